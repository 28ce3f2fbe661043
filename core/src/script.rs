//! Feature-engineering script splitting.
//!
//! A script is a `;`-delimited list of statements. Every statement but
//! the last is setup (views, temp tables); the last is the final query
//! whose result set becomes the feature matrix.
//!
//! The splitter is deliberately lexical: a `;` inside a string literal
//! or comment still ends the statement.

use crate::error::{TriageError, TriageResult};
use std::path::Path;

pub const TERMINATOR: char = ';';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    statements: Vec<String>,
}

impl Script {
    /// Split `text` on the terminator, trim each segment and drop the
    /// empty ones. Fails with `EmptyScript` when nothing is left.
    pub fn parse(text: &str) -> TriageResult<Self> {
        let statements: Vec<String> = text
            .split(TERMINATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if statements.is_empty() {
            return Err(TriageError::EmptyScript);
        }
        Ok(Self { statements })
    }

    pub fn load(path: impl AsRef<Path>) -> TriageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TriageError::io(path, e))?;
        Self::parse(&text)
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Always false: a parsed script holds at least one statement.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// All statements except the last. Empty for a single-statement script.
    pub fn setup_statements(&self) -> &[String] {
        &self.statements[..self.statements.len() - 1]
    }

    pub fn final_query(&self) -> &str {
        // parse() guarantees at least one statement.
        &self.statements[self.statements.len() - 1]
    }

    /// The setup statements rejoined as one batch, or `None` when the
    /// script is only a final query.
    pub fn setup_batch(&self) -> Option<String> {
        let setup = self.setup_statements();
        if setup.is_empty() {
            return None;
        }
        Some(format!("{};", setup.join(";\n")))
    }

    /// Rejoin the whole script. Parsing the result yields the same
    /// statements.
    pub fn render(&self) -> String {
        match self.setup_batch() {
            Some(batch) => format!("{batch}\n{};", self.final_query()),
            None => format!("{};", self.final_query()),
        }
    }
}
