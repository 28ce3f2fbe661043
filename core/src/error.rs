use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("No SQL statements found in the provided script")]
    EmptyScript,

    #[error("Setup statement {index} failed: {source}\n  statement: {statement}")]
    SetupExecution {
        index: usize,
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Final query returned no rows; check the data and the feature script")]
    EmptyResult,

    #[error("Required column '{column}' is missing from the final query result")]
    MissingFeature { column: String },

    #[error("Column '{column}' row {row}: {detail}")]
    InvalidValue {
        column: String,
        row: usize,
        detail: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Histogram encoding error: {0}")]
    Render(#[from] png::EncodingError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TriageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type TriageResult<T> = Result<T, TriageError>;
