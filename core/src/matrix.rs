//! The feature matrix: the materialized result of the final query.
//!
//! Cells keep the storage class SQLite reported. Numeric views are
//! produced on demand; nulls read as 0.

use crate::error::{TriageError, TriageResult};
use rusqlite::types::ValueRef;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    pub fn from_sql(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
        }
    }

    /// Numeric reading of the cell. Null is 0; text must parse.
    pub fn as_f64(&self) -> Result<f64, String> {
        match self {
            Cell::Null => Ok(0.0),
            Cell::Integer(i) => Ok(*i as f64),
            Cell::Real(f) => Ok(*f),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("text '{s}' is not numeric")),
            Cell::Blob(_) => Err("blob value is not numeric".into()),
        }
    }

    /// Integer reading of the cell. Reals and text must hold a whole number.
    pub fn as_i64(&self) -> Result<i64, String> {
        match self {
            Cell::Integer(i) => Ok(*i),
            Cell::Real(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            Cell::Real(f) => Err(format!("real {f} is not an integer")),
            Cell::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("text '{s}' is not an integer")),
            Cell::Null => Err("null value".into()),
            Cell::Blob(_) => Err("blob value is not an integer".into()),
        }
    }

    /// Text reading of the cell, `None` for null. Whole reals keep a
    /// trailing `.0`, so a REAL key `1.0` never collides with INTEGER `1`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Integer(i) => Some(i.to_string()),
            Cell::Real(f) => Some(real_text(*f)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

fn real_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like `column_index`, but a missing column is a `MissingFeature` error.
    pub fn require_column(&self, name: &str) -> TriageResult<usize> {
        self.column_index(name)
            .ok_or_else(|| TriageError::MissingFeature {
                column: name.to_string(),
            })
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    /// The named column as reals, nulls filled with 0.
    /// Non-numeric and non-finite cells are `InvalidValue` errors.
    pub fn numeric_column(&self, name: &str) -> TriageResult<Vec<f64>> {
        let col = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row[col]
                    .as_f64()
                    .and_then(|v| {
                        if v.is_finite() {
                            Ok(v)
                        } else {
                            Err(format!("non-finite value {v}"))
                        }
                    })
                    .map_err(|detail| TriageError::InvalidValue {
                        column: name.to_string(),
                        row: i,
                        detail,
                    })
            })
            .collect()
    }

    /// Set a real-valued column, replacing an existing column of the same
    /// name or appending a new one.
    pub fn set_numeric_column(&mut self, name: &str, values: &[f64]) {
        assert_eq!(values.len(), self.rows.len(), "column length mismatch");
        match self.column_index(name) {
            Some(col) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[col] = Cell::Real(*v);
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(Cell::Real(*v));
                }
            }
        }
    }

    /// Dense numeric grid over `columns`, in that order.
    /// Any column absent from the schema fails before conversion starts.
    pub fn feature_grid(&self, columns: &[&str]) -> TriageResult<FeatureGrid> {
        for name in columns {
            self.require_column(name)?;
        }
        let mut grid = FeatureGrid::with_capacity(self.rows.len(), columns.len());
        let per_column: Vec<Vec<f64>> = columns
            .iter()
            .map(|name| self.numeric_column(name))
            .collect::<TriageResult<_>>()?;
        for i in 0..self.rows.len() {
            grid.push_row(per_column.iter().map(|c| c[i]));
        }
        Ok(grid)
    }
}

/// Row-major matrix of reals fed to the unsupervised scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGrid {
    n_features: usize,
    values: Vec<f64>,
}

impl FeatureGrid {
    pub fn with_capacity(n_rows: usize, n_features: usize) -> Self {
        Self {
            n_features,
            values: Vec::with_capacity(n_rows * n_features),
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let mut grid = Self::with_capacity(rows.len(), n_features);
        for row in rows {
            grid.push_row(row.iter().copied());
        }
        grid
    }

    pub fn push_row(&mut self, row: impl IntoIterator<Item = f64>) {
        let before = self.values.len();
        self.values.extend(row);
        assert_eq!(
            self.values.len() - before,
            self.n_features,
            "row width mismatch"
        );
    }

    pub fn n_rows(&self) -> usize {
        if self.n_features == 0 {
            0
        } else {
            self.values.len() / self.n_features
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n_features..(i + 1) * self.n_features]
    }

    pub fn get(&self, row: usize, feature: usize) -> f64 {
        self.values[row * self.n_features + feature]
    }
}
