//! Unsupervised fraud triage: SQL feature scripts in, ranked anomaly
//! scores out.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod ingest;
pub mod matrix;
pub mod pipeline;
pub mod rank;
pub mod rng;
pub mod scorer;
pub mod script;
pub mod store;
pub mod types;

pub use error::{TriageError, TriageResult};
