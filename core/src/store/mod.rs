//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The pipeline hands it a script and gets a FeatureMatrix back;
//! no connection outlives `materialize_features`.

mod features;
mod transactions;

pub use transactions::TransactionRecord;

use crate::{error::TriageResult, matrix::FeatureMatrix, script::Script};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

pub struct FeatureStore {
    conn: Connection,
}

impl FeatureStore {
    /// Open an existing store. A missing file is an error, never an
    /// empty new database.
    pub fn open(path: impl AsRef<Path>) -> TriageResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn })
    }

    /// Open or create a store file. Used by ingestion.
    pub fn create(path: impl AsRef<Path>) -> TriageResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> TriageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }
}

/// Run `script` against the store at `db_path` and return the final
/// query's rows. The connection is opened and dropped inside this call.
pub fn materialize_features(
    db_path: impl AsRef<Path>,
    script: &Script,
) -> TriageResult<FeatureMatrix> {
    let db_path = db_path.as_ref();
    log::debug!("opening feature store at {}", db_path.display());
    let store = FeatureStore::open(db_path)?;
    store.run_script(script)
}
