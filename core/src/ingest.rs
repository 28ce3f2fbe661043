//! Flat-file ingestion: CSV in, `transactions` table out.

use crate::{
    error::{TriageError, TriageResult},
    store::{FeatureStore, TransactionRecord},
};
use std::{fs::File, path::Path};

/// Headed CSV reader. Columns are matched by header name, so order does
/// not matter.
fn open_reader(path: &Path) -> TriageResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| TriageError::io(path, e))?;
    Ok(csv::Reader::from_reader(file))
}

/// Read every record of a headed transactions CSV.
pub fn read_transactions(path: impl AsRef<Path>) -> TriageResult<Vec<TransactionRecord>> {
    let records = open_reader(path.as_ref())?
        .deserialize()
        .collect::<Result<Vec<TransactionRecord>, csv::Error>>()?;
    Ok(records)
}

/// Load `csv_path` into the store at `db_path`, replacing any existing
/// `transactions` table. Returns the number of rows loaded. A malformed
/// record leaves the previous table in place.
pub fn ingest_csv(csv_path: impl AsRef<Path>, db_path: impl AsRef<Path>) -> TriageResult<usize> {
    let csv_path = csv_path.as_ref();
    let mut rdr = open_reader(csv_path)?;
    let mut store = FeatureStore::create(db_path)?;
    let loaded = store.replace_transactions_from(rdr.deserialize::<TransactionRecord>())?;
    log::info!("ingested {loaded} transaction(s) from {}", csv_path.display());
    Ok(loaded)
}
