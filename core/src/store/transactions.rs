use super::FeatureStore;
use crate::{
    error::{TriageError, TriageResult},
    types::TxId,
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

const TRANSACTIONS_SCHEMA: &str = include_str!("../../../migrations/001_transactions.sql");

/// One raw transaction as loaded by ingestion.
/// Empty CSV cells become `None` and are stored as NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx_id: TxId,
    pub user_id: Option<String>,
    pub date: Option<String>,
    pub region: Option<String>,
    pub merchant: Option<String>,
    pub amount: Option<f64>,
}

impl FeatureStore {
    // ── Transactions ──────────────────────────────────────────────

    /// Replace the `transactions` table with `records` in one transaction.
    pub fn replace_transactions(&mut self, records: &[TransactionRecord]) -> TriageResult<usize> {
        self.replace_transactions_from(records.iter().cloned().map(Ok::<_, TriageError>))
    }

    /// Like `replace_transactions`, fed from a fallible stream such as a
    /// CSV reader. The first failing record rolls the whole replace back,
    /// leaving any previous table untouched.
    pub fn replace_transactions_from<I, E>(&mut self, records: I) -> TriageResult<usize>
    where
        I: IntoIterator<Item = Result<TransactionRecord, E>>,
        TriageError: From<E>,
    {
        let tx = self.conn.transaction()?;
        tx.execute_batch(TRANSACTIONS_SCHEMA)?;
        let mut loaded = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO transactions (tx_id, user_id, date, region, merchant, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                let r = record?;
                stmt.execute(params![r.tx_id, r.user_id, r.date, r.region, r.merchant, r.amount])?;
                loaded += 1;
            }
        }
        tx.commit()?;
        Ok(loaded)
    }

    pub fn transaction_count(&self) -> TriageResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}
