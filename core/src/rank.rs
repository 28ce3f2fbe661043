//! Ranking and per-user rollup. Pure transformations, no I/O.

use crate::{
    error::{TriageError, TriageResult},
    matrix::FeatureMatrix,
    types::{TxId, UserId, AMOUNT_COLUMN, SCORE_COLUMN, TX_ID_COLUMN, USER_ID_COLUMN},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of `fraud_scores.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub tx_id: TxId,
    pub user_id: Option<UserId>,
    pub amount: f64,
    pub anomaly_score: f64,
}

/// One row of `fraud_summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRollup {
    pub user_id: UserId,
    pub max_anomaly_score: f64,
    pub total_amount: f64,
}

/// Project a scored matrix to ranked rows, highest score first.
/// The sort is stable: equal scores keep their query order.
pub fn rank(matrix: &FeatureMatrix) -> TriageResult<Vec<RankedRow>> {
    let tx_col = matrix.require_column(TX_ID_COLUMN)?;
    let user_col = matrix.require_column(USER_ID_COLUMN)?;
    let amounts = matrix.numeric_column(AMOUNT_COLUMN)?;
    let scores = matrix.numeric_column(SCORE_COLUMN)?;

    let mut rows = Vec::with_capacity(matrix.row_count());
    for (i, (amount, anomaly_score)) in amounts.into_iter().zip(scores).enumerate() {
        let tx_id = matrix
            .cell(i, tx_col)
            .as_i64()
            .map_err(|detail| TriageError::InvalidValue {
                column: TX_ID_COLUMN.to_string(),
                row: i,
                detail,
            })?;
        rows.push(RankedRow {
            tx_id,
            user_id: matrix.cell(i, user_col).as_text(),
            amount,
            anomaly_score,
        });
    }

    rows.sort_by(|a, b| b.anomaly_score.total_cmp(&a.anomaly_score));
    Ok(rows)
}

/// Per-user max score and total amount over the first `top_k` ranked rows.
///
/// Ordered by max score, then total amount, both descending; remaining
/// ties by user id ascending. Rows without a user id are skipped.
pub fn rollup(ranked: &[RankedRow], top_k: usize) -> Vec<UserRollup> {
    let mut by_user: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in ranked.iter().take(top_k) {
        let Some(user_id) = row.user_id.as_deref() else {
            continue;
        };
        let entry = by_user
            .entry(user_id)
            .or_insert((f64::NEG_INFINITY, 0.0));
        entry.0 = entry.0.max(row.anomaly_score);
        entry.1 += row.amount;
    }

    let mut summary: Vec<UserRollup> = by_user
        .into_iter()
        .map(|(user_id, (max_anomaly_score, total_amount))| UserRollup {
            user_id: user_id.to_string(),
            max_anomaly_score,
            total_amount,
        })
        .collect();
    summary.sort_by(|a, b| {
        b.max_anomaly_score
            .total_cmp(&a.max_anomaly_score)
            .then_with(|| b.total_amount.total_cmp(&a.total_amount))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    summary
}
