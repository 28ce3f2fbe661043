//! Shared primitive types used across the pipeline.

/// Transaction identifier as stored in the `transactions` table.
pub type TxId = i64;

/// Customer identifier. Free-form text in the store.
pub type UserId = String;

/// The six feature columns every final query must produce, in model order.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "amount",
    "tx_count",
    "avg_amount",
    "total_amount",
    "daily_tx",
    "daily_amount",
];

pub const TX_ID_COLUMN: &str = "tx_id";
pub const USER_ID_COLUMN: &str = "user_id";
pub const AMOUNT_COLUMN: &str = "amount";
pub const SCORE_COLUMN: &str = "anomaly_score";
