use serde::{Deserialize, Serialize};

use crate::domain::models::{
    AccountKind, TransactionCategory, TransactionDirection, TransactionStatus, WalletTransaction,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTransactionCommand {
    pub account_id: String,
    pub account_kind: AccountKind,
    pub wallet_id: Option<String>,
    pub direction: TransactionDirection,
    /// Amount in minor units, must be positive.
    pub amount: i64,
    pub category: TransactionCategory,
    pub description: String,
    /// Defaults to `Completed` when not supplied.
    pub status: Option<TransactionStatus>,
    /// Correlation id, e.g. a booking id.
    pub reference_id: Option<String>,
    pub movie_id: Option<String>,
    pub theater_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListQuery {
    pub account_id: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionListResult {
    /// Entries sorted newest-first.
    pub transactions: Vec<WalletTransaction>,
    pub total: i64,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
}
