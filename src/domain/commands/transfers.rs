use serde::{Deserialize, Serialize};

use crate::domain::models::AccountKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub from_account_id: String,
    pub from_account_kind: AccountKind,
    pub to_account_id: String,
    pub to_account_kind: AccountKind,
    /// Amount in minor units, must be positive.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub amount: i64,
    pub from_account_id: String,
    pub to_account_id: String,
}
