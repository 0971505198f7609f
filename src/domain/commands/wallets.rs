use serde::{Deserialize, Serialize};

use crate::domain::models::AccountKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletCommand {
    pub account_id: String,
    pub account_kind: AccountKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCommand {
    pub account_id: String,
    pub account_kind: AccountKind,
    /// Amount in minor units, must be positive.
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebitCommand {
    pub account_id: String,
    pub account_kind: AccountKind,
    /// Amount in minor units, must be positive.
    pub amount: i64,
    pub description: Option<String>,
}
