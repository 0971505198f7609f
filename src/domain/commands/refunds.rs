use serde::{Deserialize, Serialize};

use crate::domain::models::{AccountKind, Wallet, WalletTransaction};
use crate::domain::refund_service::{CancellationTier, RefundBreakdown};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRefundCommand {
    pub account_id: String,
    pub account_kind: AccountKind,
    /// Originally paid amount in minor units.
    pub original_amount: i64,
    /// Policy tier computed by the booking workflow from time-to-showtime.
    pub tier: CancellationTier,
    pub booking_id: Option<String>,
    pub movie_id: Option<String>,
    pub theater_id: Option<String>,
}

/// Outcome of a processed refund. `wallet` and `transaction` are absent when
/// the tier refunds nothing and no money moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub breakdown: RefundBreakdown,
    pub wallet: Option<Wallet>,
    pub transaction: Option<WalletTransaction>,
}
