//! Domain model for a ledger entry.
//!
//! A `WalletTransaction` is created exactly once per balance mutation and is
//! treated as append-only afterwards; only the status field may be corrected.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::wallet::AccountKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionDirection {
    Credit,
    Debit,
}

impl TransactionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionDirection::Credit => "credit",
            TransactionDirection::Debit => "debit",
        }
    }

    pub fn parse(value: &str) -> Option<TransactionDirection> {
        match value {
            "credit" => Some(TransactionDirection::Credit),
            "debit" => Some(TransactionDirection::Debit),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionCategory {
    Booking,
    Refund,
    Topup,
    Withdrawal,
    Revenue,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Booking => "booking",
            TransactionCategory::Refund => "refund",
            TransactionCategory::Topup => "topup",
            TransactionCategory::Withdrawal => "withdrawal",
            TransactionCategory::Revenue => "revenue",
        }
    }

    pub fn parse(value: &str) -> Option<TransactionCategory> {
        match value {
            "booking" => Some(TransactionCategory::Booking),
            "refund" => Some(TransactionCategory::Refund),
            "topup" => Some(TransactionCategory::Topup),
            "withdrawal" => Some(TransactionCategory::Withdrawal),
            "revenue" => Some(TransactionCategory::Revenue),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<TransactionStatus> {
        match value {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one balance mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: String,
    pub account_id: String,
    pub account_kind: AccountKind,
    /// Wallet the mutation was applied to, when the caller knows it.
    pub wallet_id: Option<String>,
    pub direction: TransactionDirection,
    /// Amount in minor units, strictly positive.
    pub amount: i64,
    pub category: TransactionCategory,
    pub description: String,
    pub status: TransactionStatus,
    /// Correlation id, e.g. the booking this movement belongs to.
    pub reference_id: Option<String>,
    /// Related domain entities, carried for reporting only.
    pub movie_id: Option<String>,
    pub theater_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Generate a transaction ID based on direction and current timestamp.
    /// Format: txn-<dr|cr>-<timestamp_ms>-<random_suffix>
    /// Example: txn-cr-1625846400123-af3c
    pub fn generate_id(direction: TransactionDirection, timestamp_ms: u64) -> String {
        let leg = match direction {
            TransactionDirection::Credit => "cr",
            TransactionDirection::Debit => "dr",
        };
        format!("txn-{}-{}-{}", leg, timestamp_ms, super::random_suffix(4))
    }

    /// Whether a direction/category pair describes a movement the ledger
    /// accepts. The debit side of a refund is the venue owner funding it.
    pub fn combination_allowed(
        direction: TransactionDirection,
        category: TransactionCategory,
    ) -> bool {
        matches!(
            (direction, category),
            (TransactionDirection::Credit, TransactionCategory::Refund)
                | (TransactionDirection::Credit, TransactionCategory::Topup)
                | (TransactionDirection::Credit, TransactionCategory::Revenue)
                | (TransactionDirection::Debit, TransactionCategory::Booking)
                | (TransactionDirection::Debit, TransactionCategory::Withdrawal)
                | (TransactionDirection::Debit, TransactionCategory::Refund)
        )
    }
}
