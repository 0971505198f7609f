//! Domain model for a per-account wallet.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The platform runs a single-currency ledger.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Closed set of account roles a wallet can belong to. Raw strings from the
/// outer layers are parsed once at the boundary and carried as this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    Customer,
    VenueOwner,
    Admin,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Customer => "customer",
            AccountKind::VenueOwner => "venue_owner",
            AccountKind::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<AccountKind> {
        match value {
            "customer" => Some(AccountKind::Customer),
            "venue_owner" => Some(AccountKind::VenueOwner),
            "admin" => Some(AccountKind::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletStatus {
    Active,
    Frozen,
    Closed,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "active",
            WalletStatus::Frozen => "frozen",
            WalletStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<WalletStatus> {
        match value {
            "active" => Some(WalletStatus::Active),
            "frozen" => Some(WalletStatus::Frozen),
            "closed" => Some(WalletStatus::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-account balance record. Exactly one wallet exists per
/// (account id, account kind) pair; the balance is held in minor units and
/// never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub account_id: String,
    pub account_kind: AccountKind,
    /// Balance in minor units of `currency`.
    pub balance: i64,
    pub currency: String,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Generate a wallet ID. Format: wal-<timestamp_ms>-<random_suffix>
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("wal-{}-{}", timestamp_ms, super::random_suffix(4))
    }
}
