//! Error taxonomy for the wallet ledger and coupon engine.
//!
//! Every business-rule failure is a typed variant so callers can branch on it
//! without string matching. Storage failures are wrapped in [`Error::Database`]
//! and should be treated as internal errors by callers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Uniform end-user message for any coupon that cannot be applied. The exact
/// reason (missing, inactive, expired, exhausted, wrong venue) is deliberately
/// not revealed to the caller; internal logs keep the precise cause.
pub const COUPON_UNUSABLE_MESSAGE: &str = "Coupon doesn't exist or expired";

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("no wallet found for account {0}")]
    WalletNotFound(String),

    #[error("wallet already exists for account {0}")]
    WalletAlreadyExists(String),

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("wallet for account {0} is not active")]
    WalletFrozen(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("coupon not found: {0}")]
    CouponNotFound(String),

    #[error("coupon {0} is inactive")]
    CouponInactive(String),

    #[error("coupon {0} has expired")]
    CouponExpired(String),

    #[error("coupon {0} has no uses remaining")]
    CouponExhausted(String),

    #[error("coupon {code} is not valid at venue {venue_id}")]
    CouponScopeMismatch { code: String, venue_id: String },

    #[error("duplicate coupon code: {0}")]
    DuplicateCode(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("compensating credit of {amount} to account {account_id} failed after a partial transfer")]
    CompensationFailed { account_id: String, amount: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Message suitable for showing to an end user.
    ///
    /// Coupon-unusable variants are flattened to [`COUPON_UNUSABLE_MESSAGE`]
    /// so a caller probing codes cannot learn which condition failed.
    pub fn user_message(&self) -> String {
        match self {
            Error::CouponNotFound(_)
            | Error::CouponInactive(_)
            | Error::CouponExpired(_)
            | Error::CouponExhausted(_)
            | Error::CouponScopeMismatch { .. } => COUPON_UNUSABLE_MESSAGE.to_string(),
            Error::Database(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}
