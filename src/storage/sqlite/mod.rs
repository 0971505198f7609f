//! # SQLite Storage Module
//!
//! sqlx-backed storage implementation. One repository per aggregate, all
//! sharing a [`SqliteConnection`] that owns the pool and installs the schema.
//!
//! Monetary amounts are stored as INTEGER minor units. Timestamps are stored
//! as fixed-width RFC 3339 TEXT (millisecond precision, `Z` suffix) so that
//! lexicographic comparison in SQL matches chronological order; parsing back
//! into `chrono` types is this layer's responsibility.

pub mod connection;
pub mod coupon_repository;
pub mod transaction_repository;
pub mod wallet_repository;

pub use connection::SqliteConnection;
pub use coupon_repository::CouponRepository;
pub use transaction_repository::TransactionRepository;
pub use wallet_repository::WalletRepository;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("invalid stored timestamp '{}': {}", raw, e)))
}

/// Map a unique-constraint violation to a domain error, leaving every other
/// database failure wrapped as [`Error::Database`].
pub(crate) fn map_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> Error) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation => {
            conflict()
        }
        _ => Error::Database(err),
    }
}
