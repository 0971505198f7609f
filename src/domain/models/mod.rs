pub mod coupon;
pub mod transaction;
pub mod wallet;

pub use coupon::Coupon;
pub use transaction::{
    TransactionCategory, TransactionDirection, TransactionStatus, WalletTransaction,
};
pub use wallet::{AccountKind, Wallet, WalletStatus, DEFAULT_CURRENCY};

use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a short hex suffix for human-traceable ids.
pub(crate) fn random_suffix(len: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();
    format!("{:x}", now % (16_u128.pow(len as u32)))
        .chars()
        .take(len)
        .collect()
}
