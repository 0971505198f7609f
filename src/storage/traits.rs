//! # Storage Traits
//!
//! This module defines the storage abstraction traits the domain layer
//! depends on. The traits keep the services storage-agnostic; the SQLite
//! implementation lives in `storage::sqlite`.
//!
//! Correctness under concurrent access comes from these traits, not from
//! in-process locks: the conditional debit and the guarded usage increment
//! must be single atomic updates in any implementation, because multiple
//! process instances may mutate the same rows at once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{
    AccountKind, Coupon, TransactionStatus, Wallet, WalletStatus, WalletTransaction,
};
use crate::error::Result;

/// Trait defining the interface for wallet storage operations.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Store a new wallet. Fails with `WalletAlreadyExists` when a wallet for
    /// the same (account id, account kind) pair is already present.
    async fn insert_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Retrieve the wallet for an account, if any.
    async fn get_wallet(&self, account_id: &str, account_kind: AccountKind)
        -> Result<Option<Wallet>>;

    /// Unconditionally increase the balance. Returns false when no wallet
    /// exists for the account.
    async fn credit_wallet(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        amount: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Atomically decrease the balance, but only when the wallet is active
    /// and holds at least `amount`. The check and the decrement are one
    /// conditional update; returns false when the guard refused.
    async fn debit_wallet_if_sufficient(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        amount: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Update the wallet status. Returns false when no wallet exists.
    async fn set_wallet_status(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        status: WalletStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Trait defining the interface for ledger entry storage operations.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Append a ledger entry.
    async fn insert_transaction(&self, transaction: &WalletTransaction) -> Result<()>;

    /// Retrieve a specific entry by ID.
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<WalletTransaction>>;

    /// List entries for an account, newest first.
    async fn list_transactions(
        &self,
        account_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<WalletTransaction>>;

    /// Total number of entries for an account.
    async fn count_transactions(&self, account_id: &str) -> Result<i64>;

    /// The most recent entry for an account, if any.
    async fn latest_transaction(&self, account_id: &str) -> Result<Option<WalletTransaction>>;

    /// Update the status of an entry. Returns false when the entry does not
    /// exist; setting the status it already has is a no-op that succeeds.
    async fn update_transaction_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Trait defining the interface for coupon storage operations.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Store a new coupon with its venue scope. Fails with `DuplicateCode`
    /// when the code is already taken.
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()>;

    async fn get_coupon(&self, coupon_id: &str) -> Result<Option<Coupon>>;

    /// Retrieve by normalized (uppercased) code.
    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>>;

    /// Persist updated coupon fields and replace the venue scope.
    async fn update_coupon(&self, coupon: &Coupon) -> Result<()>;

    /// Delete a coupon and its venue scope. Returns false when absent.
    async fn delete_coupon(&self, coupon_id: &str) -> Result<bool>;

    /// Consume one use of a coupon: a single guarded increment that checks
    /// active, unexpired, uses remaining, and venue scope in one statement.
    /// Returns false when any condition refused; the caller classifies why.
    async fn redeem_coupon_if_available(
        &self,
        code: &str,
        venue_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    async fn list_coupons_by_owner(
        &self,
        owner_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<Coupon>>;

    async fn count_coupons_by_owner(&self, owner_id: &str) -> Result<i64>;

    async fn list_coupons_by_venue(
        &self,
        venue_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<Coupon>>;

    async fn count_coupons_by_venue(&self, venue_id: &str) -> Result<i64>;

    async fn list_coupons(&self, limit: u32, offset: i64) -> Result<Vec<Coupon>>;

    async fn count_coupons(&self) -> Result<i64>;
}
