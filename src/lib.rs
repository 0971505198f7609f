//! # cinema-wallet
//!
//! Wallet ledger and coupon-redemption engine for a movie booking platform.
//! The crate owns per-account balances, an append-only transaction history,
//! and coupon lifecycle with capped, venue-scoped redemption. Surrounding
//! layers (booking flows, admin tooling) construct a [`Backend`] from one
//! storage connection and call the services on it; they are expected to have
//! authenticated their callers and to supply validated identifiers.
//!
//! Correctness under concurrency comes from the storage layer: balance
//! debits and coupon usage increments are single conditional updates, so no
//! two racing operations can spend the same funds or the same coupon use.

pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};
pub use storage::sqlite::SqliteConnection;

use std::sync::Arc;

use domain::{CouponService, RefundService, TransactionService, TransferService, WalletService};
use storage::sqlite::{CouponRepository, TransactionRepository, WalletRepository};
use storage::traits::{CouponStore, TransactionStore, WalletStore};

/// Main backend struct that wires every service to one storage connection.
///
/// All storage handles are injected here, at construction; the services
/// carry no ambient globals.
pub struct Backend {
    pub wallet_service: WalletService,
    pub transaction_service: TransactionService,
    pub coupon_service: CouponService,
    pub transfer_service: TransferService,
    pub refund_service: RefundService,
}

impl Backend {
    /// Create a new backend instance with all services wired to `connection`.
    pub fn new(connection: SqliteConnection) -> Self {
        let wallet_store: Arc<dyn WalletStore> =
            Arc::new(WalletRepository::new(connection.clone()));
        let transaction_store: Arc<dyn TransactionStore> =
            Arc::new(TransactionRepository::new(connection.clone()));
        let coupon_store: Arc<dyn CouponStore> = Arc::new(CouponRepository::new(connection));

        let wallet_service = WalletService::new(wallet_store);
        let transaction_service = TransactionService::new(transaction_store);
        let coupon_service = CouponService::new(coupon_store);
        let transfer_service =
            TransferService::new(wallet_service.clone(), transaction_service.clone());
        let refund_service =
            RefundService::new(wallet_service.clone(), transaction_service.clone());

        Backend {
            wallet_service,
            transaction_service,
            coupon_service,
            transfer_service,
            refund_service,
        }
    }

    /// Connect to `url` and build a fully wired backend.
    pub async fn connect(url: &str) -> Result<Self> {
        let connection = SqliteConnection::new(url).await?;
        Ok(Self::new(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::commands::coupons::{CreateCouponCommand, RedeemCouponCommand};
    use domain::commands::transactions::{RecordTransactionCommand, TransactionListQuery};
    use domain::commands::wallets::{CreateWalletCommand, DebitCommand};
    use domain::models::{AccountKind, TransactionCategory, TransactionDirection};
    use chrono::{Duration, Utc};

    async fn create_test_backend() -> Backend {
        let connection = SqliteConnection::init_test().await.unwrap();
        Backend::new(connection)
    }

    /// A booking paid from the wallet: redeem a coupon, debit the discounted
    /// total, record the ledger entry.
    #[tokio::test]
    async fn test_booking_flow_end_to_end() {
        let backend = create_test_backend().await;

        backend
            .wallet_service
            .create_wallet(CreateWalletCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
            })
            .await
            .unwrap();
        backend
            .wallet_service
            .credit(domain::commands::wallets::CreditCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
                amount: 2000,
                description: Some("Wallet topup".to_string()),
            })
            .await
            .unwrap();

        backend
            .coupon_service
            .create(CreateCouponCommand {
                name: "Weekend deal".to_string(),
                code: "WKND25".to_string(),
                description: None,
                discount_percentage: 25,
                min_amount: 500,
                expiry_date: Utc::now() + Duration::days(2),
                venue_ids: vec!["venue-7".to_string()],
                max_usage_count: 10,
                created_by: "owner-7".to_string(),
            })
            .await
            .unwrap();

        let redemption = backend
            .coupon_service
            .redeem_for_booking(RedeemCouponCommand {
                code: "wknd25".to_string(),
                venue_id: "venue-7".to_string(),
                total_amount: 1200,
                account_id: "cust-1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(redemption.discount_amount, 300);

        let payable = 1200 - redemption.discount_amount;
        let wallet = backend
            .wallet_service
            .debit(DebitCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
                amount: payable,
                description: Some("Booking bkg-9".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(wallet.balance, 2000 - 900);

        backend
            .transaction_service
            .record(RecordTransactionCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
                wallet_id: Some(wallet.id.clone()),
                direction: TransactionDirection::Debit,
                amount: payable,
                category: TransactionCategory::Booking,
                description: "Tickets at venue-7".to_string(),
                status: None,
                reference_id: Some("bkg-9".to_string()),
                movie_id: Some("mov-3".to_string()),
                theater_id: Some("venue-7".to_string()),
            })
            .await
            .unwrap();

        let history = backend
            .transaction_service
            .list_by_account(TransactionListQuery {
                account_id: "cust-1".to_string(),
                page: 1,
                page_size: 10,
            })
            .await
            .unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.transactions[0].amount, 900);
    }
}
