//! Cancellation refunds: a pure calculator plus the flow that applies its
//! result to the wallet and the ledger.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::commands::refunds::{ProcessRefundCommand, RefundOutcome};
use crate::domain::commands::transactions::RecordTransactionCommand;
use crate::domain::commands::wallets::CreditCommand;
use crate::domain::models::{TransactionCategory, TransactionDirection};
use crate::domain::transaction_service::TransactionService;
use crate::domain::wallet_service::WalletService;
use crate::error::{Error, Result};

/// Cancellation policy tier, decided by the booking workflow from how far
/// before showtime the cancellation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationTier {
    MoreThan72Hours,
    Between48And72Hours,
    Between24And48Hours,
    LessThan24Hours,
}

impl CancellationTier {
    pub fn refund_percentage(self) -> i64 {
        match self {
            CancellationTier::MoreThan72Hours => 100,
            CancellationTier::Between48And72Hours => 75,
            CancellationTier::Between24And48Hours => 50,
            CancellationTier::LessThan24Hours => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundBreakdown {
    /// Amount returned to the customer, in minor units, rounded half-up.
    pub refund_amount: i64,
    pub refund_percentage: i64,
    /// What the platform keeps: original amount minus the refund.
    pub cancellation_fee: i64,
}

/// Pure computation of a refund from the originally paid amount and the
/// policy tier. No side effects; the caller moves the money.
pub fn calculate_refund(original_amount: i64, tier: CancellationTier) -> Result<RefundBreakdown> {
    if original_amount <= 0 {
        return Err(Error::InvalidAmount(original_amount));
    }

    let refund_percentage = tier.refund_percentage();
    let refund_amount = (original_amount * refund_percentage + 50) / 100;

    Ok(RefundBreakdown {
        refund_amount,
        refund_percentage,
        cancellation_fee: original_amount - refund_amount,
    })
}

/// Applies a computed refund: credit the wallet, append the ledger entry.
#[derive(Clone)]
pub struct RefundService {
    wallet_service: WalletService,
    transaction_service: TransactionService,
}

impl RefundService {
    pub fn new(wallet_service: WalletService, transaction_service: TransactionService) -> Self {
        Self {
            wallet_service,
            transaction_service,
        }
    }

    pub async fn process_refund(&self, command: ProcessRefundCommand) -> Result<RefundOutcome> {
        let breakdown = calculate_refund(command.original_amount, command.tier)?;

        if breakdown.refund_amount == 0 {
            info!(
                "Cancellation for account {} refunds nothing at {}%",
                command.account_id, breakdown.refund_percentage
            );
            return Ok(RefundOutcome {
                breakdown,
                wallet: None,
                transaction: None,
            });
        }

        let description = match &command.booking_id {
            Some(booking_id) => format!(
                "{}% refund for cancelled booking {}",
                breakdown.refund_percentage, booking_id
            ),
            None => format!("{}% cancellation refund", breakdown.refund_percentage),
        };

        let wallet = self
            .wallet_service
            .credit(CreditCommand {
                account_id: command.account_id.clone(),
                account_kind: command.account_kind,
                amount: breakdown.refund_amount,
                description: Some(description.clone()),
            })
            .await?;

        let transaction = self
            .transaction_service
            .record(RecordTransactionCommand {
                account_id: command.account_id.clone(),
                account_kind: command.account_kind,
                wallet_id: Some(wallet.id.clone()),
                direction: TransactionDirection::Credit,
                amount: breakdown.refund_amount,
                category: TransactionCategory::Refund,
                description,
                status: None,
                reference_id: command.booking_id.clone(),
                movie_id: command.movie_id.clone(),
                theater_id: command.theater_id.clone(),
            })
            .await?;

        info!(
            "Refunded {} ({}%) to account {}, fee {}",
            breakdown.refund_amount,
            breakdown.refund_percentage,
            command.account_id,
            breakdown.cancellation_fee
        );

        Ok(RefundOutcome {
            breakdown,
            wallet: Some(wallet),
            transaction: Some(transaction),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::wallets::CreateWalletCommand;
    use crate::domain::models::{AccountKind, TransactionStatus};
    use crate::storage::sqlite::{
        SqliteConnection, TransactionRepository, WalletRepository,
    };
    use std::sync::Arc;

    #[test]
    fn test_calculate_refund_tiers() {
        let full = calculate_refund(1000, CancellationTier::MoreThan72Hours).unwrap();
        assert_eq!(full.refund_amount, 1000);
        assert_eq!(full.cancellation_fee, 0);

        let three_quarters = calculate_refund(1000, CancellationTier::Between48And72Hours).unwrap();
        assert_eq!(three_quarters.refund_amount, 750);
        assert_eq!(three_quarters.cancellation_fee, 250);

        let half = calculate_refund(999, CancellationTier::Between24And48Hours).unwrap();
        // 999 * 50% = 499.5, half-up to 500
        assert_eq!(half.refund_amount, 500);
        assert_eq!(half.cancellation_fee, 499);

        let none = calculate_refund(1000, CancellationTier::LessThan24Hours).unwrap();
        assert_eq!(none.refund_amount, 0);
        assert_eq!(none.cancellation_fee, 1000);
    }

    #[test]
    fn test_calculate_refund_rejects_non_positive_amount() {
        assert!(matches!(
            calculate_refund(0, CancellationTier::MoreThan72Hours),
            Err(Error::InvalidAmount(0))
        ));
        assert!(matches!(
            calculate_refund(-10, CancellationTier::MoreThan72Hours),
            Err(Error::InvalidAmount(-10))
        ));
    }

    async fn create_test_service() -> (RefundService, WalletService, TransactionService) {
        let connection = SqliteConnection::init_test().await.unwrap();
        let wallet_service =
            WalletService::new(Arc::new(WalletRepository::new(connection.clone())));
        let transaction_service =
            TransactionService::new(Arc::new(TransactionRepository::new(connection)));
        let refund_service =
            RefundService::new(wallet_service.clone(), transaction_service.clone());
        (refund_service, wallet_service, transaction_service)
    }

    #[tokio::test]
    async fn test_process_refund_credits_wallet_and_records_entry() {
        let (service, wallets, transactions) = create_test_service().await;
        wallets
            .create_wallet(CreateWalletCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
            })
            .await
            .unwrap();

        let outcome = service
            .process_refund(ProcessRefundCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
                original_amount: 990,
                tier: CancellationTier::Between24And48Hours,
                booking_id: Some("bkg-42".to_string()),
                movie_id: None,
                theater_id: Some("venue-1".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome.breakdown.refund_amount, 495);
        assert_eq!(outcome.wallet.as_ref().unwrap().balance, 495);

        let entry = outcome.transaction.unwrap();
        assert_eq!(entry.category, TransactionCategory::Refund);
        assert_eq!(entry.direction, TransactionDirection::Credit);
        assert_eq!(entry.status, TransactionStatus::Completed);
        assert_eq!(entry.reference_id.as_deref(), Some("bkg-42"));

        let latest = transactions.find_most_recent("cust-1").await.unwrap().unwrap();
        assert_eq!(latest.id, entry.id);
    }

    #[tokio::test]
    async fn test_zero_percent_tier_moves_no_money() {
        let (service, wallets, transactions) = create_test_service().await;
        wallets
            .create_wallet(CreateWalletCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
            })
            .await
            .unwrap();

        let outcome = service
            .process_refund(ProcessRefundCommand {
                account_id: "cust-1".to_string(),
                account_kind: AccountKind::Customer,
                original_amount: 1000,
                tier: CancellationTier::LessThan24Hours,
                booking_id: None,
                movie_id: None,
                theater_id: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.breakdown.refund_amount, 0);
        assert!(outcome.wallet.is_none());
        assert!(outcome.transaction.is_none());

        assert_eq!(
            wallets.get_balance("cust-1", AccountKind::Customer).await.unwrap(),
            0
        );
        assert!(transactions.find_most_recent("cust-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refund_to_missing_wallet_fails() {
        let (service, _wallets, _transactions) = create_test_service().await;

        let err = service
            .process_refund(ProcessRefundCommand {
                account_id: "ghost".to_string(),
                account_kind: AccountKind::Customer,
                original_amount: 1000,
                tier: CancellationTier::MoreThan72Hours,
                booking_id: None,
                movie_id: None,
                theater_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WalletNotFound(_)));
    }
}
