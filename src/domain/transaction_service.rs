//! Ledger entry recording and account history queries.
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::commands::transactions::{
    RecordTransactionCommand, TransactionListQuery, TransactionListResult,
};
use crate::domain::commands::{total_pages, validate_pagination};
use crate::domain::models::{TransactionStatus, WalletTransaction};
use crate::error::{Error, Result};
use crate::storage::traits::TransactionStore;

const MAX_DESCRIPTION_LENGTH: usize = 256;

/// Append-only history of money movement, queryable by account.
///
/// Recording is not idempotent: two identical commands create two ledger
/// rows. Callers that need exactly-once semantics must deduplicate upstream.
#[derive(Clone)]
pub struct TransactionService {
    transaction_store: Arc<dyn TransactionStore>,
}

impl TransactionService {
    pub fn new(transaction_store: Arc<dyn TransactionStore>) -> Self {
        Self { transaction_store }
    }

    /// Validate and append a ledger entry, defaulting the status to
    /// `Completed`. Returns the stored entry with its generated id.
    pub async fn record(&self, command: RecordTransactionCommand) -> Result<WalletTransaction> {
        Self::validate_record_command(&command)?;

        let now = Utc::now();
        let transaction = WalletTransaction {
            id: WalletTransaction::generate_id(command.direction, now.timestamp_millis() as u64),
            account_id: command.account_id,
            account_kind: command.account_kind,
            wallet_id: command.wallet_id,
            direction: command.direction,
            amount: command.amount,
            category: command.category,
            description: command.description,
            status: command.status.unwrap_or(TransactionStatus::Completed),
            reference_id: command.reference_id,
            movie_id: command.movie_id,
            theater_id: command.theater_id,
            created_at: now,
            updated_at: now,
        };

        self.transaction_store
            .insert_transaction(&transaction)
            .await?;

        info!(
            "Recorded {} {} of {} for account {} ({})",
            transaction.category,
            transaction.direction,
            transaction.amount,
            transaction.account_id,
            transaction.id
        );

        Ok(transaction)
    }

    /// List an account's entries newest-first with pagination totals.
    pub async fn list_by_account(
        &self,
        query: TransactionListQuery,
    ) -> Result<TransactionListResult> {
        validate_pagination(query.page, query.page_size)?;

        let total = self
            .transaction_store
            .count_transactions(&query.account_id)
            .await?;
        let offset = (query.page as i64 - 1) * query.page_size as i64;
        let transactions = self
            .transaction_store
            .list_transactions(&query.account_id, query.page_size, offset)
            .await?;

        Ok(TransactionListResult {
            transactions,
            total,
            total_pages: total_pages(total, query.page_size),
            page: query.page,
            page_size: query.page_size,
        })
    }

    /// The most recent entry for an account, if any.
    pub async fn find_most_recent(&self, account_id: &str) -> Result<Option<WalletTransaction>> {
        self.transaction_store.latest_transaction(account_id).await
    }

    /// Update the status of an entry, for asynchronous settlement flows.
    /// Re-applying the status an entry already has succeeds unchanged.
    pub async fn update_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<WalletTransaction> {
        let updated = self
            .transaction_store
            .update_transaction_status(transaction_id, status, Utc::now())
            .await?;

        if !updated {
            return Err(Error::TransactionNotFound(transaction_id.to_string()));
        }

        info!("Transaction {} set to {}", transaction_id, status);

        self.transaction_store
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound(transaction_id.to_string()))
    }

    fn validate_record_command(command: &RecordTransactionCommand) -> Result<()> {
        if command.account_id.trim().is_empty() {
            return Err(Error::Validation(
                "accountId must not be empty".to_string(),
            ));
        }
        if command.amount <= 0 {
            return Err(Error::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if !WalletTransaction::combination_allowed(command.direction, command.category) {
            return Err(Error::Validation(format!(
                "category {} cannot be recorded as a {}",
                command.category, command.direction
            )));
        }
        if command.description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::Validation(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }
        Ok(())
    }
}
