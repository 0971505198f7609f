//! Wallet account management: the single owner of balance mutation rules.
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::wallets::{CreateWalletCommand, CreditCommand, DebitCommand};
use crate::domain::models::{AccountKind, Wallet, WalletStatus, DEFAULT_CURRENCY};
use crate::error::{Error, Result};
use crate::storage::traits::WalletStore;

/// Service guaranteeing a correct, non-negative balance per account.
///
/// Both the balance check and the decrement of a debit happen inside one
/// conditional update at the storage layer, so concurrent debits against the
/// same wallet are linearized without any in-process lock.
#[derive(Clone)]
pub struct WalletService {
    wallet_store: Arc<dyn WalletStore>,
}

impl WalletService {
    pub fn new(wallet_store: Arc<dyn WalletStore>) -> Self {
        Self { wallet_store }
    }

    /// Create a wallet with a zero balance in the system default currency.
    pub async fn create_wallet(&self, command: CreateWalletCommand) -> Result<Wallet> {
        Self::validate_account_id(&command.account_id)?;

        if self
            .wallet_store
            .get_wallet(&command.account_id, command.account_kind)
            .await?
            .is_some()
        {
            return Err(Error::WalletAlreadyExists(command.account_id));
        }

        let now = Utc::now();
        let wallet = Wallet {
            id: Wallet::generate_id(now.timestamp_millis() as u64),
            account_id: command.account_id,
            account_kind: command.account_kind,
            balance: 0,
            currency: DEFAULT_CURRENCY.to_string(),
            status: WalletStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.wallet_store.insert_wallet(&wallet).await?;

        info!(
            "Created wallet {} for account {} ({})",
            wallet.id, wallet.account_id, wallet.account_kind
        );

        Ok(wallet)
    }

    /// Fetch the wallet for an account, creating it on first request.
    pub async fn ensure_wallet(
        &self,
        account_id: &str,
        account_kind: AccountKind,
    ) -> Result<Wallet> {
        if let Some(wallet) = self.wallet_store.get_wallet(account_id, account_kind).await? {
            return Ok(wallet);
        }

        match self
            .create_wallet(CreateWalletCommand {
                account_id: account_id.to_string(),
                account_kind,
            })
            .await
        {
            Ok(wallet) => Ok(wallet),
            // Lost a creation race; the winner's wallet is the one to use.
            Err(Error::WalletAlreadyExists(_)) => self.fetch_snapshot(account_id, account_kind).await,
            Err(e) => Err(e),
        }
    }

    /// Atomically increase the balance and return the updated snapshot.
    pub async fn credit(&self, command: CreditCommand) -> Result<Wallet> {
        if command.amount <= 0 {
            return Err(Error::InvalidAmount(command.amount));
        }

        let updated = self
            .wallet_store
            .credit_wallet(
                &command.account_id,
                command.account_kind,
                command.amount,
                Utc::now(),
            )
            .await?;

        if !updated {
            return Err(Error::WalletNotFound(command.account_id));
        }

        let wallet = self
            .fetch_snapshot(&command.account_id, command.account_kind)
            .await?;

        info!(
            "Credited {} to account {} ({}): balance now {}{}",
            command.amount,
            command.account_id,
            command.account_kind,
            wallet.balance,
            command
                .description
                .as_deref()
                .map(|d| format!(" [{}]", d))
                .unwrap_or_default()
        );

        Ok(wallet)
    }

    /// Atomically decrease the balance and return the updated snapshot.
    /// Fails without touching the balance when funds are insufficient or the
    /// wallet is not active.
    pub async fn debit(&self, command: DebitCommand) -> Result<Wallet> {
        if command.amount <= 0 {
            return Err(Error::InvalidAmount(command.amount));
        }

        let updated = self
            .wallet_store
            .debit_wallet_if_sufficient(
                &command.account_id,
                command.account_kind,
                command.amount,
                Utc::now(),
            )
            .await?;

        if !updated {
            // The guard refused; read once to name the reason.
            let wallet = self
                .wallet_store
                .get_wallet(&command.account_id, command.account_kind)
                .await?
                .ok_or_else(|| Error::WalletNotFound(command.account_id.clone()))?;

            if wallet.status != WalletStatus::Active {
                warn!(
                    "Debit of {} rejected: wallet for account {} is {}",
                    command.amount, command.account_id, wallet.status
                );
                return Err(Error::WalletFrozen(command.account_id));
            }

            warn!(
                "Debit of {} rejected for account {}: balance is {}",
                command.amount, command.account_id, wallet.balance
            );
            return Err(Error::InsufficientBalance {
                requested: command.amount,
                available: wallet.balance,
            });
        }

        let wallet = self
            .fetch_snapshot(&command.account_id, command.account_kind)
            .await?;

        info!(
            "Debited {} from account {} ({}): balance now {}{}",
            command.amount,
            command.account_id,
            command.account_kind,
            wallet.balance,
            command
                .description
                .as_deref()
                .map(|d| format!(" [{}]", d))
                .unwrap_or_default()
        );

        Ok(wallet)
    }

    /// Current balance in minor units.
    pub async fn get_balance(&self, account_id: &str, account_kind: AccountKind) -> Result<i64> {
        let wallet = self.fetch_snapshot(account_id, account_kind).await?;
        Ok(wallet.balance)
    }

    pub async fn freeze(&self, account_id: &str, account_kind: AccountKind) -> Result<Wallet> {
        self.set_status(account_id, account_kind, WalletStatus::Frozen)
            .await
    }

    pub async fn unfreeze(&self, account_id: &str, account_kind: AccountKind) -> Result<Wallet> {
        self.set_status(account_id, account_kind, WalletStatus::Active)
            .await
    }

    async fn set_status(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        status: WalletStatus,
    ) -> Result<Wallet> {
        let updated = self
            .wallet_store
            .set_wallet_status(account_id, account_kind, status, Utc::now())
            .await?;

        if !updated {
            return Err(Error::WalletNotFound(account_id.to_string()));
        }

        info!("Wallet for account {} ({}) set to {}", account_id, account_kind, status);

        self.fetch_snapshot(account_id, account_kind).await
    }

    async fn fetch_snapshot(&self, account_id: &str, account_kind: AccountKind) -> Result<Wallet> {
        self.wallet_store
            .get_wallet(account_id, account_kind)
            .await?
            .ok_or_else(|| Error::WalletNotFound(account_id.to_string()))
    }

    fn validate_account_id(account_id: &str) -> Result<()> {
        if account_id.trim().is_empty() {
            return Err(Error::Validation(
                "accountId must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
