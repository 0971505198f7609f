//! Fund movement between two accounts as one logical operation.
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::commands::transactions::RecordTransactionCommand;
use crate::domain::commands::transfers::{TransferCommand, TransferResult};
use crate::domain::commands::wallets::{CreditCommand, DebitCommand};
use crate::domain::models::{TransactionCategory, TransactionDirection, TransactionStatus};
use crate::domain::transaction_service::TransactionService;
use crate::domain::wallet_service::WalletService;
use crate::error::{Error, Result};

/// Orchestrates a debit on one wallet and a credit on another, with a
/// compensating credit when the second leg fails.
///
/// The compensation is not atomic with the original debit. When it fails
/// too, the owed amount is written to the ledger as a pending entry so a
/// settlement job can retry it; the caller sees a dedicated error that must
/// be alerted on, never swallowed.
#[derive(Clone)]
pub struct TransferService {
    wallet_service: WalletService,
    transaction_service: TransactionService,
}

impl TransferService {
    pub fn new(wallet_service: WalletService, transaction_service: TransactionService) -> Self {
        Self {
            wallet_service,
            transaction_service,
        }
    }

    pub async fn transfer(&self, command: TransferCommand) -> Result<TransferResult> {
        if command.amount <= 0 {
            return Err(Error::InvalidAmount(command.amount));
        }
        if command.from_account_id == command.to_account_id
            && command.from_account_kind == command.to_account_kind
        {
            return Err(Error::Validation(
                "cannot transfer a wallet to itself".to_string(),
            ));
        }

        self.wallet_service
            .debit(DebitCommand {
                account_id: command.from_account_id.clone(),
                account_kind: command.from_account_kind,
                amount: command.amount,
                description: Some(format!("Transfer to account {}", command.to_account_id)),
            })
            .await?;

        let credit_result = self
            .wallet_service
            .credit(CreditCommand {
                account_id: command.to_account_id.clone(),
                account_kind: command.to_account_kind,
                amount: command.amount,
                description: Some(format!("Transfer from account {}", command.from_account_id)),
            })
            .await;

        if let Err(credit_err) = credit_result {
            warn!(
                "Transfer of {} from {} to {} failed while crediting; issuing compensating credit",
                command.amount, command.from_account_id, command.to_account_id
            );
            return Err(self.compensate(&command, credit_err).await);
        }

        info!(
            "Transferred {} from account {} to account {}",
            command.amount, command.from_account_id, command.to_account_id
        );

        Ok(TransferResult {
            amount: command.amount,
            from_account_id: command.from_account_id,
            to_account_id: command.to_account_id,
        })
    }

    /// Return the debited amount to the source wallet. On success the
    /// original credit failure is surfaced; on failure the owed credit is
    /// parked in the ledger and the fund-loss error returned instead.
    async fn compensate(&self, command: &TransferCommand, credit_err: Error) -> Error {
        let compensation = self
            .wallet_service
            .credit(CreditCommand {
                account_id: command.from_account_id.clone(),
                account_kind: command.from_account_kind,
                amount: command.amount,
                description: Some("Compensating credit for failed transfer".to_string()),
            })
            .await;

        match compensation {
            Ok(_) => credit_err,
            Err(comp_err) => {
                error!(
                    "Compensating credit of {} to account {} failed: {}. Funds are in limbo.",
                    command.amount, command.from_account_id, comp_err
                );

                let outbox = RecordTransactionCommand {
                    account_id: command.from_account_id.clone(),
                    account_kind: command.from_account_kind,
                    wallet_id: None,
                    direction: TransactionDirection::Credit,
                    amount: command.amount,
                    category: TransactionCategory::Refund,
                    description: format!(
                        "Compensating credit owed for failed transfer to account {}",
                        command.to_account_id
                    ),
                    status: Some(TransactionStatus::Pending),
                    reference_id: None,
                    movie_id: None,
                    theater_id: None,
                };
                if let Err(record_err) = self.transaction_service.record(outbox).await {
                    error!(
                        "Failed to park owed compensation for account {} in the ledger: {}",
                        command.from_account_id, record_err
                    );
                }

                Error::CompensationFailed {
                    account_id: command.from_account_id.clone(),
                    amount: command.amount,
                }
            }
        }
    }
}
