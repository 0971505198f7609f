use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::{format_timestamp, map_unique_violation, parse_timestamp, SqliteConnection};
use crate::domain::models::{AccountKind, Wallet, WalletStatus};
use crate::error::{Error, Result};
use crate::storage::traits::WalletStore;

/// SQLite-backed wallet repository
#[derive(Clone)]
pub struct WalletRepository {
    connection: SqliteConnection,
}

impl WalletRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    fn row_to_wallet(row: &sqlx::sqlite::SqliteRow) -> Result<Wallet> {
        let kind_raw: String = row.try_get("account_kind")?;
        let account_kind = AccountKind::parse(&kind_raw)
            .ok_or_else(|| Error::Validation(format!("unknown account kind: {}", kind_raw)))?;
        let status_raw: String = row.try_get("status")?;
        let status = WalletStatus::parse(&status_raw)
            .ok_or_else(|| Error::Validation(format!("unknown wallet status: {}", status_raw)))?;
        let created_raw: String = row.try_get("created_at")?;
        let updated_raw: String = row.try_get("updated_at")?;

        Ok(Wallet {
            id: row.try_get("wallet_id")?,
            account_id: row.try_get("account_id")?,
            account_kind,
            balance: row.try_get("balance")?,
            currency: row.try_get("currency")?,
            status,
            created_at: parse_timestamp(&created_raw)?,
            updated_at: parse_timestamp(&updated_raw)?,
        })
    }
}

#[async_trait]
impl WalletStore for WalletRepository {
    async fn insert_wallet(&self, wallet: &Wallet) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallets (
                wallet_id,
                account_id,
                account_kind,
                balance,
                currency,
                status,
                created_at,
                updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&wallet.id)
        .bind(&wallet.account_id)
        .bind(wallet.account_kind.as_str())
        .bind(wallet.balance)
        .bind(&wallet.currency)
        .bind(wallet.status.as_str())
        .bind(format_timestamp(wallet.created_at))
        .bind(format_timestamp(wallet.updated_at))
        .execute(self.connection.pool())
        .await
        .map_err(|e| {
            map_unique_violation(e, || Error::WalletAlreadyExists(wallet.account_id.clone()))
        })?;

        Ok(())
    }

    async fn get_wallet(
        &self,
        account_id: &str,
        account_kind: AccountKind,
    ) -> Result<Option<Wallet>> {
        let row_opt = sqlx::query(
            r#"
            SELECT wallet_id, account_id, account_kind, balance, currency, status,
                   created_at, updated_at
            FROM wallets
            WHERE account_id = ? AND account_kind = ?
            "#,
        )
        .bind(account_id)
        .bind(account_kind.as_str())
        .fetch_optional(self.connection.pool())
        .await?;

        match row_opt {
            Some(row) => Ok(Some(Self::row_to_wallet(&row)?)),
            None => Ok(None),
        }
    }

    async fn credit_wallet(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        amount: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance + ?, updated_at = ?
            WHERE account_id = ? AND account_kind = ?
            "#,
        )
        .bind(amount)
        .bind(format_timestamp(updated_at))
        .bind(account_id)
        .bind(account_kind.as_str())
        .execute(self.connection.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn debit_wallet_if_sufficient(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        amount: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        // The balance check and the decrement are one statement; two
        // concurrent debits can never both pass the guard on the same funds.
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance - ?, updated_at = ?
            WHERE account_id = ? AND account_kind = ?
              AND status = 'active'
              AND balance >= ?
            "#,
        )
        .bind(amount)
        .bind(format_timestamp(updated_at))
        .bind(account_id)
        .bind(account_kind.as_str())
        .bind(amount)
        .execute(self.connection.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_wallet_status(
        &self,
        account_id: &str,
        account_kind: AccountKind,
        status: WalletStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET status = ?, updated_at = ?
            WHERE account_id = ? AND account_kind = ?
            "#,
        )
        .bind(status.as_str())
        .bind(format_timestamp(updated_at))
        .bind(account_id)
        .bind(account_kind.as_str())
        .execute(self.connection.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
