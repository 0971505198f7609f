use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::{format_timestamp, parse_timestamp, SqliteConnection};
use crate::domain::models::{
    AccountKind, TransactionCategory, TransactionDirection, TransactionStatus, WalletTransaction,
};
use crate::error::{Error, Result};
use crate::storage::traits::TransactionStore;

/// SQLite-backed ledger entry repository
#[derive(Clone)]
pub struct TransactionRepository {
    connection: SqliteConnection,
}

impl TransactionRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<WalletTransaction> {
        let kind_raw: String = row.try_get("account_kind")?;
        let account_kind = AccountKind::parse(&kind_raw)
            .ok_or_else(|| Error::Validation(format!("unknown account kind: {}", kind_raw)))?;
        let direction_raw: String = row.try_get("direction")?;
        let direction = TransactionDirection::parse(&direction_raw)
            .ok_or_else(|| Error::Validation(format!("unknown direction: {}", direction_raw)))?;
        let category_raw: String = row.try_get("category")?;
        let category = TransactionCategory::parse(&category_raw)
            .ok_or_else(|| Error::Validation(format!("unknown category: {}", category_raw)))?;
        let status_raw: String = row.try_get("status")?;
        let status = TransactionStatus::parse(&status_raw)
            .ok_or_else(|| Error::Validation(format!("unknown status: {}", status_raw)))?;
        let created_raw: String = row.try_get("created_at")?;
        let updated_raw: String = row.try_get("updated_at")?;

        Ok(WalletTransaction {
            id: row.try_get("transaction_id")?,
            account_id: row.try_get("account_id")?,
            account_kind,
            wallet_id: row.try_get("wallet_id")?,
            direction,
            amount: row.try_get("amount")?,
            category,
            description: row.try_get("description")?,
            status,
            reference_id: row.try_get("reference_id")?,
            movie_id: row.try_get("movie_id")?,
            theater_id: row.try_get("theater_id")?,
            created_at: parse_timestamp(&created_raw)?,
            updated_at: parse_timestamp(&updated_raw)?,
        })
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn insert_transaction(&self, transaction: &WalletTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (
                transaction_id,
                account_id,
                account_kind,
                wallet_id,
                direction,
                amount,
                category,
                description,
                status,
                reference_id,
                movie_id,
                theater_id,
                created_at,
                updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.account_id)
        .bind(transaction.account_kind.as_str())
        .bind(&transaction.wallet_id)
        .bind(transaction.direction.as_str())
        .bind(transaction.amount)
        .bind(transaction.category.as_str())
        .bind(&transaction.description)
        .bind(transaction.status.as_str())
        .bind(&transaction.reference_id)
        .bind(&transaction.movie_id)
        .bind(&transaction.theater_id)
        .bind(format_timestamp(transaction.created_at))
        .bind(format_timestamp(transaction.updated_at))
        .execute(self.connection.pool())
        .await?;

        Ok(())
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<WalletTransaction>> {
        let row_opt = sqlx::query(
            r#"
            SELECT transaction_id, account_id, account_kind, wallet_id, direction,
                   amount, category, description, status, reference_id, movie_id,
                   theater_id, created_at, updated_at
            FROM wallet_transactions
            WHERE transaction_id = ?
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(self.connection.pool())
        .await?;

        match row_opt {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_transactions(
        &self,
        account_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<WalletTransaction>> {
        // rowid breaks created_at ties in insertion order, newest first.
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, account_id, account_kind, wallet_id, direction,
                   amount, category, description, status, reference_id, movie_id,
                   theater_id, created_at, updated_at
            FROM wallet_transactions
            WHERE account_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(account_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(self.connection.pool())
        .await?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in &rows {
            transactions.push(Self::row_to_transaction(row)?);
        }
        Ok(transactions)
    }

    async fn count_transactions(&self, account_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM wallet_transactions
            WHERE account_id = ?
            "#,
        )
        .bind(account_id)
        .fetch_one(self.connection.pool())
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn latest_transaction(&self, account_id: &str) -> Result<Option<WalletTransaction>> {
        let row_opt = sqlx::query(
            r#"
            SELECT transaction_id, account_id, account_kind, wallet_id, direction,
                   amount, category, description, status, reference_id, movie_id,
                   theater_id, created_at, updated_at
            FROM wallet_transactions
            WHERE account_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(self.connection.pool())
        .await?;

        match row_opt {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_transaction_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE wallet_transactions
            SET status = ?, updated_at = ?
            WHERE transaction_id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(format_timestamp(updated_at))
        .bind(transaction_id)
        .execute(self.connection.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
