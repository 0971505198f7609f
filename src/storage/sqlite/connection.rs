use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::error::Result;

/// SqliteConnection manages the database pool and schema.
///
/// SQLite allows a single writer, so the pool is capped at one connection;
/// linearization of balance and usage-count updates still comes from the
/// conditional UPDATE statements, not from the pool size.
#[derive(Clone)]
pub struct SqliteConnection {
    pool: Arc<SqlitePool>,
}

impl SqliteConnection {
    /// Create a new database connection, creating the database and schema
    /// when missing.
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallets (
                wallet_id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                account_kind TEXT NOT NULL,
                balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                currency TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (account_id, account_kind)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet_transactions (
                transaction_id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                account_kind TEXT NOT NULL,
                wallet_id TEXT,
                direction TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL,
                reference_id TEXT,
                movie_id TEXT,
                theater_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_wallet_transactions_account
            ON wallet_transactions (account_id, created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coupons (
                coupon_id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                discount_percentage INTEGER NOT NULL,
                min_amount INTEGER NOT NULL DEFAULT 0,
                expiry_date TEXT NOT NULL,
                max_usage_count INTEGER NOT NULL,
                current_usage_count INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_used INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coupon_venues (
                coupon_id TEXT NOT NULL,
                venue_id TEXT NOT NULL,
                PRIMARY KEY (coupon_id, venue_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
