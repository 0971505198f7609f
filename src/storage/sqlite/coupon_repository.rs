use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::{format_timestamp, map_unique_violation, parse_timestamp, SqliteConnection};
use crate::domain::models::Coupon;
use crate::error::{Error, Result};
use crate::storage::traits::CouponStore;

/// SQLite-backed coupon repository. The venue scope lives in a separate
/// `coupon_venues` table so the guarded redemption update can check scope
/// inside the same statement as the usage counter.
#[derive(Clone)]
pub struct CouponRepository {
    connection: SqliteConnection,
}

const COUPON_COLUMNS: &str = r#"coupon_id, code, name, description, discount_percentage,
       min_amount, expiry_date, max_usage_count, current_usage_count,
       is_active, is_used, created_by, created_at, updated_at"#;

impl CouponRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    fn row_to_coupon(row: &sqlx::sqlite::SqliteRow) -> Result<Coupon> {
        let expiry_raw: String = row.try_get("expiry_date")?;
        let created_raw: String = row.try_get("created_at")?;
        let updated_raw: String = row.try_get("updated_at")?;

        Ok(Coupon {
            id: row.try_get("coupon_id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            discount_percentage: row.try_get("discount_percentage")?,
            min_amount: row.try_get("min_amount")?,
            expiry_date: parse_timestamp(&expiry_raw)?,
            venue_ids: Vec::new(),
            max_usage_count: row.try_get("max_usage_count")?,
            current_usage_count: row.try_get("current_usage_count")?,
            is_active: row.try_get("is_active")?,
            is_used: row.try_get("is_used")?,
            created_by: row.try_get("created_by")?,
            created_at: parse_timestamp(&created_raw)?,
            updated_at: parse_timestamp(&updated_raw)?,
        })
    }

    async fn load_venue_scope(&self, coupon_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT venue_id FROM coupon_venues
            WHERE coupon_id = ?
            ORDER BY venue_id ASC
            "#,
        )
        .bind(coupon_id)
        .fetch_all(self.connection.pool())
        .await?;

        let mut venue_ids = Vec::with_capacity(rows.len());
        for row in &rows {
            venue_ids.push(row.try_get("venue_id")?);
        }
        Ok(venue_ids)
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Coupon> {
        let mut coupon = Self::row_to_coupon(row)?;
        coupon.venue_ids = self.load_venue_scope(&coupon.id).await?;
        Ok(coupon)
    }

    async fn hydrate_all(&self, rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Coupon>> {
        let mut coupons = Vec::with_capacity(rows.len());
        for row in rows {
            coupons.push(self.hydrate(row).await?);
        }
        Ok(coupons)
    }
}

#[async_trait]
impl CouponStore for CouponRepository {
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO coupons (
                coupon_id,
                code,
                name,
                description,
                discount_percentage,
                min_amount,
                expiry_date,
                max_usage_count,
                current_usage_count,
                is_active,
                is_used,
                created_by,
                created_at,
                updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.name)
        .bind(&coupon.description)
        .bind(coupon.discount_percentage)
        .bind(coupon.min_amount)
        .bind(format_timestamp(coupon.expiry_date))
        .bind(coupon.max_usage_count)
        .bind(coupon.current_usage_count)
        .bind(coupon.is_active)
        .bind(coupon.is_used)
        .bind(&coupon.created_by)
        .bind(format_timestamp(coupon.created_at))
        .bind(format_timestamp(coupon.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || Error::DuplicateCode(coupon.code.clone())))?;

        for venue_id in &coupon.venue_ids {
            sqlx::query("INSERT INTO coupon_venues (coupon_id, venue_id) VALUES (?, ?)")
                .bind(&coupon.id)
                .bind(venue_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_coupon(&self, coupon_id: &str) -> Result<Option<Coupon>> {
        let row_opt = sqlx::query(&format!(
            "SELECT {} FROM coupons WHERE coupon_id = ?",
            COUPON_COLUMNS
        ))
        .bind(coupon_id)
        .fetch_optional(self.connection.pool())
        .await?;

        match row_opt {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let row_opt = sqlx::query(&format!(
            "SELECT {} FROM coupons WHERE code = ?",
            COUPON_COLUMNS
        ))
        .bind(code)
        .fetch_optional(self.connection.pool())
        .await?;

        match row_opt {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        sqlx::query(
            r#"
            UPDATE coupons
            SET code = ?,
                name = ?,
                description = ?,
                discount_percentage = ?,
                min_amount = ?,
                expiry_date = ?,
                max_usage_count = ?,
                current_usage_count = ?,
                is_active = ?,
                is_used = ?,
                updated_at = ?
            WHERE coupon_id = ?
            "#,
        )
        .bind(&coupon.code)
        .bind(&coupon.name)
        .bind(&coupon.description)
        .bind(coupon.discount_percentage)
        .bind(coupon.min_amount)
        .bind(format_timestamp(coupon.expiry_date))
        .bind(coupon.max_usage_count)
        .bind(coupon.current_usage_count)
        .bind(coupon.is_active)
        .bind(coupon.is_used)
        .bind(format_timestamp(coupon.updated_at))
        .bind(&coupon.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || Error::DuplicateCode(coupon.code.clone())))?;

        sqlx::query("DELETE FROM coupon_venues WHERE coupon_id = ?")
            .bind(&coupon.id)
            .execute(&mut *tx)
            .await?;

        for venue_id in &coupon.venue_ids {
            sqlx::query("INSERT INTO coupon_venues (coupon_id, venue_id) VALUES (?, ?)")
                .bind(&coupon.id)
                .bind(venue_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_coupon(&self, coupon_id: &str) -> Result<bool> {
        let mut tx = self.connection.pool().begin().await?;

        let result = sqlx::query("DELETE FROM coupons WHERE coupon_id = ?")
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM coupon_venues WHERE coupon_id = ?")
            .bind(coupon_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn redeem_coupon_if_available(
        &self,
        code: &str,
        venue_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        // Every usability condition sits in one guarded increment; concurrent
        // redemptions can never push the counter past the cap.
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET current_usage_count = current_usage_count + 1,
                is_used = CASE
                    WHEN current_usage_count + 1 >= max_usage_count THEN 1
                    ELSE 0
                END,
                updated_at = ?
            WHERE code = ?
              AND is_active = 1
              AND expiry_date > ?
              AND current_usage_count < max_usage_count
              AND EXISTS (
                  SELECT 1 FROM coupon_venues v
                  WHERE v.coupon_id = coupons.coupon_id AND v.venue_id = ?
              )
            "#,
        )
        .bind(format_timestamp(now))
        .bind(code)
        .bind(format_timestamp(now))
        .bind(venue_id)
        .execute(self.connection.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_coupons_by_owner(
        &self,
        owner_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<Coupon>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM coupons
            WHERE created_by = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
            COUPON_COLUMNS
        ))
        .bind(owner_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(self.connection.pool())
        .await?;

        self.hydrate_all(&rows).await
    }

    async fn count_coupons_by_owner(&self, owner_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM coupons WHERE created_by = ?")
            .bind(owner_id)
            .fetch_one(self.connection.pool())
            .await?;

        Ok(row.try_get("count")?)
    }

    async fn list_coupons_by_venue(
        &self,
        venue_id: &str,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<Coupon>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM coupons
            WHERE EXISTS (
                SELECT 1 FROM coupon_venues v
                WHERE v.coupon_id = coupons.coupon_id AND v.venue_id = ?
            )
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
            COUPON_COLUMNS
        ))
        .bind(venue_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(self.connection.pool())
        .await?;

        self.hydrate_all(&rows).await
    }

    async fn count_coupons_by_venue(&self, venue_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM coupons
            WHERE EXISTS (
                SELECT 1 FROM coupon_venues v
                WHERE v.coupon_id = coupons.coupon_id AND v.venue_id = ?
            )
            "#,
        )
        .bind(venue_id)
        .fetch_one(self.connection.pool())
        .await?;

        Ok(row.try_get("count")?)
    }

    async fn list_coupons(&self, limit: u32, offset: i64) -> Result<Vec<Coupon>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM coupons
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
            COUPON_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(self.connection.pool())
        .await?;

        self.hydrate_all(&rows).await
    }

    async fn count_coupons(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM coupons")
            .fetch_one(self.connection.pool())
            .await?;

        Ok(row.try_get("count")?)
    }
}
