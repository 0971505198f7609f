//! Coupon lifecycle and safe, rate-limited redemption.
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::coupons::{
    CouponListQuery, CouponListResult, CouponRedemption, CouponValidation, CreateCouponCommand,
    RedeemCouponCommand, UpdateCouponCommand,
};
use crate::domain::commands::{total_pages, validate_pagination};
use crate::domain::models::Coupon;
use crate::error::{Error, Result};
use crate::storage::traits::CouponStore;

/// Service owning coupon lifecycle and redemption.
///
/// The usage counter is only ever advanced through the store's guarded
/// increment, so the count can never pass the cap no matter how many
/// redemptions race.
#[derive(Clone)]
pub struct CouponService {
    coupon_store: Arc<dyn CouponStore>,
}

impl CouponService {
    pub fn new(coupon_store: Arc<dyn CouponStore>) -> Self {
        Self { coupon_store }
    }

    pub async fn create(&self, command: CreateCouponCommand) -> Result<Coupon> {
        let now = Utc::now();
        Self::validate_create_command(&command, now)?;

        let code = Coupon::normalize_code(&command.code);
        if self.coupon_store.get_coupon_by_code(&code).await?.is_some() {
            return Err(Error::DuplicateCode(code));
        }

        let description = command
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| {
                Coupon::default_description(command.discount_percentage, command.min_amount)
            });

        let coupon = Coupon {
            id: Coupon::generate_id(now.timestamp_millis() as u64),
            code,
            name: command.name.trim().to_string(),
            description,
            discount_percentage: command.discount_percentage,
            min_amount: command.min_amount,
            expiry_date: command.expiry_date,
            venue_ids: command.venue_ids,
            max_usage_count: command.max_usage_count,
            current_usage_count: 0,
            is_active: true,
            is_used: false,
            created_by: command.created_by,
            created_at: now,
            updated_at: now,
        };

        self.coupon_store.insert_coupon(&coupon).await?;

        info!(
            "Created coupon {} ({}) for {} venue(s), {} uses",
            coupon.code,
            coupon.id,
            coupon.venue_ids.len(),
            coupon.max_usage_count
        );

        Ok(coupon)
    }

    /// Read-only usability check for a venue. The answer does not reveal
    /// which condition failed; internal logs keep the precise reason.
    pub async fn validate_for_venue(&self, code: &str, venue_id: &str) -> Result<CouponValidation> {
        let code = Coupon::normalize_code(code);
        let now = Utc::now();

        let coupon = match self.coupon_store.get_coupon_by_code(&code).await? {
            Some(coupon) => coupon,
            None => {
                info!("Coupon {} validation failed: no such code", code);
                return Ok(CouponValidation {
                    valid: false,
                    coupon: None,
                });
            }
        };

        if let Some(reason) = Self::unusable_reason(&coupon, venue_id, now) {
            info!("Coupon {} unusable at venue {}: {}", code, venue_id, reason);
            return Ok(CouponValidation {
                valid: false,
                coupon: None,
            });
        }

        Ok(CouponValidation {
            valid: true,
            coupon: Some(coupon),
        })
    }

    /// Consume one use of a coupon for a booking and compute the discount.
    pub async fn redeem_for_booking(&self, command: RedeemCouponCommand) -> Result<CouponRedemption> {
        if command.total_amount <= 0 {
            return Err(Error::InvalidAmount(command.total_amount));
        }

        let code = Coupon::normalize_code(&command.code);
        let now = Utc::now();

        let coupon = self
            .coupon_store
            .get_coupon_by_code(&code)
            .await?
            .ok_or_else(|| Error::CouponNotFound(code.clone()))?;

        if command.total_amount < coupon.min_amount {
            warn!(
                "Coupon {} redemption rejected: total {} below minimum {}",
                code, command.total_amount, coupon.min_amount
            );
            return Err(Error::InvalidAmount(command.total_amount));
        }

        let redeemed = self
            .coupon_store
            .redeem_coupon_if_available(&code, &command.venue_id, now)
            .await?;

        if !redeemed {
            return Err(self.classify_unusable(&code, &command.venue_id, now).await);
        }

        let coupon = self
            .coupon_store
            .get_coupon_by_code(&code)
            .await?
            .ok_or_else(|| Error::CouponNotFound(code.clone()))?;
        let discount_amount = coupon.discount_for(command.total_amount);

        info!(
            "Coupon {} redeemed by account {} at venue {}: discount {} on {} (use {}/{})",
            code,
            command.account_id,
            command.venue_id,
            discount_amount,
            command.total_amount,
            coupon.current_usage_count,
            coupon.max_usage_count
        );

        Ok(CouponRedemption {
            coupon,
            discount_amount,
        })
    }

    pub async fn update(&self, command: UpdateCouponCommand) -> Result<Coupon> {
        let mut coupon = self
            .coupon_store
            .get_coupon(&command.coupon_id)
            .await?
            .ok_or_else(|| Error::CouponNotFound(command.coupon_id.clone()))?;

        if let Some(code) = command.code {
            let code = Coupon::normalize_code(&code);
            if code.is_empty() {
                return Err(Error::Validation("code must not be empty".to_string()));
            }
            if code != coupon.code {
                if self.coupon_store.get_coupon_by_code(&code).await?.is_some() {
                    return Err(Error::DuplicateCode(code));
                }
                coupon.code = code;
            }
        }
        if let Some(name) = command.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("name must not be empty".to_string()));
            }
            coupon.name = name.trim().to_string();
        }
        if let Some(description) = command.description {
            coupon.description = description;
        }
        if let Some(discount) = command.discount_percentage {
            if !(1..=100).contains(&discount) {
                return Err(Error::Validation(
                    "discountPercentage must be between 1 and 100".to_string(),
                ));
            }
            coupon.discount_percentage = discount;
        }
        if let Some(min_amount) = command.min_amount {
            if min_amount < 0 {
                return Err(Error::Validation(
                    "minAmount must not be negative".to_string(),
                ));
            }
            coupon.min_amount = min_amount;
        }
        if let Some(expiry_date) = command.expiry_date {
            coupon.expiry_date = expiry_date;
        }
        if let Some(venue_ids) = command.venue_ids {
            if venue_ids.is_empty() {
                return Err(Error::Validation(
                    "at least one venue must be in scope".to_string(),
                ));
            }
            coupon.venue_ids = venue_ids;
        }
        if let Some(max_usage_count) = command.max_usage_count {
            if max_usage_count < 1 {
                return Err(Error::Validation(
                    "maxUsageCount must be at least 1".to_string(),
                ));
            }
            coupon.max_usage_count = max_usage_count;
        }
        if let Some(is_active) = command.is_active {
            coupon.is_active = is_active;
        }

        coupon.is_used = coupon.current_usage_count >= coupon.max_usage_count;
        coupon.updated_at = Utc::now();

        self.coupon_store.update_coupon(&coupon).await?;

        info!("Updated coupon {} ({})", coupon.code, coupon.id);

        Ok(coupon)
    }

    /// Delete a coupon. Only its creator may do so.
    pub async fn delete(&self, coupon_id: &str, requesting_owner_id: &str) -> Result<()> {
        let coupon = self
            .coupon_store
            .get_coupon(coupon_id)
            .await?
            .ok_or_else(|| Error::CouponNotFound(coupon_id.to_string()))?;

        if coupon.created_by != requesting_owner_id {
            warn!(
                "Account {} attempted to delete coupon {} owned by {}",
                requesting_owner_id, coupon_id, coupon.created_by
            );
            return Err(Error::Forbidden(
                "only the coupon's creator can delete it".to_string(),
            ));
        }

        self.coupon_store.delete_coupon(coupon_id).await?;

        info!("Deleted coupon {} ({})", coupon.code, coupon_id);

        Ok(())
    }

    pub async fn list_by_owner(
        &self,
        owner_id: &str,
        query: CouponListQuery,
    ) -> Result<CouponListResult> {
        validate_pagination(query.page, query.page_size)?;

        let total = self.coupon_store.count_coupons_by_owner(owner_id).await?;
        let offset = (query.page as i64 - 1) * query.page_size as i64;
        let coupons = self
            .coupon_store
            .list_coupons_by_owner(owner_id, query.page_size, offset)
            .await?;

        Ok(CouponListResult {
            coupons,
            total,
            total_pages: total_pages(total, query.page_size),
            page: query.page,
            page_size: query.page_size,
        })
    }

    pub async fn list_by_venue(
        &self,
        venue_id: &str,
        query: CouponListQuery,
    ) -> Result<CouponListResult> {
        validate_pagination(query.page, query.page_size)?;

        let total = self.coupon_store.count_coupons_by_venue(venue_id).await?;
        let offset = (query.page as i64 - 1) * query.page_size as i64;
        let coupons = self
            .coupon_store
            .list_coupons_by_venue(venue_id, query.page_size, offset)
            .await?;

        Ok(CouponListResult {
            coupons,
            total,
            total_pages: total_pages(total, query.page_size),
            page: query.page,
            page_size: query.page_size,
        })
    }

    pub async fn list_all(&self, query: CouponListQuery) -> Result<CouponListResult> {
        validate_pagination(query.page, query.page_size)?;

        let total = self.coupon_store.count_coupons().await?;
        let offset = (query.page as i64 - 1) * query.page_size as i64;
        let coupons = self
            .coupon_store
            .list_coupons(query.page_size, offset)
            .await?;

        Ok(CouponListResult {
            coupons,
            total,
            total_pages: total_pages(total, query.page_size),
            page: query.page,
            page_size: query.page_size,
        })
    }

    /// Name the condition that made the guarded increment refuse. The order
    /// mirrors the internal check chain: exists, active, unexpired, uses
    /// remaining, venue in scope.
    async fn classify_unusable(&self, code: &str, venue_id: &str, now: DateTime<Utc>) -> Error {
        let coupon = match self.coupon_store.get_coupon_by_code(code).await {
            Ok(Some(coupon)) => coupon,
            Ok(None) => return Error::CouponNotFound(code.to_string()),
            Err(e) => return e,
        };

        let reason = Self::unusable_reason(&coupon, venue_id, now);
        warn!(
            "Coupon {} redemption refused at venue {}: {}",
            code,
            venue_id,
            reason.unwrap_or("lost a concurrent redemption race")
        );

        if !coupon.is_active {
            Error::CouponInactive(code.to_string())
        } else if coupon.is_expired(now) {
            Error::CouponExpired(code.to_string())
        } else if !coupon.has_uses_remaining() {
            Error::CouponExhausted(code.to_string())
        } else if !coupon.applies_to_venue(venue_id) {
            Error::CouponScopeMismatch {
                code: code.to_string(),
                venue_id: venue_id.to_string(),
            }
        } else {
            // Every condition now reads as satisfied, so the refusal was a
            // concurrent redemption taking the last use.
            Error::CouponExhausted(code.to_string())
        }
    }

    fn unusable_reason(
        coupon: &Coupon,
        venue_id: &str,
        now: DateTime<Utc>,
    ) -> Option<&'static str> {
        if !coupon.is_active {
            Some("inactive")
        } else if coupon.is_expired(now) {
            Some("expired")
        } else if !coupon.has_uses_remaining() {
            Some("usage limit reached")
        } else if !coupon.applies_to_venue(venue_id) {
            Some("venue not in scope")
        } else {
            None
        }
    }

    fn validate_create_command(command: &CreateCouponCommand, now: DateTime<Utc>) -> Result<()> {
        if command.name.trim().is_empty() {
            return Err(Error::Validation("name must not be empty".to_string()));
        }
        if Coupon::normalize_code(&command.code).is_empty() {
            return Err(Error::Validation("code must not be empty".to_string()));
        }
        if command.venue_ids.is_empty() {
            return Err(Error::Validation(
                "at least one venue must be in scope".to_string(),
            ));
        }
        if !(1..=100).contains(&command.discount_percentage) {
            return Err(Error::Validation(
                "discountPercentage must be between 1 and 100".to_string(),
            ));
        }
        if command.min_amount < 0 {
            return Err(Error::Validation(
                "minAmount must not be negative".to_string(),
            ));
        }
        if command.expiry_date <= now {
            return Err(Error::Validation(
                "expiryDate must be in the future".to_string(),
            ));
        }
        if command.max_usage_count < 1 {
            return Err(Error::Validation(
                "maxUsageCount must be at least 1".to_string(),
            ));
        }
        if command.created_by.trim().is_empty() {
            return Err(Error::Validation(
                "createdBy must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::COUPON_UNUSABLE_MESSAGE;
    use crate::storage::sqlite::{CouponRepository, SqliteConnection};
    use chrono::Duration;

    async fn create_test_service() -> CouponService {
        let connection = SqliteConnection::init_test().await.unwrap();
        CouponService::new(Arc::new(CouponRepository::new(connection)))
    }

    fn launch_coupon() -> CreateCouponCommand {
        CreateCouponCommand {
            name: "Launch offer".to_string(),
            code: "launch20".to_string(),
            description: None,
            discount_percentage: 20,
            min_amount: 0,
            expiry_date: Utc::now() + Duration::days(7),
            venue_ids: vec!["venue-1".to_string(), "venue-2".to_string()],
            max_usage_count: 3,
            created_by: "owner-1".to_string(),
        }
    }

    fn redeem(code: &str, venue_id: &str, total_amount: i64) -> RedeemCouponCommand {
        RedeemCouponCommand {
            code: code.to_string(),
            venue_id: venue_id.to_string(),
            total_amount,
            account_id: "cust-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_code_and_generates_description() {
        let service = create_test_service().await;

        let coupon = service.create(launch_coupon()).await.unwrap();
        assert_eq!(coupon.code, "LAUNCH20");
        assert_eq!(coupon.current_usage_count, 0);
        assert!(coupon.is_active);
        assert!(!coupon.is_used);
        assert!(coupon.description.contains("20%"));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code_case_insensitively() {
        let service = create_test_service().await;

        service.create(launch_coupon()).await.unwrap();

        let mut duplicate = launch_coupon();
        duplicate.code = "Launch20".to_string();
        let err = service.create(duplicate).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateCode(ref c) if c == "LAUNCH20"));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = create_test_service().await;

        let mut cmd = launch_coupon();
        cmd.venue_ids.clear();
        let err = service.create(cmd).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("venue")));

        let mut cmd = launch_coupon();
        cmd.discount_percentage = 0;
        let err = service.create(cmd).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("discountPercentage")));

        let mut cmd = launch_coupon();
        cmd.discount_percentage = 101;
        assert!(service.create(cmd).await.is_err());

        let mut cmd = launch_coupon();
        cmd.expiry_date = Utc::now() - Duration::hours(1);
        let err = service.create(cmd).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("expiryDate")));
    }

    #[tokio::test]
    async fn test_validate_for_venue() {
        let service = create_test_service().await;
        service.create(launch_coupon()).await.unwrap();

        let validation = service
            .validate_for_venue("launch20", "venue-1")
            .await
            .unwrap();
        assert!(validation.valid);
        assert_eq!(validation.coupon.unwrap().code, "LAUNCH20");

        // Out-of-scope venue and unknown code both give the same shape.
        let validation = service
            .validate_for_venue("LAUNCH20", "venue-9")
            .await
            .unwrap();
        assert!(!validation.valid);
        assert!(validation.coupon.is_none());

        let validation = service
            .validate_for_venue("NOSUCH", "venue-1")
            .await
            .unwrap();
        assert!(!validation.valid);
        assert!(validation.coupon.is_none());
    }

    #[tokio::test]
    async fn test_expired_coupon_never_validates() {
        let service = create_test_service().await;

        // Created valid, then forced past its expiry through the store.
        let mut coupon = service.create(launch_coupon()).await.unwrap();
        coupon.expiry_date = Utc::now() - Duration::days(1);
        service.coupon_store.update_coupon(&coupon).await.unwrap();

        let validation = service
            .validate_for_venue("LAUNCH20", "venue-1")
            .await
            .unwrap();
        assert!(!validation.valid);

        let err = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-1", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CouponExpired(_)));
        assert_eq!(err.user_message(), COUPON_UNUSABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_redeem_computes_discount_and_counts_use() {
        let service = create_test_service().await;
        service.create(launch_coupon()).await.unwrap();

        let redemption = service
            .redeem_for_booking(redeem("launch20", "venue-1", 1000))
            .await
            .unwrap();
        assert_eq!(redemption.discount_amount, 200);
        assert_eq!(redemption.coupon.current_usage_count, 1);
        assert!(!redemption.coupon.is_used);
    }

    #[tokio::test]
    async fn test_redeem_flips_is_used_at_cap() {
        let service = create_test_service().await;
        let mut cmd = launch_coupon();
        cmd.max_usage_count = 1;
        service.create(cmd).await.unwrap();

        let redemption = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-1", 500))
            .await
            .unwrap();
        assert_eq!(redemption.coupon.current_usage_count, 1);
        assert!(redemption.coupon.is_used);

        let err = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-1", 500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CouponExhausted(_)));
    }

    #[tokio::test]
    async fn test_redeem_rejections() {
        let service = create_test_service().await;
        let mut cmd = launch_coupon();
        cmd.min_amount = 500;
        service.create(cmd).await.unwrap();

        let err = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-1", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(0)));

        let err = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-1", 499))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(499)));

        let err = service
            .redeem_for_booking(redeem("NOSUCH", "venue-1", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CouponNotFound(_)));

        let err = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-9", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CouponScopeMismatch { .. }));

        service
            .update(UpdateCouponCommand {
                coupon_id: service
                    .coupon_store
                    .get_coupon_by_code("LAUNCH20")
                    .await
                    .unwrap()
                    .unwrap()
                    .id,
                is_active: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        let err = service
            .redeem_for_booking(redeem("LAUNCH20", "venue-1", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CouponInactive(_)));
        assert_eq!(err.user_message(), COUPON_UNUSABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_respect_usage_cap() {
        let service = create_test_service().await;
        service.create(launch_coupon()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let mut cmd = redeem("LAUNCH20", "venue-1", 1000);
                cmd.account_id = format!("cust-{}", i);
                service.redeem_for_booking(cmd).await
            }));
        }

        let mut successes = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(redemption) => {
                    successes += 1;
                    assert_eq!(redemption.discount_amount, 200);
                }
                Err(Error::CouponExhausted(_)) => exhausted += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(successes, 3);
        assert_eq!(exhausted, 7);

        let coupon = service
            .coupon_store
            .get_coupon_by_code("LAUNCH20")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(coupon.current_usage_count, 3);
        assert!(coupon.is_used);
    }

    #[tokio::test]
    async fn test_update_changes_code_with_uniqueness_check() {
        let service = create_test_service().await;
        let coupon = service.create(launch_coupon()).await.unwrap();

        let mut other = launch_coupon();
        other.code = "FESTIVE50".to_string();
        other.discount_percentage = 50;
        service.create(other).await.unwrap();

        let err = service
            .update(UpdateCouponCommand {
                coupon_id: coupon.id.clone(),
                code: Some("festive50".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateCode(_)));

        let updated = service
            .update(UpdateCouponCommand {
                coupon_id: coupon.id.clone(),
                code: Some("relaunch25".to_string()),
                discount_percentage: Some(25),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.code, "RELAUNCH25");
        assert_eq!(updated.discount_percentage, 25);

        assert!(service
            .coupon_store
            .get_coupon_by_code("LAUNCH20")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_creator() {
        let service = create_test_service().await;
        let coupon = service.create(launch_coupon()).await.unwrap();

        let err = service.delete(&coupon.id, "owner-2").await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        service.delete(&coupon.id, "owner-1").await.unwrap();

        let err = service.delete(&coupon.id, "owner-1").await.unwrap_err();
        assert!(matches!(err, Error::CouponNotFound(_)));
    }

    #[tokio::test]
    async fn test_listings_are_scoped_and_paginated() {
        let service = create_test_service().await;

        for i in 0..3 {
            let mut cmd = launch_coupon();
            cmd.code = format!("OWNER1-{}", i);
            service.create(cmd).await.unwrap();
        }
        let mut cmd = launch_coupon();
        cmd.code = "OWNER2-0".to_string();
        cmd.created_by = "owner-2".to_string();
        cmd.venue_ids = vec!["venue-3".to_string()];
        service.create(cmd).await.unwrap();

        let by_owner = service
            .list_by_owner(
                "owner-1",
                CouponListQuery {
                    page: 1,
                    page_size: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(by_owner.total, 3);
        assert_eq!(by_owner.total_pages, 2);
        assert_eq!(by_owner.coupons.len(), 2);

        let by_venue = service
            .list_by_venue(
                "venue-3",
                CouponListQuery {
                    page: 1,
                    page_size: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(by_venue.total, 1);
        assert_eq!(by_venue.coupons[0].code, "OWNER2-0");

        let all = service
            .list_all(CouponListQuery {
                page: 1,
                page_size: 10,
            })
            .await
            .unwrap();
        assert_eq!(all.total, 4);
    }
}
