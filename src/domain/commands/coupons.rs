use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::Coupon;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCouponCommand {
    pub name: String,
    /// Human-facing code; matched case-insensitively.
    pub code: String,
    /// Auto-generated from the discount terms when not supplied.
    pub description: Option<String>,
    /// Whole-number percentage in 1..=100.
    pub discount_percentage: i64,
    /// Minimum qualifying booking total in minor units.
    pub min_amount: i64,
    pub expiry_date: DateTime<Utc>,
    pub venue_ids: Vec<String>,
    pub max_usage_count: i64,
    /// Account id of the creating venue owner.
    pub created_by: String,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCouponCommand {
    pub coupon_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub discount_percentage: Option<i64>,
    pub min_amount: Option<i64>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub venue_ids: Option<Vec<String>>,
    pub max_usage_count: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemCouponCommand {
    pub code: String,
    pub venue_id: String,
    /// Booking total in minor units, must be positive.
    pub total_amount: i64,
    pub account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponRedemption {
    pub coupon: Coupon,
    /// Discount in minor units, rounded half-up.
    pub discount_amount: i64,
}

/// Read-only validation outcome. The reason a coupon is unusable is not
/// exposed here; `coupon` is present only when `valid` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponValidation {
    pub valid: bool,
    pub coupon: Option<Coupon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponListQuery {
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponListResult {
    pub coupons: Vec<Coupon>,
    pub total: i64,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
}
