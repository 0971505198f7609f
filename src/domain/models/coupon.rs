//! Domain model for a promotional coupon.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Percentage discount code scoped to one or more venues, with a usage cap
/// and an expiry. Owned by the venue owner that created it; redeemed by any
/// customer account during a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    /// Human-facing unique code, always stored uppercased.
    pub code: String,
    pub name: String,
    pub description: String,
    /// Whole-number percentage in 1..=100.
    pub discount_percentage: i64,
    /// Minimum qualifying booking total in minor units.
    pub min_amount: i64,
    pub expiry_date: DateTime<Utc>,
    /// Venues the coupon is valid at.
    pub venue_ids: Vec<String>,
    pub max_usage_count: i64,
    pub current_usage_count: i64,
    pub is_active: bool,
    /// Set once `current_usage_count` reaches `max_usage_count`.
    pub is_used: bool,
    /// Account id of the venue owner that created the coupon.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// Generate a coupon ID. Format: cpn-<timestamp_ms>-<random_suffix>
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("cpn-{}-{}", timestamp_ms, super::random_suffix(4))
    }

    /// Codes are matched case-insensitively by normalizing to uppercase.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_date
    }

    pub fn has_uses_remaining(&self) -> bool {
        self.current_usage_count < self.max_usage_count
    }

    pub fn applies_to_venue(&self, venue_id: &str) -> bool {
        self.venue_ids.iter().any(|v| v == venue_id)
    }

    /// Discount in minor units for a booking total, rounded half-up.
    pub fn discount_for(&self, total_amount: i64) -> i64 {
        (total_amount * self.discount_percentage + 50) / 100
    }

    /// Description used when the creator did not supply one.
    pub fn default_description(discount_percentage: i64, min_amount: i64) -> String {
        if min_amount > 0 {
            format!(
                "Get {}% off on bookings of {} or more",
                discount_percentage, min_amount
            )
        } else {
            format!("Get {}% off on your booking", discount_percentage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_coupon() -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Coupon::generate_id(now.timestamp_millis() as u64),
            code: "LAUNCH20".to_string(),
            name: "Launch offer".to_string(),
            description: "20% off".to_string(),
            discount_percentage: 20,
            min_amount: 0,
            expiry_date: now + Duration::days(7),
            venue_ids: vec!["venue-1".to_string()],
            max_usage_count: 3,
            current_usage_count: 0,
            is_active: true,
            is_used: false,
            created_by: "owner-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(Coupon::normalize_code("  launch20 "), "LAUNCH20");
        assert_eq!(Coupon::normalize_code("Fifty50"), "FIFTY50");
    }

    #[test]
    fn test_discount_rounding() {
        let coupon = sample_coupon();
        assert_eq!(coupon.discount_for(1000), 200);

        let mut fifteen = sample_coupon();
        fifteen.discount_percentage = 15;
        // 999 * 15% = 149.85, rounds up to 150
        assert_eq!(fifteen.discount_for(999), 150);
        // 990 * 15% = 148.5, half-up to 149
        assert_eq!(fifteen.discount_for(990), 149);
    }

    #[test]
    fn test_usage_and_expiry_checks() {
        let mut coupon = sample_coupon();
        assert!(coupon.has_uses_remaining());
        coupon.current_usage_count = 3;
        assert!(!coupon.has_uses_remaining());

        let now = Utc::now();
        assert!(!coupon.is_expired(now));
        coupon.expiry_date = now - Duration::hours(1);
        assert!(coupon.is_expired(now));

        assert!(coupon.applies_to_venue("venue-1"));
        assert!(!coupon.applies_to_venue("venue-2"));
    }
}
