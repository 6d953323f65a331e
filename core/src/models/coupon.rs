use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Validity window applied when a coupon is created without explicit dates.
pub const DEFAULT_COUPON_WINDOW_DAYS: i64 = 30;

/// Body of the coupon creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSpec {
    pub coupon_id: String,
    /// Issuance limit the service should enforce.
    pub quantity: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl CouponSpec {
    /// Coupon valid from `now` for [`DEFAULT_COUPON_WINDOW_DAYS`].
    pub fn starting_at(coupon_id: impl Into<String>, quantity: u32, now: DateTime<Utc>) -> Self {
        Self {
            coupon_id: coupon_id.into(),
            quantity,
            start_date: now,
            end_date: now + Duration::days(DEFAULT_COUPON_WINDOW_DAYS),
        }
    }
}
