// src/models/coupon.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::round2;
use crate::error::AppError;

static COUPON_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_-]{3,32}$").expect("valid coupon regex"));

/// Represents the 'coupon_codes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CouponCode {
    pub id: i64,
    /// Upper-cased on write.
    pub code: String,
    pub description: String,
    pub discount_percentage: f64,
    pub expiry_date: DateTime<Utc>,
    /// Restricts the coupon to one course; `None` applies to every course.
    pub course_id: Option<i64>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Display status of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CouponStatus {
    Active,
    Inactive,
    Expired,
}

impl CouponCode {
    /// Expiry wins over the `is_active` flag.
    pub fn status_at(&self, now: DateTime<Utc>) -> CouponStatus {
        if self.expiry_date < now {
            CouponStatus::Expired
        } else if self.is_active {
            CouponStatus::Active
        } else {
            CouponStatus::Inactive
        }
    }

    /// Checks that the coupon can be redeemed against a course right now.
    pub fn ensure_applicable(&self, course_id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.is_deleted {
            return Err(AppError::NotFound("Coupon not found".to_string()));
        }
        match self.status_at(now) {
            CouponStatus::Expired => {
                return Err(AppError::BadRequest("Coupon has expired".to_string()));
            }
            CouponStatus::Inactive => {
                return Err(AppError::BadRequest("Coupon is not active".to_string()));
            }
            CouponStatus::Active => {}
        }
        if self.course_id.is_some_and(|id| id != course_id) {
            return Err(AppError::BadRequest(
                "Coupon is not valid for this course".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_status(self, now: DateTime<Utc>) -> CouponView {
        let status = self.status_at(now);
        CouponView {
            coupon: self,
            status,
        }
    }
}

/// Coupon as returned by the API, with its computed status.
#[derive(Debug, Serialize)]
pub struct CouponView {
    #[serde(flatten)]
    pub coupon: CouponCode,
    pub status: CouponStatus,
}

/// Whole-record payload used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CouponPayload {
    #[validate(length(min = 3, max = 32, message = "Coupon code must be 3 to 32 characters."))]
    pub code: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    #[validate(range(
        exclusive_min = 0.0,
        max = 100.0,
        message = "Discount must be greater than 0 and at most 100."
    ))]
    pub discount_percentage: f64,
    pub expiry_date: DateTime<Utc>,
    pub course_id: Option<i64>,
    pub is_active: bool,
}

impl CouponPayload {
    /// Upper-cases and trims the code, then checks its alphabet.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.code = normalize_code(&self.code);
        if !COUPON_CODE.is_match(&self.code) {
            return Err(AppError::BadRequest(
                "Coupon code may only contain letters, digits, '-' and '_'".to_string(),
            ));
        }
        Ok(self)
    }
}

impl From<&CouponCode> for CouponPayload {
    fn from(coupon: &CouponCode) -> Self {
        Self {
            code: coupon.code.clone(),
            description: coupon.description.clone(),
            discount_percentage: coupon.discount_percentage,
            expiry_date: coupon.expiry_date,
            course_id: coupon.course_id,
            is_active: coupon.is_active,
        }
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// DTO for checking a coupon against a schedule before enrolling.
#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
    pub schedule_id: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CouponQuote {
    pub code: String,
    pub standard_price: f64,
    pub offer_price: f64,
    pub discount_percentage: f64,
    pub final_price: f64,
}

/// Applies a percentage discount to a price, rounded to cents.
pub fn discounted_price(price: f64, discount_percentage: f64) -> f64 {
    round2((price * (100.0 - discount_percentage) / 100.0).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(is_active: bool, expiry_offset: Duration) -> CouponCode {
        CouponCode {
            id: 1,
            code: "SPRING25".into(),
            description: String::new(),
            discount_percentage: 25.0,
            expiry_date: Utc::now() + expiry_offset,
            course_id: None,
            is_active,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn past_expiry_is_expired_regardless_of_active_flag() {
        let now = Utc::now();
        for active in [true, false] {
            assert_eq!(
                coupon(active, Duration::days(-1)).status_at(now),
                CouponStatus::Expired
            );
        }
    }

    #[test]
    fn future_expiry_follows_active_flag() {
        let now = Utc::now();
        assert_eq!(coupon(true, Duration::days(5)).status_at(now), CouponStatus::Active);
        assert_eq!(coupon(false, Duration::days(5)).status_at(now), CouponStatus::Inactive);
    }

    #[test]
    fn status_serializes_as_display_label() {
        let view = coupon(true, Duration::days(-3)).with_status(Utc::now());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "Expired");
        assert_eq!(json["code"], "SPRING25");
    }

    #[test]
    fn course_restricted_coupon_rejects_other_courses() {
        let mut c = coupon(true, Duration::days(5));
        c.course_id = Some(9);
        assert!(c.ensure_applicable(9, Utc::now()).is_ok());
        assert!(c.ensure_applicable(10, Utc::now()).is_err());
    }

    #[test]
    fn codes_are_normalized_before_validation() {
        let payload = CouponPayload {
            code: "  spring-25 ".into(),
            description: String::new(),
            discount_percentage: 10.0,
            expiry_date: Utc::now(),
            course_id: None,
            is_active: true,
        };
        assert_eq!(payload.normalized().unwrap().code, "SPRING-25");
    }

    #[test]
    fn codes_with_spaces_are_rejected() {
        let payload = CouponPayload {
            code: "two words".into(),
            description: String::new(),
            discount_percentage: 10.0,
            expiry_date: Utc::now(),
            course_id: None,
            is_active: true,
        };
        assert!(payload.normalized().is_err());
    }

    #[test]
    fn discount_rounds_to_cents() {
        assert_eq!(discounted_price(199.99, 25.0), 149.99);
        assert_eq!(discounted_price(50.0, 100.0), 0.0);
    }
}
