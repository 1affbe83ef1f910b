// src/models/schedule.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use crate::error::AppError;

/// Represents the 'schedules' table: one batch/session of a course.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub standard_price: f64,
    pub offer_price: f64,
    /// Meeting link shown to enrolled learners.
    pub session_link: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn is_public(&self) -> bool {
        self.is_active && !self.is_deleted
    }
}

/// Admin list row: the schedule plus its course title.
#[derive(Debug, Serialize, FromRow)]
pub struct ScheduleRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub schedule: Schedule,
    pub course_title: String,
}

/// Whole-record payload used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SchedulePayload {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200, message = "Schedule title is required."))]
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub standard_price: f64,
    pub offer_price: f64,
    #[validate(length(max = 500))]
    pub session_link: Option<String>,
    pub is_active: bool,
}

impl SchedulePayload {
    /// Cross-field checks that run after `validate()`.
    ///
    /// The offer price may never exceed the standard price.
    pub fn check_consistency(&self) -> Result<(), AppError> {
        if !self.standard_price.is_finite() || !self.offer_price.is_finite() {
            return Err(AppError::BadRequest("Prices must be numbers".to_string()));
        }
        if self.standard_price < 0.0 || self.offer_price < 0.0 {
            return Err(AppError::BadRequest("Prices cannot be negative".to_string()));
        }
        if self.offer_price > self.standard_price {
            return Err(AppError::BadRequest(
                "Offer price cannot be greater than standard price".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(AppError::BadRequest(
                "End date cannot be before start date".to_string(),
            ));
        }
        if let Some(link) = self.session_link.as_deref().filter(|l| !l.is_empty()) {
            if Url::parse(link).is_err() {
                return Err(AppError::BadRequest("Session link must be a valid URL".to_string()));
            }
        }
        Ok(())
    }
}

impl From<&Schedule> for SchedulePayload {
    fn from(schedule: &Schedule) -> Self {
        Self {
            course_id: schedule.course_id,
            title: schedule.title.clone(),
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            standard_price: schedule.standard_price,
            offer_price: schedule.offer_price,
            session_link: schedule.session_link.clone(),
            is_active: schedule.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload(standard: f64, offer: f64) -> SchedulePayload {
        let start = Utc::now();
        SchedulePayload {
            course_id: 1,
            title: "June batch".into(),
            start_date: start,
            end_date: start + Duration::days(30),
            standard_price: standard,
            offer_price: offer,
            session_link: Some("https://meet.test/abc".into()),
            is_active: true,
        }
    }

    #[test]
    fn offer_above_standard_is_always_rejected() {
        for (standard, offer) in [(0.0, 0.01), (100.0, 100.5), (499.0, 1000.0), (1.0, 2.0)] {
            let err = payload(standard, offer).check_consistency().unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{standard} < {offer}");
        }
    }

    #[test]
    fn offer_equal_or_below_standard_is_accepted() {
        assert!(payload(100.0, 100.0).check_consistency().is_ok());
        assert!(payload(100.0, 0.0).check_consistency().is_ok());
    }

    #[test]
    fn negative_prices_and_inverted_dates_are_rejected() {
        assert!(payload(-1.0, -2.0).check_consistency().is_err());

        let mut inverted = payload(10.0, 5.0);
        std::mem::swap(&mut inverted.start_date, &mut inverted.end_date);
        assert!(inverted.check_consistency().is_err());
    }

    #[test]
    fn session_link_must_parse() {
        let mut p = payload(10.0, 5.0);
        p.session_link = Some("meet dot test".into());
        assert!(p.check_consistency().is_err());

        p.session_link = None;
        assert!(p.check_consistency().is_ok());
    }
}
