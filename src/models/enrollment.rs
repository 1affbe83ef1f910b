// src/models/enrollment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'enrollments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub schedule_id: i64,
    pub coupon_id: Option<i64>,
    pub price_paid: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub schedule_id: i64,
    pub coupon_code: Option<String>,
}

/// One row of the learner's "My Courses" page, including the session link.
#[derive(Debug, Serialize, FromRow)]
pub struct EnrollmentDetail {
    pub enrollment_id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub schedule_id: i64,
    pub schedule_title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub session_link: Option<String>,
    pub price_paid: f64,
    pub enrolled_at: DateTime<Utc>,
}
