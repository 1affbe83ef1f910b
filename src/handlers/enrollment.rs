// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::PgPool;

use super::catalog::{SCHEDULE_COLUMNS, fetch_public_course};
use crate::{
    error::AppError,
    models::{
        coupon::{ApplyCouponRequest, CouponCode, CouponQuote, discounted_price, normalize_code},
        enrollment::{EnrollRequest, Enrollment},
        schedule::Schedule,
    },
    utils::jwt::Claims,
};

pub(crate) const COUPON_COLUMNS: &str = "id, code, description, discount_percentage, expiry_date, course_id, is_active, is_deleted, created_at";

async fn fetch_public_schedule(pool: &PgPool, id: i64) -> Result<Schedule, AppError> {
    sqlx::query_as::<_, Schedule>(&format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .filter(Schedule::is_public)
        .ok_or(AppError::NotFound("Schedule not found".to_string()))
}

/// Looks up a coupon and checks it against the schedule's course, returning the price quote.
async fn quote(
    pool: &PgPool,
    code: &str,
    schedule: &Schedule,
) -> Result<(CouponCode, CouponQuote), AppError> {
    let code = normalize_code(code);
    let coupon = sqlx::query_as::<_, CouponCode>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupon_codes WHERE code = $1"
    ))
    .bind(&code)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Coupon not found".to_string()))?;

    coupon.ensure_applicable(schedule.course_id, Utc::now())?;

    let quote = CouponQuote {
        code: coupon.code.clone(),
        standard_price: schedule.standard_price,
        offer_price: schedule.offer_price,
        discount_percentage: coupon.discount_percentage,
        final_price: discounted_price(schedule.offer_price, coupon.discount_percentage),
    };
    Ok((coupon, quote))
}

/// Previews the price of a schedule with a coupon applied.
pub async fn apply_coupon(
    State(pool): State<PgPool>,
    Json(payload): Json<ApplyCouponRequest>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = fetch_public_schedule(&pool, payload.schedule_id).await?;
    let (_, quote) = quote(&pool, &payload.code, &schedule).await?;
    Ok(Json(quote))
}

/// Enrolls the current user in a course batch.
///
/// Payment is handled outside this service; the price after discount is recorded.
pub async fn enroll(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    fetch_public_course(&pool, course_id).await?;

    let schedule = fetch_public_schedule(&pool, payload.schedule_id).await?;
    if schedule.course_id != course_id {
        return Err(AppError::BadRequest(
            "Schedule does not belong to this course".to_string(),
        ));
    }

    let (coupon_id, price) = match payload.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(code) => {
            let (coupon, quote) = quote(&pool, code, &schedule).await?;
            (Some(coupon.id), quote.final_price)
        }
        None => (None, schedule.offer_price),
    };

    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments (user_id, course_id, schedule_id, coupon_id, price_paid)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, course_id, schedule_id, coupon_id, price_paid, created_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(schedule.id)
    .bind(coupon_id)
    .bind(price)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, "Already enrolled in this schedule".to_string())
    })?;

    tracing::info!(user_id, course_id, schedule_id = schedule.id, "Enrollment created");

    Ok((StatusCode::CREATED, Json(enrollment)))
}
