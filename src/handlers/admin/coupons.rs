// src/handlers/admin/coupons.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::PgPool;
use validator::Validate;

use super::{Resource, ensure_reference, set_deleted, stored_reference};
use crate::{
    error::AppError,
    handlers::enrollment::COUPON_COLUMNS,
    models::{
        AdminListParams,
        coupon::{CouponCode, CouponPayload, CouponView},
    },
};

/// Lists coupons with their computed status (Active / Inactive / Expired).
pub async fn list_coupons(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let coupons = sqlx::query_as::<_, CouponCode>(&format!(
        r#"
        SELECT {COUPON_COLUMNS}
        FROM coupon_codes
        WHERE ($1 OR is_deleted = FALSE)
          AND ($2::BIGINT IS NULL OR course_id = $2)
          AND ($3::TEXT IS NULL OR code ILIKE $3)
        ORDER BY expiry_date DESC
        "#
    ))
    .bind(params.include_deleted)
    .bind(params.course_id)
    .bind(params.search_pattern())
    .fetch_all(&pool)
    .await?;

    let now = Utc::now();
    let views: Vec<CouponView> = coupons.into_iter().map(|c| c.with_status(now)).collect();

    Ok(Json(views))
}

pub async fn get_coupon(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let coupon = sqlx::query_as::<_, CouponCode>(&format!(
        "SELECT {COUPON_COLUMNS} FROM coupon_codes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Coupon.not_found())?;

    Ok(Json(coupon.with_status(Utc::now())))
}

async fn check_coupon_payload(
    pool: &PgPool,
    payload: CouponPayload,
    stored_course: Option<i64>,
) -> Result<CouponPayload, AppError> {
    payload.validate()?;
    let payload = payload.normalized()?;
    if let Some(course_id) = payload.course_id {
        ensure_reference(pool, Resource::Course, course_id, stored_course).await?;
    }
    Ok(payload)
}

pub async fn create_coupon(
    State(pool): State<PgPool>,
    Json(payload): Json<CouponPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = check_coupon_payload(&pool, payload, None).await?;

    let coupon = sqlx::query_as::<_, CouponCode>(&format!(
        r#"
        INSERT INTO coupon_codes
            (code, description, discount_percentage, expiry_date, course_id, is_active)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COUPON_COLUMNS}
        "#
    ))
    .bind(&payload.code)
    .bind(&payload.description)
    .bind(payload.discount_percentage)
    .bind(payload.expiry_date)
    .bind(payload.course_id)
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, format!("Coupon code '{}' already exists", payload.code))
    })?;

    tracing::info!(coupon_id = coupon.id, code = %coupon.code, "Coupon created");

    Ok((StatusCode::CREATED, Json(coupon.with_status(Utc::now()))))
}

pub async fn update_coupon(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CouponPayload>,
) -> Result<impl IntoResponse, AppError> {
    let stored_course = stored_reference(&pool, Resource::Coupon, id, "course_id").await?;
    let payload = check_coupon_payload(&pool, payload, stored_course).await?;

    let coupon = sqlx::query_as::<_, CouponCode>(&format!(
        r#"
        UPDATE coupon_codes SET
            code = $1, description = $2, discount_percentage = $3,
            expiry_date = $4, course_id = $5, is_active = $6
        WHERE id = $7
        RETURNING {COUPON_COLUMNS}
        "#
    ))
    .bind(&payload.code)
    .bind(&payload.description)
    .bind(payload.discount_percentage)
    .bind(payload.expiry_date)
    .bind(payload.course_id)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, format!("Coupon code '{}' already exists", payload.code))
    })?
    .ok_or(Resource::Coupon.not_found())?;

    Ok(Json(coupon.with_status(Utc::now())))
}

pub async fn delete_coupon(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Coupon, id, true).await
}

pub async fn restore_coupon(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Coupon, id, false).await
}
