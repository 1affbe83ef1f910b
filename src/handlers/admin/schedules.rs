// src/handlers/admin/schedules.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use super::{Resource, ensure_reference, set_deleted, stored_reference};
use crate::{
    error::AppError,
    handlers::catalog::SCHEDULE_COLUMNS,
    models::{
        AdminListParams, UNKNOWN_COURSE,
        schedule::{Schedule, SchedulePayload, ScheduleRow},
    },
};

/// Lists schedules with their course title; a missing course reads "Unknown Course".
pub async fn list_schedules(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ScheduleRow>(
        r#"
        SELECT
            s.id, s.course_id, s.title, s.start_date, s.end_date,
            s.standard_price, s.offer_price, s.session_link,
            s.is_active, s.is_deleted, s.created_at,
            COALESCE(c.title, $4) AS course_title
        FROM schedules s
        LEFT JOIN courses c ON c.id = s.course_id AND c.is_deleted = FALSE
        WHERE ($1 OR s.is_deleted = FALSE)
          AND ($2::BIGINT IS NULL OR s.course_id = $2)
          AND ($3::TEXT IS NULL OR s.title ILIKE $3)
        ORDER BY s.start_date DESC
        "#,
    )
    .bind(params.include_deleted)
    .bind(params.course_id)
    .bind(params.search_pattern())
    .bind(UNKNOWN_COURSE)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list schedules: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows))
}

pub async fn get_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = sqlx::query_as::<_, Schedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Schedule.not_found())?;

    Ok(Json(schedule))
}

async fn check_schedule_payload(
    pool: &PgPool,
    payload: &SchedulePayload,
    stored_course: Option<i64>,
) -> Result<(), AppError> {
    payload.validate()?;
    payload.check_consistency()?;
    ensure_reference(pool, Resource::Course, payload.course_id, stored_course).await
}

pub async fn create_schedule(
    State(pool): State<PgPool>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    check_schedule_payload(&pool, &payload, None).await?;

    let schedule = sqlx::query_as::<_, Schedule>(&format!(
        r#"
        INSERT INTO schedules
            (course_id, title, start_date, end_date, standard_price, offer_price, session_link, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {SCHEDULE_COLUMNS}
        "#
    ))
    .bind(payload.course_id)
    .bind(payload.title.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.standard_price)
    .bind(payload.offer_price)
    .bind(payload.session_link.as_deref().filter(|l| !l.is_empty()))
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await?;

    tracing::info!(schedule_id = schedule.id, course_id = schedule.course_id, "Schedule created");

    Ok((StatusCode::CREATED, Json(schedule)))
}

/// Replaces a schedule. Rejected without writing if the offer price exceeds the standard price.
pub async fn update_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let stored_course = stored_reference(&pool, Resource::Schedule, id, "course_id").await?;
    check_schedule_payload(&pool, &payload, stored_course).await?;

    let schedule = sqlx::query_as::<_, Schedule>(&format!(
        r#"
        UPDATE schedules SET
            course_id = $1, title = $2, start_date = $3, end_date = $4,
            standard_price = $5, offer_price = $6, session_link = $7, is_active = $8
        WHERE id = $9
        RETURNING {SCHEDULE_COLUMNS}
        "#
    ))
    .bind(payload.course_id)
    .bind(payload.title.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.standard_price)
    .bind(payload.offer_price)
    .bind(payload.session_link.as_deref().filter(|l| !l.is_empty()))
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Schedule.not_found())?;

    Ok(Json(schedule))
}

pub async fn delete_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Schedule, id, true).await
}

pub async fn restore_schedule(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Schedule, id, false).await
}
