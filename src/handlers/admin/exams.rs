// src/handlers/admin/exams.rs

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
    handlers::attempts::{EXAM_COLUMNS, fetch_exam},
    models::{
        AdminListParams, UNKNOWN_COURSE,
        exam::{Exam, ExamPayload, ExamRow},
    },
};

pub async fn list_exams(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ExamRow>(
        r#"
        SELECT
            e.id, e.title, e.description, e.course_id, e.question_paper_id,
            e.duration_minutes, e.passing_percentage, e.result_method,
            e.is_active, e.is_deleted, e.created_at,
            COALESCE(c.title, $4) AS course_title
        FROM exams e
        LEFT JOIN courses c ON c.id = e.course_id AND c.is_deleted = FALSE
        WHERE ($1 OR e.is_deleted = FALSE)
          AND ($2::BIGINT IS NULL OR e.course_id = $2)
          AND ($3::TEXT IS NULL OR e.title ILIKE $3)
        ORDER BY e.id DESC
        "#,
    )
    .bind(params.include_deleted)
    .bind(params.course_id)
    .bind(params.search_pattern())
    .bind(UNKNOWN_COURSE)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows))
}

pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_exam(&pool, id).await?))
}

/// `stored` holds the (course, paper) references of the record being replaced.
async fn check_exam_payload(
    pool: &PgPool,
    payload: &ExamPayload,
    stored: (Option<i64>, Option<i64>),
) -> Result<(), AppError> {
    payload.validate()?;
    ensure_reference(pool, Resource::Course, payload.course_id, stored.0).await?;
    ensure_reference(pool, Resource::QuestionPaper, payload.question_paper_id, stored.1).await
}

pub async fn create_exam(
    State(pool): State<PgPool>,
    Json(payload): Json<ExamPayload>,
) -> Result<impl IntoResponse, AppError> {
    check_exam_payload(&pool, &payload, (None, None)).await?;

    let exam = sqlx::query_as::<_, Exam>(&format!(
        r#"
        INSERT INTO exams
            (title, description, course_id, question_paper_id, duration_minutes,
             passing_percentage, result_method, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {EXAM_COLUMNS}
        "#
    ))
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.course_id)
    .bind(payload.question_paper_id)
    .bind(payload.duration_minutes)
    .bind(payload.passing_percentage)
    .bind(payload.result_method.as_str())
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await?;

    tracing::info!(exam_id = exam.id, result_method = %payload.result_method, "Exam created");

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Replaces an exam. Running attempts keep the result method they started with.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ExamPayload>,
) -> Result<impl IntoResponse, AppError> {
    let stored = (
        stored_reference(&pool, Resource::Exam, id, "course_id").await?,
        stored_reference(&pool, Resource::Exam, id, "question_paper_id").await?,
    );
    check_exam_payload(&pool, &payload, stored).await?;

    let exam = sqlx::query_as::<_, Exam>(&format!(
        r#"
        UPDATE exams SET
            title = $1, description = $2, course_id = $3, question_paper_id = $4,
            duration_minutes = $5, passing_percentage = $6, result_method = $7, is_active = $8
        WHERE id = $9
        RETURNING {EXAM_COLUMNS}
        "#
    ))
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.course_id)
    .bind(payload.question_paper_id)
    .bind(payload.duration_minutes)
    .bind(payload.passing_percentage)
    .bind(payload.result_method.as_str())
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Exam.not_found())?;

    Ok(Json(exam))
}

pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Exam, id, true).await
}

pub async fn restore_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Exam, id, false).await
}
