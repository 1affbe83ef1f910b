// src/handlers/admin/attempts.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::attempts::{ATTEMPT_COLUMNS, fetch_attempt},
    models::exam_attempt::{AdminAttemptParams, AttemptRow, ExamAttempt, ManualResultUpdate},
};

/// Lists attempts with who took which exam, newest first.
pub async fn list_attempts(
    State(pool): State<PgPool>,
    Query(params): Query<AdminAttemptParams>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, AttemptRow>(
        r#"
        SELECT
            a.id, a.user_id, a.exam_id, a.question_paper_id, a.answers,
            a.total_questions, a.correct_answers, a.incorrect_answers, a.percentage,
            a.is_completed, a.is_result_shown, a.result_method,
            a.start_time, a.end_time, a.time_spent, a.is_deleted,
            u.email AS user_email,
            e.title AS exam_title
        FROM exam_attempts a
        JOIN users u ON u.id = a.user_id
        JOIN exams e ON e.id = a.exam_id
        WHERE a.is_deleted = FALSE
          AND ($1::BIGINT IS NULL OR a.exam_id = $1)
          AND ($2::BIGINT IS NULL OR a.user_id = $2)
        ORDER BY a.start_time DESC, a.id DESC
        "#,
    )
    .bind(params.exam_id)
    .bind(params.user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list attempts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows))
}

pub async fn get_attempt(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_attempt(&pool, id).await?))
}

/// Manual override of a learner's recorded result.
///
/// Nothing is written unless `correct + incorrect == total_questions` and the
/// percentage lies in 0..=100. The attempt is marked completed.
pub async fn update_attempt(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ManualResultUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = fetch_attempt(&pool, id).await?;
    payload.check_against(attempt.total_questions)?;

    let end_time = payload
        .end_time
        .or(attempt.end_time)
        .unwrap_or_else(chrono::Utc::now);

    let updated = sqlx::query_as::<_, ExamAttempt>(&format!(
        r#"
        UPDATE exam_attempts SET
            correct_answers = $1,
            incorrect_answers = $2,
            percentage = $3,
            time_spent = $4,
            end_time = $5,
            result_method = $6,
            is_result_shown = $7,
            is_completed = TRUE
        WHERE id = $8
        RETURNING {ATTEMPT_COLUMNS}
        "#
    ))
    .bind(payload.correct_answers)
    .bind(payload.incorrect_answers)
    .bind(payload.percentage)
    .bind(payload.time_spent)
    .bind(end_time)
    .bind(payload.result_method.as_str())
    .bind(payload.is_result_shown)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update attempt {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        attempt_id = id,
        percentage = payload.percentage,
        is_result_shown = payload.is_result_shown,
        "Attempt result overridden"
    );

    Ok(Json(updated))
}
