// src/handlers/admin/question_papers.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use super::{Resource, ensure_reference, set_deleted, stored_reference};
use crate::{
    error::AppError,
    handlers::attempts::PAPER_COLUMNS,
    models::{
        AdminListParams,
        question_paper::{PaperQuestion, QuestionPaper, QuestionPaperPayload},
    },
};

pub async fn list_papers(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let papers = sqlx::query_as::<_, QuestionPaper>(&format!(
        r#"
        SELECT {PAPER_COLUMNS}
        FROM question_papers
        WHERE ($1 OR is_deleted = FALSE)
          AND ($2::BIGINT IS NULL OR course_id = $2)
          AND ($3::TEXT IS NULL OR title ILIKE $3)
        ORDER BY id DESC
        "#
    ))
    .bind(params.include_deleted)
    .bind(params.course_id)
    .bind(params.search_pattern())
    .fetch_all(&pool)
    .await?;

    Ok(Json(papers))
}

pub async fn get_paper(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let paper = sqlx::query_as::<_, QuestionPaper>(&format!(
        "SELECT {PAPER_COLUMNS} FROM question_papers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::QuestionPaper.not_found())?;

    Ok(Json(paper))
}

/// Validates the payload and resolves its questions.
async fn check_paper_payload(
    pool: &PgPool,
    payload: QuestionPaperPayload,
    stored_course: Option<i64>,
) -> Result<(String, Option<i64>, Vec<PaperQuestion>, bool), AppError> {
    payload.validate()?;
    if let Some(course_id) = payload.course_id {
        ensure_reference(pool, Resource::Course, course_id, stored_course).await?;
    }

    let title = payload.title.trim().to_string();
    let course_id = payload.course_id;
    let is_active = payload.is_active;
    let questions = payload.into_questions()?;
    Ok((title, course_id, questions, is_active))
}

pub async fn create_paper(
    State(pool): State<PgPool>,
    Json(payload): Json<QuestionPaperPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (title, course_id, questions, is_active) = check_paper_payload(&pool, payload, None).await?;

    let paper = sqlx::query_as::<_, QuestionPaper>(&format!(
        r#"
        INSERT INTO question_papers (title, course_id, questions, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING {PAPER_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(course_id)
    .bind(SqlJson(&questions))
    .bind(is_active)
    .fetch_one(&pool)
    .await?;

    tracing::info!(paper_id = paper.id, questions = questions.len(), "Question paper created");

    Ok((StatusCode::CREATED, Json(paper)))
}

/// Replaces a paper. Attempts already graded keep their stored answer key.
pub async fn update_paper(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuestionPaperPayload>,
) -> Result<impl IntoResponse, AppError> {
    let stored_course = stored_reference(&pool, Resource::QuestionPaper, id, "course_id").await?;
    let (title, course_id, questions, is_active) =
        check_paper_payload(&pool, payload, stored_course).await?;

    let paper = sqlx::query_as::<_, QuestionPaper>(&format!(
        r#"
        UPDATE question_papers SET title = $1, course_id = $2, questions = $3, is_active = $4
        WHERE id = $5
        RETURNING {PAPER_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(course_id)
    .bind(SqlJson(&questions))
    .bind(is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::QuestionPaper.not_found())?;

    Ok(Json(paper))
}

pub async fn delete_paper(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::QuestionPaper, id, true).await
}

pub async fn restore_paper(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::QuestionPaper, id, false).await
}
