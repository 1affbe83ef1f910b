// src/handlers/admin/faqs.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use super::{Resource, set_deleted};
use crate::{
    error::AppError,
    models::{
        AdminListParams,
        faq::{Faq, FaqPayload},
    },
    utils::html::clean_html,
};

const FAQ_COLUMNS: &str =
    "id, question, answer, category, display_order, is_active, is_deleted, created_at";

pub async fn list_faqs(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let faqs = sqlx::query_as::<_, Faq>(&format!(
        r#"
        SELECT {FAQ_COLUMNS}
        FROM faqs
        WHERE ($1 OR is_deleted = FALSE)
          AND ($2::TEXT IS NULL OR question ILIKE $2)
        ORDER BY display_order, id
        "#
    ))
    .bind(params.include_deleted)
    .bind(params.search_pattern())
    .fetch_all(&pool)
    .await?;

    Ok(Json(faqs))
}

pub async fn get_faq(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let faq = sqlx::query_as::<_, Faq>(&format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(Resource::Faq.not_found())?;

    Ok(Json(faq))
}

pub async fn create_faq(
    State(pool): State<PgPool>,
    Json(payload): Json<FaqPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let faq = sqlx::query_as::<_, Faq>(&format!(
        r#"
        INSERT INTO faqs (question, answer, category, display_order, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {FAQ_COLUMNS}
        "#
    ))
    .bind(&payload.question)
    .bind(clean_html(&payload.answer))
    .bind(&payload.category)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(faq)))
}

pub async fn update_faq(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<FaqPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let faq = sqlx::query_as::<_, Faq>(&format!(
        r#"
        UPDATE faqs SET question = $1, answer = $2, category = $3, display_order = $4, is_active = $5
        WHERE id = $6
        RETURNING {FAQ_COLUMNS}
        "#
    ))
    .bind(&payload.question)
    .bind(clean_html(&payload.answer))
    .bind(&payload.category)
    .bind(payload.display_order)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Faq.not_found())?;

    Ok(Json(faq))
}

pub async fn delete_faq(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Faq, id, true).await
}

pub async fn restore_faq(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Faq, id, false).await
}
