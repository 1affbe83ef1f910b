// src/handlers/catalog.rs
//
// Public marketing-site endpoints. Only active, non-deleted records are visible.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        course::{Course, CourseCategory, CourseListParams},
        faq::Faq,
        schedule::Schedule,
        search_pattern,
    },
};

pub(crate) const COURSE_COLUMNS: &str = "id, category_id, title, description, image_url, duration, level, is_active, is_deleted, created_at";

pub(crate) const SCHEDULE_COLUMNS: &str = "id, course_id, title, start_date, end_date, standard_price, offer_price, session_link, is_active, is_deleted, created_at";

pub async fn list_categories(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, CourseCategory>(
        r#"
        SELECT id, name, description, is_active, is_deleted, created_at
        FROM course_categories
        WHERE is_active = TRUE AND is_deleted = FALSE
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(categories))
}

/// Lists public courses, optionally filtered by category and title search.
pub async fn list_courses(
    State(pool): State<PgPool>,
    Query(params): Query<CourseListParams>,
) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>(&format!(
        r#"
        SELECT {COURSE_COLUMNS}
        FROM courses
        WHERE is_active = TRUE AND is_deleted = FALSE
          AND ($1::BIGINT IS NULL OR category_id = $1)
          AND ($2::TEXT IS NULL OR title ILIKE $2)
        ORDER BY created_at DESC
        "#
    ))
    .bind(params.category_id)
    .bind(search_pattern(params.search.as_deref()))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list courses: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(courses))
}

pub async fn get_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_public_course(&pool, id).await?;
    Ok(Json(course))
}

pub(crate) async fn fetch_public_course(pool: &PgPool, id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .filter(Course::is_public)
        .ok_or(AppError::NotFound("Course not found".to_string()))
}

/// Upcoming and running batches of a course.
pub async fn list_course_schedules(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_public_course(&pool, id).await?;

    let schedules = sqlx::query_as::<_, Schedule>(&format!(
        r#"
        SELECT {SCHEDULE_COLUMNS}
        FROM schedules
        WHERE course_id = $1 AND is_active = TRUE AND is_deleted = FALSE
        ORDER BY start_date
        "#
    ))
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(schedules))
}

pub async fn list_faqs(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let faqs = sqlx::query_as::<_, Faq>(
        r#"
        SELECT id, question, answer, category, display_order, is_active, is_deleted, created_at
        FROM faqs
        WHERE is_active = TRUE AND is_deleted = FALSE
        ORDER BY display_order, id
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(faqs))
}
