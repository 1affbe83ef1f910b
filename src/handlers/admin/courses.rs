// src/handlers/admin/courses.rs

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
    handlers::catalog::COURSE_COLUMNS,
    models::{
        AdminListParams,
        course::{CategoryPayload, Course, CourseCategory, CoursePayload},
    },
    utils::html::clean_html,
};

const CATEGORY_COLUMNS: &str = "id, name, description, is_active, is_deleted, created_at";

pub async fn list_categories(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, CourseCategory>(&format!(
        r#"
        SELECT {CATEGORY_COLUMNS}
        FROM course_categories
        WHERE ($1 OR is_deleted = FALSE)
          AND ($2::TEXT IS NULL OR name ILIKE $2)
        ORDER BY name
        "#
    ))
    .bind(params.include_deleted)
    .bind(params.search_pattern())
    .fetch_all(&pool)
    .await?;

    Ok(Json(categories))
}

pub async fn get_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = sqlx::query_as::<_, CourseCategory>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM course_categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Category.not_found())?;

    Ok(Json(category))
}

pub async fn create_category(
    State(pool): State<PgPool>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, CourseCategory>(&format!(
        r#"
        INSERT INTO course_categories (name, description, is_active)
        VALUES ($1, $2, $3)
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, format!("Category '{}' already exists", payload.name))
    })?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, CourseCategory>(&format!(
        r#"
        UPDATE course_categories SET name = $1, description = $2, is_active = $3
        WHERE id = $4
        RETURNING {CATEGORY_COLUMNS}
        "#
    ))
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, format!("Category '{}' already exists", payload.name))
    })?
    .ok_or(Resource::Category.not_found())?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Category, id, true).await
}

pub async fn restore_category(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Category, id, false).await
}

pub async fn list_courses(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>(&format!(
        r#"
        SELECT {COURSE_COLUMNS}
        FROM courses
        WHERE ($1 OR is_deleted = FALSE)
          AND ($2::TEXT IS NULL OR title ILIKE $2)
        ORDER BY id DESC
        "#
    ))
    .bind(params.include_deleted)
    .bind(params.search_pattern())
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
    let course = sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(Resource::Course.not_found())?;

    Ok(Json(course))
}

async fn check_course_payload(
    pool: &PgPool,
    payload: &CoursePayload,
    stored_category: Option<i64>,
) -> Result<(), AppError> {
    payload.validate()?;
    if let Some(category_id) = payload.category_id {
        ensure_reference(pool, Resource::Category, category_id, stored_category).await?;
    }
    Ok(())
}

pub async fn create_course(
    State(pool): State<PgPool>,
    Json(payload): Json<CoursePayload>,
) -> Result<impl IntoResponse, AppError> {
    check_course_payload(&pool, &payload, None).await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        INSERT INTO courses (category_id, title, description, image_url, duration, level, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(payload.category_id)
    .bind(payload.title.trim())
    .bind(clean_html(&payload.description))
    .bind(payload.image_url.as_deref())
    .bind(&payload.duration)
    .bind(&payload.level)
    .bind(payload.is_active)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(course_id = course.id, "Course created");

    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CoursePayload>,
) -> Result<impl IntoResponse, AppError> {
    let stored_category = stored_reference(&pool, Resource::Course, id, "category_id").await?;
    check_course_payload(&pool, &payload, stored_category).await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        UPDATE courses SET
            category_id = $1, title = $2, description = $3, image_url = $4,
            duration = $5, level = $6, is_active = $7
        WHERE id = $8
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(payload.category_id)
    .bind(payload.title.trim())
    .bind(clean_html(&payload.description))
    .bind(payload.image_url.as_deref())
    .bind(&payload.duration)
    .bind(&payload.level)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(Resource::Course.not_found())?;

    Ok(Json(course))
}

pub async fn delete_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Course, id, true).await
}

pub async fn restore_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::Course, id, false).await
}
