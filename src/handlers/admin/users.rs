// src/handlers/admin/users.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use super::{Resource, set_deleted};
use crate::{
    error::AppError,
    handlers::auth::USER_COLUMNS,
    models::{
        AdminListParams,
        user::{AdminCreateUserRequest, AdminUpdateUserRequest, User},
    },
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists users, newest first. Search matches email or name.
pub async fn list_users(
    State(pool): State<PgPool>,
    Query(params): Query<AdminListParams>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE ($1 OR is_deleted = FALSE)
          AND ($2::TEXT IS NULL OR email ILIKE $2 OR full_name ILIKE $2)
        ORDER BY id DESC
        "#
    ))
    .bind(params.include_deleted)
    .bind(params.search_pattern())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

pub async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(Resource::User.not_found())?;

    Ok(Json(user))
}

/// Creates a user with a chosen role.
pub async fn create_user(
    State(pool): State<PgPool>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password, full_name, phone, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&email)
    .bind(hashed_password)
    .bind(payload.full_name.trim())
    .bind(payload.phone.as_deref())
    .bind(&payload.role)
    .fetch_one(&pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{}' already exists", email)))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Replaces a user's editable fields.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET email = $1, full_name = $2, phone = $3, role = $4, is_active = $5
        WHERE id = $6
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&email)
    .bind(&payload.full_name)
    .bind(payload.phone.as_deref())
    .bind(&payload.role)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{}' already exists", email)))?
    .ok_or(Resource::User.not_found())?;

    Ok(Json(user))
}

/// Soft deletes a user. Admins cannot delete themselves.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    set_deleted(&pool, Resource::User, id, true).await
}

pub async fn restore_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    set_deleted(&pool, Resource::User, id, false).await
}
