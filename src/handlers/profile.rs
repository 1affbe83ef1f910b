// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use super::auth::USER_COLUMNS;
use crate::{
    error::AppError,
    models::{
        UNKNOWN_COURSE,
        enrollment::EnrollmentDetail,
        user::{ChangePasswordRequest, UpdateProfileRequest, User},
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

async fn fetch_user(pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_deleted = FALSE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Get current user's profile.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()?).await?;
    Ok(Json(user))
}

/// Update the current user's name and phone.
pub async fn update_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET full_name = $1, phone = $2
        WHERE id = $3 AND is_deleted = FALSE
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(payload.full_name.trim())
    .bind(payload.phone.as_deref())
    .bind(claims.user_id()?)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Security settings: change password after re-checking the current one.
pub async fn change_password(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = fetch_user(&pool, claims.user_id()?).await?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::AuthError("Current password is incorrect".to_string()));
    }
    if payload.current_password == payload.new_password {
        return Err(AppError::BadRequest(
            "New password must differ from the current one".to_string(),
        ));
    }

    let hashed = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(hashed)
        .bind(user.id)
        .execute(&pool)
        .await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

/// The learner's enrolled courses with their schedule's session link.
pub async fn my_enrollments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let enrollments = sqlx::query_as::<_, EnrollmentDetail>(
        r#"
        SELECT
            e.id AS enrollment_id,
            e.course_id,
            COALESCE(c.title, $2) AS course_title,
            s.id AS schedule_id,
            s.title AS schedule_title,
            s.start_date,
            s.end_date,
            s.session_link,
            e.price_paid,
            e.created_at AS enrolled_at
        FROM enrollments e
        JOIN schedules s ON s.id = e.schedule_id
        LEFT JOIN courses c ON c.id = e.course_id AND c.is_deleted = FALSE
        WHERE e.user_id = $1
        ORDER BY s.start_date DESC
        "#,
    )
    .bind(claims.user_id()?)
    .bind(UNKNOWN_COURSE)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list enrollments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(enrollments))
}
