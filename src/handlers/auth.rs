// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RefreshRequest, RegisterRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{TokenType, sign_jwt, verify_jwt},
    },
};

pub(crate) const USER_COLUMNS: &str =
    "id, email, password, full_name, phone, role, is_active, is_deleted, created_at";

/// Registers a new learner account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password, full_name, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&email)
    .bind(hashed_password)
    .bind(payload.full_name.trim())
    .bind(payload.phone.as_deref())
    .fetch_one(&pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{}' is already registered", email)))?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user by email and returns an access/refresh token pair.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    if !user.can_login() {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        TokenType::Access,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;
    let refresh_token = sign_jwt(
        user.id,
        &user.role,
        TokenType::Refresh,
        &config.jwt_secret,
        config.refresh_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "refresh_token": refresh_token,
        "type": "Bearer",
        "email": user.email,
        "role": user.role
    })))
}

/// Exchanges a refresh token for a fresh access token.
///
/// The user is re-read so that role changes and deactivation take effect.
pub async fn refresh(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_jwt(&payload.refresh_token, &config.jwt_secret, TokenType::Refresh)?;
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .filter(User::can_login)
        .ok_or(AppError::AuthError("Account no longer valid".to_string()))?;

    let token = sign_jwt(
        user.id,
        &user.role,
        TokenType::Access,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer"
    })))
}
