// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Login identifier, unique across users.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub full_name: String,
    pub phone: Option<String>,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Inactive or soft-deleted accounts cannot sign in.
    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_deleted
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Full name is required."))]
    pub full_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required."))]
    pub full_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

/// DTO for the security settings page.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub new_password: String,
}

/// DTO for Admin creating a user (can specify role).
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(custom(function = validate_role))]
    pub role: String,
}

/// Whole-record replacement of a user's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(custom(function = validate_role))]
    pub role: String,
    pub is_active: bool,
}

impl From<&User> for AdminUpdateUserRequest {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
        }
    }
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    match role {
        "user" | "admin" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_role")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_are_rejected() {
        let req = AdminCreateUserRequest {
            email: "a@b.test".into(),
            password: "secret1".into(),
            full_name: "A".into(),
            phone: None,
            role: "superuser".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn register_requires_email_shape() {
        let req = RegisterRequest {
            email: "not-an-email".into(),
            password: "secret1".into(),
            full_name: "Ada".into(),
            phone: None,
        };
        assert!(req.validate().is_err());
    }
}
