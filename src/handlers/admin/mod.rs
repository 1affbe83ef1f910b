// src/handlers/admin/mod.rs
//
// Admin dashboard CRUD. Every record type follows the same shape: list,
// get, create, whole-record update, soft delete and restore.

use axum::http::StatusCode;
use sqlx::PgPool;

use crate::error::AppError;

pub mod attempts;
pub mod coupons;
pub mod courses;
pub mod exams;
pub mod faqs;
pub mod question_papers;
pub mod schedules;
pub mod users;

/// Record types that can be soft deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resource {
    User,
    Category,
    Course,
    Schedule,
    Coupon,
    QuestionPaper,
    Exam,
    Faq,
}

impl Resource {
    fn table(self) -> &'static str {
        match self {
            Resource::User => "users",
            Resource::Category => "course_categories",
            Resource::Course => "courses",
            Resource::Schedule => "schedules",
            Resource::Coupon => "coupon_codes",
            Resource::QuestionPaper => "question_papers",
            Resource::Exam => "exams",
            Resource::Faq => "faqs",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Resource::User => "User",
            Resource::Category => "Category",
            Resource::Course => "Course",
            Resource::Schedule => "Schedule",
            Resource::Coupon => "Coupon",
            Resource::QuestionPaper => "Question paper",
            Resource::Exam => "Exam",
            Resource::Faq => "FAQ",
        }
    }

    pub(crate) fn not_found(self) -> AppError {
        AppError::NotFound(format!("{} not found", self.label()))
    }
}

/// Flips the soft-delete flag of one record.
pub(crate) async fn set_deleted(
    pool: &PgPool,
    resource: Resource,
    id: i64,
    deleted: bool,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET is_deleted = $1 WHERE id = $2",
        resource.table()
    ))
    .bind(deleted)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update {} {}: {:?}", resource.table(), id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(resource.not_found());
    }

    tracing::info!(
        table = resource.table(),
        id,
        deleted,
        "Soft-delete flag updated"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Fails with 400 when a referenced row does not exist or is soft deleted.
pub(crate) async fn ensure_exists(
    pool: &PgPool,
    resource: Resource,
    id: i64,
) -> Result<(), AppError> {
    let found: Option<(i64,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE id = $1 AND is_deleted = FALSE",
        resource.table()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!(
            "{} {} does not exist",
            resource.label(),
            id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::Resource;

    #[test]
    fn tables_match_migrations() {
        assert_eq!(Resource::Coupon.table(), "coupon_codes");
        assert_eq!(Resource::Category.table(), "course_categories");
        assert_eq!(Resource::QuestionPaper.table(), "question_papers");
    }

    #[test]
    fn not_found_names_the_resource() {
        let err = Resource::Faq.not_found();
        assert_eq!(format!("{err}"), "NotFound(\"FAQ not found\")");
    }
}

/// Like `ensure_exists`, but a reference the record already holds is accepted as is,
/// so re-saving a record whose parent was soft deleted still succeeds.
pub(crate) async fn ensure_reference(
    pool: &PgPool,
    resource: Resource,
    id: i64,
    stored: Option<i64>,
) -> Result<(), AppError> {
    if stored == Some(id) {
        return Ok(());
    }
    ensure_exists(pool, resource, id).await
}

/// Current value of a reference column of a stored record; 404 when the record is missing.
pub(crate) async fn stored_reference(
    pool: &PgPool,
    resource: Resource,
    id: i64,
    column: &'static str,
) -> Result<Option<i64>, AppError> {
    let row: Option<(Option<i64>,)> = sqlx::query_as(&format!(
        "SELECT {} FROM {} WHERE id = $1",
        column,
        resource.table()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|(value,)| value).ok_or(resource.not_found())
}
