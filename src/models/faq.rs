// src/models/faq.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'faqs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    /// Sanitized HTML.
    pub answer: String,
    pub category: String,
    /// Ascending sort key on the public page.
    pub display_order: i32,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FaqPayload {
    #[validate(length(min = 1, max = 500, message = "Question is required."))]
    pub question: String,
    #[validate(length(min = 1, max = 10000, message = "Answer is required."))]
    pub answer: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[serde(default)]
    pub display_order: i32,
    pub is_active: bool,
}

impl From<&Faq> for FaqPayload {
    fn from(faq: &Faq) -> Self {
        Self {
            question: faq.question.clone(),
            answer: faq.answer.clone(),
            category: faq.category.clone(),
            display_order: faq.display_order,
            is_active: faq.is_active,
        }
    }
}
