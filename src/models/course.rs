// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_url_string;

/// Represents the 'course_categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseCategory {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 100, message = "Category name is required."))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
}

impl From<&CourseCategory> for CategoryPayload {
    fn from(category: &CourseCategory) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            is_active: category.is_active,
        }
    }
}

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub category_id: Option<i64>,
    pub title: String,

    /// Sanitized HTML.
    pub description: String,

    /// URL of the cover image. Uploads are handled elsewhere.
    pub image_url: Option<String>,

    /// Free text, e.g. "6 weeks".
    pub duration: String,
    pub level: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Course {
    pub fn is_public(&self) -> bool {
        self.is_active && !self.is_deleted
    }
}

/// Whole-record payload used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CoursePayload {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "Course title is required."))]
    pub title: String,
    #[validate(length(max = 20000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub duration: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub level: String,
    pub is_active: bool,
}

impl From<&Course> for CoursePayload {
    fn from(course: &Course) -> Self {
        Self {
            category_id: course.category_id,
            title: course.title.clone(),
            description: course.description.clone(),
            image_url: course.image_url.clone(),
            duration: course.duration.clone(),
            level: course.level.clone(),
            is_active: course.is_active,
        }
    }
}

/// Query parameters for the public course list.
#[derive(Debug, Deserialize)]
pub struct CourseListParams {
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> Course {
        Course {
            id: 3,
            category_id: Some(1),
            title: "Cloud Practitioner".into(),
            description: "<p>Intro</p>".into(),
            image_url: Some("https://cdn.test/cloud.png".into()),
            duration: "4 weeks".into(),
            level: "Beginner".into(),
            is_active: true,
            is_deleted: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn unchanged_course_payload_round_trips() {
        let course = sample_course();
        let payload = CoursePayload::from(&course);
        let json = serde_json::to_value(&payload).unwrap();
        let back: CoursePayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.title, course.title);
        assert_eq!(back.image_url, course.image_url);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn image_url_must_be_a_url() {
        let mut payload = CoursePayload::from(&sample_course());
        payload.image_url = Some("cloud.png".into());
        assert!(payload.validate().is_err());
    }

    #[test]
    fn deleted_courses_are_not_public() {
        let mut course = sample_course();
        course.is_deleted = true;
        assert!(!course.is_public());
    }
}
