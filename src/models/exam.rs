// src/models/exam.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// How an attempt's result is released.
///
/// `Auto`: the graded result is visible to the learner on submit.
/// `Manual`: an administrator reviews and publishes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMethod {
    Auto,
    Manual,
}

impl ResultMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultMethod::Auto => "auto",
            ResultMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for ResultMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ResultMethod::Auto),
            "manual" => Ok(ResultMethod::Manual),
            other => Err(format!("unknown result method '{}'", other)),
        }
    }
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub course_id: i64,
    pub question_paper_id: i64,
    /// Time limit for one attempt.
    pub duration_minutes: i32,
    pub passing_percentage: f64,
    /// 'auto' or 'manual', see [`ResultMethod`].
    pub result_method: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Exam {
    pub fn is_public(&self) -> bool {
        self.is_active && !self.is_deleted
    }

    /// Unknown stored values fall back to `Auto`.
    pub fn result_method(&self) -> ResultMethod {
        self.result_method.parse().unwrap_or(ResultMethod::Auto)
    }
}

/// Admin list row: the exam plus its course title.
#[derive(Debug, Serialize, FromRow)]
pub struct ExamRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub exam: Exam,
    pub course_title: String,
}

/// Whole-record payload used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ExamPayload {
    #[validate(length(min = 1, max = 200, message = "Exam title is required."))]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    pub course_id: i64,
    pub question_paper_id: i64,
    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes."))]
    pub duration_minutes: i32,
    #[validate(range(min = 0.0, max = 100.0))]
    pub passing_percentage: f64,
    pub result_method: ResultMethod,
    pub is_active: bool,
}

impl From<&Exam> for ExamPayload {
    fn from(exam: &Exam) -> Self {
        Self {
            title: exam.title.clone(),
            description: exam.description.clone(),
            course_id: exam.course_id,
            question_paper_id: exam.question_paper_id,
            duration_minutes: exam.duration_minutes,
            passing_percentage: exam.passing_percentage,
            result_method: exam.result_method(),
            is_active: exam.is_active,
        }
    }
}
