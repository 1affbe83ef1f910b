// src/models/mod.rs

use serde::Deserialize;
use url::Url;

pub mod coupon;
pub mod course;
pub mod enrollment;
pub mod exam;
pub mod exam_attempt;
pub mod faq;
pub mod question_paper;
pub mod schedule;
pub mod user;

/// Rendered in place of a course title when the referenced course is missing.
pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// Query parameters shared by the admin list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct AdminListParams {
    /// Include soft-deleted records (default: false).
    #[serde(default)]
    pub include_deleted: bool,

    /// Case-insensitive substring match on the record's title/name.
    pub search: Option<String>,

    pub course_id: Option<i64>,
}

impl AdminListParams {
    /// `ILIKE` pattern for `search`, or `None` when no search was given.
    pub fn search_pattern(&self) -> Option<String> {
        search_pattern(self.search.as_deref())
    }
}

pub(crate) fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
}

/// Validates that a string is a correctly formatted URL.
pub(crate) fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Rounds to two decimal places, the precision used for prices and percentages.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(Some(" 50%_off ")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(search_pattern(Some(r"C:\temp")).as_deref(), Some(r"%C:\\temp%"));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }
}
