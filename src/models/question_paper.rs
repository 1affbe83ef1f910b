// src/models/question_paper.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::error::AppError;

/// A single question inside a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperQuestion {
    /// Stable within the paper; attempts reference questions by this id.
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Subset of `options`. More than one entry makes it a multiple-answer question.
    pub correct_answers: Vec<String>,
    /// Explanation shown on the result page.
    #[serde(default)]
    pub description: String,
}

impl PaperQuestion {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Question as sent to a learner taking the exam (no answer key).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub multiple: bool,
}

impl From<&PaperQuestion> for PublicQuestion {
    fn from(q: &PaperQuestion) -> Self {
        Self {
            id: q.id.clone(),
            question: q.question.clone(),
            options: q.options.clone(),
            multiple: q.correct_answers.len() > 1,
        }
    }
}

/// Represents the 'question_papers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionPaper {
    pub id: i64,
    pub title: String,
    pub course_id: Option<i64>,
    /// Ordered question list, stored as JSONB.
    pub questions: Json<Vec<PaperQuestion>>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl QuestionPaper {
    pub fn public_questions(&self) -> Vec<PublicQuestion> {
        self.questions.iter().map(PublicQuestion::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QuestionInput {
    /// Assigned from the position when omitted.
    pub id: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Question text is required."))]
    pub question: String,
    #[validate(length(min = 2, max = 10, message = "Each question needs 2 to 10 options."))]
    pub options: Vec<String>,
    #[validate(length(min = 1, message = "Each question needs a correct answer."))]
    pub correct_answers: Vec<String>,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
}

/// Whole-record payload used for both create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QuestionPaperPayload {
    #[validate(length(min = 1, max = 200, message = "Paper title is required."))]
    pub title: String,
    pub course_id: Option<i64>,
    #[validate(length(min = 1, message = "A paper needs at least one question."), nested)]
    pub questions: Vec<QuestionInput>,
    pub is_active: bool,
}

impl QuestionPaperPayload {
    /// Resolves ids and checks that every answer key is one of the options.
    pub fn into_questions(self) -> Result<Vec<PaperQuestion>, AppError> {
        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(self.questions.len());

        for (index, input) in self.questions.into_iter().enumerate() {
            let id = input
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("q{}", index + 1));

            if !seen.insert(id.clone()) {
                return Err(AppError::BadRequest(format!("Duplicate question id '{}'", id)));
            }

            let unique_options: HashSet<&String> = input.options.iter().collect();
            if unique_options.len() != input.options.len() {
                return Err(AppError::BadRequest(format!(
                    "Question '{}' has duplicate options",
                    id
                )));
            }

            if let Some(stray) = input
                .correct_answers
                .iter()
                .find(|a| !input.options.contains(a))
            {
                return Err(AppError::BadRequest(format!(
                    "Correct answer '{}' of question '{}' is not one of its options",
                    stray, id
                )));
            }

            questions.push(PaperQuestion {
                id,
                question: input.question,
                options: input.options,
                correct_answers: input.correct_answers,
                description: input.description,
            });
        }

        Ok(questions)
    }
}

impl From<&QuestionPaper> for QuestionPaperPayload {
    fn from(paper: &QuestionPaper) -> Self {
        Self {
            title: paper.title.clone(),
            course_id: paper.course_id,
            questions: paper
                .questions
                .iter()
                .map(|q| QuestionInput {
                    id: Some(q.id.clone()),
                    question: q.question.clone(),
                    options: q.options.clone(),
                    correct_answers: q.correct_answers.clone(),
                    description: q.description.clone(),
                })
                .collect(),
            is_active: paper.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: Option<&str>, correct: &[&str]) -> QuestionInput {
        QuestionInput {
            id: id.map(String::from),
            question: "Which are prime?".into(),
            options: vec!["2".into(), "3".into(), "4".into()],
            correct_answers: correct.iter().map(|s| s.to_string()).collect(),
            description: "2 and 3 are prime.".into(),
        }
    }

    fn paper(questions: Vec<QuestionInput>) -> QuestionPaperPayload {
        QuestionPaperPayload {
            title: "Set A".into(),
            course_id: None,
            questions,
            is_active: true,
        }
    }

    #[test]
    fn missing_ids_are_assigned_by_position() {
        let questions = paper(vec![input(None, &["2"]), input(Some("custom"), &["3"])])
            .into_questions()
            .unwrap();
        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[1].id, "custom");
    }

    #[test]
    fn answer_key_outside_options_is_rejected() {
        assert!(paper(vec![input(None, &["5"])]).into_questions().is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = paper(vec![input(Some("a"), &["2"]), input(Some("a"), &["3"])]).into_questions();
        assert!(result.is_err());
    }

    #[test]
    fn nested_question_validation_runs() {
        let mut bad = input(None, &[]);
        bad.options = vec!["only".into()];
        assert!(paper(vec![bad]).validate().is_err());
        assert!(paper(vec![]).validate().is_err());
    }

    #[test]
    fn public_questions_hide_answer_key() {
        let questions = paper(vec![input(None, &["2", "3"])]).into_questions().unwrap();
        let public = PublicQuestion::from(&questions[0]);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("correct_answers").is_none());
        assert_eq!(json["multiple"], true);
    }
}
