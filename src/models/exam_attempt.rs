// src/models/exam_attempt.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use super::{
    exam::{Exam, ResultMethod},
    question_paper::{PaperQuestion, PublicQuestion},
    round2,
};
use crate::{
    config::{BAND_GREEN_THRESHOLD, BAND_YELLOW_THRESHOLD},
    error::AppError,
};

/// One answered (or, after grading, unanswered) question of an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    pub selected_options: Vec<String>,

    /// Filled in on grading.
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub is_correct: bool,
    /// Explanation copied from the paper on grading.
    #[serde(default)]
    pub description: String,
}

/// Represents the 'exam_attempts' table in the database.
///
/// `correct_answers + incorrect_answers == total_questions` and
/// `0 <= percentage <= 100` hold for every completed attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamAttempt {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    /// The question paper set this attempt was taken against.
    pub question_paper_id: i64,
    pub answers: Json<Vec<AttemptAnswer>>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub incorrect_answers: i32,
    pub percentage: f64,
    pub is_completed: bool,
    pub is_result_shown: bool,
    pub result_method: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and end.
    pub time_spent: i32,
    #[serde(skip)]
    pub is_deleted: bool,
}

impl ExamAttempt {
    pub fn result_method(&self) -> ResultMethod {
        self.result_method.parse().unwrap_or(ResultMethod::Auto)
    }

    pub fn deadline(&self, duration_minutes: i32) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(duration_minutes))
    }

    pub fn remaining_seconds(&self, duration_minutes: i32, now: DateTime<Utc>) -> i64 {
        if self.is_completed {
            return 0;
        }
        (self.deadline(duration_minutes) - now).num_seconds().max(0)
    }

    /// An in-progress attempt whose time limit has run out.
    pub fn is_expired(&self, duration_minutes: i32, now: DateTime<Utc>) -> bool {
        !self.is_completed && now >= self.deadline(duration_minutes)
    }

    /// Grades the saved answers and closes the attempt.
    ///
    /// The end time is capped at the deadline, so an attempt finalized late
    /// never reports more time than the exam allows.
    pub fn complete(
        &mut self,
        questions: &[PaperQuestion],
        duration_minutes: i32,
        now: DateTime<Utc>,
    ) {
        let graded = grade(questions, &self.answers);
        let end = now.min(self.deadline(duration_minutes)).max(self.start_time);

        self.answers = Json(graded.answers);
        self.total_questions = graded.total;
        self.correct_answers = graded.correct;
        self.incorrect_answers = graded.incorrect;
        self.percentage = graded.percentage;
        self.end_time = Some(end);
        self.time_spent = i32::try_from((end - self.start_time).num_seconds()).unwrap_or(i32::MAX);
        self.is_completed = true;
        self.is_result_shown = self.result_method() == ResultMethod::Auto;
    }

    /// Hides the answer key and the score until the result is published.
    pub fn redacted(mut self) -> Self {
        if self.is_result_shown {
            return self;
        }
        for answer in self.answers.iter_mut() {
            answer.correct_answers.clear();
            answer.is_correct = false;
            answer.description.clear();
        }
        self.correct_answers = 0;
        self.incorrect_answers = 0;
        self.percentage = 0.0;
        self
    }
}

/// Status of an exam from the learner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PracticeStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// One card of the learner's practice-test page.
#[derive(Debug, Clone, Serialize)]
pub struct PracticeTest {
    pub exam_id: i64,
    pub title: String,
    pub description: String,
    pub course_id: i64,
    pub duration_minutes: i32,
    pub passing_percentage: f64,
    pub status: PracticeStatus,
    pub latest_attempt_id: Option<i64>,
    /// Only present once the latest attempt's result is published.
    pub percentage: Option<f64>,
    pub attempts_count: usize,
}

/// Most recent attempt: latest start time, ties broken by the higher id.
pub fn latest_attempt<'a, I>(attempts: I) -> Option<&'a ExamAttempt>
where
    I: IntoIterator<Item = &'a ExamAttempt>,
{
    attempts
        .into_iter()
        .max_by_key(|a| (a.start_time, a.id))
}

pub fn status_of(latest: Option<&ExamAttempt>) -> PracticeStatus {
    match latest {
        Some(a) if a.is_completed => PracticeStatus::Completed,
        Some(_) => PracticeStatus::InProgress,
        None => PracticeStatus::NotStarted,
    }
}

/// Joins exams with the user's attempts, one view-model per exam.
pub fn derive_practice_tests(exams: &[Exam], attempts: &[ExamAttempt]) -> Vec<PracticeTest> {
    let mut by_exam: HashMap<i64, Vec<&ExamAttempt>> = HashMap::new();
    for attempt in attempts {
        by_exam.entry(attempt.exam_id).or_default().push(attempt);
    }

    exams
        .iter()
        .map(|exam| {
            let matched = by_exam.get(&exam.id).map(Vec::as_slice).unwrap_or_default();
            let latest = latest_attempt(matched.iter().copied());

            PracticeTest {
                exam_id: exam.id,
                title: exam.title.clone(),
                description: exam.description.clone(),
                course_id: exam.course_id,
                duration_minutes: exam.duration_minutes,
                passing_percentage: exam.passing_percentage,
                status: status_of(latest),
                latest_attempt_id: latest.map(|a| a.id),
                percentage: latest
                    .filter(|a| a.is_completed && a.is_result_shown)
                    .map(|a| a.percentage),
                attempts_count: matched.len(),
            }
        })
        .collect()
}

/// A learner's selection for one question.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSelection {
    pub question_id: String,
    /// Empty clears the saved answer.
    #[serde(default)]
    pub selected_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAnswersRequest {
    pub answers: Vec<AnswerSelection>,
}

/// Merges new selections into the saved ones, in paper order.
///
/// Rejects unknown question ids and options that do not belong to the question.
pub fn merge_selections(
    questions: &[PaperQuestion],
    saved: &[AttemptAnswer],
    incoming: Vec<AnswerSelection>,
) -> Result<Vec<AttemptAnswer>, AppError> {
    let by_id: HashMap<&str, &PaperQuestion> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut selections: HashMap<String, Vec<String>> = saved
        .iter()
        .map(|a| (a.question_id.clone(), a.selected_options.clone()))
        .collect();

    for selection in incoming {
        let question = by_id.get(selection.question_id.as_str()).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown question '{}'", selection.question_id))
        })?;

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(selection.selected_options.len());
        for option in selection.selected_options {
            if !question.has_option(&option) {
                return Err(AppError::BadRequest(format!(
                    "'{}' is not an option of question '{}'",
                    option, question.id
                )));
            }
            if seen.insert(option.clone()) {
                options.push(option);
            }
        }

        if options.is_empty() {
            selections.remove(&selection.question_id);
        } else {
            selections.insert(selection.question_id, options);
        }
    }

    Ok(questions
        .iter()
        .filter_map(|q| {
            selections.remove(&q.id).map(|selected_options| AttemptAnswer {
                question_id: q.id.clone(),
                selected_options,
                correct_answers: Vec::new(),
                is_correct: false,
                description: String::new(),
            })
        })
        .collect())
}

/// Outcome of grading an attempt against its paper.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub answers: Vec<AttemptAnswer>,
    pub total: i32,
    pub correct: i32,
    pub incorrect: i32,
    pub percentage: f64,
}

/// Grades every question of the paper. An answer is correct iff the selected
/// set equals the answer-key set; unanswered questions count as incorrect.
pub fn grade(questions: &[PaperQuestion], saved: &[AttemptAnswer]) -> Grade {
    let selections: HashMap<&str, &Vec<String>> = saved
        .iter()
        .map(|a| (a.question_id.as_str(), &a.selected_options))
        .collect();

    let mut correct = 0;
    let answers: Vec<AttemptAnswer> = questions
        .iter()
        .map(|q| {
            let selected = selections.get(q.id.as_str()).map(|s| (*s).clone()).unwrap_or_default();
            let chosen: HashSet<&String> = selected.iter().collect();
            let key: HashSet<&String> = q.correct_answers.iter().collect();
            let is_correct = !key.is_empty() && chosen == key;
            if is_correct {
                correct += 1;
            }

            AttemptAnswer {
                question_id: q.id.clone(),
                selected_options: selected,
                correct_answers: q.correct_answers.clone(),
                is_correct,
                description: q.description.clone(),
            }
        })
        .collect();

    let total = i32::try_from(answers.len()).unwrap_or(i32::MAX);
    Grade {
        answers,
        total,
        correct,
        incorrect: total - correct,
        percentage: percentage_of(correct, total),
    }
}

pub fn percentage_of(correct: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round2(f64::from(correct) * 100.0 / f64::from(total))
}

/// Color coding of a score on the result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Green,
    Yellow,
    Red,
}

impl ScoreBand {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= BAND_GREEN_THRESHOLD {
            ScoreBand::Green
        } else if percentage >= BAND_YELLOW_THRESHOLD {
            ScoreBand::Yellow
        } else {
            ScoreBand::Red
        }
    }
}

/// Payload returned by start/resume: everything the exam-taking view needs.
#[derive(Debug, Serialize)]
pub struct CurrentExamData {
    pub attempt: ExamAttempt,
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
    pub remaining_seconds: i64,
}

/// Graded record as shown on the result page.
#[derive(Debug, Serialize)]
pub struct AttemptResult {
    pub attempt_id: i64,
    pub exam_id: i64,
    pub exam_title: String,
    pub answers: Vec<AttemptAnswer>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub incorrect_answers: i32,
    pub percentage: f64,
    pub passed: bool,
    pub band: ScoreBand,
    pub result_method: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_spent: i32,
}

impl AttemptResult {
    pub fn new(attempt: ExamAttempt, exam: &Exam) -> Self {
        Self {
            attempt_id: attempt.id,
            exam_id: exam.id,
            exam_title: exam.title.clone(),
            passed: attempt.percentage >= exam.passing_percentage,
            band: ScoreBand::for_percentage(attempt.percentage),
            answers: attempt.answers.0,
            total_questions: attempt.total_questions,
            correct_answers: attempt.correct_answers,
            incorrect_answers: attempt.incorrect_answers,
            percentage: attempt.percentage,
            result_method: attempt.result_method,
            start_time: attempt.start_time,
            end_time: attempt.end_time,
            time_spent: attempt.time_spent,
        }
    }
}

/// Admin manual override of an attempt's recorded result.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ManualResultUpdate {
    #[validate(range(min = 0))]
    pub correct_answers: i32,
    #[validate(range(min = 0))]
    pub incorrect_answers: i32,
    #[validate(range(min = 0.0, max = 100.0, message = "Percentage must be between 0 and 100."))]
    pub percentage: f64,
    #[validate(range(min = 0))]
    pub time_spent: i32,
    pub end_time: Option<DateTime<Utc>>,
    pub result_method: ResultMethod,
    pub is_result_shown: bool,
}

impl ManualResultUpdate {
    /// Arithmetic consistency against the attempt's question count.
    pub fn check_against(&self, total_questions: i32) -> Result<(), AppError> {
        self.validate()?;

        if !(0.0..=100.0).contains(&self.percentage) {
            return Err(AppError::BadRequest(
                "Percentage must be between 0 and 100.".to_string(),
            ));
        }

        let answered = i64::from(self.correct_answers) + i64::from(self.incorrect_answers);
        if answered != i64::from(total_questions) {
            return Err(AppError::BadRequest(format!(
                "Correct and incorrect answers must add up to the total of {} questions.",
                total_questions
            )));
        }

        Ok(())
    }
}

/// Query parameters for the admin attempt list.
#[derive(Debug, Default, Deserialize)]
pub struct AdminAttemptParams {
    pub exam_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Admin list row: the attempt plus who took which exam.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attempt: ExamAttempt,
    pub user_email: String,
    pub exam_title: String,
}
