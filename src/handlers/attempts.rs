// src/handlers/attempts.rs
//
// Learner side of the exam lifecycle: practice-test catalog, start/resume,
// answer saving, submission and the result page.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    error::AppError,
    models::{
        exam::Exam,
        exam_attempt::{
            AttemptResult, CurrentExamData, ExamAttempt, SaveAnswersRequest,
            derive_practice_tests, merge_selections,
        },
        question_paper::QuestionPaper,
    },
    utils::jwt::Claims,
};

pub(crate) const EXAM_COLUMNS: &str = "id, title, description, course_id, question_paper_id, duration_minutes, passing_percentage, result_method, is_active, is_deleted, created_at";

pub(crate) const PAPER_COLUMNS: &str =
    "id, title, course_id, questions, is_active, is_deleted, created_at";

pub(crate) const ATTEMPT_COLUMNS: &str = "id, user_id, exam_id, question_paper_id, answers, total_questions, correct_answers, incorrect_answers, percentage, is_completed, is_result_shown, result_method, start_time, end_time, time_spent, is_deleted";

pub(crate) async fn fetch_exam(pool: &PgPool, id: i64) -> Result<Exam, AppError> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))
}

pub(crate) async fn fetch_paper(pool: &PgPool, id: i64) -> Result<QuestionPaper, AppError> {
    sqlx::query_as::<_, QuestionPaper>(&format!(
        "SELECT {PAPER_COLUMNS} FROM question_papers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Question paper not found".to_string()))
}

pub(crate) async fn fetch_attempt(pool: &PgPool, id: i64) -> Result<ExamAttempt, AppError> {
    sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM exam_attempts WHERE id = $1 AND is_deleted = FALSE"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))
}

/// Loads an attempt that belongs to the caller. Other users' attempts read as missing.
async fn fetch_own_attempt(pool: &PgPool, claims: &Claims, id: i64) -> Result<ExamAttempt, AppError> {
    let attempt = fetch_attempt(pool, id).await?;
    if attempt.user_id != claims.user_id()? {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    }
    Ok(attempt)
}

/// Writes a graded attempt back. Fails with `Conflict` if it was completed in the meantime,
/// so a concurrent submit or an admin override is never overwritten.
async fn store_completion(pool: &PgPool, attempt: &ExamAttempt) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE exam_attempts SET
            answers = $1,
            total_questions = $2,
            correct_answers = $3,
            incorrect_answers = $4,
            percentage = $5,
            is_completed = TRUE,
            is_result_shown = $6,
            end_time = $7,
            time_spent = $8
        WHERE id = $9 AND is_completed = FALSE
        "#,
    )
    .bind(&attempt.answers)
    .bind(attempt.total_questions)
    .bind(attempt.correct_answers)
    .bind(attempt.incorrect_answers)
    .bind(attempt.percentage)
    .bind(attempt.is_result_shown)
    .bind(attempt.end_time)
    .bind(attempt.time_spent)
    .bind(attempt.id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store attempt {}: {:?}", attempt.id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    tracing::info!(
        attempt_id = attempt.id,
        percentage = attempt.percentage,
        "Attempt completed"
    );
    Ok(())
}

/// Grades and stores an attempt whose time limit has passed. Returns whether it did.
async fn finalize_if_expired(
    pool: &PgPool,
    attempt: &mut ExamAttempt,
    exam: &Exam,
) -> Result<bool, AppError> {
    let now = Utc::now();
    if !attempt.is_expired(exam.duration_minutes, now) {
        return Ok(false);
    }

    let paper = fetch_paper(pool, attempt.question_paper_id).await?;
    attempt.complete(&paper.questions, exam.duration_minutes, now);
    store_completion(pool, attempt).await?;
    Ok(true)
}

fn current_exam_data(attempt: ExamAttempt, exam: Exam, paper: &QuestionPaper) -> CurrentExamData {
    let remaining_seconds = attempt.remaining_seconds(exam.duration_minutes, Utc::now());
    CurrentExamData {
        attempt: attempt.redacted(),
        exam,
        questions: paper.public_questions(),
        remaining_seconds,
    }
}

#[derive(Debug, Deserialize)]
pub struct PracticeTestParams {
    pub course_id: Option<i64>,
}

/// Practice-test catalog with the caller's status on each exam.
pub async fn list_practice_tests(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PracticeTestParams>,
) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!(
        r#"
        SELECT {EXAM_COLUMNS}
        FROM exams
        WHERE is_active = TRUE AND is_deleted = FALSE
          AND ($1::BIGINT IS NULL OR course_id = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(params.course_id)
    .fetch_all(&pool)
    .await?;

    let attempts = sqlx::query_as::<_, ExamAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM exam_attempts WHERE user_id = $1 AND is_deleted = FALSE"
    ))
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    Ok(Json(derive_practice_tests(&exams, &attempts)))
}

/// Starts an exam, or hands back the caller's attempt that is still running.
///
/// An in-progress attempt whose time ran out is graded first and a new one is created.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let exam = fetch_exam(&pool, exam_id).await?;
    if !exam.is_public() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let running = sqlx::query_as::<_, ExamAttempt>(&format!(
        r#"
        SELECT {ATTEMPT_COLUMNS}
        FROM exam_attempts
        WHERE user_id = $1 AND exam_id = $2 AND is_completed = FALSE AND is_deleted = FALSE
        ORDER BY start_time DESC, id DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .bind(exam_id)
    .fetch_optional(&pool)
    .await?;

    if let Some(mut attempt) = running {
        if !finalize_if_expired(&pool, &mut attempt, &exam).await? {
            let paper = fetch_paper(&pool, attempt.question_paper_id).await?;
            return Ok((StatusCode::OK, Json(current_exam_data(attempt, exam, &paper))));
        }
    }

    let paper = fetch_paper(&pool, exam.question_paper_id).await?;
    if paper.is_deleted || paper.questions.is_empty() {
        return Err(AppError::BadRequest(
            "This exam has no questions yet".to_string(),
        ));
    }

    let attempt = sqlx::query_as::<_, ExamAttempt>(&format!(
        r#"
        INSERT INTO exam_attempts (user_id, exam_id, question_paper_id, total_questions, result_method)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ATTEMPT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(exam.id)
    .bind(paper.id)
    .bind(i32::try_from(paper.questions.len()).unwrap_or(i32::MAX))
    .bind(exam.result_method().as_str())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(attempt_id = attempt.id, user_id, exam_id, "Attempt started");

    Ok((StatusCode::CREATED, Json(current_exam_data(attempt, exam, &paper))))
}

/// Current state of one of the caller's attempts.
pub async fn resume_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut attempt = fetch_own_attempt(&pool, &claims, id).await?;
    let exam = fetch_exam(&pool, attempt.exam_id).await?;
    finalize_if_expired(&pool, &mut attempt, &exam).await?;

    let paper = fetch_paper(&pool, attempt.question_paper_id).await?;
    Ok(Json(current_exam_data(attempt, exam, &paper)))
}

/// Saves selections for an in-progress attempt.
pub async fn save_answers(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SaveAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut attempt = fetch_own_attempt(&pool, &claims, id).await?;
    if attempt.is_completed {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    let exam = fetch_exam(&pool, attempt.exam_id).await?;
    if finalize_if_expired(&pool, &mut attempt, &exam).await? {
        return Err(AppError::Conflict(
            "Time is up; the attempt has been submitted".to_string(),
        ));
    }

    let paper = fetch_paper(&pool, attempt.question_paper_id).await?;
    let answers = merge_selections(&paper.questions, &attempt.answers, payload.answers)?;

    let result = sqlx::query(
        "UPDATE exam_attempts SET answers = $1 WHERE id = $2 AND is_completed = FALSE",
    )
    .bind(SqlJson(&answers))
    .bind(attempt.id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    attempt.answers = SqlJson(answers);
    Ok(Json(current_exam_data(attempt, exam, &paper)))
}

/// Grades and closes an in-progress attempt.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut attempt = fetch_own_attempt(&pool, &claims, id).await?;
    if attempt.is_completed {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    let exam = fetch_exam(&pool, attempt.exam_id).await?;
    let paper = fetch_paper(&pool, attempt.question_paper_id).await?;

    attempt.complete(&paper.questions, exam.duration_minutes, Utc::now());
    store_completion(&pool, &attempt).await?;

    Ok(Json(attempt.redacted()))
}

/// Graded result of a completed attempt.
///
/// Learners see it only once it is published; admins always can.
pub async fn get_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = if claims.is_admin() {
        fetch_attempt(&pool, id).await?
    } else {
        fetch_own_attempt(&pool, &claims, id).await?
    };

    if !attempt.is_completed {
        return Err(AppError::BadRequest("Attempt has not been submitted".to_string()));
    }
    if !attempt.is_result_shown && !claims.is_admin() {
        return Err(AppError::Forbidden("Result has not been published yet".to_string()));
    }

    let exam = fetch_exam(&pool, attempt.exam_id).await?;
    Ok(Json(AttemptResult::new(attempt, &exam)))
}
