// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    handlers::{
        admin::{attempts as admin_attempts, coupons, courses, exams, faqs, question_papers, schedules, users},
        attempts, auth, catalog, enrollment, profile,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// Assembles the main application router.
///
/// * `/api/auth`: registration, login, token refresh.
/// * `/api`: public catalog, plus learner routes behind `auth_middleware`.
/// * `/api/admin`: dashboard CRUD behind auth + admin checks.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh));

    let catalog_routes = Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/courses", get(catalog::list_courses))
        .route("/courses/{id}", get(catalog::get_course))
        .route("/courses/{id}/schedules", get(catalog::list_course_schedules))
        .route("/faqs", get(catalog::list_faqs))
        .route("/coupons/apply", post(enrollment::apply_coupon));

    let learner_routes = Router::new()
        .route("/me", get(profile::get_me).put(profile::update_me))
        .route("/me/password", put(profile::change_password))
        .route("/me/enrollments", get(profile::my_enrollments))
        .route("/courses/{id}/enroll", post(enrollment::enroll))
        .route("/practice-tests", get(attempts::list_practice_tests))
        .route("/exams/{id}/attempts", post(attempts::start_attempt))
        .route("/attempts/{id}", get(attempts::resume_attempt))
        .route("/attempts/{id}/answers", put(attempts::save_answers))
        .route("/attempts/{id}/submit", post(attempts::submit_attempt))
        .route("/attempts/{id}/result", get(attempts::get_result))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/restore", post(users::restore_user))
        .route(
            "/categories",
            get(courses::list_categories).post(courses::create_category),
        )
        .route(
            "/categories/{id}",
            get(courses::get_category)
                .put(courses::update_category)
                .delete(courses::delete_category),
        )
        .route("/categories/{id}/restore", post(courses::restore_category))
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{id}/restore", post(courses::restore_course))
        .route(
            "/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/schedules/{id}",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        )
        .route("/schedules/{id}/restore", post(schedules::restore_schedule))
        .route("/coupons", get(coupons::list_coupons).post(coupons::create_coupon))
        .route(
            "/coupons/{id}",
            get(coupons::get_coupon)
                .put(coupons::update_coupon)
                .delete(coupons::delete_coupon),
        )
        .route("/coupons/{id}/restore", post(coupons::restore_coupon))
        .route(
            "/question-papers",
            get(question_papers::list_papers).post(question_papers::create_paper),
        )
        .route(
            "/question-papers/{id}",
            get(question_papers::get_paper)
                .put(question_papers::update_paper)
                .delete(question_papers::delete_paper),
        )
        .route("/question-papers/{id}/restore", post(question_papers::restore_paper))
        .route("/exams", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/exams/{id}",
            get(exams::get_exam)
                .put(exams::update_exam)
                .delete(exams::delete_exam),
        )
        .route("/exams/{id}/restore", post(exams::restore_exam))
        .route("/faqs", get(faqs::list_faqs).post(faqs::create_faq))
        .route(
            "/faqs/{id}",
            get(faqs::get_faq).put(faqs::update_faq).delete(faqs::delete_faq),
        )
        .route("/faqs/{id}/restore", post(faqs::restore_faq))
        .route("/attempts", get(admin_attempts::list_attempts))
        .route(
            "/attempts/{id}",
            get(admin_attempts::get_attempt).put(admin_attempts::update_attempt),
        )
        // Auth runs first (outermost), then the admin role check.
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", catalog_routes.merge(learner_routes))
        .nest("/api/admin", admin_routes)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
