// tests/common/mod.rs
//
// Shared harness: spawns the router on a random port against the Postgres
// at DATABASE_URL. Tests return early when DATABASE_URL is not set.

#![allow(dead_code)]

use certify::{
    config::Config,
    routes,
    state::AppState,
    utils::{
        hash::hash_password,
        jwt::{TokenType, sign_jwt},
    },
};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

pub struct TestApp {
    pub address: String,
    pub pool: PgPool,
    pub client: reqwest::Client,
    pub config: Config,
}

/// A user created for a test, with a valid access token.
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub token: String,
}

pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..10])
}

pub async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        refresh_expiration: 3600,
        rust_log: "error".to_string(),
        server_port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        admin_email: None,
        admin_password: None,
    };

    let app = routes::create_router(AppState::new(pool.clone(), config.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: reqwest::Client::new(),
        config,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a learner through the API and logs in.
    pub async fn learner(&self) -> TestUser {
        let email = format!("{}@example.test", unique("learner"));
        let password = "password123".to_string();

        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({"email": email, "password": password, "full_name": "Test Learner"}))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);
        let user: Value = response.json().await.unwrap();

        let login: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .unwrap();

        TestUser {
            id: user["id"].as_i64().unwrap(),
            email,
            password,
            token: login["token"].as_str().unwrap().to_string(),
        }
    }

    /// Inserts an admin directly and signs a token for it.
    pub async fn admin(&self) -> TestUser {
        let email = format!("{}@example.test", unique("admin"));
        let password = "adminpass".to_string();

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password, full_name, role) VALUES ($1, $2, 'Admin', 'admin') RETURNING id",
        )
        .bind(&email)
        .bind(hash_password(&password).unwrap())
        .fetch_one(&self.pool)
        .await
        .unwrap();

        let token = sign_jwt(id, "admin", TokenType::Access, &self.config.jwt_secret, 600).unwrap();
        TestUser {
            id,
            email,
            password,
            token,
        }
    }

    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a course through the admin API and returns its id.
    pub async fn create_course(&self, admin: &TestUser) -> i64 {
        let response = self
            .post(
                &admin.token,
                "/api/admin/courses",
                json!({
                    "category_id": null,
                    "title": unique("Course"),
                    "description": "<p>Hands-on course</p>",
                    "image_url": null,
                    "duration": "4 weeks",
                    "level": "Beginner",
                    "is_active": true
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
    }

    /// Creates a two-question paper and an exam on it. Returns the exam id.
    pub async fn create_exam(&self, admin: &TestUser, course_id: i64, result_method: &str) -> i64 {
        let paper = self
            .post(
                &admin.token,
                "/api/admin/question-papers",
                json!({
                    "title": unique("Paper"),
                    "course_id": course_id,
                    "is_active": true,
                    "questions": [
                        {
                            "id": "q1",
                            "question": "2 + 2?",
                            "options": ["3", "4", "5"],
                            "correct_answers": ["4"],
                            "description": "Basic addition."
                        },
                        {
                            "id": "q2",
                            "question": "Which are even?",
                            "options": ["1", "2", "4"],
                            "correct_answers": ["2", "4"],
                            "description": "Divisible by two."
                        }
                    ]
                }),
            )
            .await;
        assert_eq!(paper.status().as_u16(), 201);
        let paper_id = paper.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

        let exam = self
            .post(
                &admin.token,
                "/api/admin/exams",
                json!({
                    "title": unique("Exam"),
                    "description": "",
                    "course_id": course_id,
                    "question_paper_id": paper_id,
                    "duration_minutes": 30,
                    "passing_percentage": 60.0,
                    "result_method": result_method,
                    "is_active": true
                }),
            )
            .await;
        assert_eq!(exam.status().as_u16(), 201);
        exam.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
    }
}
