// tests/profile_tests.rs

mod common;

use common::{TestApp, TestUser, spawn_app, unique};
use serde_json::{Value, json};

async fn create_schedule(app: &TestApp, admin: &TestUser, course_id: i64) -> i64 {
    let response = app
        .post(
            &admin.token,
            "/api/admin/schedules",
            json!({
                "course_id": course_id,
                "title": "Evening batch",
                "start_date": "2030-01-10T18:00:00Z",
                "end_date": "2030-03-10T18:00:00Z",
                "standard_price": 200.0,
                "offer_price": 150.0,
                "session_link": "https://meet.example.com/evening",
                "is_active": true
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn update_profile_and_change_password() {
    let Some(app) = spawn_app().await else { return };
    let learner = app.learner().await;

    let updated = app
        .put(
            &learner.token,
            "/api/me",
            json!({"full_name": "Grace Hopper", "phone": "+1 555 0100"}),
        )
        .await;
    assert_eq!(updated.status().as_u16(), 200);
    let me: Value = app.get(&learner.token, "/api/me").await.json().await.unwrap();
    assert_eq!(me["full_name"], "Grace Hopper");
    assert_eq!(me["phone"], "+1 555 0100");

    let wrong = app
        .put(
            &learner.token,
            "/api/me/password",
            json!({"current_password": "not-it", "new_password": "brandnew123"}),
        )
        .await;
    assert_eq!(wrong.status().as_u16(), 401);

    let changed = app
        .put(
            &learner.token,
            "/api/me/password",
            json!({"current_password": learner.password, "new_password": "brandnew123"}),
        )
        .await;
    assert_eq!(changed.status().as_u16(), 204);

    let old_login = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": learner.email, "password": learner.password}))
        .send()
        .await
        .unwrap();
    assert_eq!(old_login.status().as_u16(), 401);

    let new_login = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": learner.email, "password": "brandnew123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(new_login.status().as_u16(), 200);
}

#[tokio::test]
async fn enroll_with_coupon_and_list_enrollments() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let learner = app.learner().await;
    let course_id = app.create_course(&admin).await;
    let schedule_id = create_schedule(&app, &admin, course_id).await;

    let code = unique("SAVE").to_uppercase();
    let coupon = app
        .post(
            &admin.token,
            "/api/admin/coupons",
            json!({
                "code": code.to_lowercase(),
                "description": "Launch offer",
                "discount_percentage": 20.0,
                "expiry_date": "2099-01-01T00:00:00Z",
                "course_id": course_id,
                "is_active": true
            }),
        )
        .await;
    assert_eq!(coupon.status().as_u16(), 201);
    let coupon: Value = coupon.json().await.unwrap();
    assert_eq!(coupon["code"], code.as_str());

    let quote: Value = app
        .client
        .post(app.url("/api/coupons/apply"))
        .json(&json!({"code": code, "schedule_id": schedule_id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quote["final_price"].as_f64(), Some(120.0));

    let enrolled = app
        .post(
            &learner.token,
            &format!("/api/courses/{}/enroll", course_id),
            json!({"schedule_id": schedule_id, "coupon_code": code}),
        )
        .await;
    assert_eq!(enrolled.status().as_u16(), 201);
    let enrolled: Value = enrolled.json().await.unwrap();
    assert_eq!(enrolled["price_paid"].as_f64(), Some(120.0));

    let again = app
        .post(
            &learner.token,
            &format!("/api/courses/{}/enroll", course_id),
            json!({"schedule_id": schedule_id}),
        )
        .await;
    assert_eq!(again.status().as_u16(), 409);

    let mine: Value = app
        .get(&learner.token, "/api/me/enrollments")
        .await
        .json()
        .await
        .unwrap();
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["schedule_id"].as_i64(), Some(schedule_id));
    assert_eq!(mine[0]["session_link"], "https://meet.example.com/evening");
}

#[tokio::test]
async fn coupon_for_another_course_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let course_id = app.create_course(&admin).await;
    let other_course = app.create_course(&admin).await;
    let schedule_id = create_schedule(&app, &admin, course_id).await;

    let code = unique("ONLY").to_uppercase();
    app.post(
        &admin.token,
        "/api/admin/coupons",
        json!({
            "code": code,
            "description": "",
            "discount_percentage": 10.0,
            "expiry_date": "2099-01-01T00:00:00Z",
            "course_id": other_course,
            "is_active": true
        }),
    )
    .await;

    let response = app
        .client
        .post(app.url("/api/coupons/apply"))
        .json(&json!({"code": code, "schedule_id": schedule_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
