// tests/admin_crud_tests.rs

mod common;

use common::{spawn_app, unique};
use serde_json::{Value, json};

#[tokio::test]
async fn schedule_offer_above_standard_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let course_id = app.create_course(&admin).await;

    let response = app
        .post(
            &admin.token,
            "/api/admin/schedules",
            json!({
                "course_id": course_id,
                "title": "Weekend batch",
                "start_date": "2030-02-01T09:00:00Z",
                "end_date": "2030-04-01T09:00:00Z",
                "standard_price": 100.0,
                "offer_price": 150.0,
                "session_link": null,
                "is_active": true
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let rows: Value = app
        .get(&admin.token, &format!("/api/admin/schedules?course_id={}", course_id))
        .await
        .json()
        .await
        .unwrap();
    assert!(rows.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn schedule_for_missing_course_is_rejected() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let response = app
        .post(
            &admin.token,
            "/api/admin/schedules",
            json!({
                "course_id": i64::MAX,
                "title": "Orphan batch",
                "start_date": "2030-02-01T09:00:00Z",
                "end_date": "2030-04-01T09:00:00Z",
                "standard_price": 100.0,
                "offer_price": 80.0,
                "session_link": null,
                "is_active": true
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn expired_coupon_reports_expired_status() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let created = app
        .post(
            &admin.token,
            "/api/admin/coupons",
            json!({
                "code": unique("OLD").to_uppercase(),
                "description": "Last year's offer",
                "discount_percentage": 15.0,
                "expiry_date": "2020-01-01T00:00:00Z",
                "course_id": null,
                "is_active": true
            }),
        )
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let id = created.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let coupon: Value = app
        .get(&admin.token, &format!("/api/admin/coupons/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(coupon["status"], "Expired");
}

#[tokio::test]
async fn coupon_discount_must_be_positive() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let response = app
        .post(
            &admin.token,
            "/api/admin/coupons",
            json!({
                "code": unique("ZERO").to_uppercase(),
                "description": "",
                "discount_percentage": 0.0,
                "expiry_date": "2099-01-01T00:00:00Z",
                "course_id": null,
                "is_active": true
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn saving_an_unchanged_faq_keeps_its_fields() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let payload = json!({
        "question": unique("How long is access?"),
        "answer": "<p>Lifetime access.</p>",
        "category": "General",
        "display_order": 3,
        "is_active": true
    });
    let created: Value = app
        .post(&admin.token, "/api/admin/faqs", payload.clone())
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let saved = app
        .put(&admin.token, &format!("/api/admin/faqs/{}", id), payload)
        .await;
    assert_eq!(saved.status().as_u16(), 200);
    let saved: Value = saved.json().await.unwrap();

    for field in ["question", "answer", "category", "display_order", "is_active"] {
        assert_eq!(saved[field], created[field], "field {} changed", field);
    }
}

#[tokio::test]
async fn faq_answer_is_sanitized() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let created: Value = app
        .post(
            &admin.token,
            "/api/admin/faqs",
            json!({
                "question": unique("Is it safe?"),
                "answer": "<p>Yes</p><script>alert(1)</script>",
                "category": "General",
                "display_order": 1,
                "is_active": true
            }),
        )
        .await
        .json()
        .await
        .unwrap();

    let answer = created["answer"].as_str().unwrap();
    assert!(answer.contains("<p>Yes</p>"));
    assert!(!answer.contains("<script>"));
}

#[tokio::test]
async fn soft_deleted_course_leaves_catalog_until_restored() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let course_id = app.create_course(&admin).await;

    let public = app.client.get(app.url(&format!("/api/courses/{}", course_id))).send().await.unwrap();
    assert_eq!(public.status().as_u16(), 200);

    let deleted = app
        .delete(&admin.token, &format!("/api/admin/courses/{}", course_id))
        .await;
    assert_eq!(deleted.status().as_u16(), 204);

    let public = app.client.get(app.url(&format!("/api/courses/{}", course_id))).send().await.unwrap();
    assert_eq!(public.status().as_u16(), 404);

    // Still visible to admins on request.
    let admin_view = app
        .get(&admin.token, "/api/admin/courses?include_deleted=true")
        .await
        .json::<Value>()
        .await
        .unwrap();
    assert!(
        admin_view
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["id"].as_i64() == Some(course_id) && c["is_deleted"] == true)
    );

    let restored = app
        .post(&admin.token, &format!("/api/admin/courses/{}/restore", course_id), json!({}))
        .await;
    assert_eq!(restored.status().as_u16(), 204);

    let public = app.client.get(app.url(&format!("/api/courses/{}", course_id))).send().await.unwrap();
    assert_eq!(public.status().as_u16(), 200);
}

#[tokio::test]
async fn deleting_a_missing_record_is_404() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let response = app
        .delete(&admin.token, &format!("/api/admin/faqs/{}", i64::MAX))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn question_paper_answers_must_be_options() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let course_id = app.create_course(&admin).await;

    let response = app
        .post(
            &admin.token,
            "/api/admin/question-papers",
            json!({
                "title": unique("Broken paper"),
                "course_id": course_id,
                "is_active": true,
                "questions": [{
                    "question": "Pick one",
                    "options": ["a", "b"],
                    "correct_answers": ["c"],
                    "description": ""
                }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn saving_an_unchanged_category_keeps_its_fields() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let payload = json!({
        "name": unique("Cloud"),
        "description": "Cloud certification tracks",
        "is_active": true
    });
    let created = app.post(&admin.token, "/api/admin/categories", payload.clone()).await;
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let saved = app
        .put(&admin.token, &format!("/api/admin/categories/{}", id), payload)
        .await;
    assert_eq!(saved.status().as_u16(), 200);
    assert_eq!(saved.json::<Value>().await.unwrap(), created);
}

#[tokio::test]
async fn saving_an_unchanged_schedule_keeps_its_fields() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;
    let course_id = app.create_course(&admin).await;

    let payload = json!({
        "course_id": course_id,
        "title": "Morning batch",
        "start_date": "2030-05-01T08:00:00Z",
        "end_date": "2030-06-30T08:00:00Z",
        "standard_price": 300.0,
        "offer_price": 249.5,
        "session_link": "https://meet.example.com/morning",
        "is_active": true
    });
    let created = app.post(&admin.token, "/api/admin/schedules", payload.clone()).await;
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let saved = app
        .put(&admin.token, &format!("/api/admin/schedules/{}", id), payload.clone())
        .await;
    assert_eq!(saved.status().as_u16(), 200);
    assert_eq!(saved.json::<Value>().await.unwrap(), created);

    // The course going away does not block re-saving the schedule as it is.
    let deleted = app
        .delete(&admin.token, &format!("/api/admin/courses/{}", course_id))
        .await;
    assert_eq!(deleted.status().as_u16(), 204);

    let saved = app
        .put(&admin.token, &format!("/api/admin/schedules/{}", id), payload)
        .await;
    assert_eq!(saved.status().as_u16(), 200);
    assert_eq!(saved.json::<Value>().await.unwrap(), created);
}

#[tokio::test]
async fn course_keeps_its_deleted_category_but_cannot_move_to_one() {
    let Some(app) = spawn_app().await else { return };
    let admin = app.admin().await;

    let mut category_ids = Vec::new();
    for _ in 0..2 {
        let category: Value = app
            .post(
                &admin.token,
                "/api/admin/categories",
                json!({"name": unique("Track"), "description": "", "is_active": true}),
            )
            .await
            .json()
            .await
            .unwrap();
        category_ids.push(category["id"].as_i64().unwrap());
    }

    let payload = json!({
        "category_id": category_ids[0],
        "title": unique("Course"),
        "description": "<p>Intro</p>",
        "image_url": null,
        "duration": "6 weeks",
        "level": "Intermediate",
        "is_active": true
    });
    let created: Value = app
        .post(&admin.token, "/api/admin/courses", payload.clone())
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    for category_id in &category_ids {
        let deleted = app
            .delete(&admin.token, &format!("/api/admin/categories/{}", category_id))
            .await;
        assert_eq!(deleted.status().as_u16(), 204);
    }

    let saved = app
        .put(&admin.token, &format!("/api/admin/courses/{}", id), payload.clone())
        .await;
    assert_eq!(saved.status().as_u16(), 200);
    assert_eq!(saved.json::<Value>().await.unwrap(), created);

    let mut moved = payload;
    moved["category_id"] = json!(category_ids[1]);
    let rejected = app
        .put(&admin.token, &format!("/api/admin/courses/{}", id), moved)
        .await;
    assert_eq!(rejected.status().as_u16(), 400);
}
