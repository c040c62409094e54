use axum_test::TestServer;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;

use coursecompass_api::api::{create_router, AppState};
use coursecompass_api::db::{CourseStore, MIGRATOR};
use coursecompass_api::models::{EventType, NewCourse};

async fn create_test_server() -> (TestServer, CourseStore) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();

    let store = CourseStore::new(pool);
    let app = create_router(AppState::new(store.clone()));
    (TestServer::new(app).unwrap(), store)
}

async fn seed_course(store: &CourseStore, title: &str, tags: &str, min_cgpa: f64) -> i64 {
    store
        .insert_course(&NewCourse {
            title: title.to_string(),
            provider: "Coursera".to_string(),
            description: format!("{} description", title),
            tags: tags.to_string(),
            min_cgpa: Some(min_cgpa),
            difficulty: "Intermediate".to_string(),
            duration_weeks: 8,
            url: String::new(),
            source: "seed".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _store) = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_courses_includes_rating_annotations() {
    let (server, store) = create_test_server().await;
    let course_id = seed_course(&store, "Machine Learning Basics", "ml,ai,python", 6.0).await;

    let response = server.get("/api/courses").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["course_id"], course_id);
    assert_eq!(courses[0]["title"], "Machine Learning Basics");
    // A course with no reviews reads as average 0.0 with count 0.
    assert_eq!(courses[0]["avg_rating"], 0.0);
    assert_eq!(courses[0]["rating_count"], 0);
}

#[tokio::test]
async fn test_list_courses_is_idempotent() {
    let (server, store) = create_test_server().await;
    seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;
    seed_course(&store, "Web Development with React", "web,frontend,react", 0.0).await;

    let first: serde_json::Value = server.get("/api/courses").await.json();
    let second: serde_json::Value = server.get("/api/courses").await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_get_course_returns_reviews_and_aggregate() {
    let (server, store) = create_test_server().await;
    let course_id = seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;

    for (rating, name) in [(5, "Asha"), (4, "Ben")] {
        let response = server
            .post("/api/review")
            .json(&json!({
                "course_id": course_id,
                "reviewer_name": name,
                "rating": rating,
            }))
            .await;
        response.assert_status_ok();
    }

    let response = server.get(&format!("/api/course/{}", course_id)).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["course"]["course_id"], course_id);
    assert_eq!(body["rating_count"], 2);
    assert!((body["avg_rating"].as_f64().unwrap() - 4.5).abs() < 1e-9);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_unknown_course_is_not_found() {
    let (server, _store) = create_test_server().await;
    let response = server.get("/api/course/999").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommend_filters_by_cgpa_and_matches_tags_case_insensitively() {
    let (server, store) = create_test_server().await;
    let course_a = seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;
    let course_b = seed_course(&store, "Data Mining", "ml,data mining", 7.0).await;

    let response = server
        .post("/api/recommend")
        .json(&json!({
            "cgpa": 6.5,
            "interests": ["ML"],
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["course_id"].as_i64().unwrap())
        .collect();

    // Course A qualifies and matches "ML" against its "ml" tag; course B's
    // 7.0 minimum exceeds the caller's 6.5 regardless of tag overlap.
    assert!(ids.contains(&course_a));
    assert!(!ids.contains(&course_b));
}

#[tokio::test]
async fn test_recommend_orders_by_tag_overlap() {
    let (server, store) = create_test_server().await;
    let none = seed_course(&store, "Unrelated", "history", 0.0).await;
    let both = seed_course(&store, "Full Stack ML", "ml,web", 0.0).await;
    let one = seed_course(&store, "Intro ML", "ml", 0.0).await;

    let response = server
        .post("/api/recommend")
        .json(&json!({
            "cgpa": 8.0,
            "interests": ["ml", "web"],
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["course_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![both, one, none]);
}

#[tokio::test]
async fn test_recommend_prefers_better_rated_course_on_equal_overlap() {
    let (server, store) = create_test_server().await;
    let unrated = seed_course(&store, "Intro ML", "ml", 0.0).await;
    let rated = seed_course(&store, "Applied ML", "ml", 0.0).await;

    server
        .post("/api/review")
        .json(&json!({ "course_id": rated, "rating": 5 }))
        .await
        .assert_status_ok();

    let body: serde_json::Value = server
        .post("/api/recommend")
        .json(&json!({ "cgpa": 9.0, "interests": ["ml"] }))
        .await
        .json();

    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["course_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![rated, unrated]);
}

#[tokio::test]
async fn test_recommend_caps_results_at_top_k() {
    let (server, store) = create_test_server().await;
    for i in 0..5 {
        seed_course(&store, &format!("Course {}", i), "ml", 0.0).await;
    }

    let body: serde_json::Value = server
        .post("/api/recommend")
        .json(&json!({ "cgpa": 9.0, "interests": ["ml"], "top_k": 3 }))
        .await
        .json();
    assert_eq!(body["results"].as_array().unwrap().len(), 3);

    // top_k of zero yields an empty result, not an error.
    let body: serde_json::Value = server
        .post("/api/recommend")
        .json(&json!({ "cgpa": 9.0, "interests": ["ml"], "top_k": 0 }))
        .await
        .json();
    assert!(body["results"].as_array().unwrap().is_empty());

    // Fewer qualifying courses than top_k returns all of them.
    let body: serde_json::Value = server
        .post("/api/recommend")
        .json(&json!({ "cgpa": 9.0, "interests": ["ml"], "top_k": 50 }))
        .await
        .json();
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected_before_any_write() {
    let (server, store) = create_test_server().await;
    let course_id = seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;

    let response = server
        .post("/api/review")
        .json(&json!({ "course_id": course_id, "rating": 6 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("rating"));

    assert!(store.reviews_for_course(course_id).await.unwrap().is_empty());
    assert!(store.interactions_for_course(course_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_complete_without_user_records_anonymous_interaction() {
    let (server, store) = create_test_server().await;
    let course_id = seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;

    let response = server
        .post("/api/complete")
        .json(&json!({ "user_id": null, "course_id": course_id }))
        .await;
    response.assert_status_ok();

    let interactions = store.interactions_for_course(course_id).await.unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].user_id, "anon");
    assert_eq!(interactions[0].event_type, EventType::Complete);
}

#[tokio::test]
async fn test_pay_logs_purchase_and_returns_redirect() {
    let (server, store) = create_test_server().await;
    let course_id = seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;

    let response = server
        .post("/api/pay")
        .json(&json!({ "course_id": course_id, "user_id": "u7" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(
        body["redirect"],
        format!("/payment_page?course_id={}", course_id)
    );

    let interactions = store.interactions_for_course(course_id).await.unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].event_type, EventType::Purchase);
    assert_eq!(interactions[0].user_id, "u7");
}

#[tokio::test]
async fn test_mock_payment_page_and_submit() {
    let (server, store) = create_test_server().await;
    let course_id = seed_course(&store, "Machine Learning Basics", "ml,ai", 6.0).await;

    let response = server
        .get(&format!("/payment_page?course_id={}", course_id))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Fake Payment Page"));

    let response = server
        .post("/payment_submit")
        .form(&json!({
            "course_id": course_id,
            "card_number": "4111111111111111",
            "expiry": "12/29",
            "cvv": "123",
        }))
        .await;
    response.assert_status_ok();

    let interactions = store.interactions_for_course(course_id).await.unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].event_type, EventType::Purchase);
    assert_eq!(interactions[0].user_id, "anon");
    assert_eq!(interactions[0].details, "fake payment submit");
}

#[tokio::test]
async fn test_list_electives_returns_flagged_courses() {
    let (server, store) = create_test_server().await;
    seed_course(&store, "Web Development with React", "web,react", 0.0).await;
    let elective = seed_course(&store, "Data Mining", "data mining,ml", 7.0).await;
    store.mark_elective(elective).await.unwrap();

    let response = server.get("/api/electives").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["course_id"], elective);
}
