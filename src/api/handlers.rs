use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::CourseStore;
use crate::error::{AppError, AppResult};
use crate::models::{Course, EventType, NewReview, RatingSummary, Review};
use crate::services::recommendations;

use super::AppState;

// Request/Response types

/// A catalog course annotated with its live aggregate rating.
#[derive(Debug, Serialize)]
pub struct CourseWithRating {
    pub course_id: i64,
    pub title: String,
    pub provider: String,
    pub description: String,
    pub tags: String,
    pub min_cgpa: Option<f64>,
    pub difficulty: String,
    pub duration_weeks: i64,
    pub avg_rating: f64,
    pub rating_count: i64,
}

impl CourseWithRating {
    fn new(course: Course, summary: RatingSummary) -> Self {
        Self {
            course_id: course.course_id,
            title: course.title,
            provider: course.provider,
            description: course.description,
            tags: course.tags,
            min_cgpa: course.min_cgpa,
            difficulty: course.difficulty,
            duration_weeks: course.duration_weeks,
            avg_rating: summary.average,
            rating_count: summary.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseWithRating>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub avg_rating: f64,
    pub rating_count: i64,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub cgpa: f64,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub results: Vec<Course>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub course_id: i64,
    pub user_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub rating: i64,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub is_senior: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub user_id: Option<String>,
    pub course_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub course_id: i64,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

impl Ack {
    fn ok() -> Self {
        Self { status: "ok" }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All catalog courses, newest first, each with its aggregate rating.
pub async fn list_courses(
    State(state): State<AppState>,
) -> AppResult<Json<CourseListResponse>> {
    let courses = state.store.list_courses().await?;
    let courses = annotate(&state.store, courses).await?;
    Ok(Json(CourseListResponse { courses }))
}

/// One course with its full review list and aggregate rating.
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> AppResult<Json<CourseDetailResponse>> {
    let course = state
        .store
        .get_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    let reviews = state.store.reviews_for_course(course_id).await?;
    let summary = state.store.rating_summary(course_id).await?;

    Ok(Json(CourseDetailResponse {
        course,
        avg_rating: summary.average,
        rating_count: summary.count,
        reviews,
    }))
}

/// Courses flagged as department electives, with aggregate ratings.
pub async fn list_electives(
    State(state): State<AppState>,
) -> AppResult<Json<CourseListResponse>> {
    let courses = state.store.list_electives().await?;
    let courses = annotate(&state.store, courses).await?;
    Ok(Json(CourseListResponse { courses }))
}

/// Ranked course recommendations for the caller's GPA and interests.
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    let results =
        recommendations::recommend(&state.store, request.cgpa, &request.interests, request.top_k)
            .await?;
    Ok(Json(RecommendResponse { results }))
}

/// Submits a review; the review row and its `rating` interaction are
/// written in one transaction.
pub async fn submit_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Json<Ack>> {
    if !(1..=5).contains(&request.rating) {
        return Err(AppError::Validation(
            "rating must be an integer between 1 and 5".to_string(),
        ));
    }

    let review = NewReview {
        course_id: request.course_id,
        user_id: request.user_id,
        reviewer_name: request.reviewer_name,
        rating: request.rating,
        pros: request.pros,
        cons: request.cons,
        comment: request.comment,
        is_senior: request.is_senior,
    };
    state.store.submit_review(&review).await?;

    tracing::info!(course_id = review.course_id, rating = review.rating, "review submitted");

    Ok(Json(Ack::ok()))
}

/// Logs a `complete` interaction for the course.
pub async fn mark_complete(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> AppResult<Json<Ack>> {
    state
        .store
        .log_interaction(
            request.user_id.as_deref(),
            request.course_id,
            EventType::Complete,
            "user completed course",
        )
        .await?;

    Ok(Json(Ack::ok()))
}

/// Mock payment: logs a `purchase` interaction and hands back the
/// payment-page redirect for the course.
pub async fn pay(
    State(state): State<AppState>,
    Json(request): Json<PayRequest>,
) -> AppResult<Json<PayResponse>> {
    state
        .store
        .log_interaction(
            request.user_id.as_deref(),
            request.course_id,
            EventType::Purchase,
            "fake payment",
        )
        .await?;

    Ok(Json(PayResponse {
        redirect: format!("/payment_page?course_id={}", request.course_id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PaymentPageQuery {
    pub course_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentSubmitForm {
    pub course_id: Option<i64>,
}

/// Mock checkout form. Carries no business logic.
pub async fn payment_page(Query(query): Query<PaymentPageQuery>) -> Html<String> {
    let course_id = query
        .course_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    Html(format!(
        "<html><body>\
           <h3>Fake Payment Page</h3>\
           <p>Course ID: {course_id}</p>\
           <form method=\"POST\" action=\"/payment_submit\">\
             <input type=\"hidden\" name=\"course_id\" value=\"{course_id}\" />\
             Card Number: <input name=\"card_number\" /><br/>\
             Expiry: <input name=\"expiry\" /><br/>\
             CVV: <input name=\"cvv\" /><br/>\
             <button type=\"submit\">Pay (Fake)</button>\
           </form>\
         </body></html>"
    ))
}

/// Mock checkout submission: records the `purchase` and discards the
/// (fake) card details.
pub async fn payment_submit(
    State(state): State<AppState>,
    Form(form): Form<PaymentSubmitForm>,
) -> AppResult<Html<&'static str>> {
    let course_id = form
        .course_id
        .ok_or_else(|| AppError::Validation("course_id is required".to_string()))?;

    state
        .store
        .log_interaction(None, course_id, EventType::Purchase, "fake payment submit")
        .await?;

    Ok(Html(
        "<html><body><h3>Fake payment successful. You can close this tab.</h3></body></html>",
    ))
}

/// Pairs each course with its aggregate rating.
async fn annotate(
    store: &CourseStore,
    courses: Vec<Course>,
) -> AppResult<Vec<CourseWithRating>> {
    let mut annotated = Vec::with_capacity(courses.len());
    for course in courses {
        let summary = store.rating_summary(course.course_id).await?;
        annotated.push(CourseWithRating::new(course, summary));
    }
    Ok(annotated)
}
