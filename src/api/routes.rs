use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    // The single-page frontend is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog reads
        .route("/api/courses", get(handlers::list_courses))
        .route("/api/course/:course_id", get(handlers::get_course))
        .route("/api/electives", get(handlers::list_electives))
        // Recommendations
        .route("/api/recommend", post(handlers::recommend))
        // Reviews and interactions
        .route("/api/review", post(handlers::submit_review))
        .route("/api/complete", post(handlers::mark_complete))
        // Mock payment flow
        .route("/api/pay", post(handlers::pay))
        .route("/payment_page", get(handlers::payment_page))
        .route("/payment_submit", post(handlers::payment_submit))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}
