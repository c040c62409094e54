use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel user id recorded when a caller does not identify themselves.
pub const ANONYMOUS_USER: &str = "anon";

/// A catalog entry. Courses are created at catalog-load time and are
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub course_id: i64,
    pub title: String,
    pub provider: String,
    pub description: String,
    /// Comma-separated free-text tags, matched case-insensitively.
    pub tags: String,
    /// Minimum GPA required to take the course; absent means no requirement.
    pub min_cgpa: Option<f64>,
    pub difficulty: String,
    pub duration_weeks: i64,
    pub url: String,
    /// Catalog origin ("seed", "external", "college", ...).
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a course at catalog-load time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub provider: String,
    pub description: String,
    pub tags: String,
    pub min_cgpa: Option<f64>,
    pub difficulty: String,
    pub duration_weeks: i64,
    pub url: String,
    pub source: String,
}

/// A user-submitted course review. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub review_id: i64,
    pub course_id: i64,
    pub user_id: Option<String>,
    pub reviewer_name: Option<String>,
    /// Star rating, always within [1, 5].
    pub rating: i64,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub comment: Option<String>,
    pub is_senior: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new review submission.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub course_id: i64,
    pub user_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub rating: i64,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub comment: Option<String>,
    pub is_senior: bool,
}

/// Kind of user action captured in the interaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EventType {
    Rating,
    Complete,
    Purchase,
}

/// An immutable event record of a user action against a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Interaction {
    pub interaction_id: i64,
    pub user_id: String,
    pub course_id: i64,
    pub event_type: EventType,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating for a course. A course with no reviews has an
/// average of 0.0 and a count of 0, not a null.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

impl RatingSummary {
    /// Summary for a course with no reviews.
    pub fn empty() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }
}
