use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{
    Course, EventType, Interaction, NewCourse, NewReview, RatingSummary, Review, ANONYMOUS_USER,
};

/// Storage-access contract for the course catalog and its append-only
/// review and interaction logs.
///
/// Holds a pooled handle; each operation acquires a connection from the
/// pool for the duration of its statements and releases it on every exit
/// path. No global connection state.
#[derive(Clone)]
pub struct CourseStore {
    pool: SqlitePool,
}

impl CourseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Catalog reads
    // ------------------------------------------------------------------

    /// All catalog courses, newest first.
    pub async fn list_courses(&self) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "SELECT * FROM courses ORDER BY created_at DESC, course_id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// One course by id, or `None` if it does not exist.
    pub async fn get_course(&self, course_id: i64) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE course_id = ?")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Courses flagged as department electives, newest first.
    pub async fn list_electives(&self) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "SELECT c.* FROM courses c \
             JOIN electives e ON e.course_id = c.course_id \
             ORDER BY c.created_at DESC, c.course_id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    // ------------------------------------------------------------------
    // Reviews and rating aggregation
    // ------------------------------------------------------------------

    /// Reviews for a course, most recent first.
    pub async fn reviews_for_course(&self, course_id: i64) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE course_id = ? \
             ORDER BY created_at DESC, review_id DESC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Arithmetic mean and count of all ratings for a course.
    ///
    /// An unknown course id is not an error: it simply has no reviews and
    /// yields (0.0, 0).
    pub async fn rating_summary(&self, course_id: i64) -> Result<RatingSummary, sqlx::Error> {
        sqlx::query_as::<_, RatingSummary>(
            "SELECT COALESCE(AVG(rating), 0.0) AS average, COUNT(*) AS count \
             FROM reviews WHERE course_id = ?",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Persists a review and its companion `rating` interaction as a
    /// single transaction; a failure in either insert leaves no partial
    /// record.
    ///
    /// The rating is assumed to be range-checked at the boundary; the
    /// schema CHECK constraint is the backstop.
    pub async fn submit_review(&self, review: &NewReview) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO reviews \
             (course_id, user_id, reviewer_name, rating, pros, cons, comment, is_senior, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.course_id)
        .bind(&review.user_id)
        .bind(&review.reviewer_name)
        .bind(review.rating)
        .bind(&review.pros)
        .bind(&review.cons)
        .bind(&review.comment)
        .bind(review.is_senior)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO interactions (user_id, course_id, event_type, details, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(effective_user(review.user_id.as_deref()))
        .bind(review.course_id)
        .bind(EventType::Rating)
        .bind(format!("rating={}", review.rating))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    // ------------------------------------------------------------------
    // Interaction log
    // ------------------------------------------------------------------

    /// Appends one interaction row with a server-assigned timestamp.
    ///
    /// A missing or empty user id is recorded under the anonymous
    /// sentinel. Never updates or deduplicates; storage failures surface
    /// verbatim.
    pub async fn log_interaction(
        &self,
        user_id: Option<&str>,
        course_id: i64,
        event_type: EventType,
        details: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO interactions (user_id, course_id, event_type, details, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(effective_user(user_id))
        .bind(course_id)
        .bind(event_type)
        .bind(details)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Interactions recorded against a course, most recent first.
    pub async fn interactions_for_course(
        &self,
        course_id: i64,
    ) -> Result<Vec<Interaction>, sqlx::Error> {
        sqlx::query_as::<_, Interaction>(
            "SELECT * FROM interactions WHERE course_id = ? \
             ORDER BY created_at DESC, interaction_id DESC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
    }

    // ------------------------------------------------------------------
    // Catalog loading
    // ------------------------------------------------------------------

    /// Inserts a course at catalog-load time and returns its id.
    pub async fn insert_course(&self, course: &NewCourse) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO courses \
             (title, provider, description, tags, min_cgpa, difficulty, duration_weeks, url, source, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&course.title)
        .bind(&course.provider)
        .bind(&course.description)
        .bind(&course.tags)
        .bind(course.min_cgpa)
        .bind(&course.difficulty)
        .bind(course.duration_weeks)
        .bind(&course.url)
        .bind(&course.source)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Flags an existing course as a department elective.
    pub async fn mark_elective(&self, course_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO electives (course_id) VALUES (?)")
            .bind(course_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Substitutes the anonymous sentinel for missing or empty user ids.
fn effective_user(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => ANONYMOUS_USER.to_string(),
    }
}
