//! Rule-based course recommendations.
//!
//! Filters the catalog by the caller's GPA, scores each surviving course
//! by interest-tag overlap with a small average-rating adjustment, and
//! returns the top K.

use std::collections::HashSet;

use crate::db::CourseStore;
use crate::error::AppResult;
use crate::models::Course;

/// Weight of the average-rating signal relative to tag overlap.
const RATING_WEIGHT: f64 = 0.3;

/// Neutral rating; averages above it boost the score, below it penalize.
const NEUTRAL_RATING: f64 = 3.0;

struct ScoredCourse {
    score: f64,
    course: Course,
}

/// Returns up to `top_k` courses the caller qualifies for, best first.
///
/// Courses whose minimum GPA exceeds `cgpa` are discarded (no stated
/// minimum counts as 0.0). The remainder are scored by the size of the
/// intersection between the caller's normalized interests and the
/// course's tag list, plus `(avg_rating - 3.0) * 0.3`. Equal scores
/// order by ascending course id so results do not depend on storage
/// scan order.
pub async fn recommend(
    store: &CourseStore,
    cgpa: f64,
    interests: &[String],
    top_k: usize,
) -> AppResult<Vec<Course>> {
    let interests = normalize_interests(interests);

    let catalog = store.list_courses().await?;
    let candidates = catalog.len();

    let mut scored = Vec::new();
    for course in catalog {
        if course.min_cgpa.unwrap_or(0.0) > cgpa {
            continue;
        }

        let overlap = tag_overlap(&course.tags, &interests);
        let summary = store.rating_summary(course.course_id).await?;
        let score = overlap as f64 + rating_adjustment(summary.average);

        scored.push(ScoredCourse { score, course });
    }

    let results = rank(scored, top_k);
    tracing::debug!(
        candidates,
        qualifying = results.len(),
        top_k,
        "ranked recommendations"
    );

    Ok(results)
}

/// Trims, lowercases, and deduplicates interest strings, discarding
/// empties.
fn normalize_interests(interests: &[String]) -> HashSet<String> {
    interests
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect()
}

/// Number of the course's comma-separated tags present in the caller's
/// normalized interests.
fn tag_overlap(tags: &str, interests: &HashSet<String>) -> usize {
    tags.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<HashSet<_>>()
        .intersection(interests)
        .count()
}

/// Secondary signal from the course's average rating. A course with no
/// reviews (average 0.0) takes the full -0.9 penalty.
fn rating_adjustment(average: f64) -> f64 {
    (average - NEUTRAL_RATING) * RATING_WEIGHT
}

/// Sorts by score descending, breaking ties by ascending course id, and
/// keeps the first `top_k` courses.
fn rank(mut scored: Vec<ScoredCourse>, top_k: usize) -> Vec<Course> {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.course.course_id.cmp(&b.course.course_id))
    });
    scored.truncate(top_k);
    scored.into_iter().map(|s| s.course).collect()
}
