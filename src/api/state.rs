use crate::db::CourseStore;

/// Shared application state
///
/// Carries the pooled storage handle; cloning is cheap and no request
/// ever sees another request's connection.
#[derive(Clone)]
pub struct AppState {
    pub store: CourseStore,
}

impl AppState {
    pub fn new(store: CourseStore) -> Self {
        Self { store }
    }
}
