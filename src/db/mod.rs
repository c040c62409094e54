pub mod sqlite;
pub mod store;

pub use sqlite::create_pool;
pub use store::CourseStore;

/// Embedded schema migrations, applied at startup (and by tests against
/// in-memory databases).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
