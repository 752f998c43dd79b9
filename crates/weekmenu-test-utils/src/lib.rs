//! Shared test utilities for weekmenu integration tests.
//!
//! Each test gets its own SQLite database file in a temporary directory,
//! with migrations applied. The returned [`tempfile::TempDir`] guard must be
//! kept alive for the lifetime of the pool; dropping it deletes the
//! database file.

use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

use weekmenu_db::pool;

/// Create a fresh file-backed database with migrations applied.
///
/// Returns `(pool, dir)`. The directory guard owns the database file; drop
/// both together when the test is done.
pub async fn create_test_db() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir for test database");
    let url = format!(
        "sqlite://{}/test.db?mode=rwc",
        dir.path().to_str().expect("temp dir path is not utf-8")
    );

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to test database at {url}: {e}"));

    pool::run_migrations(&db_pool)
        .await
        .expect("migrations should succeed");

    (db_pool, dir)
}
