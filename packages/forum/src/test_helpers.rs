use std::sync::Arc;

use crate::AppState;
use crate::config::{AuthConfig, ServerConfig};
use crate::db::Database;
use crate::metrics::ServerMetrics;
use crate::repository::ForumRepository;
use crate::ws::Hub;

/// Build a fully-wired `AppState` backed by an in-memory SQLite database.
/// Suitable for handler tests that exercise real SQL queries without I/O.
///
/// Returns `(AppState, TempDir)`; callers hold the `TempDir` for the
/// lifetime of the test as a scratch data directory.
pub async fn test_app_state() -> (AppState, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("tempdir");

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    crate::db::run_migrations(&pool).await.expect("migrations");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("pragma");

    let db = Arc::new(Database { pool: pool.clone() });
    let repository = Arc::new(ForumRepository::new(pool));
    let metrics = Arc::new(ServerMetrics::new());
    let hub = Arc::new(Hub::new(repository.clone(), metrics.clone()));

    let state = AppState {
        server_config: Arc::new(ServerConfig::default()),
        auth_config: Arc::new(AuthConfig::default()),
        metrics,
        db,
        repository,
        hub,
    };

    (state, tmp)
}
