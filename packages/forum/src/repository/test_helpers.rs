use sqlx::sqlite::SqlitePoolOptions;

/// Create a fresh ForumRepository backed by an in-memory SQLite database.
/// Each call returns an isolated database with all migrations applied.
pub async fn test_repository() -> super::ForumRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    crate::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("Failed to enable foreign keys");

    super::ForumRepository::new(pool)
}

/// Insert a user row. Display names are derived from the username.
pub async fn seed_user(repo: &super::ForumRepository, id: &str, username: &str) {
    sqlx::query("INSERT INTO users (id, username, first_name, last_name) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(username)
        .bind(username)
        .bind("Test")
        .execute(&repo.pool)
        .await
        .expect("Failed to seed user");
}

/// Insert a session that expires `ttl_secs` from now (negative for already expired).
pub async fn seed_session(repo: &super::ForumRepository, token: &str, user_id: &str, ttl_secs: i64) {
    let expires_at = chrono::Utc::now().timestamp() + ttl_secs;
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&repo.pool)
        .await
        .expect("Failed to seed session");
}
