use anyhow::{Context, Result};

use super::ForumRepository;
use crate::models::{CreatePostRequest, Post};

const POST_COLUMNS: &str = r#"
    SELECT p.id, p.user_id, u.username, p.title, p.content, p.category, p.created_at
    FROM posts p
    JOIN users u ON p.user_id = u.id
"#;

impl ForumRepository {
    /// Insert a post and return it joined with the author's username.
    pub async fn create_post(&self, user_id: &str, req: &CreatePostRequest) -> Result<Post> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, title, content, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.category)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert post")?;

        self.get_post(&id)
            .await?
            .with_context(|| format!("Post {} missing after insert", id))
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let sql = format!("{} WHERE p.id = ?", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch post")?;
        Ok(post)
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let sql = format!("{} ORDER BY p.created_at DESC, p.rowid DESC", POST_COLUMNS);
        let posts = sqlx::query_as::<_, Post>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;
        Ok(posts)
    }
}
