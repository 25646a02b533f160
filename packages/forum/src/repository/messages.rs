use anyhow::{Context, Result};

use super::ForumRepository;
use crate::models::PrivateMessage;

impl ForumRepository {
    /// Append a private message. `sent_at` is Unix milliseconds, assigned by the caller.
    pub async fn insert_private_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        sent_at: i64,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (sender_id, receiver_id, content, sent_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert private message")?;

        Ok(result.last_insert_rowid())
    }

    /// Conversation between two users in both directions, oldest first.
    pub async fn get_private_messages(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<PrivateMessage>> {
        let messages = sqlx::query_as::<_, PrivateMessage>(
            r#"
            SELECT id, sender_id, receiver_id, content, sent_at
            FROM messages
            WHERE (sender_id = ? AND receiver_id = ?)
               OR (sender_id = ? AND receiver_id = ?)
            ORDER BY sent_at ASC, id ASC
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch private messages")?;
        Ok(messages)
    }
}
