//! Session table access for the hub: token resolution, online status, and
//! the online-user set. Sessions are issued by the login flow, not here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::ForumRepository;
use crate::models::OnlineUser;

/// Liveness flag stored on each session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Online,
    Offline,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Online => "online",
            SessionStatus::Offline => "offline",
        }
    }
}

impl ForumRepository {
    /// Resolve a session token to its user id. Expired sessions (`expires_at <= now`)
    /// resolve to `None`; expiry is checked against the clock on every call.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<String>> {
        let now = chrono::Utc::now().timestamp();
        let user_id: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?")
                .bind(token)
                .bind(now)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to resolve session")?;
        Ok(user_id)
    }

    pub async fn set_session_status(&self, token: &str, status: SessionStatus) -> Result<()> {
        sqlx::query("UPDATE sessions SET status = ? WHERE token = ?")
            .bind(status.as_str())
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to update session status")?;
        Ok(())
    }

    /// Users holding at least one unexpired session marked online.
    pub async fn get_online_users(&self) -> Result<Vec<OnlineUser>> {
        let now = chrono::Utc::now().timestamp();
        let users = sqlx::query_as::<_, OnlineUser>(
            r#"
            SELECT DISTINCT u.id AS user_id, u.username, u.first_name, u.last_name
            FROM users u
            JOIN sessions s ON u.id = s.user_id
            WHERE s.status = 'online' AND s.expires_at > ?
            ORDER BY u.username
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch online users")?;
        Ok(users)
    }

    /// Delete a session. Returns true if a row was removed.
    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;
        Ok(result.rows_affected() > 0)
    }
}
