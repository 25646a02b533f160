//! Collaborators the hub calls into: session resolution and the few storage
//! reads and writes it needs. The SQLite repository implements both; tests
//! substitute fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::OnlineUser;
use crate::repository::{ForumRepository, SessionStatus};

/// Resolve an opaque session token to a user id. Expired or unknown tokens
/// resolve to `None`.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait HubStore: Send + Sync {
    /// Name shown to other users, `None` if the user does not exist.
    async fn display_name(&self, user_id: &str) -> Result<Option<String>>;

    /// Append a private message; `sent_at` is Unix milliseconds.
    async fn persist_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        sent_at: i64,
    ) -> Result<i64>;

    async fn online_users(&self) -> Result<Vec<OnlineUser>>;

    async fn set_session_status(&self, token: &str, status: SessionStatus) -> Result<()>;
}

#[async_trait]
impl IdentityResolver for ForumRepository {
    async fn resolve(&self, token: &str) -> Result<Option<String>> {
        self.resolve_session(token).await
    }
}

#[async_trait]
impl HubStore for ForumRepository {
    async fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.get_user_by_id(user_id).await?.map(|u| u.username))
    }

    async fn persist_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        sent_at: i64,
    ) -> Result<i64> {
        self.insert_private_message(sender_id, receiver_id, content, sent_at)
            .await
    }

    async fn online_users(&self) -> Result<Vec<OnlineUser>> {
        self.get_online_users().await
    }

    async fn set_session_status(&self, token: &str, status: SessionStatus) -> Result<()> {
        ForumRepository::set_session_status(self, token, status).await
    }
}
