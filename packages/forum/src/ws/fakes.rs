//! In-memory `HubStore` for hub tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::models::OnlineUser;
use crate::repository::SessionStatus;

use super::store::HubStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub sent_at: i64,
}

#[derive(Default)]
pub struct FakeStore {
    names: HashMap<String, String>,
    online: Vec<OnlineUser>,
    fail_persist: bool,
    fail_online_users: bool,
    offline_gate: Option<Arc<Notify>>,
    pub messages: Mutex<Vec<StoredMessage>>,
    pub status_updates: Mutex<Vec<(String, SessionStatus)>>,
}

impl FakeStore {
    pub fn with_user(mut self, user_id: &str, username: &str) -> Self {
        self.names.insert(user_id.to_string(), username.to_string());
        self
    }

    pub fn with_online(mut self, user_id: &str, username: &str) -> Self {
        self.online.push(OnlineUser {
            user_id: user_id.to_string(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        });
        self
    }

    pub fn failing_persist(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub fn failing_online_users(mut self) -> Self {
        self.fail_online_users = true;
        self
    }

    /// Hold every `Offline` status write until `gate` is notified.
    pub fn gated_offline(mut self, gate: Arc<Notify>) -> Self {
        self.offline_gate = Some(gate);
        self
    }

    pub fn last_status(&self, token: &str) -> Option<SessionStatus> {
        self.status_updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| t == token)
            .map(|(_, status)| *status)
    }

    pub fn stored(&self) -> Vec<StoredMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl HubStore for FakeStore {
    async fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.names.get(user_id).cloned())
    }

    async fn persist_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        sent_at: i64,
    ) -> Result<i64> {
        if self.fail_persist {
            bail!("disk full");
        }
        let mut messages = self.messages.lock().unwrap();
        messages.push(StoredMessage {
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            sent_at,
        });
        Ok(messages.len() as i64)
    }

    async fn online_users(&self) -> Result<Vec<OnlineUser>> {
        if self.fail_online_users {
            bail!("database locked");
        }
        Ok(self.online.clone())
    }

    async fn set_session_status(&self, token: &str, status: SessionStatus) -> Result<()> {
        if status == SessionStatus::Offline {
            if let Some(gate) = &self.offline_gate {
                gate.notified().await;
            }
        }
        self.status_updates
            .lock()
            .unwrap()
            .push((token.to_string(), status));
        Ok(())
    }
}
