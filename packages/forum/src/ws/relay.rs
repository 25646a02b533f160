//! Private Message Relay
//!
//! Persist first, then attempt exactly one live delivery. A message that
//! fails to persist is not delivered either.

use thiserror::Error;
use tracing::{debug, error};

use super::hub::Hub;
use super::protocol::ServerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// Stored; the receiver will see it on the next history fetch.
    RecipientOffline,
    /// Stored, but the receiver's connection rejected the event.
    DeliveryFailed,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("receiver_id is required")]
    MissingReceiver,
    #[error("content is required")]
    EmptyContent,
    #[error("failed to persist message: {0:#}")]
    Persist(anyhow::Error),
}

impl Hub {
    pub async fn relay_private_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<RelayOutcome, RelayError> {
        if receiver_id.is_empty() {
            return Err(RelayError::MissingReceiver);
        }
        if content.is_empty() {
            return Err(RelayError::EmptyContent);
        }

        let sent_at = chrono::Utc::now().timestamp_millis();
        if let Err(e) = self
            .store()
            .persist_message(sender_id, receiver_id, content, sent_at)
            .await
        {
            self.metrics().persist_failed();
            error!(sender_id = %sender_id, receiver_id = %receiver_id, "Failed to persist private message: {:#}", e);
            return Err(RelayError::Persist(e));
        }
        self.metrics().message_persisted();

        let Some(conn) = self.registry().lookup(receiver_id).await else {
            debug!(receiver_id = %receiver_id, "Recipient offline, message stored only");
            return Ok(RelayOutcome::RecipientOffline);
        };

        let event = ServerEvent::PrivateMessage {
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            sent_at,
        };
        if self.deliver(&conn, event) {
            Ok(RelayOutcome::Delivered)
        } else {
            Ok(RelayOutcome::DeliveryFailed)
        }
    }
}
