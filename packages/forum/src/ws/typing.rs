//! Typing Notifier: ephemeral, never persisted.

use tracing::{debug, warn};

use super::hub::Hub;
use super::protocol::{ServerEvent, TypingEdge};

impl Hub {
    /// Relay a typing indicator from `sender_id` to `receiver_id`.
    /// Returns whether it was delivered; failures are logged only.
    pub async fn relay_typing(&self, sender_id: &str, receiver_id: &str, edge: TypingEdge) -> bool {
        if receiver_id.is_empty() {
            debug!(sender_id = %sender_id, "Typing frame without receiver_id");
            return false;
        }

        let sender_username = match self.store().display_name(sender_id).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                warn!(sender_id = %sender_id, "Typing sender has no user row");
                return false;
            }
            Err(e) => {
                warn!(sender_id = %sender_id, "Failed to look up typing sender: {:#}", e);
                return false;
            }
        };

        let event = ServerEvent::typing(edge, sender_id.to_string(), sender_username);
        let delivered = self.send_to_user(receiver_id, event).await;
        if !delivered {
            debug!(receiver_id = %receiver_id, ?edge, "Typing receiver not connected");
        }
        delivered
    }
}
