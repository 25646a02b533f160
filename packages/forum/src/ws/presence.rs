//! Presence Broadcaster

use tracing::{debug, error};

use super::connection::ConnectionHandle;
use super::hub::Hub;
use super::protocol::{PresenceStatus, ServerEvent};

impl Hub {
    /// Tell every other connected user that `user_id` went online or offline.
    pub async fn broadcast_status(
        &self,
        user_id: &str,
        username: &str,
        status: PresenceStatus,
    ) -> usize {
        let event = ServerEvent::UserStatus {
            user_id: user_id.to_string(),
            username: username.to_string(),
            status,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let delivered = self.fan_out(&event, Some(user_id)).await;
        debug!(user_id = %user_id, ?status, delivered, "Broadcast presence");
        delivered
    }

    /// Push the current online-user set to one connection.
    pub async fn send_online_snapshot(&self, conn: &ConnectionHandle) -> bool {
        let users = match self.store().online_users().await {
            Ok(users) => users,
            Err(e) => {
                error!(user_id = %conn.user_id(), "Failed to fetch online users: {:#}", e);
                return false;
            }
        };
        self.deliver(conn, ServerEvent::OnlineUsers { users })
    }
}
