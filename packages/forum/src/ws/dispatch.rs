//! Event Router
//!
//! Decodes one inbound frame and hands it to the matching hub operation.
//! Nothing here can end the connection: bad frames are logged and dropped.

use tracing::{debug, info, warn};

use super::connection::ConnectionHandle;
use super::hub::Hub;
use super::protocol::{ClientFrame, PresenceStatus, TypingEdge, parse_frame};

/// Per-connection context the router needs alongside the hub.
pub(crate) struct ConnectionContext {
    pub conn: ConnectionHandle,
    /// Resolved once at connect time
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    Routed,
    Dropped,
}

pub(crate) async fn dispatch_frame(hub: &Hub, ctx: &ConnectionContext, text: &str) -> DispatchOutcome {
    let user_id = ctx.conn.user_id();

    let frame = match parse_frame(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(user_id = %user_id, "Dropping frame: {}", e);
            hub.metrics().frame_dropped();
            return DispatchOutcome::Dropped;
        }
    };

    match frame {
        ClientFrame::PrivateMessage {
            receiver_id,
            content,
        } => {
            if let Err(e) = hub
                .relay_private_message(user_id, &receiver_id, &content)
                .await
            {
                warn!(user_id = %user_id, "Private message dropped: {}", e);
                hub.metrics().frame_dropped();
                return DispatchOutcome::Dropped;
            }
        }
        ClientFrame::Identify => {
            info!(user_id = %user_id, "User identified");
        }
        ClientFrame::UserStatus => {
            hub.broadcast_status(user_id, &ctx.username, PresenceStatus::Online)
                .await;
        }
        ClientFrame::GetOnlineUsers => {
            hub.send_online_snapshot(&ctx.conn).await;
        }
        ClientFrame::TypingStart { receiver_id } => {
            hub.relay_typing(user_id, &receiver_id, TypingEdge::Start)
                .await;
        }
        ClientFrame::TypingStop { receiver_id } => {
            hub.relay_typing(user_id, &receiver_id, TypingEdge::Stop)
                .await;
        }
    }

    debug!(user_id = %user_id, "Frame routed");
    DispatchOutcome::Routed
}
