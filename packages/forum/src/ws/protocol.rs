//! WebSocket Protocol Types
//!
//! Frames exchanged with browser clients. Both directions are JSON objects
//! tagged by a `type` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{OnlineUser, Post};

/// Messages from client to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    PrivateMessage {
        #[serde(default)]
        receiver_id: String,
        #[serde(default)]
        content: String,
    },
    Identify,
    UserStatus,
    GetOnlineUsers,
    TypingStart {
        #[serde(default)]
        receiver_id: String,
    },
    TypingStop {
        #[serde(default)]
        receiver_id: String,
    },
}

/// Only the discriminator, decoded before the payload so an unknown type can
/// be reported by name.
#[derive(Debug, Deserialize)]
struct FrameHeader {
    #[serde(rename = "type")]
    kind: Option<String>,
}

const KNOWN_TYPES: &[&str] = &[
    "private_message",
    "identify",
    "user_status",
    "get_online_users",
    "typing_start",
    "typing_stop",
];

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not a JSON object: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("frame has no type")]
    MissingType,
    #[error("unknown frame type: {0}")]
    UnknownType(String),
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one inbound text frame.
pub fn parse_frame(text: &str) -> Result<ClientFrame, FrameError> {
    let header: FrameHeader = serde_json::from_str(text).map_err(FrameError::Malformed)?;
    let kind = header.kind.ok_or(FrameError::MissingType)?;
    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(FrameError::UnknownType(kind));
    }
    serde_json::from_str(text).map_err(|source| FrameError::InvalidPayload { kind, source })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Which edge of a typing indicator is being relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingEdge {
    Start,
    Stop,
}

/// Messages from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    PrivateMessage {
        sender_id: String,
        content: String,
        /// Unix milliseconds
        sent_at: i64,
    },
    UserStatus {
        user_id: String,
        username: String,
        status: PresenceStatus,
        /// Unix milliseconds
        timestamp: i64,
    },
    OnlineUsers {
        users: Vec<OnlineUser>,
    },
    TypingStart {
        sender_id: String,
        sender_username: String,
    },
    TypingStop {
        sender_id: String,
        sender_username: String,
    },
    NewPost {
        post: Post,
    },
}

impl ServerEvent {
    pub fn typing(edge: TypingEdge, sender_id: String, sender_username: String) -> Self {
        match edge {
            TypingEdge::Start => ServerEvent::TypingStart {
                sender_id,
                sender_username,
            },
            TypingEdge::Stop => ServerEvent::TypingStop {
                sender_id,
                sender_username,
            },
        }
    }

    /// Wire name of this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::PrivateMessage { .. } => "private_message",
            ServerEvent::UserStatus { .. } => "user_status",
            ServerEvent::OnlineUsers { .. } => "online_users",
            ServerEvent::TypingStart { .. } => "typing_start",
            ServerEvent::TypingStop { .. } => "typing_stop",
            ServerEvent::NewPost { .. } => "new_post",
        }
    }
}
