use serde::{Deserialize, Serialize};

/// A registered forum member.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: i64,
}

/// Public view of a user whose session is currently online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OnlineUser {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A forum post, joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
}

/// A persisted private message. `sent_at` is Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PrivateMessage {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub sent_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageHistoryQuery {
    pub user_id: String,
}
