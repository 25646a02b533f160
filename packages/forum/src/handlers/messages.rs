use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::AppState;
use crate::auth::AuthSession;
use crate::models::{MessageHistoryQuery, PrivateMessage};

/// Conversation between the caller and `user_id`, oldest first.
pub async fn message_history_handler(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<MessageHistoryQuery>,
) -> Result<Json<Vec<PrivateMessage>>, (StatusCode, String)> {
    if query.user_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "user_id is required".to_string()));
    }
    state
        .repository
        .get_private_messages(&session.user_id, &query.user_id)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
