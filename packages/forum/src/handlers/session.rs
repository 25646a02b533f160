use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::AppState;
use crate::auth::AuthSession;

/// End the caller's session and drop the live connection opened with it. A
/// connection the user opened with another session stays up. The dropped
/// connection's own cleanup announces the user as offline.
pub async fn logout_handler(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    state
        .repository
        .delete_session(&session.token)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let disconnected = state
        .hub
        .disconnect_session(&session.user_id, &session.token)
        .await;
    info!(user_id = %session.user_id, disconnected, "User logged out");

    Ok(Json(serde_json::json!({ "status": "logged_out" })))
}
