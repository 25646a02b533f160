use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use tracing::debug;

use crate::AppState;
use crate::auth::AuthSession;
use crate::ws;

/// Upgrade into the live-connection hub. The session cookie is resolved
/// before the upgrade; without a valid session the request gets a 401.
pub async fn forum_websocket_handler(
    State(state): State<AppState>,
    session: AuthSession,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.hub.clone();
    let queue_capacity = state.server_config.websocket.send_queue_capacity;
    debug!(user_id = %session.user_id, "Upgrading WebSocket");

    ws.on_upgrade(move |socket| {
        ws::handle_socket(socket, hub, session.user_id, session.token, queue_capacity)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_upgrade_without_cookie_is_unauthorized() {
        let (state, _tmp) = crate::test_helpers::test_app_state().await;
        let app = Router::new()
            .route("/ws", get(forum_websocket_handler))
            .with_state(state);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/ws")
                    .header("connection", "upgrade")
                    .header("upgrade", "websocket")
                    .header("sec-websocket-version", "13")
                    .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upgrade_with_expired_session_is_unauthorized() {
        let (state, _tmp) = crate::test_helpers::test_app_state().await;
        crate::repository::test_helpers::seed_user(&state.repository, "U1", "alice").await;
        crate::repository::test_helpers::seed_session(&state.repository, "old", "U1", -5).await;
        let app = Router::new()
            .route("/ws", get(forum_websocket_handler))
            .with_state(state);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/ws")
                    .header("cookie", "session_id=old")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
