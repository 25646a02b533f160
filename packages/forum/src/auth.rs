//! Session-cookie authentication for HTTP routes and the WebSocket upgrade.
//!
//! Sessions are created by the login flow; this module only resolves the
//! cookie to a user id through the injected `IdentityResolver`.

use axum::{
    Json,
    extract::FromRef,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::error;

use crate::config::AuthConfig;
use crate::ws::IdentityResolver;

// =============================================================================
// Auth Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    MissingSession,
    #[error("invalid or expired session")]
    InvalidSession,
    #[error("session lookup failed")]
    Unavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingSession | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

// =============================================================================
// Auth State
// =============================================================================

#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<dyn IdentityResolver>,
    pub auth_config: Arc<AuthConfig>,
}

// =============================================================================
// Axum Extractors
// =============================================================================

/// An authenticated caller: the session token from the cookie and the user it
/// resolved to. Resolved once per request; expiry is checked at that moment.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub token: String,
}

/// Pull the session token out of the request's cookies.
fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

impl<S> axum::extract::FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let token =
            session_token(parts, &auth.auth_config.cookie_name).ok_or(AuthError::MissingSession)?;

        match auth.resolver.resolve(&token).await {
            Ok(Some(user_id)) => Ok(AuthSession { user_id, token }),
            Ok(None) => Err(AuthError::InvalidSession),
            Err(e) => {
                error!("Session lookup failed: {:#}", e);
                Err(AuthError::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_helpers;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn whoami(session: AuthSession) -> String {
        session.user_id
    }

    async fn app() -> Router {
        let repo = test_helpers::test_repository().await;
        test_helpers::seed_user(&repo, "U1", "alice").await;
        test_helpers::seed_session(&repo, "tok1", "U1", 3600).await;
        test_helpers::seed_session(&repo, "stale", "U1", -60).await;

        let state = AuthState {
            resolver: Arc::new(repo),
            auth_config: Arc::new(AuthConfig::default()),
        };
        Router::new().route("/whoami", get(whoami)).with_state(state)
    }

    async fn call(cookie: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri("/whoami");
        if let Some(c) = cookie {
            req = req.header("cookie", c);
        }
        let resp = app()
            .await
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_user() {
        let (status, body) = call(Some("theme=dark; session_id=tok1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "U1");
    }

    #[tokio::test]
    async fn test_missing_cookie_rejected() {
        let (status, body) = call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "not authenticated");
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let (status, _) = call(Some("session_id=nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let (status, body) = call(Some("session_id=stale")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("expired"));
    }

    #[tokio::test]
    async fn test_empty_cookie_rejected() {
        let (status, _) = call(Some("session_id=")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingSession.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
