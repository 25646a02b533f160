use axum::{Json, extract::State, http::StatusCode};

use crate::AppState;
use crate::auth::AuthSession;
use crate::models::OnlineUser;

pub async fn online_users_handler(
    State(state): State<AppState>,
    _session: AuthSession,
) -> Result<Json<Vec<OnlineUser>>, (StatusCode, String)> {
    match state.repository.get_online_users().await {
        Ok(users) => Ok(Json(users)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
