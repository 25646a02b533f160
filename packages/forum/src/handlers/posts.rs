use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::AppState;
use crate::auth::AuthSession;
use crate::models::{CreatePostRequest, Post};

pub async fn list_posts_handler(
    State(state): State<AppState>,
    _session: AuthSession,
) -> Result<Json<Vec<Post>>, (StatusCode, String)> {
    match state.repository.list_posts().await {
        Ok(posts) => Ok(Json(posts)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// Create a post, then push it to every live connection.
pub async fn create_post_handler(
    State(state): State<AppState>,
    session: AuthSession,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), (StatusCode, String)> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "title and content are required".to_string(),
        ));
    }

    let post = state
        .repository
        .create_post(&session.user_id, &req)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    info!(post_id = %post.id, user_id = %session.user_id, "Post created");
    state.hub.broadcast_new_post(post.clone()).await;

    Ok((StatusCode::CREATED, Json(post)))
}
