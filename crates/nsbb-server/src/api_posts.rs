//! Post storage and rendering.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use nsbb_types::Post;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for creating a post.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub username: String,
    pub content: String,
}

/// Request body for a rendering preview.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
}

/// A post as shown to readers.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostView {
    pub id: i64,
    /// Author username.
    pub author: String,
    /// Rendered post body.
    pub html: String,
    /// Plugin decorations for the author, possibly empty.
    #[serde(rename = "authorInfo")]
    pub author_info: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Handler for `POST /api/posts`.
pub async fn create_post_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("post content is empty".to_string()));
    }

    let post = with_conn(state, move |_, conn| {
        let user = nsbb_db::get_user_by_username(conn, &payload.username)?.ok_or_else(|| {
            ApiError::NotFound(format!("user not found: {}", payload.username))
        })?;
        let post = nsbb_db::create_post(conn, user.id, &payload.content)?;
        tracing::debug!(post_id = post.id, user_id = user.id, "created post");
        Ok(post)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for `GET /api/posts/{id}`.
pub async fn get_post_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, ApiError> {
    let view = with_conn(state, move |state, conn| {
        let post = nsbb_db::get_post(conn, id)?;
        let author = nsbb_db::get_user(conn, post.user_id)?;
        let author_info = state.plugins.author_info(conn, &author, &post)?;
        Ok(PostView {
            id: post.id,
            author: author.username,
            html: state.renderer.render(&post.content),
            author_info,
            created_at: post.created_at,
        })
    })
    .await?;
    Ok(Json(view))
}

/// Handler for `POST /api/posts/preview`.
pub async fn preview_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let html = tokio::task::spawn_blocking(move || state.renderer.render(&payload.content))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?;
    Ok(Json(PreviewResponse { html }))
}
