//! User lookup.

use crate::api::{with_conn, ApiError};
use crate::AppState;
use axum::extract::{Extension, Json, Path};
use nsbb_types::User;
use std::sync::Arc;

/// Handler for `GET /api/users/{username}`.
pub async fn get_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = with_conn(state, move |_, conn| {
        nsbb_db::get_user_by_username(conn, &username)?
            .ok_or_else(|| ApiError::NotFound(format!("user not found: {}", username)))
    })
    .await?;
    Ok(Json(user))
}
