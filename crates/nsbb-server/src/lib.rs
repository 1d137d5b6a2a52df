//! nsbb server library logic.

pub mod api;
pub mod api_posts;
pub mod api_register;
pub mod api_users;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use nsbb_db::DbPool;
use nsbb_markup::PostRenderer;
use nsbb_plugin::PluginRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Installed plugins, in dispatch order.
    pub plugins: Arc<PluginRegistry>,
    /// Post renderer composed from every plugin's markup contributions.
    pub renderer: Arc<PostRenderer>,
}

impl AppState {
    /// Builds the state, composing the renderer from `plugins`.
    pub fn new(pool: DbPool, plugins: PluginRegistry) -> Self {
        let renderer = plugins.post_renderer();
        tracing::debug!(
            rules = ?renderer.parser().rule_names(),
            strategies = ?renderer.strategy_names(),
            "composed post renderer"
        );
        Self {
            pool,
            plugins: Arc::new(plugins),
            renderer: Arc::new(renderer),
        }
    }
}

/// Maximum request body size (256 KiB).
const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", get(api_register::registration_page_handler))
        .route("/api/register", post(api_register::register_handler))
        .route("/api/users/{username}", get(api_users::get_user_handler))
        .route("/api/posts", post(api_posts::create_post_handler))
        .route("/api/posts/preview", post(api_posts::preview_handler))
        .route("/api/posts/{id}", get(api_posts::get_post_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
