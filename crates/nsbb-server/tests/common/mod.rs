#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Query,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use nsbb_db::{open_pool, DbPool, DEFAULT_MAX_CONNECTIONS};
use nsbb_nationstates::{NationStatesConfig, NationStatesPlugin};
use nsbb_plugin::{ForumPlugin, PluginRegistry};
use nsbb_server::{app, AppState};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestServer {
    pub app: Router,
    pub pool: DbPool,
    _dir: TempDir,
}

/// Serves a stand-in verification API answering every request with `body`.
pub async fn mock_verify_api(body: &'static str) -> String {
    let router = Router::new().route(
        "/cgi-bin/api.cgi",
        get(move |Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("a").map(String::as_str), Some("verify"));
            body
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/cgi-bin/api.cgi")
}

/// An API URL nothing listens on.
pub fn unreachable_api() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/cgi-bin/api.cgi")
}

pub fn nationstates_plugin(api_url: String) -> Arc<dyn ForumPlugin> {
    let config = NationStatesConfig {
        api_url,
        timeout_secs: 2,
        ..NationStatesConfig::default()
    };
    Arc::new(NationStatesPlugin::new(config).unwrap())
}

pub fn setup_with(plugins: PluginRegistry) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forum.db");
    let pool = open_pool(path.to_str().unwrap(), DEFAULT_MAX_CONNECTIONS).unwrap();
    {
        let conn = pool.get().unwrap();
        nsbb_db::run_migrations(&conn).unwrap();
        plugins.run_migrations(&conn).unwrap();
    }
    TestServer {
        app: app(AppState::new(pool.clone(), plugins)),
        pool,
        _dir: dir,
    }
}

pub fn setup(api_url: String) -> TestServer {
    setup_with(PluginRegistry::new().with_plugin(nationstates_plugin(api_url)))
}

impl TestServer {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    pub async fn post_json(&self, uri: &str, payload: Value) -> (StatusCode, Value) {
        let (status, body) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    pub fn nation_of(&self, username: &str) -> Option<String> {
        let conn = self.pool.get().unwrap();
        let user = nsbb_db::get_user_by_username(&conn, username)
            .unwrap()
            .unwrap();
        nsbb_nationstates::store::user_nation(&conn, user.id).unwrap()
    }
}
