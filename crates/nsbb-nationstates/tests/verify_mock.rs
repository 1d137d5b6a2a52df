//! Registration-form validation against a local stand-in for the
//! NationStates verification API.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use nsbb_nationstates::fields::{CODE_INCORRECT, NATION_FIELD, USERNAME_FIELD};
use nsbb_nationstates::{NationStatesConfig, NationStatesPlugin, NsApiClient};
use nsbb_plugin::{FormField, ForumPlugin, RegistrationForm};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct MockApi {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    seen: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockApi {
    fn answering(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
            seen: Arc::default(),
        }
    }
}

async fn api_handler(
    State(api): State<MockApi>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    api.seen.lock().unwrap().push(params);
    if !api.delay.is_zero() {
        tokio::time::sleep(api.delay).await;
    }
    (api.status, api.body)
}

/// Serves `api` on an ephemeral port and returns the endpoint URL.
async fn serve(api: MockApi) -> String {
    let app = Router::new()
        .route("/cgi-bin/api.cgi", get(api_handler))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/cgi-bin/api.cgi")
}

fn plugin_for(api_url: String, timeout: Duration) -> NationStatesPlugin {
    let config = NationStatesConfig {
        api_url,
        ..NationStatesConfig::default()
    };
    let client = NsApiClient::new(&config.api_url, &config.user_agent, timeout).unwrap();
    NationStatesPlugin::with_client(config, client)
}

async fn submit(plugin: &NationStatesPlugin, nation: &str, checksum: &str) -> RegistrationForm {
    let mut form = RegistrationForm::new();
    form.add_field(FormField::new(USERNAME_FIELD, "Username"));
    plugin.extend_registration_form(&mut form);
    form.fill(&HashMap::from([
        (USERNAME_FIELD.to_string(), "alice".to_string()),
        (NATION_FIELD.to_string(), nation.to_string()),
        ("nation_checksum".to_string(), checksum.to_string()),
    ]));
    form.validate().await;
    form
}

#[tokio::test]
async fn verified_code_records_nation() {
    let api = MockApi::answering("1\n");
    let seen = api.seen.clone();
    let plugin = plugin_for(serve(api).await, Duration::from_secs(5));

    let form = submit(&plugin, "Testlandia", "abc123").await;

    assert!(form.is_valid(), "{:?}", form.errors());
    assert_eq!(
        plugin.pending().get("alice", form.submission()),
        Some(Some("Testlandia".to_string()))
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["a"], "verify");
    assert_eq!(seen[0]["nation"], "Testlandia");
    assert_eq!(seen[0]["checksum"], "abc123");
}

#[tokio::test]
async fn nation_with_spaces_is_sent_decoded() {
    let api = MockApi::answering("1");
    let seen = api.seen.clone();
    let plugin = plugin_for(serve(api).await, Duration::from_secs(5));

    let form = submit(&plugin, "The Far-Away Isles", "abc123").await;

    assert!(form.is_valid());
    assert_eq!(seen.lock().unwrap()[0]["nation"], "The Far-Away Isles");
}

#[tokio::test]
async fn rejected_code_fails_checksum_field() {
    let plugin = plugin_for(serve(MockApi::answering("0")).await, Duration::from_secs(5));

    let form = submit(&plugin, "Testlandia", "wrong").await;

    assert!(!form.is_valid());
    let errors = form.errors();
    assert_eq!(errors["nation_checksum"], [CODE_INCORRECT]);
    assert!(!errors.contains_key(NATION_FIELD));
    assert_eq!(plugin.pending().get("alice", form.submission()), None);
}

async fn assert_soft_failure(plugin: NationStatesPlugin) {
    let form = submit(&plugin, "Testlandia", "abc123").await;
    assert!(form.is_valid(), "{:?}", form.errors());
    assert_eq!(plugin.pending().get("alice", form.submission()), Some(None));
}

#[tokio::test]
async fn server_error_registers_without_nation() {
    let api = MockApi {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        ..MockApi::answering("oops")
    };
    assert_soft_failure(plugin_for(serve(api).await, Duration::from_secs(5))).await;
}

#[tokio::test]
async fn unparseable_body_registers_without_nation() {
    let api = MockApi::answering("<html>maintenance</html>");
    assert_soft_failure(plugin_for(serve(api).await, Duration::from_secs(5))).await;
}

#[tokio::test]
async fn timeout_registers_without_nation() {
    let api = MockApi {
        delay: Duration::from_secs(2),
        ..MockApi::answering("1")
    };
    assert_soft_failure(plugin_for(serve(api).await, Duration::from_millis(200))).await;
}

#[tokio::test]
async fn unreachable_api_registers_without_nation() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/cgi-bin/api.cgi");
    assert_soft_failure(plugin_for(url, Duration::from_secs(5))).await;
}

#[tokio::test]
async fn concurrent_submissions_keep_separate_outcomes() {
    let plugin = plugin_for(serve(MockApi::answering("1")).await, Duration::from_secs(5));

    let first = submit(&plugin, "Testlandia", "abc123").await;
    let second = submit(&plugin, "Nova Terra", "def456").await;

    assert_eq!(plugin.pending().len(), 2);
    assert_eq!(
        plugin.pending().get("alice", first.submission()),
        Some(Some("Testlandia".to_string()))
    );
    assert_eq!(
        plugin.pending().get("alice", second.submission()),
        Some(Some("Nova Terra".to_string()))
    );
}

#[tokio::test]
async fn revalidating_a_form_replaces_its_outcome() {
    let plugin = plugin_for(serve(MockApi::answering("1")).await, Duration::from_secs(5));

    let mut form = submit(&plugin, "Testlandia", "abc123").await;
    form.fill(&HashMap::from([
        (USERNAME_FIELD.to_string(), "alice".to_string()),
        (NATION_FIELD.to_string(), "Nova Terra".to_string()),
        ("nation_checksum".to_string(), "def456".to_string()),
    ]));
    assert!(form.validate().await);

    assert_eq!(plugin.pending().len(), 1);
    assert_eq!(
        plugin.pending().get("alice", form.submission()),
        Some(Some("Nova Terra".to_string()))
    );
}
