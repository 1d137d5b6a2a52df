mod common;

use axum::http::StatusCode;
use common::{mock_verify_api, setup, unreachable_api};
use serde_json::json;

#[tokio::test]
async fn post_shows_nation_and_renders_markup() {
    let server = setup(mock_verify_api("1").await);
    let (status, _) = server
        .post_json(
            "/api/register",
            json!({"username": "alice", "nation": "Testlandia", "nation_checksum": "abc123"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, post) = server
        .post_json(
            "/api/posts",
            json!({
                "username": "alice",
                "content": "[quote=Bob;42]Hello[/quote]\n\nSee [region]the_north_pacific[/region]",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = post["id"].as_i64().unwrap();

    let (status, view) = server.get_json(&format!("/api/posts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["author"], "alice");
    assert_eq!(
        view["authorInfo"],
        "<a href=\"https://nationstates.net/Testlandia\">Testlandia</a>"
    );

    let html = view["html"].as_str().unwrap();
    assert!(html.starts_with("<blockquote class=\"rmb-quote\">"), "{html}");
    assert!(html.contains("Bob <a href=\"/post/42\">#42</a> wrote:"));
    assert!(html.contains("<div class=\"rmb-quote-text\">Hello</div>"));
    assert!(html.ends_with(
        "<p>See <a href=\"https://www.nationstates.net/region=the_north_pacific\">The North Pacific</a></p>\n"
    ));
}

#[tokio::test]
async fn author_without_nation_has_no_info() {
    let server = setup(unreachable_api());
    server
        .post_json(
            "/api/register",
            json!({"username": "bob", "nation": "Testlandia", "nation_checksum": "abc123"}),
        )
        .await;

    let (_, post) = server
        .post_json("/api/posts", json!({"username": "bob", "content": "hi"}))
        .await;
    let (status, view) = server
        .get_json(&format!("/api/posts/{}", post["id"]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["authorInfo"], "");
    assert_eq!(view["html"], "<p>hi</p>\n");
}

#[tokio::test]
async fn preview_escapes_and_formats() {
    let server = setup(unreachable_api());

    let (status, body) = server
        .post_json(
            "/api/posts/preview",
            json!({"content": "[b]bold[/b] <script>\n[nation]testlandia[/nation]"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["html"],
        "<p><strong>bold</strong> &lt;script&gt;<br />\
         <a href=\"https://www.nationstates.net/nation=testlandia\">Testlandia</a></p>\n"
    );
}

#[tokio::test]
async fn preview_renders_markdown() {
    let server = setup(unreachable_api());

    let (status, body) = server
        .post_json(
            "/api/posts/preview",
            json!({"content": "Vote *aye* on [region]the_north_pacific[/region]\n\n1. first"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["html"],
        "<p>Vote <em>aye</em> on \
         <a href=\"https://www.nationstates.net/region=the_north_pacific\">The North Pacific</a></p>\n\
         <ol>\n<li>first</li>\n</ol>\n"
    );
}

#[tokio::test]
async fn preview_of_unclosed_tags_completes() {
    let server = setup(unreachable_api());
    let content = "[b]".repeat(10_000);

    let (status, body) = server
        .post_json("/api/posts/preview", json!({ "content": content }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html"], format!("<p>{content}</p>\n"));
}

#[tokio::test]
async fn unknown_post_and_user_are_not_found() {
    let server = setup(unreachable_api());

    let (status, _) = server.get_json("/api/posts/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .post_json("/api/posts", json!({"username": "ghost", "content": "hi"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_post_is_a_bad_request() {
    let server = setup(unreachable_api());

    let (status, body) = server
        .post_json("/api/posts", json!({"username": "bob", "content": "   "}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "post content is empty");
}
