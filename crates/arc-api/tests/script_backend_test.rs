#![allow(clippy::unwrap_used)]
// Integration tests for `ScriptBackend` + `RpcClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arc_api::{Error, RpcClient, ScriptBackend, ServerResponse, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RpcClient) {
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}/exec", server.uri())).unwrap();
    let backend = ScriptBackend::with_client(reqwest::Client::new(), url);
    (server, RpcClient::new(backend))
}

// ── Envelope handling ───────────────────────────────────────────────

#[tokio::test]
async fn test_retrieve_all_posts_argument_list() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .and(body_json(json!(["tutors", "retrieveAll"])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "val": { "1": { "id": 1, "date": 10, "firstName": "Ada" } },
            "message": null
        })))
        .mount(&server)
        .await;

    let resp = client
        .ask(vec![json!("tutors"), json!("retrieveAll")])
        .await;

    assert!(!resp.error);
    assert_eq!(resp.val["1"]["firstName"], json!("Ada"));
}

#[tokio::test]
async fn test_string_encoded_envelope() {
    let (server, client) = setup().await;

    let inner = r#"{"error":false,"val":{"id":1000,"date":5},"message":null}"#;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(inner)))
        .mount(&server)
        .await;

    let resp = client
        .ask(vec![json!("tutors"), json!("create"), json!({"id": -1, "date": -1})])
        .await;

    assert_eq!(resp.val, json!({"id": 1000, "date": 5}));
}

#[tokio::test]
async fn test_server_error_envelope_passes_through() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": true,
            "val": null,
            "message": "id 9 not found"
        })))
        .mount(&server)
        .await;

    let resp = client.ask(vec![json!("tutors"), json!("delete"), json!(9)]).await;
    assert_eq!(resp, ServerResponse::failure("id 9 not found"));
}

// ── Failure normalization ───────────────────────────────────────────

#[tokio::test]
async fn test_http_error_becomes_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Script function failed"))
        .mount(&server)
        .await;

    let resp = client.ask(vec![json!("debug")]).await;
    assert!(resp.error);
    assert_eq!(
        resp.message.as_deref(),
        Some("HTTP 500: Script function failed")
    );

    let err = client.try_ask(vec![json!("debug")]).await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 500, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_non_json_body_becomes_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
        .mount(&server)
        .await;

    let err = client.try_ask(vec![json!("debug")]).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");

    let resp = client.ask(vec![json!("debug")]).await;
    assert!(resp.error);
    assert!(resp.message.unwrap().starts_with("Deserialization error"));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let (server, client) = setup().await;
    let client = client.with_timeout(Duration::from_millis(100));

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error": false, "val": null, "message": null}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let resp = client.ask(vec![json!("debug")]).await;
    assert_eq!(resp, ServerResponse::failure("Server is not responding"));
}

#[tokio::test]
async fn test_connection_refused_becomes_envelope() {
    // Bind then drop a server so the port is closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let backend = ScriptBackend::with_client(
        reqwest::Client::new(),
        Url::parse(&format!("{uri}/exec")).unwrap(),
    );
    let client = RpcClient::new(backend);

    let resp = client.ask(vec![json!("debug")]).await;
    assert!(resp.error);
    assert!(resp.message.unwrap().starts_with("HTTP transport error"));
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_access_token_sent_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "val": "pong",
            "message": null
        })))
        .mount(&server)
        .await;

    let transport =
        TransportConfig::default().with_access_token(SecretString::from("s3cret".to_string()));
    let backend = ScriptBackend::new(
        Url::parse(&format!("{}/exec", server.uri())).unwrap(),
        &transport,
    )
    .unwrap();
    let client = RpcClient::new(backend);

    let resp = client.command("ping").await;
    assert_eq!(resp.val, json!("pong"));
}
