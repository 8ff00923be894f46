//! GraphQL probe tests against a mock instance.

use std::collections::HashMap;

use tether_core::probe::{ClientConfig, GraphQlProbe, ProbeClient, ProbeErrorKind};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn probe_for(server: &MockServer, token: &str) -> GraphQlProbe {
    GraphQlProbe::new(ClientConfig {
        endpoint: server.uri(),
        token: Some(token.to_string()),
        custom_headers: HashMap::new(),
    })
}

#[tokio::test]
async fn test_site_assist_status_parses_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .and(header("Authorization", "token tok123"))
        .and(body_string_contains("SiteAssistStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "site": { "productVersion": "5.0.4", "isAssistEnabled": true } }
        })))
        .mount(&server)
        .await;

    let status = probe_for(&server, "tok123").site_assist_status().await;
    assert!(status.enabled);
    assert_eq!(status.version, "5.0.4");
}

#[tokio::test]
async fn test_site_assist_status_degrades_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let status = probe_for(&server, "tok123").site_assist_status().await;
    assert!(!status.enabled);
    assert!(status.version.is_empty());
}

#[tokio::test]
async fn test_current_user_id_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .and(body_string_contains("CurrentUser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "currentUser": { "id": "VXNlcjox" } }
        })))
        .mount(&server)
        .await;

    let id = probe_for(&server, "tok123").current_user_id().await.unwrap();
    assert_eq!(id, "VXNlcjox");
}

#[tokio::test]
async fn test_current_user_id_null_user_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "currentUser": null }
        })))
        .mount(&server)
        .await;

    let err = probe_for(&server, "bad-token")
        .current_user_id()
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProbeErrorKind::GraphQl);
}

#[tokio::test]
async fn test_current_user_info_reads_verified_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .and(body_string_contains("CurrentUserInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "currentUser": { "id": "VXNlcjox", "hasVerifiedEmail": true } }
        })))
        .mount(&server)
        .await;

    let info = probe_for(&server, "tok123")
        .current_user_info()
        .await
        .unwrap();
    assert_eq!(info.id, "VXNlcjox");
    assert!(info.has_verified_email);
}

#[tokio::test]
async fn test_graphql_errors_surface_with_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": null,
            "errors": [ { "message": "token expired" } ]
        })))
        .mount(&server)
        .await;

    let err = probe_for(&server, "tok123")
        .current_user_info()
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProbeErrorKind::GraphQl);
    assert_eq!(err.to_string(), "token expired");
}

#[tokio::test]
async fn test_http_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = probe_for(&server, "tok123")
        .current_user_id()
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProbeErrorKind::HttpStatus);
    assert_eq!(err.message, "HTTP 401");
    assert_eq!(err.details.as_deref(), Some("unauthorized"));
}

#[tokio::test]
async fn test_custom_headers_are_attached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/.api/graphql"))
        .and(header("X-Corp-Proxy", "token-for-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "currentUser": { "id": "VXNlcjox" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut custom_headers = HashMap::new();
    custom_headers.insert("X-Corp-Proxy".to_string(), "token-for-proxy".to_string());
    let probe = GraphQlProbe::new(ClientConfig {
        endpoint: server.uri(),
        token: Some("tok123".to_string()),
        custom_headers,
    });

    probe.current_user_id().await.unwrap();
}
