//! Invoker and resolver behaviour against a mock server

mod common;

use common::{MockPlatform, REGION, items};
use glctl_core::resolver::resolve;
use glctl_core::resources::webhooks::Webhook;
use glctl_core::{ApiRequest, CoreError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const WEBHOOKS: &str = "/compute-ops-mgmt/v1beta1/webhooks";

fn webhook(name: &str) -> serde_json::Value {
    json!({
        "id": format!("id-{}", name),
        "name": name,
        "destination": "https://example.com/hook",
        "eventFilter": "type eq 'compute-ops/server'",
        "state": "ENABLED"
    })
}

#[tokio::test]
async fn test_sends_bearer_and_accept_headers() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let url = format!("{}/ping", platform.server.uri());
    let response = session
        .client()
        .invoke(&ApiRequest::get(url), false)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["ok"], true);
}

#[tokio::test]
async fn test_last_response_tracks_only_the_latest_call() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Resource not found"})),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/present"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let client = session.client();

    let err = client
        .invoke(
            &ApiRequest::get(format!("{}/missing", platform.server.uri())),
            false,
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match &err {
        CoreError::Remote(remote) => assert_eq!(remote.message, "Resource not found"),
        other => panic!("unexpected error: {other:?}"),
    }

    let last = client.last_response().unwrap();
    assert_eq!(last.status, 404);
    assert!(client.last_error_detail().unwrap().contains("Resource not found"));

    client
        .invoke(
            &ApiRequest::get(format!("{}/present", platform.server.uri())),
            false,
        )
        .await
        .unwrap();
    assert!(client.last_response().is_none());
    assert!(client.last_error_detail().is_none());
}

#[tokio::test]
async fn test_dry_run_never_touches_the_network() {
    let platform = MockPlatform::start().await;
    let session = platform.session();

    let url = format!("{}/webhooks", platform.server.uri());
    let response = session
        .client()
        .invoke(
            &ApiRequest::post(url, json!({"name": "a", "token": "do-not-print"})),
            true,
        )
        .await
        .unwrap();

    assert!(response.is_none());
    assert_eq!(platform.request_count().await, 0);
    let previews = platform.previews();
    assert_eq!(previews.len(), 1);
    assert!(!previews[0].contains("do-not-print"));
    assert!(!previews[0].contains("test-token"));
}

// ============================================================================
// Resolver
// ============================================================================

#[tokio::test]
async fn test_resolve_matches_exact_name_only() {
    let platform = MockPlatform::start().await;

    // A server-side filter that is looser than ours
    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(items(vec![webhook("webhooka"), webhook("WebhookA ")])),
        )
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let found = resolve::<Webhook>(&session, REGION, "WebhookA").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_resolve_returns_handle_with_region() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .and(query_param("filter", "name eq 'O''Brien'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![webhook("O'Brien")])))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let handle = resolve::<Webhook>(&session, REGION, "O'Brien")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(handle.id(), "id-O'Brien");
    assert_eq!(handle.region(), REGION);
    assert_eq!(
        handle.item_url(&session).unwrap(),
        format!("{}{}/id-O'Brien", platform.server.uri(), WEBHOOKS)
    );
}

#[tokio::test]
async fn test_resolve_accepts_bare_array() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([webhook("WebhookA")])))
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let handle = resolve::<Webhook>(&session, REGION, "WebhookA").await.unwrap();
    assert!(handle.is_some());
}
