//! Webhook commands against a mock regional API

mod common;

use common::{MockPlatform, REGION, dry_run, items, names, run};
use glctl_core::resources::webhooks::{
    CreateWebhook, UpdateWebhook, create_webhook, remove_webhooks, test_webhook, update_webhook,
};
use glctl_core::{CoreError, Status};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const WEBHOOKS: &str = "/compute-ops-mgmt/v1beta1/webhooks";

fn webhook(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "destination": "https://example.com/hook",
        "eventFilter": "type eq 'compute-ops/server'",
        "state": "ENABLED",
        "status": "ACTIVE"
    })
}

fn create_request() -> CreateWebhook {
    CreateWebhook::new(
        "WebhookA",
        "https://example.com/hook",
        "type eq 'compute-ops/server'",
    )
    .unwrap()
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_twice_is_complete_then_warning() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .and(query_param("filter", "name eq 'WebhookA'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .up_to_n_times(1)
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .and(query_param("filter", "name eq 'WebhookA'"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![webhook("wh-1", "WebhookA")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .and(path(WEBHOOKS))
        .and(body_json(json!({
            "name": "WebhookA",
            "destination": "https://example.com/hook",
            "eventFilter": "type eq 'compute-ops/server'",
            "state": "ENABLED"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(webhook("wh-1", "WebhookA")))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let request = create_request();

    let first = create_webhook(&session, REGION, &request, run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.status(), Status::Complete);
    assert_eq!(first.region(), Some(REGION));

    let second = create_webhook(&session, REGION, &request, run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status(), Status::Warning);
    assert_eq!(
        second.details(),
        "Webhook 'WebhookA' already exists in the region! No action needed."
    );

    assert_eq!(platform.requests("POST").await.len(), 1);
}

#[tokio::test]
async fn test_create_remote_error_is_failed_with_raw_detail() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .and(path(WEBHOOKS))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Destination is not reachable"})),
        )
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let status = create_webhook(&session, REGION, &create_request(), run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.status(), Status::Failed);
    assert_eq!(status.details(), "Webhook 'WebhookA' cannot be created!");
    assert!(
        status
            .exception()
            .unwrap()
            .contains("Destination is not reachable")
    );
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_sends_backfilled_merge_patch() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![webhook("wh-1", "WebhookA")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{}/wh-1", WEBHOOKS)))
        .and(header("content-type", "application/merge-patch+json"))
        .and(body_json(json!({
            "name": "WebhookA",
            "destination": "https://example.com/new-hook",
            "eventFilter": "type eq 'compute-ops/server'",
            "state": "ENABLED"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(webhook("wh-1", "WebhookA")))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let changes = UpdateWebhook::new()
        .with_destination("https://example.com/new-hook")
        .unwrap();

    let status = update_webhook(&session, REGION, "WebhookA", &changes, run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status(), Status::Complete);
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn test_remove_missing_sends_no_delete() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .and(query_param("filter", "name eq 'WebhookA'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .and(query_param("filter", "name eq 'WebhookB'"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![webhook("wh-2", "WebhookB")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/wh-2", WEBHOOKS)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let statuses = remove_webhooks(&session, REGION, &names(&["WebhookA", "WebhookB"]), run())
        .await
        .unwrap();

    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].name(), "WebhookA");
    assert_eq!(statuses[0].status(), Status::Failed);
    assert_eq!(
        statuses[0].details(),
        "Webhook 'WebhookA' cannot be found in the region!"
    );
    assert_eq!(statuses[1].name(), "WebhookB");
    assert_eq!(statuses[1].status(), Status::Complete);

    assert_eq!(platform.requests("DELETE").await.len(), 1);
}

#[tokio::test]
async fn test_declined_remove_is_warning() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![webhook("wh-1", "WebhookA")])),
        )
        .mount(&platform.server)
        .await;

    let session = platform.session().with_confirm(Box::new(|prompt| {
        assert_eq!(prompt, "Delete webhook 'WebhookA' from region 'eu-central'?");
        false
    }));
    let statuses = remove_webhooks(&session, REGION, &names(&["WebhookA"]), run())
        .await
        .unwrap();

    assert_eq!(statuses[0].status(), Status::Warning);
    assert_eq!(statuses[0].details(), "Operation cancelled by the user.");
    assert!(platform.requests("DELETE").await.is_empty());
}

#[tokio::test]
async fn test_forbidden_delete_reports_remediation() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![webhook("wh-1", "WebhookA")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/wh-1", WEBHOOKS)))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "Insufficient privileges"})),
        )
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let statuses = remove_webhooks(&session, REGION, &names(&["WebhookA"]), run())
        .await
        .unwrap();

    assert_eq!(statuses[0].status(), Status::Failed);
    assert!(
        statuses[0]
            .details()
            .starts_with("Permission denied (HTTP 403) while trying to delete webhook 'WebhookA'.")
    );
    assert!(
        statuses[0]
            .exception()
            .unwrap()
            .contains("Insufficient privileges")
    );
}

#[tokio::test]
async fn test_failed_lookup_aborts_batch() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .respond_with(ResponseTemplate::new(500))
        .mount(&platform.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let err = remove_webhooks(&session, REGION, &names(&["WebhookA", "WebhookB"]), run())
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, CoreError::Resolution { .. }));
    assert_eq!(err.status(), Some(500));
    // The second name is never looked up
    assert_eq!(platform.requests("GET").await.len(), 1);
}

// ============================================================================
// Test
// ============================================================================

#[tokio::test]
async fn test_test_action_posts_to_the_resolved_webhook() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(WEBHOOKS))
        .and(query_param("filter", "name eq 'WebhookA'"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![webhook("wh-1", "WebhookA")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/wh-1/test", WEBHOOKS)))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let status = test_webhook(&session, REGION, "WebhookA", run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.name(), "WebhookA");
    assert_eq!(status.status(), Status::Complete);
    assert_eq!(
        status.details(),
        "Test event sent to the webhook destination!"
    );

    let posts = platform.requests("POST").await;
    assert_eq!(posts.len(), 1);
    assert!(posts[0].body.is_empty());
}

// ============================================================================
// Dry run
// ============================================================================

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let platform = MockPlatform::start().await;
    let session = platform.session();

    let created = create_webhook(&session, REGION, &create_request(), dry_run())
        .await
        .unwrap();
    assert!(created.is_none());

    let changes = UpdateWebhook::new().with_enabled(false);
    let updated = update_webhook(&session, REGION, "WebhookA", &changes, dry_run())
        .await
        .unwrap();
    assert!(updated.is_none());

    let removed = remove_webhooks(&session, REGION, &names(&["WebhookA"]), dry_run())
        .await
        .unwrap();
    assert!(removed.is_empty());

    let tested = test_webhook(&session, REGION, "WebhookA", dry_run())
        .await
        .unwrap();
    assert!(tested.is_none());

    assert_eq!(platform.request_count().await, 0);

    let previews = platform.previews();
    assert_eq!(previews.len(), 4);
    assert!(previews[0].contains("-X POST"));
    assert!(previews[1].contains("-X PATCH"));
    assert!(previews[1].contains("<webhook-id:WebhookA>"));
    assert!(previews[1].contains(r#"{"state":"DISABLED"}"#));
    assert!(previews[2].contains("-X DELETE"));
    assert!(previews[3].contains("<webhook-id:WebhookA>/test"));
    assert!(previews.iter().all(|p| !p.contains("test-token")));
}
