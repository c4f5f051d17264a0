//! Service provisioning against a mock platform API

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use common::{MockPlatform, REGION, dry_run, forced, items, names, run};
use glctl_core::resources::services::{list_services, provision_services, remove_services};
use glctl_core::{CoreError, Status};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const MANAGERS: &str = "/service-catalog/v1beta1/service-managers";
const PROVISIONS: &str = "/service-catalog/v1beta1/provisions";
const SERVICE: &str = "Compute Ops Management";

fn provision(status: &str) -> Value {
    json!({
        "id": "p-1",
        "name": SERVICE,
        "region": REGION,
        "serviceManagerId": "sm-1",
        "provision_status": status
    })
}

async fn mount_catalogue(platform: &MockPlatform) {
    Mock::given(method("GET"))
        .and(path(MANAGERS))
        .and(query_param("filter", format!("name eq '{}'", SERVICE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(items(vec![json!({"id": "sm-1", "name": SERVICE})])),
        )
        .mount(&platform.server)
        .await;
}

#[tokio::test]
async fn test_provision_waits_until_provisioned() {
    let platform = MockPlatform::start().await;
    mount_catalogue(&platform).await;

    // Initial lookup: not provisioned yet
    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .up_to_n_times(1)
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONING")])),
        )
        .up_to_n_times(2)
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONED")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .and(path(PROVISIONS))
        .and(body_json(json!({"serviceManagerId": "sm-1", "region": REGION})))
        .respond_with(ResponseTemplate::new(202).set_body_json(provision("PROVISIONING")))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let statuses = provision_services(&session, REGION, &names(&[SERVICE]), run())
        .await
        .unwrap();

    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].status(), Status::Complete);
    assert_eq!(
        statuses[0].details(),
        "Service successfully provisioned in the region!"
    );
    // One lookup, two PROVISIONING polls, one PROVISIONED poll
    let provision_reads = platform
        .requests("GET")
        .await
        .into_iter()
        .filter(|r| r.url.path() == PROVISIONS)
        .count();
    assert_eq!(provision_reads, 4);
}

#[tokio::test]
async fn test_provision_times_out_after_max_attempts() {
    let platform = MockPlatform::start().await;
    mount_catalogue(&platform).await;

    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .up_to_n_times(1)
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONING")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .and(path(PROVISIONS))
        .respond_with(ResponseTemplate::new(202))
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let err = provision_services(&session, REGION, &names(&[SERVICE]), run())
        .await
        .unwrap_err();

    match &err {
        CoreError::ConvergenceTimeout {
            resource,
            region,
            attempts,
        } => {
            assert!(resource.contains(SERVICE));
            assert_eq!(region, REGION);
            assert_eq!(*attempts, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_fatal());

    let provision_reads = platform
        .requests("GET")
        .await
        .into_iter()
        .filter(|r| r.url.path() == PROVISIONS)
        .count();
    assert_eq!(provision_reads, 1 + 10);
}

#[tokio::test]
async fn test_unknown_service_is_failed_without_post() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(MANAGERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![])))
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let statuses = provision_services(&session, REGION, &names(&["Unknown"]), run())
        .await
        .unwrap();

    assert_eq!(statuses[0].status(), Status::Failed);
    assert_eq!(
        statuses[0].details(),
        "Service 'Unknown' cannot be found in the region!"
    );
}

#[tokio::test]
async fn test_already_provisioned_is_warning() {
    let platform = MockPlatform::start().await;
    mount_catalogue(&platform).await;

    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONED")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let statuses = provision_services(&session, REGION, &names(&[SERVICE]), run())
        .await
        .unwrap();
    assert_eq!(statuses[0].status(), Status::Warning);
}

#[tokio::test]
async fn test_provision_in_other_region_does_not_match() {
    let platform = MockPlatform::start().await;
    mount_catalogue(&platform).await;

    let mut elsewhere = provision("PROVISIONED");
    elsewhere["region"] = json!("us-west");

    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(vec![elsewhere])))
        .up_to_n_times(1)
        .mount(&platform.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONED")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("POST"))
        .and(path(PROVISIONS))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform.session();
    let statuses = provision_services(&session, REGION, &names(&[SERVICE]), run())
        .await
        .unwrap();
    assert_eq!(statuses[0].status(), Status::Complete);
}

// ============================================================================
// Removal and confirmation
// ============================================================================

#[tokio::test]
async fn test_remove_declined_sends_no_delete() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONED")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&platform.server)
        .await;

    let prompts = Arc::new(AtomicU32::new(0));
    let counter = prompts.clone();
    let session = platform.session().with_confirm(Box::new(move |prompt| {
        assert!(prompt.contains(SERVICE));
        counter.fetch_add(1, Ordering::SeqCst);
        false
    }));

    let statuses = remove_services(&session, REGION, &names(&[SERVICE]), run())
        .await
        .unwrap();

    assert_eq!(statuses[0].status(), Status::Warning);
    assert_eq!(statuses[0].details(), "Operation cancelled by the user.");
    assert_eq!(prompts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_forced_remove_skips_confirmation() {
    let platform = MockPlatform::start().await;

    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(items(vec![provision("PROVISIONED")])),
        )
        .mount(&platform.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/p-1", PROVISIONS)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&platform.server)
        .await;

    let session = platform
        .session()
        .with_confirm(Box::new(|_| panic!("confirmation must be skipped")));

    let statuses = remove_services(&session, REGION, &names(&[SERVICE]), forced())
        .await
        .unwrap();
    assert_eq!(statuses[0].status(), Status::Complete);
}

#[tokio::test]
async fn test_dry_run_provision_previews_placeholder() {
    let platform = MockPlatform::start().await;
    let session = platform.session();

    let statuses = provision_services(&session, REGION, &names(&[SERVICE]), dry_run())
        .await
        .unwrap();

    assert!(statuses.is_empty());
    assert_eq!(platform.request_count().await, 0);
    let previews = platform.previews();
    assert_eq!(previews.len(), 1);
    assert!(previews[0].contains("<service-id:Compute Ops Management>"));
}

#[tokio::test]
async fn test_list_filters_by_region() {
    let platform = MockPlatform::start().await;

    let mut elsewhere = provision("PROVISIONED");
    elsewhere["region"] = json!("us-west");
    Mock::given(method("GET"))
        .and(path(PROVISIONS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(items(vec![provision("PROVISIONED"), elsewhere])),
        )
        .mount(&platform.server)
        .await;

    let session = platform.session();
    assert_eq!(list_services(&session, None).await.unwrap().len(), 2);
    let local = list_services(&session, Some(REGION)).await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].region, REGION);
}
