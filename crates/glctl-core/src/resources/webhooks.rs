//! Webhooks (regional)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::executor::{Executor, Operation, RunOptions};
use crate::http::ApiRequest;
use crate::resolver::{ApiFamily, Resource, list, target_url};
use crate::resources::{https_url, lookup, required};
use crate::session::SessionContext;
use crate::status::{OperationStatus, PendingStatus, process_each};

pub const WEBHOOKS_PATH: &str = "/compute-ops-mgmt/v1beta1/webhooks";

/// Whether the webhook delivers events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookState {
    #[default]
    Enabled,
    Disabled,
}

impl WebhookState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            WebhookState::Enabled
        } else {
            WebhookState::Disabled
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub event_filter: String,
    #[serde(default)]
    pub state: WebhookState,
    #[serde(default)]
    pub status: Option<String>,
}

impl Resource for Webhook {
    const KIND: &'static str = "Webhook";
    const FAMILY: ApiFamily = ApiFamily::Regional;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn collection_url(session: &SessionContext, region: &str) -> Result<String> {
        session.com_url(region, WEBHOOKS_PATH)
    }
}

/// Body of a webhook creation
#[derive(Debug, Clone, PartialEq)]
pub struct CreateWebhook {
    name: String,
    destination: String,
    event_filter: String,
    state: WebhookState,
}

impl CreateWebhook {
    /// Validates that the destination is an https URL and the other fields are set
    pub fn new(name: &str, destination: &str, event_filter: &str) -> Result<Self> {
        Ok(Self {
            name: required(name, "Webhook name")?,
            destination: https_url(destination, "Webhook destination")?,
            event_filter: required(event_filter, "Event filter")?,
            state: WebhookState::Enabled,
        })
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.state = WebhookState::from_enabled(enabled);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "destination": self.destination,
            "eventFilter": self.event_filter,
            "state": self.state,
        })
    }
}

/// Changes to an existing webhook; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateWebhook {
    new_name: Option<String>,
    destination: Option<String>,
    event_filter: Option<String>,
    state: Option<WebhookState>,
}

impl UpdateWebhook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Result<Self> {
        self.new_name = Some(required(name, "Webhook name")?);
        Ok(self)
    }

    pub fn with_destination(mut self, destination: &str) -> Result<Self> {
        self.destination = Some(https_url(destination, "Webhook destination")?);
        Ok(self)
    }

    pub fn with_event_filter(mut self, event_filter: &str) -> Result<Self> {
        self.event_filter = Some(required(event_filter, "Event filter")?);
        Ok(self)
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.state = Some(WebhookState::from_enabled(enabled));
        self
    }

    /// Merge-patch body
    ///
    /// With a current webhook every updatable field is present, unset ones
    /// backfilled from it. Without one (dry-run) only the supplied fields are sent.
    pub fn to_patch(&self, current: Option<&Webhook>) -> Value {
        let mut body = Map::new();

        let name = self.new_name.clone().or_else(|| current.map(|c| c.name.clone()));
        let destination = self
            .destination
            .clone()
            .or_else(|| current.map(|c| c.destination.clone()));
        let event_filter = self
            .event_filter
            .clone()
            .or_else(|| current.map(|c| c.event_filter.clone()));
        let state = self.state.or_else(|| current.map(|c| c.state));

        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(destination) = destination {
            body.insert("destination".to_string(), json!(destination));
        }
        if let Some(event_filter) = event_filter {
            body.insert("eventFilter".to_string(), json!(event_filter));
        }
        if let Some(state) = state {
            body.insert("state".to_string(), json!(state));
        }

        Value::Object(body)
    }
}

pub async fn list_webhooks(session: &SessionContext, region: &str) -> Result<Vec<Webhook>> {
    list::<Webhook>(session, region).await
}

/// Create a webhook unless one with the same name exists
pub async fn create_webhook(
    session: &SessionContext,
    region: &str,
    request: &CreateWebhook,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let executor = Executor::new(session, options);
    let pending = PendingStatus::new(request.name()).region(region);

    let target = lookup::<Webhook>(&executor, region, request.name()).await?;
    let url = Webhook::collection_url(session, region)?;

    let outcome = executor
        .execute(Operation::create(request.name(), region), target.as_ref(), |_| {
            Ok(ApiRequest::post(url, request.to_json()))
        })
        .await;

    Ok(pending.from_outcome(outcome, "Webhook successfully created in the region!"))
}

/// Update the webhook called `name`
pub async fn update_webhook(
    session: &SessionContext,
    region: &str,
    name: &str,
    changes: &UpdateWebhook,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let executor = Executor::new(session, options);
    let pending = PendingStatus::new(name).region(region);

    let target = lookup::<Webhook>(&executor, region, name).await?;

    let outcome = executor
        .execute(Operation::update(name, region), target.as_ref(), |target| {
            Ok(ApiRequest::patch(
                target_url(session, region, name, target)?,
                changes.to_patch(target.map(|t| &**t)),
            ))
        })
        .await;

    Ok(pending.from_outcome(outcome, "Webhook successfully updated in the region!"))
}

/// Delete webhooks by name, one status per name
pub async fn remove_webhooks(
    session: &SessionContext,
    region: &str,
    names: &[String],
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    let executor = Executor::new(session, options);

    process_each(names, |name| async move {
        let pending = PendingStatus::new(name).region(region);
        let target = lookup::<Webhook>(&executor, region, name).await?;

        let operation = Operation::delete(name, region).confirm_with(format!(
            "Delete webhook '{}' from region '{}'?",
            name, region
        ));

        let outcome = executor
            .execute(operation, target.as_ref(), |target| {
                Ok(ApiRequest::delete(target_url(session, region, name, target)?))
            })
            .await;

        Ok(pending.from_outcome(outcome, "Webhook successfully deleted from the region!"))
    })
    .await
}

/// Ask the platform to send a test event to the webhook's destination
pub async fn test_webhook(
    session: &SessionContext,
    region: &str,
    name: &str,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let executor = Executor::new(session, options);
    let pending = PendingStatus::new(name).region(region);

    let target = lookup::<Webhook>(&executor, region, name).await?;

    let outcome = executor
        .execute(Operation::action("test", name, region), target.as_ref(), |target| {
            Ok(ApiRequest::post_empty(format!(
                "{}/test",
                target_url(session, region, name, target)?
            )))
        })
        .await;

    Ok(pending.from_outcome(outcome, "Test event sent to the webhook destination!"))
}
