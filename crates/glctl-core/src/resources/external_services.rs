//! External service integrations (regional)
//!
//! ServiceNow and Data Services Cloud Console integrations. Both authenticate
//! with an OAuth client credential; secrets stay in [`SecretValue`]s until the
//! request body is built.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::config::SecretValue;
use crate::error::{CoreError, Result};
use crate::executor::{Executor, MutationOutcome, Operation, RunOptions};
use crate::http::ApiRequest;
use crate::poller::{PollTarget, await_condition};
use crate::resolver::{ApiFamily, Resource, ResourceHandle, list, resolve, target_url};
use crate::resources::activities::await_activity_after;
use crate::resources::{https_url, lookup, required};
use crate::session::{CachedApiCredential, SessionContext};
use crate::status::{OperationStatus, PendingStatus, process_each};

pub const EXTERNAL_SERVICES_PATH: &str = "/compute-ops-mgmt/v1beta1/external-services";

const ENABLED: &str = "ENABLED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalService {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub authentication_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub service_data: Value,
    #[serde(default)]
    pub resource_uri: Option<String>,
}

impl ExternalService {
    /// URI activities refer to this integration by
    pub fn activity_uri(&self) -> String {
        self.resource_uri
            .clone()
            .unwrap_or_else(|| format!("{}/{}", EXTERNAL_SERVICES_PATH, self.id))
    }

    pub fn is_enabled(&self) -> bool {
        self.status.as_deref() == Some(ENABLED)
    }
}

impl Resource for ExternalService {
    const KIND: &'static str = "External service";
    const FAMILY: ApiFamily = ApiFamily::Regional;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn collection_url(session: &SessionContext, region: &str) -> Result<String> {
        session.com_url(region, EXTERNAL_SERVICES_PATH)
    }
}

/// OAuth client id and secret
#[derive(Debug, Clone, PartialEq)]
pub struct ClientCredential {
    client_id: String,
    client_secret: SecretValue,
}

impl ClientCredential {
    pub fn new(client_id: &str, client_secret: SecretValue) -> Result<Self> {
        let client_id = required(client_id, "Client ID")?;
        if client_secret.is_empty() {
            return Err(CoreError::Validation(
                "Client secret cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            client_id,
            client_secret,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `{"clientId", "clientSecret"}` with the secret revealed
    fn authentication(&self) -> Result<Map<String, Value>> {
        let mut auth = Map::new();
        auth.insert("clientId".to_string(), json!(self.client_id));
        auth.insert(
            "clientSecret".to_string(),
            json!(self.client_secret.reveal()?),
        );
        Ok(auth)
    }
}

impl From<&CachedApiCredential> for ClientCredential {
    fn from(credential: &CachedApiCredential) -> Self {
        Self {
            client_id: credential.client_id.clone(),
            client_secret: credential.client_secret.clone(),
        }
    }
}

/// A ServiceNow incident integration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceNowIntegration {
    name: String,
    description: Option<String>,
    credential: ClientCredential,
    refresh_token: SecretValue,
    oauth_url: String,
    incident_url: String,
    refresh_token_expiry_days: u32,
}

impl ServiceNowIntegration {
    pub fn new(
        name: &str,
        credential: ClientCredential,
        refresh_token: SecretValue,
        oauth_url: &str,
        incident_url: &str,
        refresh_token_expiry_days: u32,
    ) -> Result<Self> {
        if refresh_token.is_empty() {
            return Err(CoreError::Validation(
                "Refresh token cannot be empty".to_string(),
            ));
        }
        if refresh_token_expiry_days == 0 {
            return Err(CoreError::Validation(
                "Refresh token expiry must be at least one day".to_string(),
            ));
        }
        Ok(Self {
            name: required(name, "External service name")?,
            description: None,
            credential,
            refresh_token,
            oauth_url: https_url(oauth_url, "OAuth URL")?,
            incident_url: https_url(incident_url, "Incident URL")?,
            refresh_token_expiry_days,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A Data Services Cloud Console integration
#[derive(Debug, Clone, PartialEq)]
pub struct DsccIntegration {
    name: String,
    description: Option<String>,
    credential: ClientCredential,
    dscc_region: String,
}

impl DsccIntegration {
    pub fn new(name: &str, credential: ClientCredential, dscc_region: &str) -> Result<Self> {
        Ok(Self {
            name: required(name, "External service name")?,
            description: None,
            credential,
            dscc_region: required(dscc_region, "DSCC region")?,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of an external-service creation, one variant per service type
#[derive(Debug, Clone, PartialEq)]
pub enum CreateExternalService {
    ServiceNow(ServiceNowIntegration),
    Dscc(DsccIntegration),
}

impl CreateExternalService {
    pub fn name(&self) -> &str {
        match self {
            CreateExternalService::ServiceNow(s) => &s.name,
            CreateExternalService::Dscc(d) => &d.name,
        }
    }

    /// Wire value of `serviceType`
    pub fn service_type(&self) -> &'static str {
        match self {
            CreateExternalService::ServiceNow(_) => "SERVICE_NOW",
            CreateExternalService::Dscc(_) => "DSCC",
        }
    }

    /// Request body; reveals the secrets it carries
    pub fn to_json(&self) -> Result<Value> {
        let (name, description, auth, service_data) = match self {
            CreateExternalService::ServiceNow(s) => {
                let mut auth = s.credential.authentication()?;
                auth.insert("refreshToken".to_string(), json!(s.refresh_token.reveal()?));
                (
                    &s.name,
                    &s.description,
                    auth,
                    json!({
                        "refreshTokenExpiryInDays": s.refresh_token_expiry_days,
                        "oauthUrl": s.oauth_url,
                        "incidentUrl": s.incident_url,
                    }),
                )
            }
            CreateExternalService::Dscc(d) => (
                &d.name,
                &d.description,
                d.credential.authentication()?,
                json!({ "region": d.dscc_region }),
            ),
        };

        let mut body = json!({
            "name": name,
            "serviceType": self.service_type(),
            "authenticationType": "OAUTH",
            "authentication": auth,
            "serviceData": service_data,
        });
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        Ok(body)
    }
}

impl From<ServiceNowIntegration> for CreateExternalService {
    fn from(integration: ServiceNowIntegration) -> Self {
        CreateExternalService::ServiceNow(integration)
    }
}

impl From<DsccIntegration> for CreateExternalService {
    fn from(integration: DsccIntegration) -> Self {
        CreateExternalService::Dscc(integration)
    }
}

/// Changes to an existing integration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExternalService {
    new_name: Option<String>,
    description: Option<String>,
    credential: Option<ClientCredential>,
}

impl UpdateExternalService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Result<Self> {
        self.new_name = Some(required(name, "External service name")?);
        Ok(self)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_credential(mut self, credential: ClientCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Merge-patch body; name and description are backfilled from `current`
    pub fn to_patch(&self, current: Option<&ExternalService>) -> Result<Value> {
        let mut body = Map::new();

        let name = self.new_name.clone().or_else(|| current.map(|c| c.name.clone()));
        let description = self
            .description
            .clone()
            .or_else(|| current.and_then(|c| c.description.clone()));

        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        if let Some(credential) = &self.credential {
            body.insert(
                "authentication".to_string(),
                Value::Object(credential.authentication()?),
            );
        }

        Ok(Value::Object(body))
    }
}

pub async fn list_external_services(
    session: &SessionContext,
    region: &str,
) -> Result<Vec<ExternalService>> {
    list::<ExternalService>(session, region).await
}

/// Create an integration and wait until it is enabled
///
/// A creation that never reaches `ENABLED` within the session's bound is a
/// [`CoreError::ConvergenceTimeout`].
pub async fn create_external_service(
    session: &SessionContext,
    region: &str,
    request: &CreateExternalService,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let executor = Executor::new(session, options);
    let name = request.name();
    let pending = PendingStatus::new(name)
        .region(region)
        .service_type(request.service_type());

    let target = lookup::<ExternalService>(&executor, region, name).await?;
    let url = ExternalService::collection_url(session, region)?;

    let outcome = executor
        .execute(Operation::create(name, region), target.as_ref(), |_| {
            Ok(ApiRequest::post(url, request.to_json()?))
        })
        .await;

    if !outcome.is_complete() {
        return Ok(pending.from_outcome(outcome, ""));
    }

    let subject = format!("external service '{}'", name);
    await_condition(
        PollTarget {
            resource: &subject,
            region,
        },
        session.polling().external_service_enable,
        || resolve::<ExternalService>(session, region, name),
        |found: &Option<ResourceHandle<ExternalService>>| {
            found.as_ref().is_some_and(|s| s.is_enabled())
        },
        session.progress(),
    )
    .await?;

    info!("External service '{}' is enabled in '{}'", name, region);
    Ok(Some(pending.complete(
        "External service successfully created and enabled in the region!",
    )))
}

/// Update the integration called `name`
pub async fn update_external_service(
    session: &SessionContext,
    region: &str,
    name: &str,
    changes: &UpdateExternalService,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let executor = Executor::new(session, options);
    let target = lookup::<ExternalService>(&executor, region, name).await?;

    let mut pending = PendingStatus::new(name).region(region);
    if let Some(service_type) = target.as_ref().and_then(|t| t.service_type.clone()) {
        pending = pending.service_type(service_type);
    }

    let outcome = executor
        .execute(Operation::update(name, region), target.as_ref(), |target| {
            Ok(ApiRequest::patch(
                target_url(session, region, name, target)?,
                changes.to_patch(target.map(|t| &**t))?,
            ))
        })
        .await;

    Ok(pending.from_outcome(outcome, "External service successfully updated in the region!"))
}

/// Delete integrations by name, one status per name
pub async fn remove_external_services(
    session: &SessionContext,
    region: &str,
    names: &[String],
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    let executor = Executor::new(session, options);

    process_each(names, |name| async move {
        let pending = PendingStatus::new(name).region(region);
        let target = lookup::<ExternalService>(&executor, region, name).await?;

        let operation = Operation::delete(name, region).confirm_with(format!(
            "Delete external service '{}' from region '{}'?",
            name, region
        ));

        let outcome = executor
            .execute(operation, target.as_ref(), |target| {
                Ok(ApiRequest::delete(target_url(session, region, name, target)?))
            })
            .await;

        Ok(pending.from_outcome(
            outcome,
            "External service successfully deleted from the region!",
        ))
    })
    .await
}

/// Trigger a test of the integration and report the activity it produced
pub async fn test_external_service(
    session: &SessionContext,
    region: &str,
    name: &str,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let executor = Executor::new(session, options);
    let target = lookup::<ExternalService>(&executor, region, name).await?;

    let mut pending = PendingStatus::new(name).region(region);
    if let Some(service_type) = target.as_ref().and_then(|t| t.service_type.clone()) {
        pending = pending.service_type(service_type);
    }

    let sent_at = Utc::now();
    let outcome = executor
        .execute(Operation::action("test", name, region), target.as_ref(), |target| {
            Ok(ApiRequest::post_empty(format!(
                "{}/test",
                target_url(session, region, name, target)?
            )))
        })
        .await;

    let (MutationOutcome::Complete(_), Some(service)) = (&outcome, target.as_ref()) else {
        return Ok(pending.from_outcome(outcome, ""));
    };

    let activity = await_activity_after(
        session,
        region,
        &format!("test activity of external service '{}'", name),
        &service.activity_uri(),
        sent_at,
    )
    .await?;

    Ok(Some(pending.complete(activity.formatted_message.unwrap_or_else(
        || "Test completed; the activity carried no message.".to_string(),
    ))))
}
