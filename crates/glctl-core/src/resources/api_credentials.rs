//! API credentials (platform)
//!
//! Creating a credential is the only moment its client secret is returned, so
//! the new credential is kept in the session's cache for later use (for example
//! as the credential of a DSCC integration). A cached credential counts as in use:
//! removing it asks for confirmation unless forced.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::SecretValue;
use crate::error::Result;
use crate::executor::{Executor, MutationOutcome, Operation, RunOptions};
use crate::http::ApiRequest;
use crate::resolver::{ApiFamily, Resource, list, target_url};
use crate::resources::{lookup, required};
use crate::session::{CachedApiCredential, SessionContext};
use crate::status::{OperationStatus, PendingStatus, StatusAggregator};

pub const API_CREDENTIALS_PATH: &str = "/authn/v1beta1/api-credentials";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredential {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Resource for ApiCredential {
    const KIND: &'static str = "API credential";
    const FAMILY: ApiFamily = ApiFamily::Platform;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn collection_url(session: &SessionContext, _region: &str) -> Result<String> {
        Ok(session.glp_url(API_CREDENTIALS_PATH))
    }
}

/// Body of an API credential creation
#[derive(Debug, Clone, PartialEq)]
pub struct CreateApiCredential {
    name: String,
    service_name: String,
    region: String,
}

impl CreateApiCredential {
    pub fn new(name: &str, service_name: &str, region: &str) -> Result<Self> {
        Ok(Self {
            name: required(name, "API credential name")?,
            service_name: required(service_name, "Service name")?,
            region: required(region, "Region")?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "serviceName": self.service_name,
            "region": self.region,
        })
    }
}

pub async fn list_api_credentials(session: &SessionContext) -> Result<Vec<ApiCredential>> {
    list::<ApiCredential>(session, "").await
}

/// Create a credential and cache its client id and secret in the session
pub async fn create_api_credential(
    session: &mut SessionContext,
    request: &CreateApiCredential,
    options: RunOptions,
) -> Result<Option<OperationStatus>> {
    let region = request.region.as_str();
    session.ensure_region(region)?;
    let pending = PendingStatus::new(request.name()).region(region);

    let outcome = {
        let executor = Executor::new(session, options);
        let target = lookup::<ApiCredential>(&executor, region, request.name()).await?;
        let url = ApiCredential::collection_url(session, region)?;

        executor
            .execute(Operation::create(request.name(), region), target.as_ref(), |_| {
                Ok(ApiRequest::post(url, request.to_json()))
            })
            .await
    };

    let MutationOutcome::Complete(response) = outcome else {
        return Ok(pending.from_outcome(outcome, ""));
    };

    let client_id = response.body.get("clientId").and_then(Value::as_str);
    let client_secret = response.body.get("clientSecret").and_then(Value::as_str);

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => {
            session.cache_api_credential(CachedApiCredential {
                name: request.name.clone(),
                region: request.region.clone(),
                service_name: request.service_name.clone(),
                client_id: client_id.to_string(),
                client_secret: SecretValue::new(client_secret),
            });
            info!("API credential '{}' cached for this session", request.name);
            Ok(Some(pending.complete(format!(
                "API credential successfully created! Client ID: {}",
                client_id
            ))))
        }
        _ => {
            warn!(
                "API credential '{}' was created but the response carried no client secret",
                request.name
            );
            Ok(Some(pending.warning(
                "API credential created, but no client secret was returned; it cannot be used from this session.",
            )))
        }
    }
}

/// Delete credentials by name
///
/// A credential cached by this session is confirmed before removal unless
/// forced, and dropped from the cache once deleted.
pub async fn remove_api_credentials(
    session: &mut SessionContext,
    names: &[String],
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    let mut aggregator = StatusAggregator::new();

    for name in names {
        let pending = PendingStatus::new(name.as_str());

        let outcome = {
            let executor = Executor::new(session, options);
            let target = lookup::<ApiCredential>(&executor, "", name).await?;

            let mut operation = Operation::delete(name, "");
            if session.is_credential_in_use(name) {
                operation = operation.confirm_with(format!(
                    "API credential '{}' is in use by this session. Remove it anyway?",
                    name
                ));
            }

            executor
                .execute(operation, target.as_ref(), |target| {
                    Ok(ApiRequest::delete(target_url(session, "", name, target)?))
                })
                .await
        };

        if outcome.is_complete() {
            session.forget_api_credential(name);
        }
        if let Some(status) = pending.from_outcome(outcome, "API credential successfully deleted!") {
            aggregator.push(status);
        }
    }

    Ok(aggregator.into_statuses())
}
