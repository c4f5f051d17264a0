//! Service provisioning (platform)
//!
//! Services are picked from the catalogue by name and provisioned into a region.
//! Provisioning is asynchronous server-side: the new provision is polled until
//! its `provision_status` reads `PROVISIONED`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::executor::{Executor, Operation, RunOptions};
use crate::http::ApiRequest;
use crate::poller::{PollTarget, await_condition};
use crate::resolver::{
    ApiFamily, Resource, ResourceHandle, fetch_items, list, placeholder_id, resolve, target_url,
};
use crate::resources::lookup;
use crate::session::SessionContext;
use crate::status::{OperationStatus, PendingStatus, process_each};

pub const SERVICE_MANAGERS_PATH: &str = "/service-catalog/v1beta1/service-managers";
pub const PROVISIONS_PATH: &str = "/service-catalog/v1beta1/provisions";

const PROVISIONED: &str = "PROVISIONED";

/// A catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManager {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Resource for ServiceManager {
    const KIND: &'static str = "Service";
    const FAMILY: ApiFamily = ApiFamily::Platform;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn collection_url(session: &SessionContext, _region: &str) -> Result<String> {
        Ok(session.glp_url(SERVICE_MANAGERS_PATH))
    }
}

/// A service provisioned into one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProvision {
    pub id: String,
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub service_manager_id: Option<String>,
    #[serde(default, rename = "provision_status")]
    pub provision_status: Option<String>,
}

impl ServiceProvision {
    pub fn is_provisioned(&self) -> bool {
        self.provision_status.as_deref() == Some(PROVISIONED)
    }
}

impl Resource for ServiceProvision {
    const KIND: &'static str = "Service";
    const FAMILY: ApiFamily = ApiFamily::Platform;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn region(&self) -> Option<&str> {
        Some(&self.region)
    }

    fn collection_url(session: &SessionContext, region: &str) -> Result<String> {
        session.ensure_region(region)?;
        Ok(session.glp_url(PROVISIONS_PATH))
    }
}

/// The service catalogue
pub async fn list_service_catalogue(session: &SessionContext) -> Result<Vec<ServiceManager>> {
    list::<ServiceManager>(session, "").await
}

/// Provisioned services, optionally limited to one region
pub async fn list_services(
    session: &SessionContext,
    region: Option<&str>,
) -> Result<Vec<ServiceProvision>> {
    let url = session.glp_url(PROVISIONS_PATH);
    let provisions: Vec<ServiceProvision> = fetch_items(session, &url).await?;
    Ok(provisions
        .into_iter()
        .filter(|p| region.is_none_or(|r| p.region == r))
        .collect())
}

/// Provision services by name, waiting for each to converge
pub async fn provision_services(
    session: &SessionContext,
    region: &str,
    names: &[String],
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    let executor = Executor::new(session, options);

    process_each(names, |name| async move {
        let pending = PendingStatus::new(name).region(region);

        let manager = lookup::<ServiceManager>(&executor, region, name).await?;
        let manager_id = match (&manager, executor.is_dry_run()) {
            (Some(manager), _) => manager.id().to_string(),
            (None, true) => placeholder_id(ServiceManager::KIND, name),
            (None, false) => {
                return Ok(Some(pending.failed(
                    format!("Service '{}' cannot be found in the region!", name),
                    None,
                )));
            }
        };

        let target = lookup::<ServiceProvision>(&executor, region, name).await?;
        let url = ServiceProvision::collection_url(session, region)?;

        let outcome = executor
            .execute(Operation::create(name, region), target.as_ref(), |_| {
                Ok(ApiRequest::post(
                    url,
                    json!({ "serviceManagerId": manager_id, "region": region }),
                ))
            })
            .await;

        if !outcome.is_complete() {
            return Ok(pending.from_outcome(outcome, ""));
        }

        let subject = format!("service '{}'", name);
        await_condition(
            PollTarget {
                resource: &subject,
                region,
            },
            session.polling().provision,
            || resolve::<ServiceProvision>(session, region, name),
            |found: &Option<ResourceHandle<ServiceProvision>>| {
                found.as_ref().is_some_and(|p| p.is_provisioned())
            },
            session.progress(),
        )
        .await?;

        info!("Service '{}' provisioned in '{}'", name, region);
        Ok(Some(
            pending.complete("Service successfully provisioned in the region!"),
        ))
    })
    .await
}

/// Remove provisioned services; asks for confirmation unless forced
pub async fn remove_services(
    session: &SessionContext,
    region: &str,
    names: &[String],
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    let executor = Executor::new(session, options);

    process_each(names, |name| async move {
        let pending = PendingStatus::new(name).region(region);
        let target = lookup::<ServiceProvision>(&executor, region, name).await?;

        let operation = Operation::delete(name, region).confirm_with(format!(
            "Remove service '{}' from region '{}'? All of its data in the region will be lost.",
            name, region
        ));

        let outcome = executor
            .execute(operation, target.as_ref(), |target| {
                Ok(ApiRequest::delete(target_url(session, region, name, target)?))
            })
            .await;

        Ok(pending.from_outcome(outcome, "Service successfully removed from the region!"))
    })
    .await
}
