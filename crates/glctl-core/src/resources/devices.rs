//! Device service assignment (platform)
//!
//! Unlike the other commands, (un)assignment is bulk: every serial number is
//! looked up with one read, validated on its own, and all valid devices are then
//! patched with a single request. Each item's outcome follows from that one
//! response.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::executor::{Executor, OperationKind, RunOptions, permission_denied_message};
use crate::http::ApiRequest;
use crate::resolver::{ApiFamily, Resource, fetch_items, odata_literal, placeholder_id, with_query};
use crate::resources::lookup;
use crate::resources::services::ServiceManager;
use crate::session::SessionContext;
use crate::status::{OperationStatus, PendingStatus};

pub const DEVICES_PATH: &str = "/devices/v1beta1/devices";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub serial_number: String,
    #[serde(default)]
    pub application: Option<ApplicationRef>,
    #[serde(default)]
    pub region: Option<String>,
}

impl Device {
    /// Id of the service the device is assigned to
    pub fn application_id(&self) -> Option<&str> {
        self.application.as_ref().and_then(|a| a.id.as_deref())
    }
}

impl Resource for Device {
    const KIND: &'static str = "Device";
    const FAMILY: ApiFamily = ApiFamily::Platform;
    const NAME_FIELD: &'static str = "serialNumber";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.serial_number
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn collection_url(session: &SessionContext, _region: &str) -> Result<String> {
        Ok(session.glp_url(DEVICES_PATH))
    }
}

/// Desired assignment of a batch
#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    /// Assigned to the service with this id, in this region
    To { application_id: String, region: String },
    Unassigned,
}

impl Assignment {
    fn is_satisfied_by(&self, device: &Device) -> bool {
        match self {
            Assignment::To {
                application_id,
                region,
            } => {
                device.application_id() == Some(application_id.as_str())
                    && device.region.as_deref() == Some(region.as_str())
            }
            Assignment::Unassigned => device.application_id().is_none(),
        }
    }

    fn to_patch(&self) -> Value {
        match self {
            Assignment::To {
                application_id,
                region,
            } => json!({ "application": { "id": application_id }, "region": region }),
            Assignment::Unassigned => json!({ "application": { "id": null }, "region": null }),
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Assignment::To { .. } => "assigned to the service",
            Assignment::Unassigned => "unassigned from its service",
        }
    }
}

/// `serialNumber in ('a','b')`
fn serial_filter(serials: &[&str]) -> String {
    let literals: Vec<String> = serials.iter().map(|s| odata_literal(s)).collect();
    format!("serialNumber in ({})", literals.join(","))
}

/// One read for the whole batch, keyed by serial number
async fn lookup_devices(
    session: &SessionContext,
    serials: &[&str],
) -> Result<HashMap<String, Device>> {
    if serials.is_empty() {
        return Ok(HashMap::new());
    }

    let url = with_query(
        &session.glp_url(DEVICES_PATH),
        &[("filter", &serial_filter(serials))],
    )?;
    let devices: Vec<Device> = fetch_items(session, &url)
        .await
        .map_err(|e| CoreError::resolution(format!("devices {}", serials.join(", ")), e))?;

    debug!("Found {} of {} device(s)", devices.len(), serials.len());
    Ok(devices
        .into_iter()
        .map(|d| (d.serial_number.clone(), d))
        .collect())
}

enum Slot {
    Done(OperationStatus),
    Valid { pending: PendingStatus, id: String },
}

/// Assign devices to a provisioned service in `region`
pub async fn assign_devices(
    session: &SessionContext,
    serials: &[String],
    service_name: &str,
    region: &str,
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    session.ensure_region(region)?;
    let executor = Executor::new(session, options);

    let application_id = match lookup::<ServiceManager>(&executor, region, service_name).await? {
        Some(manager) => manager.id().to_string(),
        None if executor.is_dry_run() => placeholder_id(ServiceManager::KIND, service_name),
        None => {
            warn!("Service '{}' not found, no device can be assigned", service_name);
            return Ok(serials
                .iter()
                .map(|serial| {
                    PendingStatus::new(serial.as_str()).region(region).failed(
                        format!("Service '{}' cannot be found in the region!", service_name),
                        None,
                    )
                })
                .collect());
        }
    };

    let assignment = Assignment::To {
        application_id,
        region: region.to_string(),
    };
    apply(&executor, serials, Some(region), &assignment).await
}

/// Remove devices from whatever service they are assigned to
pub async fn unassign_devices(
    session: &SessionContext,
    serials: &[String],
    options: RunOptions,
) -> Result<Vec<OperationStatus>> {
    let executor = Executor::new(session, options);
    apply(&executor, serials, None, &Assignment::Unassigned).await
}

async fn apply(
    executor: &Executor<'_>,
    serials: &[String],
    region: Option<&str>,
    assignment: &Assignment,
) -> Result<Vec<OperationStatus>> {
    let session = executor.session();

    let wanted: Vec<&str> = serials
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let devices = if executor.is_dry_run() {
        HashMap::new()
    } else {
        lookup_devices(session, &wanted).await?
    };

    let slots: Vec<Slot> = serials
        .iter()
        .map(|serial| {
            let serial = serial.trim();
            let mut pending = PendingStatus::new(serial);
            if let Some(region) = region {
                pending = pending.region(region);
            }

            if serial.is_empty() {
                return Slot::Done(pending.failed("Serial number cannot be empty!", None));
            }
            if executor.is_dry_run() {
                return Slot::Valid {
                    pending,
                    id: placeholder_id(Device::KIND, serial),
                };
            }
            match devices.get(serial) {
                None => Slot::Done(pending.failed(
                    format!("Device '{}' cannot be found in the workspace!", serial),
                    None,
                )),
                Some(device) if assignment.is_satisfied_by(device) => Slot::Done(pending.warning(
                    format!("Device is already {}! No action needed.", assignment.verb()),
                )),
                Some(device) => Slot::Valid {
                    pending,
                    id: device.id.clone(),
                },
            }
        })
        .collect();

    let ids: Vec<&str> = slots
        .iter()
        .filter_map(|slot| match slot {
            Slot::Valid { id, .. } => Some(id.as_str()),
            Slot::Done(_) => None,
        })
        .collect();

    if ids.is_empty() {
        return Ok(finish(slots, |_| None));
    }

    let pairs: Vec<(&str, &str)> = ids.iter().map(|id| ("id", *id)).collect();
    let url = with_query(&session.glp_url(DEVICES_PATH), &pairs)?;
    let request = ApiRequest::patch(url, assignment.to_patch());

    if executor.is_dry_run() {
        session.client().invoke(&request, true).await?;
        // Previewed items produce no record
        let statuses = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Done(status) => Some(status),
                Slot::Valid { .. } => None,
            })
            .collect();
        return Ok(statuses);
    }

    let result = session.client().invoke(&request, false).await;
    let remote_detail = session.client().last_error_detail();
    let verb = assignment.verb();

    Ok(finish(slots, |pending: PendingStatus| {
        let serial = pending.name().to_string();
        Some(match &result {
            Ok(Some(response)) if matches!(response.status, 200 | 202) => {
                info!("Device '{}' {}", serial, verb);
                pending.complete(format!("Device successfully {}!", verb))
            }
            Ok(response) => pending.failed(
                format!("Device cannot be {}!", verb),
                Some(format!(
                    "Unexpected response status {}",
                    response.as_ref().map(|r| r.status).unwrap_or_default()
                )),
            ),
            Err(e) => {
                let details = if e.is_permission_denied() {
                    permission_denied_message(
                        ApiFamily::Platform,
                        OperationKind::Update,
                        Device::KIND,
                        &serial,
                    )
                } else {
                    format!("Device cannot be {}!", verb)
                };
                pending.failed(
                    details,
                    Some(remote_detail.clone().unwrap_or_else(|| e.to_string())),
                )
            }
        })
    }))
}

/// Statuses in input order, resolving valid items with `resolve`
fn finish<F>(slots: Vec<Slot>, mut resolve: F) -> Vec<OperationStatus>
where
    F: FnMut(PendingStatus) -> Option<OperationStatus>,
{
    slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Done(status) => Some(status),
            Slot::Valid { pending, .. } => resolve(pending),
        })
        .collect()
}
