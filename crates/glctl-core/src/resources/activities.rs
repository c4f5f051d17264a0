//! Activities (regional, read-only)
//!
//! Audit records written by the compute-management service. An action such as an
//! external-service test reports its result only through a new activity, so the
//! caller waits for one that is newer than the moment the action was sent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::poller::{PollTarget, await_condition};
use crate::resolver::{eq_filter, fetch_items, with_query};
use crate::session::SessionContext;

pub const ACTIVITIES_PATH: &str = "/compute-ops-mgmt/v1beta1/activities";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySource {
    #[serde(default)]
    pub resource_uri: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub formatted_message: Option<String>,
    #[serde(default)]
    pub source: Option<ActivitySource>,
}

/// Activities whose source is `resource_uri`, or all of them
pub async fn list_activities(
    session: &SessionContext,
    region: &str,
    resource_uri: Option<&str>,
) -> Result<Vec<Activity>> {
    let mut url = session.com_url(region, ACTIVITIES_PATH)?;
    if let Some(uri) = resource_uri {
        url = with_query(&url, &[("filter", &eq_filter("source/resourceUri", uri))])?;
    }
    fetch_items(session, &url).await
}

/// Wait for the first activity on `resource_uri` created after `after`
///
/// Bounded by the session's activity polling condition.
pub async fn await_activity_after(
    session: &SessionContext,
    region: &str,
    subject: &str,
    resource_uri: &str,
    after: DateTime<Utc>,
) -> Result<Activity> {
    let activities = await_condition(
        PollTarget {
            resource: subject,
            region,
        },
        session.polling().activity,
        || list_activities(session, region, Some(resource_uri)),
        |activities: &Vec<Activity>| activities.iter().any(|a| a.created_at > after),
        session.progress(),
    )
    .await?;

    // The predicate held, so at least one activity qualifies
    let mut newer: Vec<Activity> = activities
        .into_iter()
        .filter(|a| a.created_at > after)
        .collect();
    newer.sort_by_key(|a| a.created_at);
    newer
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::Validation(format!("No activity found for {}", subject)))
}
