//! Per-item outcome records and their aggregation
//!
//! Every input item of a batch produces exactly one [`OperationStatus`]. A
//! [`PendingStatus`] is opened when an item starts and is consumed by exactly one
//! of `complete`, `warning` or `failed`; the resulting record has no mutators.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::executor::MutationOutcome;

/// Terminal state of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The remote mutation succeeded (and converged, where applicable)
    Complete,
    /// A remote error, a missing resource, or an invalid item
    Failed,
    /// Nothing to do, or the user cancelled
    Warning,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Complete => write!(f, "Complete"),
            Status::Failed => write!(f, "Failed"),
            Status::Warning => write!(f, "Warning"),
        }
    }
}

/// Final record for one processed item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperationStatus {
    name: String,
    region: Option<String>,
    service_type: Option<String>,
    status: Status,
    details: String,
    exception: Option<String>,
}

impl OperationStatus {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn service_type(&self) -> Option<&str> {
        self.service_type.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }
}

/// An item whose outcome is not known yet
#[derive(Debug, Clone)]
#[must_use = "a pending status must be finished with complete, warning or failed"]
pub struct PendingStatus {
    name: String,
    region: Option<String>,
    service_type: Option<String>,
}

impl PendingStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: None,
            service_type: None,
        }
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn complete(self, details: impl Into<String>) -> OperationStatus {
        self.finish(Status::Complete, details.into(), None)
    }

    pub fn warning(self, details: impl Into<String>) -> OperationStatus {
        self.finish(Status::Warning, details.into(), None)
    }

    pub fn failed(self, details: impl Into<String>, exception: Option<String>) -> OperationStatus {
        self.finish(Status::Failed, details.into(), exception)
    }

    /// Finish from an executor outcome; a dry-run preview yields no record
    pub fn from_outcome(
        self,
        outcome: MutationOutcome,
        complete_details: impl Into<String>,
    ) -> Option<OperationStatus> {
        match outcome {
            MutationOutcome::Complete(_) => Some(self.complete(complete_details)),
            MutationOutcome::Failed { details, exception } => Some(self.failed(details, exception)),
            MutationOutcome::Warning { details } => Some(self.warning(details)),
            MutationOutcome::Previewed => None,
        }
    }

    fn finish(self, status: Status, details: String, exception: Option<String>) -> OperationStatus {
        OperationStatus {
            name: self.name,
            region: self.region,
            service_type: self.service_type,
            status,
            details,
            exception,
        }
    }
}

/// Counts per terminal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub complete: usize,
    pub failed: usize,
    pub warning: usize,
}

/// Collects one status per item, in processing order
#[derive(Debug, Default)]
pub struct StatusAggregator {
    statuses: Vec<OperationStatus>,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, status: OperationStatus) {
        self.statuses.push(status);
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.statuses)
    }

    pub fn into_statuses(self) -> Vec<OperationStatus> {
        self.statuses
    }
}

/// Count statuses by state
pub fn summarize(statuses: &[OperationStatus]) -> Summary {
    statuses
        .iter()
        .fold(Summary::default(), |mut summary, s| {
            match s.status {
                Status::Complete => summary.complete += 1,
                Status::Failed => summary.failed += 1,
                Status::Warning => summary.warning += 1,
            }
            summary
        })
}

/// Run `f` for every item, one after the other
///
/// `Ok(None)` from `f` (a dry-run preview) adds no record. An `Err` aborts the
/// batch: per-item failures must already be folded into a `Failed` status.
pub async fn process_each<I, T, F, Fut>(items: I, mut f: F) -> Result<Vec<OperationStatus>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<Option<OperationStatus>>>,
{
    let mut aggregator = StatusAggregator::new();
    for item in items {
        if let Some(status) = f(item).await? {
            aggregator.push(status);
        }
    }
    Ok(aggregator.into_statuses())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use serde_json::json;

    #[test]
    fn test_pending_finishes_once() {
        let status = PendingStatus::new("WebhookA")
            .region("eu-central")
            .complete("Webhook successfully created in the region!");
        assert_eq!(status.name(), "WebhookA");
        assert_eq!(status.region(), Some("eu-central"));
        assert_eq!(status.status(), Status::Complete);
        assert!(status.exception().is_none());
    }

    #[test]
    fn test_serializes_pascal_case() {
        let status = PendingStatus::new("snow")
            .region("eu-central")
            .service_type("SERVICE_NOW")
            .failed("Create failed!", Some("HTTP 400".to_string()));
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            json!({
                "Name": "snow",
                "Region": "eu-central",
                "ServiceType": "SERVICE_NOW",
                "Status": "Failed",
                "Details": "Create failed!",
                "Exception": "HTTP 400"
            })
        );
    }

    #[test]
    fn test_from_outcome() {
        let failed = PendingStatus::new("WebhookA").from_outcome(
            MutationOutcome::Failed {
                details: "Webhook 'WebhookA' cannot be found in the region!".to_string(),
                exception: None,
            },
            "unused",
        );
        assert_eq!(failed.map(|s| s.status()), Some(Status::Failed));

        let previewed =
            PendingStatus::new("WebhookA").from_outcome(MutationOutcome::Previewed, "unused");
        assert!(previewed.is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut aggregator = StatusAggregator::new();
        aggregator.push(PendingStatus::new("a").complete("ok"));
        aggregator.push(PendingStatus::new("b").failed("nope", None));
        aggregator.push(PendingStatus::new("c").warning("exists"));
        aggregator.push(PendingStatus::new("d").complete("ok"));

        assert_eq!(
            aggregator.summary(),
            Summary {
                complete: 2,
                failed: 1,
                warning: 1
            }
        );
        let names: Vec<_> = aggregator
            .into_statuses()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_process_each_keeps_order_and_independence() {
        let statuses = process_each(vec!["one", "", "three"], |item| async move {
            let pending = PendingStatus::new(item);
            Ok(Some(if item.is_empty() {
                pending.failed("Name cannot be empty!", None)
            } else {
                pending.complete("done")
            }))
        })
        .await
        .unwrap();

        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0].status(), Status::Complete);
        assert_eq!(statuses[1].status(), Status::Failed);
        assert_eq!(statuses[2].status(), Status::Complete);
    }

    #[tokio::test]
    async fn test_process_each_skips_previews_and_stops_on_fatal() {
        let previews = process_each(vec![1, 2], |_| async { Ok(None) })
            .await
            .unwrap();
        assert!(previews.is_empty());

        let mut seen = Vec::new();
        let result = process_each(vec![1, 2, 3], |n| {
            seen.push(n);
            async move {
                if n == 2 {
                    Err(CoreError::Validation("fatal".to_string()))
                } else {
                    Ok(Some(PendingStatus::new(n.to_string()).complete("ok")))
                }
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(seen, vec![1, 2]);
    }
}
