//! Convergence polling after asynchronous mutations
//!
//! Several mutations only start work server-side: a provisioned service must reach
//! `PROVISIONED`, a new external service must become `ENABLED`, a test action must
//! leave an activity record behind. [`await_condition`] re-queries until a predicate
//! holds, with a fixed interval and a hard attempt ceiling. Running out of attempts
//! is a [`CoreError::ConvergenceTimeout`], which callers treat as fatal because the
//! remote state is no longer known.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::error::{CoreError, Result};

/// Progress events emitted while polling
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has begun
    Started { resource: String, region: String },
    /// One unsuccessful poll
    Polling {
        resource: String,
        attempt: u32,
        max_attempts: u32,
    },
    /// The predicate held
    Converged { resource: String, attempts: u32 },
    /// Attempts exhausted
    TimedOut { resource: String, attempts: u32 },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive a spinner; library callers usually pass nothing.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Retry ceiling and fixed delay for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceCondition {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl ConvergenceCondition {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }
}

/// One condition per convergence use site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    /// Service provision reaching `PROVISIONED`
    pub provision: ConvergenceCondition,
    /// External service reaching `ENABLED`
    pub external_service_enable: ConvergenceCondition,
    /// Activity record newer than a reference time
    pub activity: ConvergenceCondition,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollingPolicy {
    fn from(config: &PollingConfig) -> Self {
        let interval = Duration::from_secs(config.interval_secs);
        Self {
            provision: ConvergenceCondition::new(config.provision_attempts, interval),
            external_service_enable: ConvergenceCondition::new(config.enable_attempts, interval),
            activity: ConvergenceCondition::new(config.activity_attempts, interval),
        }
    }
}

impl PollingPolicy {
    /// Same ceiling everywhere with a custom interval (tests, impatient callers)
    pub fn uniform(max_attempts: u32, interval: Duration) -> Self {
        let condition = ConvergenceCondition::new(max_attempts, interval);
        Self {
            provision: condition,
            external_service_enable: condition,
            activity: condition,
        }
    }
}

/// What is being waited on, for messages and errors
#[derive(Debug, Clone, Copy)]
pub struct PollTarget<'a> {
    pub resource: &'a str,
    pub region: &'a str,
}

/// Poll until `predicate` holds or `condition.max_attempts` polls have failed
///
/// Errors from `poll` propagate immediately. There is no sleep after the final
/// unsuccessful attempt.
pub async fn await_condition<T, F, Fut, P>(
    target: PollTarget<'_>,
    condition: ConvergenceCondition,
    mut poll: F,
    predicate: P,
    on_progress: Option<&ProgressCallback>,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    emit(
        on_progress,
        ProgressEvent::Started {
            resource: target.resource.to_string(),
            region: target.region.to_string(),
        },
    );

    for attempt in 1..=condition.max_attempts {
        let value = poll().await?;

        if predicate(&value) {
            info!("{} converged after {} attempt(s)", target.resource, attempt);
            emit(
                on_progress,
                ProgressEvent::Converged {
                    resource: target.resource.to_string(),
                    attempts: attempt,
                },
            );
            return Ok(value);
        }

        debug!(
            "{} not converged yet (attempt {}/{})",
            target.resource, attempt, condition.max_attempts
        );
        emit(
            on_progress,
            ProgressEvent::Polling {
                resource: target.resource.to_string(),
                attempt,
                max_attempts: condition.max_attempts,
            },
        );

        if attempt < condition.max_attempts {
            tokio::time::sleep(condition.interval).await;
        }
    }

    warn!(
        "{} in region '{}' did not converge after {} attempts",
        target.resource, target.region, condition.max_attempts
    );
    emit(
        on_progress,
        ProgressEvent::TimedOut {
            resource: target.resource.to_string(),
            attempts: condition.max_attempts,
        },
    );

    Err(CoreError::ConvergenceTimeout {
        resource: target.resource.to_string(),
        region: target.region.to_string(),
        attempts: condition.max_attempts,
    })
}

fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
