//! Convergence polling configuration
//!
//! Stored per profile under `[profiles.<name>.polling]`. Every use site of the
//! poller is bounded; these values only tune the bounds.

use serde::{Deserialize, Serialize};

/// Polling bounds for the convergence waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed delay between two polls, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Attempts while waiting for a service provision to reach `PROVISIONED`
    #[serde(default = "default_provision_attempts")]
    pub provision_attempts: u32,

    /// Attempts while waiting for an external service to reach `ENABLED`
    #[serde(default = "default_enable_attempts")]
    pub enable_attempts: u32,

    /// Attempts while waiting for a new activity record to appear
    #[serde(default = "default_activity_attempts")]
    pub activity_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            provision_attempts: default_provision_attempts(),
            enable_attempts: default_enable_attempts(),
            activity_attempts: default_activity_attempts(),
        }
    }
}

fn default_interval_secs() -> u64 {
    2
}

fn default_provision_attempts() -> u32 {
    10
}

fn default_enable_attempts() -> u32 {
    15
}

fn default_activity_attempts() -> u32 {
    30
}
