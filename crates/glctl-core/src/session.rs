//! Session context shared by every pipeline operation
//!
//! Holds the authenticated client, the workspace's known regions, the API
//! credentials created during this session, and the caller-supplied hooks for
//! confirmation and progress. It is passed explicitly; nothing in the crate reads
//! process-wide state.

use std::fmt;

use serde::Serialize;

use crate::config::{ResolvedProfile, SecretValue};
use crate::error::{CoreError, Result};
use crate::http::ApiClient;
use crate::poller::{PollingPolicy, ProgressCallback};

/// Asked before destructive operations that were not forced
///
/// Receives a human-readable prompt; returning `false` cancels the item.
pub type ConfirmCallback = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Base URLs of the two API families
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Global platform API
    pub glp_url: String,
    /// Regional API template, `{region}` is substituted
    pub com_url_template: String,
}

impl Endpoints {
    pub fn new(glp_url: impl Into<String>, com_url_template: impl Into<String>) -> Self {
        Self {
            glp_url: glp_url.into(),
            com_url_template: com_url_template.into(),
        }
    }

    /// Platform URL for `path`
    pub fn glp(&self, path: &str) -> String {
        format!("{}{}", self.glp_url.trim_end_matches('/'), path)
    }

    /// Regional URL for `path`
    pub fn com(&self, region: &str, path: &str) -> String {
        let base = self.com_url_template.replace("{region}", region);
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

/// An API credential created in this session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedApiCredential {
    pub name: String,
    pub region: String,
    pub service_name: String,
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: SecretValue,
}

/// Everything a pipeline operation needs
pub struct SessionContext {
    client: ApiClient,
    endpoints: Endpoints,
    regions: Vec<String>,
    api_credentials: Vec<CachedApiCredential>,
    polling: PollingPolicy,
    confirm: ConfirmCallback,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("endpoints", &self.endpoints)
            .field("regions", &self.regions)
            .field("api_credentials", &self.api_credentials)
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Create a session; confirmation defaults to "always confirm"
    pub fn new(client: ApiClient, endpoints: Endpoints) -> Self {
        Self {
            client,
            endpoints,
            regions: Vec::new(),
            api_credentials: Vec::new(),
            polling: PollingPolicy::default(),
            confirm: Box::new(|_| true),
            progress: None,
        }
    }

    /// Build a session from a resolved profile
    pub fn from_profile(client: ApiClient, profile: &ResolvedProfile) -> Self {
        Self::new(
            client,
            Endpoints::new(profile.glp_url.clone(), profile.com_url.clone()),
        )
        .with_regions(profile.regions.clone())
        .with_polling(PollingPolicy::from(&profile.polling))
    }

    #[must_use]
    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    #[must_use]
    pub fn with_polling(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    #[must_use]
    pub fn with_confirm(mut self, confirm: ConfirmCallback) -> Self {
        self.confirm = confirm;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn polling(&self) -> &PollingPolicy {
        &self.polling
    }

    pub fn progress(&self) -> Option<&ProgressCallback> {
        self.progress.as_ref()
    }

    /// Ask the confirmation hook
    pub fn confirm(&self, prompt: &str) -> bool {
        (self.confirm)(prompt)
    }

    /// Check a region against the workspace's known regions
    ///
    /// An empty region list means the registry is unknown and every region passes.
    pub fn ensure_region(&self, region: &str) -> Result<()> {
        if region.trim().is_empty() {
            return Err(CoreError::Validation("A region is required".to_string()));
        }
        if !self.regions.is_empty() && !self.regions.iter().any(|r| r == region) {
            return Err(CoreError::Validation(format!(
                "Region '{}' is not provisioned in this workspace. Known regions: {}",
                region,
                self.regions.join(", ")
            )));
        }
        Ok(())
    }

    /// Regional base URL for `path`, after checking the region
    pub fn com_url(&self, region: &str, path: &str) -> Result<String> {
        self.ensure_region(region)?;
        Ok(self.endpoints.com(region, path))
    }

    /// Platform URL for `path`
    pub fn glp_url(&self, path: &str) -> String {
        self.endpoints.glp(path)
    }

    pub fn api_credentials(&self) -> &[CachedApiCredential] {
        &self.api_credentials
    }

    /// Whether a credential with this name is held by the session
    pub fn is_credential_in_use(&self, name: &str) -> bool {
        self.api_credentials.iter().any(|c| c.name == name)
    }

    pub(crate) fn cache_api_credential(&mut self, credential: CachedApiCredential) {
        self.api_credentials.retain(|c| c.name != credential.name);
        self.api_credentials.push(credential);
    }

    pub(crate) fn forget_api_credential(&mut self, name: &str) {
        self.api_credentials.retain(|c| c.name != name);
    }
}
