//! Session construction from profiles

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use glctl_core::{
    ApiClient, Config, ConfirmCallback, ProgressCallback, ProgressEvent, ResolvedProfile,
    SessionContext,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, trace};

use crate::error::Result as CliResult;

/// User agent string for glctl HTTP requests
const GLCTL_USER_AGENT: &str = concat!("glctl/", env!("CARGO_PKG_VERSION"));

/// Connection manager for creating authenticated sessions
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save a configuration to the location this manager was loaded from
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve a profile with environment variable override support
    ///
    /// When --config-file is explicitly specified, environment variables are ignored
    /// so the file is the only source of truth.
    pub fn resolve_profile(&self, profile_name: Option<&str>) -> CliResult<ResolvedProfile> {
        let use_env_vars = self.config_path.is_none();
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let name = self.config.resolve_profile(profile_name)?;
        info!("Using profile: {}", name);

        let profile = self
            .config
            .profiles
            .get(&name)
            .ok_or_else(|| crate::error::GlctlError::ProfileNotFound { name: name.clone() })?;

        Ok(profile.resolve(&name, use_env_vars)?)
    }

    /// Build the session every resource command runs against
    pub fn create_session(&self, profile_name: Option<&str>) -> CliResult<SessionContext> {
        debug!("Creating session");
        trace!("Profile name: {:?}", profile_name);

        let resolved = self.resolve_profile(profile_name)?;
        debug!(
            "Platform URL: {}, regional URL template: {}, {} known region(s)",
            resolved.glp_url,
            resolved.com_url,
            resolved.regions.len()
        );

        let client = ApiClient::builder()
            .token(resolved.token.clone())
            .user_agent(GLCTL_USER_AGENT)
            // Previews go to stderr so stdout stays parseable
            .preview_sink(Arc::new(|text: &str| eprintln!("{}\n", text)))
            .build()?;

        let mut session = SessionContext::from_profile(client, &resolved);
        if std::io::stdin().is_terminal() {
            session = session.with_confirm(terminal_confirm());
        }
        if std::io::stderr().is_terminal() {
            session = session.with_progress(spinner_progress());
        }
        Ok(session)
    }
}

/// Ask on the terminal; a failed prompt counts as "no"
fn terminal_confirm() -> ConfirmCallback {
    Box::new(|prompt: &str| {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    })
}

/// One spinner per convergence wait
fn spinner_progress() -> ProgressCallback {
    let current: Arc<Mutex<Option<ProgressBar>>> = Arc::default();

    Box::new(move |event: ProgressEvent| {
        let Ok(mut slot) = current.lock() else {
            return;
        };
        match event {
            ProgressEvent::Started { resource, region } => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
                    bar.set_style(style);
                }
                bar.set_message(format!("Waiting for {} in region '{}'", resource, region));
                bar.enable_steady_tick(Duration::from_millis(120));
                *slot = Some(bar);
            }
            ProgressEvent::Polling {
                resource,
                attempt,
                max_attempts,
            } => {
                if let Some(bar) = slot.as_ref() {
                    bar.set_message(format!(
                        "Waiting for {} (attempt {}/{})",
                        resource, attempt, max_attempts
                    ));
                }
            }
            ProgressEvent::Converged { .. } | ProgressEvent::TimedOut { .. } => {
                if let Some(bar) = slot.take() {
                    bar.finish_and_clear();
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glctl_core::Profile;
    use std::collections::HashMap;

    fn manager(config_path: Option<PathBuf>) -> ConnectionManager {
        let mut profile = Profile::new("file-token");
        profile.regions = vec!["eu-central".to_string()];
        let config = Config {
            default_profile: None,
            profiles: HashMap::from([("prod".to_string(), profile)]),
        };
        ConnectionManager::with_config_path(config, config_path)
    }

    #[test]
    fn test_explicit_config_file_ignores_environment() {
        let mgr = manager(Some(PathBuf::from("/tmp/glctl-test.toml")));
        let resolved = mgr.resolve_profile(None).unwrap();
        assert_eq!(resolved.name, "prod");
        assert_eq!(resolved.token, "file-token");
        assert_eq!(resolved.regions, vec!["eu-central".to_string()]);
    }

    #[test]
    fn test_unknown_profile() {
        let mgr = manager(Some(PathBuf::from("/tmp/glctl-test.toml")));
        let err = mgr.resolve_profile(Some("staging")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::GlctlError::ProfileNotFound { ref name } if name == "staging"
        ));
    }

    #[test]
    fn test_session_carries_profile_regions() {
        let mgr = manager(Some(PathBuf::from("/tmp/glctl-test.toml")));
        let session = mgr.create_session(Some("prod")).unwrap();
        assert!(session.ensure_region("eu-central").is_ok());
        assert!(session.ensure_region("us-west").is_err());
    }
}
