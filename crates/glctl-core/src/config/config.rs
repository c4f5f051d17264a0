//! Configuration management for glctl
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format with support for multiple named profiles,
//! one per workspace the user manages.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::polling::PollingConfig;

/// Default global platform API endpoint
pub const DEFAULT_GLP_URL: &str = "https://global.api.greenlake.hpe.com";

/// Default regional compute-management API endpoint template
pub const DEFAULT_COM_URL: &str = "https://{region}-api.compute.cloud.hpe.com";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    /// Workspace this profile is bound to (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Bearer token, plaintext or `keyring:` reference
    pub token: String,
    /// Global platform API base URL
    #[serde(default = "default_glp_url")]
    pub glp_url: String,
    /// Regional API base URL template; `{region}` is substituted per call
    #[serde(default = "default_com_url")]
    pub com_url: String,
    /// Regions provisioned in the workspace
    #[serde(default)]
    pub regions: Vec<String>,
    /// Convergence polling overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingConfig>,
}

/// Connection settings resolved from a profile, environment and keyring
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub token: String,
    pub glp_url: String,
    pub com_url: String,
    pub regions: Vec<String>,
    pub polling: PollingConfig,
}

fn default_glp_url() -> String {
    DEFAULT_GLP_URL.to_string()
}

fn default_com_url() -> String {
    DEFAULT_COM_URL.to_string()
}

impl Profile {
    /// Create a profile with default endpoints
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            workspace_id: None,
            token: token.into(),
            glp_url: default_glp_url(),
            com_url: default_com_url(),
            regions: Vec::new(),
            polling: None,
        }
    }

    /// Resolve token and endpoints (with keyring and environment support)
    ///
    /// When `use_env_vars` is false, `GLCTL_*` variables are ignored so an explicit
    /// config file stays isolated from the surrounding shell.
    pub fn resolve(&self, name: &str, use_env_vars: bool) -> Result<ResolvedProfile> {
        let env = |var: &'static str| if use_env_vars { Some(var) } else { None };

        let token = CredentialStore::resolve(&self.token, env("GLCTL_TOKEN"))
            .map_err(|e| ConfigError::CredentialError(format!("Failed to resolve token: {}", e)))?;
        let glp_url = CredentialStore::resolve(&self.glp_url, env("GLCTL_GLP_URL")).map_err(|e| {
            ConfigError::CredentialError(format!("Failed to resolve platform URL: {}", e))
        })?;
        let com_url = CredentialStore::resolve(&self.com_url, env("GLCTL_COM_URL")).map_err(|e| {
            ConfigError::CredentialError(format!("Failed to resolve regional URL: {}", e))
        })?;

        Ok(ResolvedProfile {
            name: name.to_string(),
            token,
            glp_url,
            com_url,
            regions: self.regions.clone(),
            polling: self.polling.clone().unwrap_or_default(),
        })
    }
}

impl Config {
    /// Resolve the profile name to use
    ///
    /// Resolution order: explicit name, `default_profile`, first profile alphabetically.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            if !self.profiles.contains_key(profile_name) {
                return Err(ConfigError::ProfileNotFound {
                    name: profile_name.to_string(),
                });
            }
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        if let Some((name, _)) = self.list_profiles().first() {
            return Ok((*name).clone());
        }

        Err(ConfigError::NoProfiles {
            suggestion: "Use 'glctl profile set <name> --token <token>' to create a profile."
                .to_string(),
        })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/glctl/config.toml
    /// On macOS: ~/Library/Application Support/com.glctl.glctl/config.toml
    /// On Windows: %APPDATA%\glctl\glctl\config.toml
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "glctl", "glctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports `${VAR}` and `${VAR:-default}`. Unknown variables are left untouched
    /// so profiles that are not in use do not need their variables set.
    ///
    /// ```toml
    /// token = "${GLCTL_PROD_TOKEN}"
    /// glp_url = "${GLCTL_GLP_URL:-https://global.api.greenlake.hpe.com}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}
