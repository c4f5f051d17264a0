//! Configuration and profile management for glctl
//!
//! This module provides the configuration system for managing workspace
//! tokens, API endpoints and polling behaviour.
//!
//! # Features
//!
//! - Multiple named profiles for different workspaces
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;
pub mod polling;

// Re-export main types for convenience
pub use config::{Config, DEFAULT_COM_URL, DEFAULT_GLP_URL, Profile, ResolvedProfile};
pub use credential::{CredentialStore, SecretValue};
pub use error::{ConfigError, Result};
pub use polling::PollingConfig;
