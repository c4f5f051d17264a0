//! Command implementations
//!
//! Resource commands share one shape: build the session, run the core
//! operation, print one status per item, and report whether any item failed.

pub mod api_credential;
pub mod device;
pub mod external_service;
pub mod profile;
pub mod service;
pub mod webhook;

use std::io::IsTerminal;

use glctl_core::{OperationStatus, RunOptions, SecretValue, Status};
use tracing::debug;

use crate::cli::{DryRunArgs, OutputFormat, RemoveArgs};
use crate::error::{GlctlError, Result as CliResult};
use crate::output;

/// Environment variable holding the OAuth client secret for integrations
pub const CLIENT_SECRET_ENV: &str = "GLCTL_CLIENT_SECRET";

/// Environment variable holding the ServiceNow refresh token
pub const REFRESH_TOKEN_ENV: &str = "GLCTL_REFRESH_TOKEN";

/// How a command ended, for the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Success,
    /// At least one item ended `Failed`
    ItemsFailed,
}

impl Outcome {
    pub fn of(statuses: &[OperationStatus]) -> Self {
        if statuses.iter().any(|s| s.status() == Status::Failed) {
            Outcome::ItemsFailed
        } else {
            Outcome::Success
        }
    }
}

impl From<DryRunArgs> for RunOptions {
    fn from(args: DryRunArgs) -> Self {
        RunOptions {
            dry_run: args.dry_run,
            force: false,
        }
    }
}

impl From<RemoveArgs> for RunOptions {
    fn from(args: RemoveArgs) -> Self {
        RunOptions {
            dry_run: args.dry_run,
            force: args.force,
        }
    }
}

/// Print statuses and derive the outcome
pub fn report(
    statuses: &[OperationStatus],
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    output::print_statuses(statuses, output_format.into(), query)?;
    Ok(Outcome::of(statuses))
}

/// Same as [`report`] for single-item commands; a dry run has no status
pub fn report_one(
    status: Option<OperationStatus>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    let statuses: Vec<OperationStatus> = status.into_iter().collect();
    report(&statuses, output_format, query)
}

/// Print a listing
pub fn print_list<T: serde::Serialize>(
    items: T,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    output::print_output(items, output_format.into(), query)?;
    Ok(Outcome::Success)
}

/// Read a secret from the environment, or prompt for it on a terminal
///
/// Secrets are never taken from command-line arguments, where they would end up
/// in shell history. A `keyring:<entry>` value is read from the OS keyring.
pub fn read_secret(env_var: &str, prompt: &str) -> CliResult<SecretValue> {
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        debug!("Using secret from {}", env_var);
        return Ok(SecretValue::from_config(value));
    }

    if !std::io::stdin().is_terminal() {
        return Err(GlctlError::InvalidInput {
            message: format!("{} is not set and no terminal is available to prompt", env_var),
        });
    }

    let value = rpassword::prompt_password(format!("{}: ", prompt))?;
    if value.is_empty() {
        return Err(GlctlError::InvalidInput {
            message: format!("{} cannot be empty", prompt),
        });
    }
    Ok(SecretValue::from_config(value))
}
