//! Concrete resource operations
//!
//! Each submodule expresses one family of commands through the shared pipeline:
//! resolve by name, execute the mutation, optionally wait for convergence, and
//! record one [`OperationStatus`](crate::status::OperationStatus) per item.
//!
//! Request builders validate their input when they are constructed, so an
//! invalid request never reaches the executor.

pub mod activities;
pub mod api_credentials;
pub mod devices;
pub mod external_services;
pub mod services;
pub mod webhooks;

use url::Url;

use crate::error::{CoreError, Result};
use crate::executor::Executor;
use crate::resolver::{Resource, ResourceHandle, resolve};

/// Resolve `name` unless this is a dry run, where resolution is skipped
pub(crate) async fn lookup<T: Resource>(
    executor: &Executor<'_>,
    region: &str,
    name: &str,
) -> Result<Option<ResourceHandle<T>>> {
    if executor.is_dry_run() {
        return Ok(None);
    }
    resolve(executor.session(), region, name).await
}

/// Trimmed, non-empty value
pub(crate) fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}

/// An absolute `https` URL
pub(crate) fn https_url(value: &str, field: &str) -> Result<String> {
    let parsed = Url::parse(value.trim())
        .map_err(|e| CoreError::Validation(format!("{} is not a valid URL: {}", field, e)))?;
    if parsed.scheme() != "https" {
        return Err(CoreError::Validation(format!(
            "{} must use https, got '{}'",
            field,
            parsed.scheme()
        )));
    }
    Ok(value.trim().to_string())
}
