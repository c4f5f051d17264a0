//! Unified error handling for glctl-core
//!
//! Per-item failures of a batch are not errors: they are recorded as
//! [`Status::Failed`](crate::status::Status) outcomes. The variants here are what a
//! pipeline operation can still raise, and only [`CoreError::is_fatal`] ones stop a
//! whole batch.
//!
//! # Example
//!
//! ```rust
//! use glctl_core::{CoreError, RemoteError};
//!
//! let err = CoreError::Remote(RemoteError::new(
//!     "DELETE",
//!     "https://example.test/webhooks/1",
//!     403,
//!     None,
//! ));
//! assert!(err.is_permission_denied());
//! assert!(!err.is_fatal());
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for pipeline operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The request could not be sent or its response could not be read
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The read used to find the target resource failed
    #[error("Failed to resolve {resource}: {source}")]
    Resolution {
        resource: String,
        #[source]
        source: Box<CoreError>,
    },

    /// A bounded poll ran out of attempts
    #[error(
        "Timed out waiting for {resource} in region '{region}' to converge after {attempts} attempts"
    )]
    ConvergenceTimeout {
        resource: String,
        region: String,
        attempts: u32,
    },

    /// Invalid input detected before anything was sent
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// A non-2xx response from the remote API
#[derive(Error, Debug, Clone)]
#[error("{method} {url} failed with HTTP {status}: {message}")]
pub struct RemoteError {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: Option<Value>,
    pub message: String,
}

impl RemoteError {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        body: Option<Value>,
    ) -> Self {
        let message = body
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| "no error detail returned".to_string());
        Self {
            method: method.into(),
            url: url.into(),
            status,
            body,
            message,
        }
    }
}

/// Pull a human message out of the platform's error bodies
///
/// Both `{"message": ..}` and `{"errorDetails": [{"message": ..}]}` shapes occur.
fn extract_message(body: &Value) -> Option<String> {
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    if let Some(details) = body.get("errorDetails").and_then(Value::as_array)
        && let Some(message) = details
            .iter()
            .find_map(|d| d.get("message").and_then(Value::as_str))
    {
        return Some(message.to_string());
    }
    body.as_str().map(str::to_string)
}

impl CoreError {
    /// HTTP status carried by the error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Remote(e) => Some(e.status),
            CoreError::Resolution { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Returns true for HTTP 403
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        self.status() == Some(403)
    }

    /// Returns true for HTTP 404
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true for errors that must abort a whole batch
    ///
    /// Resolution failures leave no item-level status to complete, and a
    /// convergence timeout leaves the remote state unknown.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::Resolution { .. } | CoreError::ConvergenceTimeout { .. }
        )
    }

    /// Wrap an error raised by a lookup read
    pub fn resolution(resource: impl Into<String>, source: CoreError) -> Self {
        CoreError::Resolution {
            resource: resource.into(),
            source: Box::new(source),
        }
    }
}
