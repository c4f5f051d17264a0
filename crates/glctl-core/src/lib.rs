//! # glctl-core
//!
//! Core library for `glctl`, shared by the CLI and usable on its own.
//!
//! Every mutating command follows the same pipeline:
//!
//! ```text
//! parameters -> resolver (read) -> executor (write) -> poller (optional wait) -> status
//! ```
//!
//! - [`http`] - the invoker: one authenticated request, or a redacted dry-run preview
//! - [`resolver`] - name to [`ResourceHandle`], zero or one match
//! - [`executor`] - idempotent create, not-found checks, confirmation, classification
//! - [`poller`] - bounded waits for server-side convergence
//! - [`status`] - one [`OperationStatus`] per input item
//! - [`resources`] - webhooks, external services, service provisioning, API
//!   credentials and device assignment, expressed through the pipeline
//!
//! All state an operation needs travels in an explicit [`SessionContext`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use glctl_core::resources::webhooks::{CreateWebhook, create_webhook};
//! use glctl_core::config::{DEFAULT_COM_URL, DEFAULT_GLP_URL};
//! use glctl_core::{ApiClient, Endpoints, RunOptions, SessionContext};
//!
//! let client = ApiClient::builder().token(token).build()?;
//! let session = SessionContext::new(client, Endpoints::new(DEFAULT_GLP_URL, DEFAULT_COM_URL));
//!
//! let request = CreateWebhook::new(
//!     "WebhookA",
//!     "https://example.com/hook",
//!     "type eq 'compute-ops/server'",
//! )?;
//! let status = create_webhook(&session, "eu-central", &request, RunOptions::default()).await?;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod poller;
pub mod resolver;
pub mod resources;
pub mod session;
pub mod status;

pub use config::{Config, ConfigError, PollingConfig, Profile, ResolvedProfile, SecretValue};
pub use error::{CoreError, RemoteError, Result};
pub use executor::{Executor, MutationOutcome, Operation, OperationKind, RunOptions};
pub use http::{ApiClient, ApiRequest, ApiResponse, HttpMethod, LastResponse, PreviewSink};
pub use poller::{
    ConvergenceCondition, PollingPolicy, ProgressCallback, ProgressEvent, await_condition,
};
pub use resolver::{ApiFamily, Resource, ResourceHandle};
pub use session::{CachedApiCredential, ConfirmCallback, Endpoints, SessionContext};
pub use status::{OperationStatus, PendingStatus, Status, StatusAggregator, Summary};
