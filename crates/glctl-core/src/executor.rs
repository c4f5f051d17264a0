//! Mutation executor
//!
//! Applies the idempotency rules shared by every mutating command, in order:
//!
//! 1. dry-run: build the request without a resolved target and preview it
//! 2. create of an existing name: warning, nothing sent
//! 3. update, delete or action on a missing name: failure, nothing sent
//! 4. confirmation-gated operations ask first unless forced
//! 5. build, send, classify
//!
//! Remote failures become [`MutationOutcome::Failed`]; nothing here returns an
//! error for a single item.

use std::fmt;

use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::http::{ApiRequest, ApiResponse};
use crate::resolver::{ApiFamily, Resource, ResourceHandle};
use crate::session::SessionContext;

/// What a mutation does to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    /// A named action on an existing resource, e.g. "test"
    Action(&'static str),
}

impl OperationKind {
    /// Infinitive used in messages
    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Action(verb) => verb,
        }
    }

    fn failure_details(&self, kind: &str, name: &str) -> String {
        match self {
            OperationKind::Create => format!("{} '{}' cannot be created!", kind, name),
            OperationKind::Update => format!("{} '{}' cannot be updated!", kind, name),
            OperationKind::Delete => format!("{} '{}' cannot be deleted!", kind, name),
            OperationKind::Action(verb) => {
                format!("Failed to {} {} '{}'!", verb, kind.to_lowercase(), name)
            }
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Flags shared by every mutating command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Preview requests instead of sending them
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub force: bool,
}

/// One mutation of one named item
#[derive(Debug, Clone)]
pub struct Operation<'a> {
    kind: OperationKind,
    name: &'a str,
    region: &'a str,
    confirm_prompt: Option<String>,
}

impl<'a> Operation<'a> {
    pub fn new(kind: OperationKind, name: &'a str, region: &'a str) -> Self {
        Self {
            kind,
            name,
            region,
            confirm_prompt: None,
        }
    }

    pub fn create(name: &'a str, region: &'a str) -> Self {
        Self::new(OperationKind::Create, name, region)
    }

    pub fn update(name: &'a str, region: &'a str) -> Self {
        Self::new(OperationKind::Update, name, region)
    }

    pub fn delete(name: &'a str, region: &'a str) -> Self {
        Self::new(OperationKind::Delete, name, region)
    }

    pub fn action(verb: &'static str, name: &'a str, region: &'a str) -> Self {
        Self::new(OperationKind::Action(verb), name, region)
    }

    /// Ask the session's confirmation hook before sending, unless forced
    #[must_use]
    pub fn confirm_with(mut self, prompt: impl Into<String>) -> Self {
        self.confirm_prompt = Some(prompt.into());
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn region(&self) -> &'a str {
        self.region
    }
}

/// Classified result of one mutation
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The request was sent and answered with 2xx
    Complete(ApiResponse),
    /// Not found, rejected remotely, or the request could not be built
    Failed {
        details: String,
        exception: Option<String>,
    },
    /// Nothing to do, or cancelled
    Warning { details: String },
    /// Dry-run: the request was rendered, not sent
    Previewed,
}

impl MutationOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, MutationOutcome::Complete(_))
    }

    /// Response body of a completed mutation
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            MutationOutcome::Complete(response) => Some(response),
            _ => None,
        }
    }
}

/// Runs mutations against one session
#[derive(Debug, Clone, Copy)]
pub struct Executor<'s> {
    session: &'s SessionContext,
    options: RunOptions,
}

impl<'s> Executor<'s> {
    pub fn new(session: &'s SessionContext, options: RunOptions) -> Self {
        Self { session, options }
    }

    pub fn session(&self) -> &'s SessionContext {
        self.session
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Apply `operation` to `target`
    ///
    /// `build` receives the resolved target (always `None` in dry-run, where
    /// resolution is skipped) and returns the request to send.
    pub async fn execute<T, B>(
        &self,
        operation: Operation<'_>,
        target: Option<&ResourceHandle<T>>,
        build: B,
    ) -> MutationOutcome
    where
        T: Resource,
        B: FnOnce(Option<&ResourceHandle<T>>) -> Result<ApiRequest>,
    {
        let subject = format!("{} '{}'", T::KIND, operation.name);

        if self.options.dry_run {
            return match build(None) {
                Ok(request) => match self.session.client().invoke(&request, true).await {
                    Ok(_) => MutationOutcome::Previewed,
                    Err(e) => self.failed::<T>(&operation, &e, None),
                },
                Err(e) => self.failed::<T>(&operation, &e, None),
            };
        }

        match (operation.kind, target) {
            (OperationKind::Create, Some(_)) => {
                warn!("{} already exists in region '{}'", subject, operation.region);
                return MutationOutcome::Warning {
                    details: format!("{} already exists in the region! No action needed.", subject),
                };
            }
            (OperationKind::Create, None) | (_, Some(_)) => {}
            (_, None) => {
                warn!("{} not found in region '{}'", subject, operation.region);
                return MutationOutcome::Failed {
                    details: format!("{} cannot be found in the region!", subject),
                    exception: None,
                };
            }
        }

        if let Some(prompt) = &operation.confirm_prompt
            && !self.options.force
            && !self.session.confirm(prompt)
        {
            info!("{} {} cancelled by the user", operation.kind, subject);
            return MutationOutcome::Warning {
                details: "Operation cancelled by the user.".to_string(),
            };
        }

        let request = match build(target) {
            Ok(request) => request,
            Err(e) => return self.failed::<T>(&operation, &e, None),
        };

        match self.session.client().invoke(&request, false).await {
            Ok(Some(response)) => {
                info!("{} {}: HTTP {}", operation.kind, subject, response.status);
                MutationOutcome::Complete(response)
            }
            Ok(None) => MutationOutcome::Previewed,
            Err(e) => {
                let detail = self.session.client().last_error_detail();
                self.failed::<T>(&operation, &e, detail)
            }
        }
    }

    fn failed<T: Resource>(
        &self,
        operation: &Operation<'_>,
        error: &CoreError,
        remote_detail: Option<String>,
    ) -> MutationOutcome {
        let details = if error.is_permission_denied() {
            permission_denied_message(T::FAMILY, operation.kind, T::KIND, operation.name)
        } else {
            operation.kind.failure_details(T::KIND, operation.name)
        };
        let exception = remote_detail.unwrap_or_else(|| error.to_string());

        warn!("{} ({})", details, exception);
        MutationOutcome::Failed {
            details,
            exception: Some(exception),
        }
    }
}

/// Role names for one API family: (lacking, sufficient)
fn roles(family: ApiFamily) -> (&'static [&'static str], &'static [&'static str]) {
    match family {
        ApiFamily::Platform => (
            &["Workspace Observer", "Workspace Member"],
            &["Workspace Administrator", "Workspace Operator"],
        ),
        ApiFamily::Regional => (
            &["Compute Ops Management viewer"],
            &[
                "Compute Ops Management administrator",
                "Compute Ops Management operator",
            ],
        ),
    }
}

/// Remediation text for an HTTP 403
pub fn permission_denied_message(
    family: ApiFamily,
    kind: OperationKind,
    resource: &str,
    name: &str,
) -> String {
    let (lacking, sufficient) = roles(family);
    format!(
        "Permission denied (HTTP 403) while trying to {} {} '{}'. Roles lacking this permission: {}. Roles with sufficient permission: {}.",
        kind.verb(),
        resource.to_lowercase(),
        name,
        lacking.join(", "),
        sufficient.join(", ")
    )
}
