//! Error types for glctl
//!
//! Per-item failures never show up here: they are statuses. A [`GlctlError`] is
//! what stops a whole command.

use colored::Colorize;
use glctl_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: list available profiles:
///       glctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the glctl application
#[derive(Error, Debug)]
pub enum GlctlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'glctl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// A lookup read failed, so no item of the batch could be processed safely
    #[error("{message}")]
    Resolution { message: String },

    /// Polling ran out of attempts; the remote state is unknown
    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for glctl operations
pub type Result<T> = std::result::Result<T, GlctlError>;

impl GlctlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GlctlError::ProfileNotFound { name } => vec![
                "List available profiles: glctl profile list".to_string(),
                format!("Create profile '{}': glctl profile set {}", name, name),
                "Check profile name spelling".to_string(),
            ],
            GlctlError::NoProfileConfigured => vec![
                "Create a profile: glctl profile set <name> --token <token>".to_string(),
                "View profile documentation: glctl profile --help".to_string(),
            ],
            GlctlError::AuthenticationFailed { .. } => vec![
                "Check your profile: glctl profile show <profile>".to_string(),
                "Tokens expire; create a new one and run: glctl profile set <profile> --token <token>"
                    .to_string(),
            ],
            GlctlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URLs are correct: glctl profile show <profile>".to_string(),
            ],
            GlctlError::Resolution { .. } => vec![
                "No item was changed after this failure; re-run the command once the API responds"
                    .to_string(),
                "Run with -vv to see the failing request".to_string(),
            ],
            GlctlError::Timeout { .. } => vec![
                "The request was accepted but did not finish in time; check its state before retrying"
                    .to_string(),
                "Raise the polling bounds under [profiles.<name>.polling] in the config file"
                    .to_string(),
            ],
            GlctlError::InvalidInput { .. } => vec![
                "Check the command syntax: glctl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));
        if matches!(self, GlctlError::Resolution { .. } | GlctlError::Timeout { .. }) {
            diag = diag.detail("The remaining items of the batch were not processed.");
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for GlctlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Http(e) => GlctlError::ConnectionError {
                message: e.to_string(),
            },
            CoreError::Remote(remote) if remote.status == 401 => {
                GlctlError::AuthenticationFailed {
                    message: remote.message,
                }
            }
            CoreError::Remote(remote) => GlctlError::ApiError {
                message: remote.to_string(),
            },
            err @ CoreError::Resolution { .. } => GlctlError::Resolution {
                message: err.to_string(),
            },
            err @ CoreError::ConvergenceTimeout { .. } => GlctlError::Timeout {
                message: err.to_string(),
            },
            CoreError::Validation(message) => GlctlError::InvalidInput { message },
            CoreError::Config(e) => GlctlError::from(e),
            CoreError::Json(e) => GlctlError::from(e),
            CoreError::Url(e) => GlctlError::InvalidInput {
                message: e.to_string(),
            },
        }
    }
}

impl From<ConfigError> for GlctlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => GlctlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => GlctlError::NoProfileConfigured,
            other => GlctlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GlctlError {
    fn from(err: serde_json::Error) -> Self {
        GlctlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for GlctlError {
    fn from(err: std::io::Error) -> Self {
        GlctlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for GlctlError {
    fn from(err: anyhow::Error) -> Self {
        GlctlError::Configuration(format!("{:#}", err))
    }
}
