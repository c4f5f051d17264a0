//! CLI structure and command definitions
//!
//! One subcommand group per resource family. Every mutating command accepts
//! `--dry-run`, which prints the requests it would send instead of sending them.

use clap::{Args, Parser, Subcommand};

pub mod resources;

pub use resources::*;

/// Workspace management CLI for webhooks, integrations, services and devices
#[derive(Parser, Debug)]
#[command(name = "glctl")]
#[command(
    version,
    about = "Workspace management CLI for webhooks, integrations, services and devices"
)]
#[command(long_about = "
Workspace management CLI for webhooks, integrations, services and devices

Every command that changes something reports one status per item:
Complete, Warning (nothing to do, or cancelled) or Failed.

EXAMPLES:
    # Set up a profile (the token is prompted for)
    glctl profile set prod --regions eu-central,us-west

    # Create a webhook
    glctl webhook create alerts --region eu-central \\
        --destination https://example.com/hook \\
        --event-filter \"type eq 'compute-ops/alert'\"

    # Preview a provisioning without sending anything
    glctl service provision 'Compute Ops Management' --region eu-central --dry-run

    # Filter output with JMESPath
    glctl webhook list --region eu-central -o json -q '[?state==`ENABLED`].name'

For more help on a specific command, run:
    glctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "GLCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "GLCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Flags shared by every mutating command
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct DryRunArgs {
    /// Print the requests that would be sent, without sending them
    #[arg(long)]
    pub dry_run: bool,
}

/// Flags shared by destructive commands
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RemoveArgs {
    /// Print the requests that would be sent, without sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(long, short)]
    pub force: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile, prompting for the token
    glctl profile set prod --regions eu-central,us-west

    # Create a profile with the token stored in the OS keyring
    glctl profile set prod --token TOKEN --use-keyring

    # List all profiles
    glctl profile list

    # Make a profile the default
    glctl profile default prod
")]
    Profile(ProfileCommands),

    /// Webhook subscriptions in a region
    #[command(subcommand, visible_alias = "wh")]
    Webhook(WebhookCommands),

    /// External service integrations (ServiceNow, DSCC) in a region
    #[command(subcommand, name = "external-service", visible_alias = "es")]
    ExternalService(ExternalServiceCommands),

    /// Service provisioning in workspace regions
    #[command(subcommand, visible_alias = "svc")]
    Service(ServiceCommands),

    /// API client credentials
    #[command(subcommand, name = "api-credential", visible_alias = "cred")]
    ApiCredential(ApiCredentialCommands),

    /// Device assignment to provisioned services
    #[command(subcommand, visible_alias = "dev")]
    Device(DeviceCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// Workspace bearer token (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Workspace this profile manages
        #[arg(long)]
        workspace_id: Option<String>,

        /// Global platform API base URL
        #[arg(long, default_value = glctl_core::config::DEFAULT_GLP_URL)]
        glp_url: String,

        /// Regional API URL template, `{region}` is substituted
        #[arg(long, default_value = glctl_core::config::DEFAULT_COM_URL)]
        com_url: String,

        /// Regions provisioned in the workspace (comma separated)
        #[arg(long, value_delimiter = ',')]
        regions: Vec<String>,

        /// Store the token in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use when none is given
        name: String,
    },
}
