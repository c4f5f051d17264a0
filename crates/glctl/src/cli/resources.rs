//! Resource command definitions

use clap::{ArgGroup, Subcommand};

use super::{DryRunArgs, RemoveArgs};

/// Webhook commands
#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// List webhooks in a region
    #[command(visible_alias = "ls")]
    List {
        /// Region to query
        #[arg(long, short)]
        region: String,
    },

    /// Create a webhook
    #[command(after_help = "EXAMPLES:
    glctl webhook create alerts --region eu-central \\
        --destination https://example.com/hook \\
        --event-filter \"type eq 'compute-ops/alert'\"
")]
    Create {
        /// Webhook name
        name: String,

        /// Region to create the webhook in
        #[arg(long, short)]
        region: String,

        /// HTTPS endpoint receiving the events
        #[arg(long)]
        destination: String,

        /// OData filter selecting the events to deliver
        #[arg(long)]
        event_filter: String,

        /// Create the webhook disabled
        #[arg(long)]
        disabled: bool,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Update a webhook; omitted fields keep their current value
    #[command(group(ArgGroup::new("state").args(["enabled", "disabled"])))]
    Update {
        /// Current webhook name
        name: String,

        /// Region of the webhook
        #[arg(long, short)]
        region: String,

        /// Rename the webhook
        #[arg(long)]
        new_name: Option<String>,

        /// New destination URL
        #[arg(long)]
        destination: Option<String>,

        /// New event filter
        #[arg(long)]
        event_filter: Option<String>,

        /// Enable the webhook
        #[arg(long)]
        enabled: bool,

        /// Disable the webhook
        #[arg(long)]
        disabled: bool,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Delete webhooks by name
    #[command(visible_alias = "rm")]
    Remove {
        /// Webhook names
        #[arg(required = true)]
        names: Vec<String>,

        /// Region of the webhooks
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: RemoveArgs,
    },

    /// Send a test event to a webhook's destination
    Test {
        /// Webhook name
        name: String,

        /// Region of the webhook
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: DryRunArgs,
    },
}

/// External service commands
#[derive(Subcommand, Debug)]
pub enum ExternalServiceCommands {
    /// List external services in a region
    #[command(visible_alias = "ls")]
    List {
        /// Region to query
        #[arg(long, short)]
        region: String,
    },

    /// Create an integration and wait until it is enabled
    #[command(subcommand)]
    Create(CreateExternalServiceCommands),

    /// Update an integration; omitted fields keep their current value
    Update {
        /// Current integration name
        name: String,

        /// Region of the integration
        #[arg(long, short)]
        region: String,

        /// Rename the integration
        #[arg(long)]
        new_name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New OAuth client id; the secret is read from GLCTL_CLIENT_SECRET or prompted
        #[arg(long)]
        client_id: Option<String>,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Delete integrations by name
    #[command(visible_alias = "rm")]
    Remove {
        /// Integration names
        #[arg(required = true)]
        names: Vec<String>,

        /// Region of the integrations
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: RemoveArgs,
    },

    /// Test an integration and report the activity it produced
    Test {
        /// Integration name
        name: String,

        /// Region of the integration
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: DryRunArgs,
    },
}

/// Integration types that can be created
#[derive(Subcommand, Debug)]
pub enum CreateExternalServiceCommands {
    /// ServiceNow incident integration
    #[command(name = "servicenow")]
    #[command(after_help = "EXAMPLES:
    GLCTL_CLIENT_SECRET=... GLCTL_REFRESH_TOKEN=... \\
    glctl external-service create servicenow snow --region eu-central \\
        --client-id 0a1b2c \\
        --oauth-url https://example.service-now.com/oauth_token.do \\
        --incident-url https://example.service-now.com/api/now/import/u_demo_incident_inbound_api
")]
    ServiceNow {
        /// Integration name
        name: String,

        /// Region to create the integration in
        #[arg(long, short)]
        region: String,

        /// OAuth client id; the secret is read from GLCTL_CLIENT_SECRET or prompted
        #[arg(long)]
        client_id: String,

        /// ServiceNow OAuth token endpoint
        #[arg(long)]
        oauth_url: String,

        /// ServiceNow incident import endpoint
        #[arg(long)]
        incident_url: String,

        /// Days until the refresh token expires
        #[arg(long, default_value_t = 100)]
        refresh_token_expiry_days: u32,

        /// Description shown in the console
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Data Services Cloud Console integration
    #[command(name = "dscc")]
    #[command(group(ArgGroup::new("credential").args(["client_id", "new_credential"]).required(true)))]
    #[command(after_help = "EXAMPLES:
    # With an existing client id (the secret is prompted for)
    glctl external-service create dscc storage --region eu-central \\
        --dscc-region eu-central --client-id 0a1b2c

    # With a new API credential created for the purpose
    glctl external-service create dscc storage --region eu-central \\
        --dscc-region eu-central \\
        --new-credential storage-integration --credential-service 'Data Services'
")]
    Dscc {
        /// Integration name
        name: String,

        /// Region to create the integration in
        #[arg(long, short)]
        region: String,

        /// Region of the DSCC instance
        #[arg(long)]
        dscc_region: String,

        /// OAuth client id; the secret is read from GLCTL_CLIENT_SECRET or prompted
        #[arg(long)]
        client_id: Option<String>,

        /// Create an API credential with this name and use it
        #[arg(long, requires = "credential_service")]
        new_credential: Option<String>,

        /// Service the new API credential is issued for
        #[arg(long)]
        credential_service: Option<String>,

        /// Description shown in the console
        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        run: DryRunArgs,
    },
}

/// Service provisioning commands
#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// List provisioned services, or the service catalogue
    #[command(visible_alias = "ls")]
    List {
        /// Only services provisioned in this region
        #[arg(long, short, conflicts_with = "catalogue")]
        region: Option<String>,

        /// List the services that can be provisioned instead
        #[arg(long)]
        catalogue: bool,
    },

    /// Provision services in a region and wait until they are ready
    Provision {
        /// Service names, as listed in the catalogue
        #[arg(required = true)]
        names: Vec<String>,

        /// Region to provision in
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Remove services from a region, deleting their data there
    #[command(visible_alias = "rm")]
    Remove {
        /// Service names
        #[arg(required = true)]
        names: Vec<String>,

        /// Region to remove the services from
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: RemoveArgs,
    },
}

/// API credential commands
#[derive(Subcommand, Debug)]
pub enum ApiCredentialCommands {
    /// List API credentials
    #[command(visible_alias = "ls")]
    List,

    /// Create an API credential for a provisioned service
    Create {
        /// Credential name
        name: String,

        /// Service the credential is issued for
        #[arg(long)]
        service: String,

        /// Region of the service
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Delete API credentials by name
    #[command(visible_alias = "rm")]
    Remove {
        /// Credential names
        #[arg(required = true)]
        names: Vec<String>,

        #[command(flatten)]
        run: RemoveArgs,
    },
}

/// Device assignment commands
#[derive(Subcommand, Debug)]
pub enum DeviceCommands {
    /// Assign devices to a provisioned service
    Assign {
        /// Device serial numbers
        #[arg(required = true)]
        serials: Vec<String>,

        /// Service to assign the devices to
        #[arg(long)]
        service: String,

        /// Region of the service
        #[arg(long, short)]
        region: String,

        #[command(flatten)]
        run: DryRunArgs,
    },

    /// Remove devices from the service they are assigned to
    Unassign {
        /// Device serial numbers
        #[arg(required = true)]
        serials: Vec<String>,

        #[command(flatten)]
        run: DryRunArgs,
    },
}
