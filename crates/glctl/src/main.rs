use anyhow::Result;
use clap::Parser;
use glctl_core::Config;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use commands::Outcome;
use connection::ConnectionManager;
use error::Result as CliResult;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        Config::load_from_path(&path).map(|config| (config, Some(path)))
    } else {
        debug!("Loading config from default location");
        Config::load().map(|config| (config, None))
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error::GlctlError::from(e).print_diagnostic();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    match execute_command(&cli, &conn_mgr).await {
        Ok(Outcome::Success) => Ok(()),
        Ok(Outcome::ItemsFailed) => std::process::exit(1),
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "glctl=warn,glctl_core=warn",
            1 => "glctl=info,glctl_core=info",
            2 => "glctl=debug,glctl_core=debug",
            _ => "glctl=trace,glctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> CliResult<Outcome> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let query = cli.query.as_deref();

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, cli.output.into(), None)?;
                }
                _ => {
                    println!("glctl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(Outcome::Success)
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }

        Commands::Webhook(cmd) => {
            commands::webhook::handle_webhook_command(cmd, conn_mgr, profile, cli.output, query)
                .await
        }

        Commands::ExternalService(cmd) => {
            commands::external_service::handle_external_service_command(
                cmd, conn_mgr, profile, cli.output, query,
            )
            .await
        }

        Commands::Service(cmd) => {
            commands::service::handle_service_command(cmd, conn_mgr, profile, cli.output, query)
                .await
        }

        Commands::ApiCredential(cmd) => {
            commands::api_credential::handle_api_credential_command(
                cmd, conn_mgr, profile, cli.output, query,
            )
            .await
        }

        Commands::Device(cmd) => {
            commands::device::handle_device_command(cmd, conn_mgr, profile, cli.output, query)
                .await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(Outcome::Success) => info!("Command completed successfully in {:?}", duration),
        Ok(Outcome::ItemsFailed) => info!("Command completed with failures in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands;
            match cmd {
                ProfileCommands::List => "profile list".to_string(),
                ProfileCommands::Path => "profile path".to_string(),
                ProfileCommands::Show { name } => format!("profile show {}", name),
                ProfileCommands::Set { name, .. } => {
                    format!("profile set {} [token redacted]", name)
                }
                ProfileCommands::Remove { name } => format!("profile remove {}", name),
                ProfileCommands::Default { name } => format!("profile default {}", name),
            }
        }
        // Secrets never travel through argv, resource commands are safe to print
        Commands::Webhook(cmd) => format!("webhook {:?}", cmd),
        Commands::ExternalService(cmd) => format!("external-service {:?}", cmd),
        Commands::Service(cmd) => format!("service {:?}", cmd),
        Commands::ApiCredential(cmd) => format!("api-credential {:?}", cmd),
        Commands::Device(cmd) => format!("device {:?}", cmd),
    }
}
