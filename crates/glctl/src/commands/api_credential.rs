//! API credential command implementations

use colored::Colorize;
use glctl_core::Status;
use glctl_core::resources::api_credentials::{
    CreateApiCredential, create_api_credential, list_api_credentials, remove_api_credentials,
};

use super::{Outcome, print_list, report, report_one};
use crate::cli::{ApiCredentialCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

pub async fn handle_api_credential_command(
    cmd: &ApiCredentialCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    let mut session = conn_mgr.create_session(profile_name)?;

    match cmd {
        ApiCredentialCommands::List => {
            print_list(list_api_credentials(&session).await?, output_format, query)
        }
        ApiCredentialCommands::Create {
            name,
            service,
            region,
            run,
        } => {
            let request = CreateApiCredential::new(name, service, region)?;
            let status = create_api_credential(&mut session, &request, (*run).into()).await?;

            // The secret is only ever returned by this call
            if status.as_ref().is_some_and(|s| s.status() == Status::Complete)
                && let Some(cached) = session.api_credentials().iter().find(|c| c.name == request.name())
            {
                eprintln!("Client secret: {}", cached.client_secret.reveal()?);
                eprintln!(
                    "{}",
                    "Store it now: glctl does not keep it and it cannot be retrieved later."
                        .yellow()
                );
            }
            report_one(status, output_format, query)
        }
        ApiCredentialCommands::Remove { names, run } => {
            let statuses = remove_api_credentials(&mut session, names, (*run).into()).await?;
            report(&statuses, output_format, query)
        }
    }
}
