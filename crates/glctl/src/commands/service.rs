//! Service provisioning command implementations

use glctl_core::resources::services::{
    list_service_catalogue, list_services, provision_services, remove_services,
};

use super::{Outcome, print_list, report};
use crate::cli::{OutputFormat, ServiceCommands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

pub async fn handle_service_command(
    cmd: &ServiceCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    let session = conn_mgr.create_session(profile_name)?;

    match cmd {
        ServiceCommands::List { catalogue: true, .. } => {
            print_list(list_service_catalogue(&session).await?, output_format, query)
        }
        ServiceCommands::List { region, .. } => print_list(
            list_services(&session, region.as_deref()).await?,
            output_format,
            query,
        ),
        ServiceCommands::Provision { names, region, run } => {
            let statuses = provision_services(&session, region, names, (*run).into()).await?;
            report(&statuses, output_format, query)
        }
        ServiceCommands::Remove { names, region, run } => {
            let statuses = remove_services(&session, region, names, (*run).into()).await?;
            report(&statuses, output_format, query)
        }
    }
}
