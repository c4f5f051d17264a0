//! Device assignment command implementations

use glctl_core::resources::devices::{assign_devices, unassign_devices};

use super::{Outcome, report};
use crate::cli::{DeviceCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

pub async fn handle_device_command(
    cmd: &DeviceCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    let session = conn_mgr.create_session(profile_name)?;

    let statuses = match cmd {
        DeviceCommands::Assign {
            serials,
            service,
            region,
            run,
        } => assign_devices(&session, serials, service, region, (*run).into()).await?,
        DeviceCommands::Unassign { serials, run } => {
            unassign_devices(&session, serials, (*run).into()).await?
        }
    };

    report(&statuses, output_format, query)
}
