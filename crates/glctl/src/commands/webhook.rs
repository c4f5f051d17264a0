//! Webhook command implementations

use glctl_core::resources::webhooks::{
    CreateWebhook, UpdateWebhook, create_webhook, list_webhooks, remove_webhooks, test_webhook,
    update_webhook,
};
use tracing::debug;

use super::{Outcome, print_list, report, report_one};
use crate::cli::{OutputFormat, WebhookCommands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

pub async fn handle_webhook_command(
    cmd: &WebhookCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    let session = conn_mgr.create_session(profile_name)?;

    match cmd {
        WebhookCommands::List { region } => {
            let webhooks = list_webhooks(&session, region).await?;
            debug!("Found {} webhook(s) in {}", webhooks.len(), region);
            print_list(webhooks, output_format, query)
        }
        WebhookCommands::Create {
            name,
            region,
            destination,
            event_filter,
            disabled,
            run,
        } => {
            let request = CreateWebhook::new(name, destination, event_filter)?.enabled(!disabled);
            let status = create_webhook(&session, region, &request, (*run).into()).await?;
            report_one(status, output_format, query)
        }
        WebhookCommands::Update {
            name,
            region,
            new_name,
            destination,
            event_filter,
            enabled,
            disabled,
            run,
        } => {
            let mut changes = UpdateWebhook::new();
            if let Some(new_name) = new_name {
                changes = changes.with_name(new_name)?;
            }
            if let Some(destination) = destination {
                changes = changes.with_destination(destination)?;
            }
            if let Some(event_filter) = event_filter {
                changes = changes.with_event_filter(event_filter)?;
            }
            if *enabled || *disabled {
                changes = changes.with_enabled(*enabled);
            }

            let status = update_webhook(&session, region, name, &changes, (*run).into()).await?;
            report_one(status, output_format, query)
        }
        WebhookCommands::Remove { names, region, run } => {
            let statuses = remove_webhooks(&session, region, names, (*run).into()).await?;
            report(&statuses, output_format, query)
        }
        WebhookCommands::Test { name, region, run } => {
            let status = test_webhook(&session, region, name, (*run).into()).await?;
            report_one(status, output_format, query)
        }
    }
}
