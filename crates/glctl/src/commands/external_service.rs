//! External service command implementations

use glctl_core::resources::api_credentials::{CreateApiCredential, create_api_credential};
use glctl_core::resources::external_services::{
    ClientCredential, CreateExternalService, DsccIntegration, ServiceNowIntegration,
    UpdateExternalService, create_external_service, list_external_services,
    remove_external_services, test_external_service, update_external_service,
};
use glctl_core::{RunOptions, SecretValue, SessionContext, Status};
use tracing::{debug, info};

use super::{
    CLIENT_SECRET_ENV, Outcome, REFRESH_TOKEN_ENV, print_list, read_secret, report, report_one,
};
use crate::cli::{CreateExternalServiceCommands, ExternalServiceCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;

pub async fn handle_external_service_command(
    cmd: &ExternalServiceCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    let mut session = conn_mgr.create_session(profile_name)?;

    match cmd {
        ExternalServiceCommands::List { region } => {
            let services = list_external_services(&session, region).await?;
            debug!("Found {} external service(s) in {}", services.len(), region);
            print_list(services, output_format, query)
        }
        ExternalServiceCommands::Create(create) => {
            handle_create(&mut session, create, output_format, query).await
        }
        ExternalServiceCommands::Update {
            name,
            region,
            new_name,
            description,
            client_id,
            run,
        } => {
            let mut changes = UpdateExternalService::new();
            if let Some(new_name) = new_name {
                changes = changes.with_name(new_name)?;
            }
            if let Some(description) = description {
                changes = changes.with_description(description.as_str());
            }
            if let Some(client_id) = client_id {
                let secret = read_secret(CLIENT_SECRET_ENV, "Client secret")?;
                changes = changes.with_credential(ClientCredential::new(client_id, secret)?);
            }

            let status =
                update_external_service(&session, region, name, &changes, (*run).into()).await?;
            report_one(status, output_format, query)
        }
        ExternalServiceCommands::Remove { names, region, run } => {
            let statuses =
                remove_external_services(&session, region, names, (*run).into()).await?;
            report(&statuses, output_format, query)
        }
        ExternalServiceCommands::Test { name, region, run } => {
            let status = test_external_service(&session, region, name, (*run).into()).await?;
            report_one(status, output_format, query)
        }
    }
}

async fn handle_create(
    session: &mut SessionContext,
    cmd: &CreateExternalServiceCommands,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<Outcome> {
    match cmd {
        CreateExternalServiceCommands::ServiceNow {
            name,
            region,
            client_id,
            oauth_url,
            incident_url,
            refresh_token_expiry_days,
            description,
            run,
        } => {
            let credential =
                ClientCredential::new(client_id, read_secret(CLIENT_SECRET_ENV, "Client secret")?)?;
            let refresh_token = read_secret(REFRESH_TOKEN_ENV, "Refresh token")?;

            let mut integration = ServiceNowIntegration::new(
                name,
                credential,
                refresh_token,
                oauth_url,
                incident_url,
                *refresh_token_expiry_days,
            )?;
            if let Some(description) = description {
                integration = integration.with_description(description.as_str());
            }

            let request = CreateExternalService::from(integration);
            let status = create_external_service(session, region, &request, (*run).into()).await?;
            report_one(status, output_format, query)
        }
        CreateExternalServiceCommands::Dscc {
            name,
            region,
            dscc_region,
            client_id,
            new_credential,
            credential_service,
            description,
            run,
        } => {
            let options: RunOptions = (*run).into();
            let mut statuses = Vec::new();

            let credential = match (client_id, new_credential, credential_service) {
                (Some(client_id), _, _) => {
                    ClientCredential::new(client_id, read_secret(CLIENT_SECRET_ENV, "Client secret")?)?
                }
                (None, Some(credential_name), Some(service)) => {
                    let request = CreateApiCredential::new(credential_name, service, region)?;
                    let status = create_api_credential(session, &request, options).await?;
                    let created = status
                        .as_ref()
                        .is_none_or(|s| s.status() == Status::Complete);
                    statuses.extend(status);

                    if !created {
                        // The integration cannot be created without its credential
                        return report(&statuses, output_format, query);
                    }

                    match session
                        .api_credentials()
                        .iter()
                        .find(|c| c.name == *credential_name)
                    {
                        Some(cached) => {
                            info!("Using new API credential '{}'", credential_name);
                            ClientCredential::from(cached)
                        }
                        // Dry run: nothing was created, preview with placeholders
                        None => ClientCredential::new(
                            &format!("<client-id:{}>", credential_name),
                            SecretValue::new("<client-secret>"),
                        )?,
                    }
                }
                _ => {
                    return Err(crate::error::GlctlError::InvalidInput {
                        message: "Either --client-id or --new-credential with --credential-service is required"
                            .to_string(),
                    });
                }
            };

            let mut integration = DsccIntegration::new(name, credential, dscc_region)?;
            if let Some(description) = description {
                integration = integration.with_description(description.as_str());
            }

            let request = CreateExternalService::from(integration);
            let status = create_external_service(session, region, &request, options).await?;
            statuses.extend(status);
            report(&statuses, output_format, query)
        }
    }
}
