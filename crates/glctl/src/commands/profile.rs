//! Profile management command implementations

use colored::Colorize;
use glctl_core::config::CredentialStore;
use glctl_core::{Config, Profile};
use tracing::{debug, info, trace, warn};

use super::{Outcome, read_secret};
use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{GlctlError, Result as CliResult};
use crate::output;

/// Environment variable read when `--token` is omitted
const TOKEN_ENV: &str = "GLCTL_TOKEN";

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<Outcome> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            token,
            workspace_id,
            glp_url,
            com_url,
            regions,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let settings = ProfileSettings {
                token: token.clone(),
                workspace_id: workspace_id.clone(),
                glp_url: glp_url.clone(),
                com_url: com_url.clone(),
                regions: regions.clone(),
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
            };
            handle_set(conn_mgr, name, settings)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }?;

    Ok(Outcome::Success)
}

/// Options of `profile set`
struct ProfileSettings {
    token: Option<String>,
    workspace_id: Option<String>,
    glp_url: String,
    com_url: String,
    regions: Vec<String>,
    #[cfg(feature = "secure-storage")]
    use_keyring: bool,
}

fn config_location(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .clone()
        .or_else(|| Config::config_path().ok())
        .map(|p| p.display().to_string())
}

fn structured(output_format: OutputFormat) -> Option<output::OutputFormat> {
    match output_format {
        OutputFormat::Json => Some(output::OutputFormat::Json),
        OutputFormat::Yaml => Some(output::OutputFormat::Yaml),
        OutputFormat::Auto | OutputFormat::Table => None,
    }
}

/// Token as shown to the user
fn masked_token(token: &str) -> String {
    if CredentialStore::is_keyring_reference(token) {
        return token.to_string();
    }
    if token.starts_with("${") {
        return token.to_string();
    }
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}

fn profile_json(name: &str, profile: &Profile, is_default: bool) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "name": name,
        "is_default": is_default,
        "token": masked_token(&profile.token),
        "glp_url": profile.glp_url,
        "com_url": profile.com_url,
        "regions": profile.regions,
    });
    if let Some(ref workspace_id) = profile.workspace_id {
        obj["workspace_id"] = serde_json::json!(workspace_id);
    }
    if let Some(ref polling) = profile.polling {
        obj["polling"] = serde_json::json!(polling);
    }
    obj
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    if let Some(fmt) = structured(output_format) {
        let profile_list: Vec<serde_json::Value> = profiles
            .iter()
            .map(|(name, profile)| profile_json(name, profile, default == Some(name.as_str())))
            .collect();

        let output_data = serde_json::json!({
            "config_path": config_location(conn_mgr),
            "profiles": profile_list,
            "count": profiles.len(),
        });
        output::print_output(&output_data, fmt, None)?;
        return Ok(());
    }

    if let Some(path) = config_location(conn_mgr) {
        println!("Configuration file: {}", path);
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'glctl profile set' to create a profile.");
        return Ok(());
    }

    for (name, profile) in &profiles {
        if default == Some(name.as_str()) {
            println!("  {} {}", name.bold().cyan(), "(default)".green());
        } else {
            println!("  {}", name.bold().cyan());
        }
        if let Some(ref workspace_id) = profile.workspace_id {
            println!("    {} {}", "Workspace:".dimmed(), workspace_id);
        }
        if !profile.regions.is_empty() {
            println!("    {}   {}", "Regions:".dimmed(), profile.regions.join(", "));
        }
    }

    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match conn_mgr.config_path {
        Some(ref path) => path.clone(),
        None => Config::config_path()?,
    };

    match structured(output_format) {
        Some(fmt) => {
            let output_data = serde_json::json!({ "config_path": config_path.to_str() });
            output::print_output(&output_data, fmt, None)?;
        }
        None => println!("{}", config_path.display()),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| GlctlError::ProfileNotFound {
            name: name.to_string(),
        })?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    if let Some(fmt) = structured(output_format) {
        output::print_output(profile_json(name, profile, is_default), fmt, None)?;
        return Ok(());
    }

    println!("Profile: {}", name.bold());
    if is_default {
        println!("Default: {}", "yes".green());
    }
    if let Some(ref workspace_id) = profile.workspace_id {
        println!("Workspace: {}", workspace_id);
    }
    println!("Token: {}", masked_token(&profile.token));
    println!("Platform URL: {}", profile.glp_url);
    println!("Regional URL: {}", profile.com_url);
    if profile.regions.is_empty() {
        println!("Regions: {}", "(none)".dimmed());
    } else {
        println!("Regions: {}", profile.regions.join(", "));
    }
    if let Some(ref polling) = profile.polling {
        println!(
            "Polling: every {}s (provision {}, enable {}, activity {} attempts)",
            polling.interval_secs,
            polling.provision_attempts,
            polling.enable_attempts,
            polling.activity_attempts
        );
    }

    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    settings: ProfileSettings,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);

    let token = match settings.token {
        Some(token) if !token.is_empty() => token,
        _ => read_secret(TOKEN_ENV, "Workspace token")?.reveal()?,
    };

    #[cfg(feature = "secure-storage")]
    let token = if settings.use_keyring {
        let reference = CredentialStore::store_token(name, &token)?;
        println!("Token stored securely in OS keyring");
        reference
    } else {
        token
    };

    // Polling overrides are only edited in the file, keep them
    let polling = conn_mgr
        .config
        .profiles
        .get(name)
        .and_then(|existing| existing.polling.clone());

    let profile = Profile {
        workspace_id: settings.workspace_id,
        glp_url: settings.glp_url,
        com_url: settings.com_url,
        regions: settings
            .regions
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
        polling,
        ..Profile::new(token)
    };

    let mut config = conn_mgr.config.clone();
    let first_profile = config.profiles.is_empty();
    config.set_profile(name.to_string(), profile);
    conn_mgr.save_config(&config)?;

    match config_location(conn_mgr) {
        Some(path) => {
            println!("Profile '{}' saved successfully to:", name);
            println!("  {}", path);
        }
        None => println!("Profile '{}' saved successfully.", name),
    }

    if first_profile {
        println!();
        println!("Tip: Make it the default with:");
        println!("  glctl profile default {}", name);
    }

    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);

    let removed = config
        .remove_profile(name)
        .ok_or_else(|| GlctlError::ProfileNotFound {
            name: name.to_string(),
        })?;

    if let Err(e) = CredentialStore::forget(&removed.token) {
        warn!("Failed to delete keyring entry for '{}': {}", name, e);
    }

    conn_mgr.save_config(&config)?;
    println!("Profile '{}' removed successfully", name);
    if was_default {
        println!("It was the default profile; no default is set now.");
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(GlctlError::ProfileNotFound {
            name: name.to_string(),
        });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'", name);
    Ok(())
}
