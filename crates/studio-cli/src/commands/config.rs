//! Config inspection commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use studio_auth::AuthConfig;
use studio_core::{Config, ConfigError};

use crate::ui;

/// Config command actions.
#[derive(Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Validate the config file.
    Validate,
}

/// Config file path: the explicit override or the state-dir default.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(Config::default_path, Path::to_path_buf)
}

/// Load the effective configuration.
///
/// A missing file yields defaults. Environment overrides are applied and
/// the result is validated again.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let config = if path.exists() {
        Config::load(path)?
    } else {
        Config::default()
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Run the config command.
pub fn run_config(
    action: ConfigAction,
    path: &Path,
    loaded: Result<Config, ConfigError>,
) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = loaded?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Validate => {
            validate(path, loaded);
            Ok(())
        }
    }
}

fn validate(path: &Path, loaded: Result<Config, ConfigError>) {
    ui::header("Validating Configuration");

    if path.exists() {
        ui::kv("File", &path.display().to_string());
    } else {
        ui::warning(&format!(
            "Config file not found: {} (using defaults)",
            path.display()
        ));
    }

    match loaded {
        Ok(config) => {
            ui::success("Configuration is valid");

            let auth = AuthConfig::from_config(&config);
            ui::kv(
                "Session TTL",
                &format!("{} days", config.auth.session_ttl_days),
            );
            ui::kv(
                "Token TTL",
                &format!("{} seconds", auth.token_ttl_seconds),
            );
            ui::kv("Allowed models", &auth.allowed_model_ids.len().to_string());
            ui::kv("Data dir", &config.data_dir().display().to_string());

            if auth.super_admin_emails.is_empty() {
                ui::warning("No super-admin emails configured; nobody is promoted at login");
            } else {
                ui::kv(
                    "Super-admin emails",
                    &auth.super_admin_emails.len().to_string(),
                );
            }
        }
        Err(ConfigError::Parse(e)) => ui::error(&format!("Syntax error: {e}")),
        Err(e) => ui::error(&e.to_string()),
    }
}
