//! Configuration loading and validation.
//!
//! Config is a JSON5 file. Location: `~/.llm-studio/llm-studio.json`,
//! or `$LLM_STUDIO_STATE_DIR/llm-studio.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Page;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON5 parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] json5::Error),

    /// Config validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Session and bootstrap-role settings.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Data-plane token settings.
    #[serde(default)]
    pub llm_gateway: LlmGatewaySettings,

    /// Listing defaults.
    #[serde(default)]
    pub listing: ListingSettings,

    /// Downstream call deadlines.
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Local storage.
    #[serde(default)]
    pub storage: StorageSettings,

    /// Global settings.
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns error if config cannot be loaded or parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Save configuration to a path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Self::state_dir().join("llm-studio.json")
    }

    /// Get the LLM Studio state directory.
    ///
    /// Uses `LLM_STUDIO_STATE_DIR` env var if set, otherwise `~/.llm-studio`.
    #[must_use]
    pub fn state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("LLM_STUDIO_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Some(home) = dirs::home_dir() {
            home.join(".llm-studio")
        } else {
            PathBuf::from(".llm-studio")
        }
    }

    /// Directory holding the sled databases.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| Self::state_dir().join("data"))
    }

    /// Apply environment variable overrides.
    ///
    /// Recognized: `LLM_STUDIO_SUPER_ADMIN_EMAILS` (comma-separated),
    /// `LLM_STUDIO_SESSION_TTL_DAYS`, `LLM_STUDIO_TOKEN_TTL_SECONDS`.
    /// Unparseable numbers are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(emails) = std::env::var("LLM_STUDIO_SUPER_ADMIN_EMAILS") {
            self.auth.super_admin_emails = emails
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(days) = std::env::var("LLM_STUDIO_SESSION_TTL_DAYS") {
            match days.trim().parse() {
                Ok(days) => self.auth.session_ttl_days = days,
                Err(_) => {
                    tracing::warn!(value = %days, "Ignoring invalid LLM_STUDIO_SESSION_TTL_DAYS");
                }
            }
        }

        if let Ok(secs) = std::env::var("LLM_STUDIO_TOKEN_TTL_SECONDS") {
            match secs.trim().parse() {
                Ok(secs) => self.llm_gateway.token_ttl_seconds = secs,
                Err(_) => {
                    tracing::warn!(value = %secs, "Ignoring invalid LLM_STUDIO_TOKEN_TTL_SECONDS");
                }
            }
        }

        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_ttl_days == 0 {
            return Err(ConfigError::Validation(
                "auth.sessionTtlDays must be positive".to_string(),
            ));
        }

        if self.auth.session_ttl_days > MAX_SESSION_TTL_DAYS {
            return Err(ConfigError::Validation(format!(
                "auth.sessionTtlDays must be at most {MAX_SESSION_TTL_DAYS}"
            )));
        }

        if self.llm_gateway.token_ttl_seconds <= 0 {
            return Err(ConfigError::Validation(
                "llmGateway.tokenTtlSeconds must be positive".to_string(),
            ));
        }

        if self.listing.default_page_size == 0 {
            return Err(ConfigError::Validation(
                "listing.defaultPageSize must be positive".to_string(),
            ));
        }

        if self.timeouts.gateway_secs == 0 || self.timeouts.login_secs == 0 {
            return Err(ConfigError::Validation(
                "timeouts must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Session and bootstrap-role settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Session lifetime in days.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: u64,

    /// Emails promoted to `super_admin` on login.
    #[serde(default)]
    pub super_admin_emails: Vec<String>,

    /// Key prefix for durable session records.
    #[serde(default = "default_session_prefix")]
    pub session_prefix: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
            super_admin_emails: vec![],
            session_prefix: default_session_prefix(),
        }
    }
}

/// Longest accepted session lifetime, in days.
pub const MAX_SESSION_TTL_DAYS: u64 = 3650;

const fn default_session_ttl_days() -> u64 {
    7
}

fn default_session_prefix() -> String {
    "llmstudio:sess:".to_string()
}

/// Data-plane token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmGatewaySettings {
    /// Lifetime of issued data-plane tokens.
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: i64,

    /// Model ids every issued token is scoped to.
    #[serde(default)]
    pub allowed_model_ids: Vec<String>,
}

impl Default for LlmGatewaySettings {
    fn default() -> Self {
        Self {
            token_ttl_seconds: default_token_ttl_seconds(),
            allowed_model_ids: vec![],
        }
    }
}

const fn default_token_ttl_seconds() -> i64 {
    3600
}

/// Listing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSettings {
    /// Page size used when the caller gives none.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

const fn default_page_size() -> usize {
    Page::DEFAULT_LIMIT
}

/// Downstream call deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutSettings {
    /// Bound for a single identity or admin call.
    #[serde(default = "default_gateway_secs")]
    pub gateway_secs: u64,

    /// Bound for the whole OAuth completion path.
    #[serde(default = "default_login_secs")]
    pub login_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            gateway_secs: default_gateway_secs(),
            login_secs: default_login_secs(),
        }
    }
}

const fn default_gateway_secs() -> u64 {
    5
}

const fn default_login_secs() -> u64 {
    10
}

/// Local storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    /// Directory for sled databases. Defaults to `<state dir>/data`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Global settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Enable debug logging.
    #[serde(default)]
    pub debug: bool,

    /// Log format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}
