//! Authentication configuration.

use std::collections::HashSet;
use std::time::Duration;

use studio_core::Config;
use studio_core::types::Page;
use studio_core::validation::normalize_email;

/// Default session lifetime in days.
const DEFAULT_SESSION_TTL_DAYS: u64 = 7;
/// Default data-plane token lifetime in seconds.
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
/// Default bound for a single identity or admin call.
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);
/// Default bound for the whole OAuth completion path.
const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Normalized super-admin email allow-list.
///
/// Entries are trimmed and lower-cased; empty entries are dropped. An empty
/// list disables auto-promotion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperAdminEmails(HashSet<String>);

impl SuperAdminEmails {
    /// Build the set from raw configured entries.
    #[must_use]
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            emails
                .into_iter()
                .map(|e| normalize_email(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    /// Whether `email` matches an entry (case-insensitive, trimmed).
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let email = normalize_email(email);
        !email.is_empty() && self.0.contains(&email)
    }

    /// Whether auto-promotion is disabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Immutable runtime snapshot consumed by the services.
///
/// Built once at startup from the file config (or the builder in tests).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session lifetime.
    pub session_ttl: Duration,

    /// Lifetime of issued data-plane tokens.
    pub token_ttl_seconds: i64,

    /// Model ids every issued data-plane token is scoped to.
    pub allowed_model_ids: Vec<String>,

    /// Emails promoted to `super_admin` at login.
    pub super_admin_emails: SuperAdminEmails,

    /// Page size used when a listing gives none.
    pub default_page_size: usize,

    /// Bound for a single identity, admin, or store call.
    pub gateway_timeout: Duration,

    /// Bound for the whole OAuth completion path.
    pub login_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: days(DEFAULT_SESSION_TTL_DAYS),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            allowed_model_ids: vec![],
            super_admin_emails: SuperAdminEmails::default(),
            default_page_size: Page::DEFAULT_LIMIT,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}

impl AuthConfig {
    /// Create a new auth config builder.
    #[must_use]
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Derive the snapshot from the file config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let snapshot = Self {
            session_ttl: days(config.auth.session_ttl_days),
            token_ttl_seconds: config.llm_gateway.token_ttl_seconds,
            allowed_model_ids: config.llm_gateway.allowed_model_ids.clone(),
            super_admin_emails: SuperAdminEmails::new(&config.auth.super_admin_emails),
            default_page_size: config.listing.default_page_size,
            gateway_timeout: Duration::from_secs(config.timeouts.gateway_secs),
            login_timeout: Duration::from_secs(config.timeouts.login_secs),
        };

        tracing::info!(
            session_ttl_secs = snapshot.session_ttl.as_secs(),
            token_ttl_seconds = snapshot.token_ttl_seconds,
            allowed_models = snapshot.allowed_model_ids.len(),
            super_admins = snapshot.super_admin_emails.len(),
            "Auth config loaded"
        );

        snapshot
    }

    /// Normalize raw listing input against the configured page size.
    #[must_use]
    pub fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Page {
        Page::normalize(limit, offset, self.default_page_size)
    }
}

fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(24 * 3600))
}

/// Builder for `AuthConfig`.
#[derive(Debug, Default)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    /// Set session lifetime in days.
    #[must_use]
    pub fn session_ttl_days(mut self, n: u64) -> Self {
        self.config.session_ttl = days(n);
        self
    }

    /// Set data-plane token lifetime.
    #[must_use]
    pub const fn token_ttl_seconds(mut self, secs: i64) -> Self {
        self.config.token_ttl_seconds = secs;
        self
    }

    /// Add a model id to the data-plane token scope.
    #[must_use]
    pub fn allowed_model(mut self, id: impl Into<String>) -> Self {
        self.config.allowed_model_ids.push(id.into());
        self
    }

    /// Set the super-admin allow-list.
    #[must_use]
    pub fn super_admin_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.super_admin_emails = SuperAdminEmails::new(emails);
        self
    }

    /// Set default listing page size.
    #[must_use]
    pub const fn default_page_size(mut self, n: usize) -> Self {
        self.config.default_page_size = n;
        self
    }

    /// Set per-call deadline.
    #[must_use]
    pub const fn gateway_timeout(mut self, d: Duration) -> Self {
        self.config.gateway_timeout = d;
        self
    }

    /// Set OAuth completion deadline.
    #[must_use]
    pub const fn login_timeout(mut self, d: Duration) -> Self {
        self.config.login_timeout = d;
        self
    }

    /// Build the config.
    #[must_use]
    pub fn build(self) -> AuthConfig {
        self.config
    }
}
