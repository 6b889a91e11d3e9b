//! Port traits implemented by infrastructure adapters.
//!
//! Every async method can be cancelled by dropping its future; callers bound
//! each call with [`crate::deadline::bounded`]. No port is retried here.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use studio_core::{
    AdminUser, LlmModelConfig, LlmModelSpec, LlmProviderConfig, LlmProviderConfigView,
    LlmProviderType, LoginInfo, Me, Page, Role, Session, SessionId, TokenPair,
};

/// Session store and user directory errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record absent (never existed, deleted, or expired).
    #[error("Record not found")]
    NotFound,

    /// Backend failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Identity provider and admin backend errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Backend could not be reached.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected the request (bad code, state, or redirect URL).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Fallback user-id extraction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No access token given.
    #[error("Empty access token")]
    EmptyToken,

    /// Token is not a parseable JWT.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Claims carry no usable user id.
    #[error("User id not found in token claims")]
    MissingUserId,
}

/// Authorization redirect issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationUrl {
    /// URL the browser is sent to.
    pub url: String,
    /// Opaque OAuth state echoed back on callback.
    pub state: String,
}

/// Data-plane token issued by the LLM gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Bearer token for the data plane.
    pub token: String,
    /// Expiration (Unix timestamp).
    pub expires_at_unix: i64,
}

/// External identity provider.
#[async_trait]
pub trait OAuthGateway: Send + Sync {
    /// Issue an authorization URL and state for `provider`.
    async fn authorization_url(
        &self,
        provider: &str,
        redirect_url: &str,
    ) -> Result<AuthorizationUrl, GatewayError>;

    /// Exchange an authorization code and state for tokens.
    async fn login_by_oauth(&self, code: &str, state: &str) -> Result<TokenPair, GatewayError>;

    /// Authoritative login-info lookup for the owner of `access_token`.
    async fn current_user_login_info(&self, access_token: &str)
    -> Result<LoginInfo, GatewayError>;
}

/// Best-effort, unverified user-id extraction from an access token.
pub trait UidExtractor: Send + Sync {
    /// Extract the user id from the token's claims.
    ///
    /// # Errors
    ///
    /// Returns error if the token cannot be parsed or carries no user id.
    fn extract_user_id(&self, access_token: &str) -> Result<String, ExtractError>;
}

/// Durable, TTL-bound session storage.
///
/// Expiry is enforced by the store: an expired session must read back as
/// [`StoreError::NotFound`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist `session` under `id` for `ttl`.
    async fn save(&self, id: &SessionId, session: &Session, ttl: Duration)
    -> Result<(), StoreError>;

    /// Load a live session.
    async fn get(&self, id: &SessionId) -> Result<Session, StoreError>;

    /// Delete a session. Deleting an absent session succeeds.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;
}

/// Local user records keyed by identity-provider uid.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the user with role `user` if absent. Idempotent.
    async fn ensure_exists(&self, user_id: &str) -> Result<(), StoreError>;

    /// Upsert the login-info snapshot for `info.user_id`.
    async fn save_login_info(&self, info: &LoginInfo) -> Result<(), StoreError>;

    /// Current role. Missing users yield [`StoreError::NotFound`].
    async fn get_role(&self, user_id: &str) -> Result<Role, StoreError>;

    /// Set the role, creating the user first if needed.
    async fn set_role(&self, user_id: &str, role: Role) -> Result<(), StoreError>;

    /// Users ordered newest first.
    async fn list_users(&self, page: Page) -> Result<Vec<AdminUser>, StoreError>;

    /// Composite current-user view. Missing users yield [`StoreError::NotFound`].
    async fn get_me(&self, user_id: &str) -> Result<Me, StoreError>;

    /// Set the nickname, creating the user first if needed.
    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<(), StoreError>;
}

/// Downstream administrative API for provider and model configuration.
#[async_trait]
pub trait LlmGatewayAdmin: Send + Sync {
    /// Create or replace a provider config.
    async fn upsert_provider_config(&self, config: &LlmProviderConfig)
    -> Result<(), GatewayError>;

    /// Remove a provider config.
    async fn delete_provider_config(&self, provider: LlmProviderType) -> Result<(), GatewayError>;

    /// All provider configs.
    async fn list_provider_configs(&self) -> Result<Vec<LlmProviderConfigView>, GatewayError>;

    /// Create or replace a model, returning its id.
    async fn upsert_model(&self, config: &LlmModelConfig) -> Result<String, GatewayError>;

    /// Remove a model.
    async fn delete_model(&self, id: &str) -> Result<(), GatewayError>;

    /// All models.
    async fn list_models(&self) -> Result<Vec<LlmModelSpec>, GatewayError>;
}

/// Issuer of short-lived data-plane tokens.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue a token for `subject` scoped to `allowed_model_ids`.
    async fn issue_token(
        &self,
        subject: &str,
        ttl_seconds: i64,
        allowed_model_ids: &[String],
    ) -> Result<IssuedToken, GatewayError>;
}
