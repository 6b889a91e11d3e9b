//! OAuth completion and session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use studio_core::{LoginInfo, Role, Session, SessionId, TokenPair};

use crate::AuthError;
use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::policy::Policy;
use crate::ports::{AuthorizationUrl, OAuthGateway, SessionStore, UidExtractor, UserRepository};

/// Result of a successful OAuth completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLogin {
    /// Bearer id of the new session.
    pub session_id: SessionId,
    /// Identity-provider uid of the session owner.
    pub user_id: String,
}

/// Drives OAuth login into server-side sessions.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn OAuthGateway>,
    extractor: Option<Arc<dyn UidExtractor>>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserRepository>,
    config: Arc<AuthConfig>,
}

impl AuthService {
    /// Create the service. The fallback uid extractor is optional; see
    /// [`Self::with_uid_extractor`].
    #[must_use]
    pub fn new(
        gateway: Arc<dyn OAuthGateway>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserRepository>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            gateway,
            extractor: None,
            sessions,
            users,
            config,
        }
    }

    /// Wire the fallback uid extractor.
    #[must_use]
    pub fn with_uid_extractor(mut self, extractor: Arc<dyn UidExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Configured session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }

    /// Policy sharing this service's stores and deadlines.
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy::new(
            Arc::clone(&self.sessions),
            Arc::clone(&self.users),
            self.config.gateway_timeout,
        )
    }

    /// Ask the identity provider for an authorization redirect.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, or `Timeout`.
    pub async fn start_oauth(
        &self,
        provider: &str,
        redirect_url: &str,
    ) -> Result<AuthorizationUrl, AuthError> {
        bounded(
            "authorization_url",
            self.config.gateway_timeout,
            self.gateway.authorization_url(provider, redirect_url),
        )
        .await
    }

    /// Exchange an OAuth callback for a new session.
    ///
    /// The whole exchange is bounded by the login deadline. No session is
    /// written unless every prior step succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Config` when the fallback is needed but no extractor is
    /// wired, `Extraction` when the fallback fails, and any gateway or store
    /// error otherwise.
    pub async fn complete_oauth_to_session(
        &self,
        code: &str,
        state: &str,
        ttl: Duration,
    ) -> Result<CompletedLogin, AuthError> {
        bounded(
            "complete_oauth",
            self.config.login_timeout,
            self.complete(code, state, ttl),
        )
        .await
    }

    async fn complete(
        &self,
        code: &str,
        state: &str,
        ttl: Duration,
    ) -> Result<CompletedLogin, AuthError> {
        let timeout = self.config.gateway_timeout;

        let tokens = bounded(
            "login_by_oauth",
            timeout,
            self.gateway.login_by_oauth(code, state),
        )
        .await?;

        let info = self.lookup_login_info(&tokens).await;
        let user_id = match &info {
            Some(info) => info.user_id.clone(),
            None => self.fallback_user_id(&tokens)?,
        };

        bounded(
            "ensure_user",
            timeout,
            self.users.ensure_exists(&user_id),
        )
        .await?;

        if let Some(info) = &info {
            bounded("save_login_info", timeout, self.users.save_login_info(info)).await?;

            if self.config.super_admin_emails.contains(&info.email) {
                bounded(
                    "promote_super_admin",
                    timeout,
                    self.users.set_role(&user_id, Role::SuperAdmin),
                )
                .await?;
                tracing::info!(user_id, "Promoted to super_admin from allow-list");
            }
        }

        let session_id = SessionId::generate();
        let session = Session::new(user_id.clone(), tokens);
        bounded(
            "session_save",
            timeout,
            self.sessions.save(&session_id, &session, ttl),
        )
        .await?;

        tracing::info!(user_id, session = %session_id.redacted(), "Login completed");

        Ok(CompletedLogin {
            session_id,
            user_id,
        })
    }

    /// Authoritative login info, or `None` when it is unusable.
    async fn lookup_login_info(&self, tokens: &TokenPair) -> Option<LoginInfo> {
        let result = bounded(
            "current_user_login_info",
            self.config.gateway_timeout,
            self.gateway
                .current_user_login_info(&tokens.access_token.value),
        )
        .await;

        match result {
            Ok(info) if !info.user_id.is_empty() => Some(info),
            Ok(_) => {
                tracing::warn!("Login info carried no user id, using token claims");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login info lookup failed, using token claims");
                None
            }
        }
    }

    fn fallback_user_id(&self, tokens: &TokenPair) -> Result<String, AuthError> {
        let extractor = self
            .extractor
            .as_ref()
            .ok_or_else(|| AuthError::Config("uid extractor not configured".to_string()))?;

        let user_id = extractor.extract_user_id(&tokens.access_token.value)?;
        if user_id.is_empty() {
            return Err(AuthError::Extraction(crate::ExtractError::MissingUserId));
        }
        Ok(user_id)
    }

    /// End a session. An empty id is ignored; an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns the store error, or `Timeout`.
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), AuthError> {
        if session_id.is_empty() {
            return Ok(());
        }

        bounded(
            "session_delete",
            self.config.gateway_timeout,
            self.sessions.delete(session_id),
        )
        .await?;

        tracing::debug!(session = %session_id.redacted(), "Logged out");
        Ok(())
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .field("uid_extractor", &self.extractor.is_some())
            .finish_non_exhaustive()
    }
}
