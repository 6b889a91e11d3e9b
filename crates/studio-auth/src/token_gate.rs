//! Data-plane token issuance for logged-in users.

use std::sync::Arc;

use studio_core::SessionId;

use crate::AuthError;
use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::policy::{Operation, Policy};
use crate::ports::{IssuedToken, TokenIssuer};

/// Issues data-plane tokens to any valid session.
///
/// TTL and model scope come from deployment config, not the caller.
#[derive(Clone)]
pub struct TokenGate {
    policy: Policy,
    issuer: Arc<dyn TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl TokenGate {
    /// Create the gate.
    #[must_use]
    pub fn new(policy: Policy, issuer: Arc<dyn TokenIssuer>, config: Arc<AuthConfig>) -> Self {
        Self {
            policy,
            issuer,
            config,
        }
    }

    /// Issue a token for the session owner.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for a bad session, or the issuer error.
    pub async fn issue_token(&self, session_id: &SessionId) -> Result<IssuedToken, AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::IssueToken)
            .await?;

        let issued = bounded(
            "issue_token",
            self.config.gateway_timeout,
            self.issuer.issue_token(
                &principal.user_id,
                self.config.token_ttl_seconds,
                &self.config.allowed_model_ids,
            ),
        )
        .await?;

        tracing::debug!(
            user_id = principal.user_id,
            expires_at = issued.expires_at_unix,
            "Data-plane token issued"
        );
        Ok(issued)
    }
}

impl std::fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGate")
            .field("token_ttl_seconds", &self.config.token_ttl_seconds)
            .field("allowed_model_ids", &self.config.allowed_model_ids)
            .finish_non_exhaustive()
    }
}
