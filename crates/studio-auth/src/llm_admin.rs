//! Provider and model administration behind the admin gate.

use std::sync::Arc;

use studio_core::validation::require_non_empty;
use studio_core::{
    LlmModelCapability, LlmModelConfig, LlmModelSpec, LlmProviderConfig, LlmProviderConfigView,
    LlmProviderType, SessionId,
};

use crate::AuthError;
use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::policy::{Operation, Policy};
use crate::ports::LlmGatewayAdmin;

/// Parse a provider name from caller input.
///
/// # Errors
///
/// Returns `InvalidProvider` for unrecognized names.
pub fn parse_provider(s: &str) -> Result<LlmProviderType, AuthError> {
    LlmProviderType::parse(s).ok_or(AuthError::InvalidProvider)
}

/// Parse capability names from caller input. Blank entries are skipped.
///
/// # Errors
///
/// Returns `InvalidCapability` naming the first unrecognized entry.
pub fn parse_capabilities<I, S>(names: I) -> Result<Vec<LlmModelCapability>, AuthError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter(|n| !n.as_ref().trim().is_empty())
        .map(|n| {
            let n = n.as_ref();
            LlmModelCapability::parse(n).ok_or_else(|| AuthError::InvalidCapability(n.to_string()))
        })
        .collect()
}

/// Thin pass-through to the gateway admin API.
///
/// Every call authorizes first; local validation runs before any
/// downstream write.
#[derive(Clone)]
pub struct LlmAdminService {
    policy: Policy,
    admin: Arc<dyn LlmGatewayAdmin>,
    config: Arc<AuthConfig>,
}

impl LlmAdminService {
    /// Create the service.
    #[must_use]
    pub fn new(policy: Policy, admin: Arc<dyn LlmGatewayAdmin>, config: Arc<AuthConfig>) -> Self {
        Self {
            policy,
            admin,
            config,
        }
    }

    /// Provider configs sorted by provider.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, or the gateway error.
    pub async fn list_provider_configs(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<LlmProviderConfigView>, AuthError> {
        self.policy
            .authorize(session_id, Operation::ListProviderConfigs)
            .await?;
        self.provider_configs().await
    }

    async fn provider_configs(&self) -> Result<Vec<LlmProviderConfigView>, AuthError> {
        let mut configs = bounded(
            "list_provider_configs",
            self.config.gateway_timeout,
            self.admin.list_provider_configs(),
        )
        .await?;
        configs.sort_by_key(|c| c.provider);
        Ok(configs)
    }

    /// Create or replace a provider config. `base_url` and `api_key` are
    /// trimmed before delegation.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, or the gateway error.
    pub async fn upsert_provider_config(
        &self,
        session_id: &SessionId,
        config: LlmProviderConfig,
    ) -> Result<(), AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::UpsertProviderConfig)
            .await?;

        let config = LlmProviderConfig {
            base_url: config.base_url.trim().to_string(),
            api_key: config.api_key.trimmed(),
            ..config
        };

        bounded(
            "upsert_provider_config",
            self.config.gateway_timeout,
            self.admin.upsert_provider_config(&config),
        )
        .await?;

        tracing::info!(
            user_id = principal.user_id,
            provider = %config.provider,
            "Provider config upserted"
        );
        Ok(())
    }

    /// Remove a provider config.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, or the gateway error.
    pub async fn delete_provider_config(
        &self,
        session_id: &SessionId,
        provider: LlmProviderType,
    ) -> Result<(), AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::DeleteProviderConfig)
            .await?;

        bounded(
            "delete_provider_config",
            self.config.gateway_timeout,
            self.admin.delete_provider_config(provider),
        )
        .await?;

        tracing::info!(user_id = principal.user_id, %provider, "Provider config deleted");
        Ok(())
    }

    /// Models sorted by id.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, or the gateway error.
    pub async fn list_models(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<LlmModelSpec>, AuthError> {
        self.policy
            .authorize(session_id, Operation::ListModels)
            .await?;

        let mut models = bounded(
            "list_models",
            self.config.gateway_timeout,
            self.admin.list_models(),
        )
        .await?;
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }

    /// Create or replace a model, returning its id.
    ///
    /// The provider must already appear in the provider listing. That is a
    /// live read, not a constraint: a concurrent delete can race it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, `InvalidUpstreamModel`,
    /// `ProviderNotConfigured`, or the gateway error.
    pub async fn upsert_model(
        &self,
        session_id: &SessionId,
        config: LlmModelConfig,
    ) -> Result<String, AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::UpsertModel)
            .await?;

        let upstream_model = require_non_empty("upstream_model", &config.upstream_model)
            .map_err(|_| AuthError::InvalidUpstreamModel)?;

        let configured = self
            .provider_configs()
            .await?
            .iter()
            .any(|c| c.provider == config.provider);
        if !configured {
            return Err(AuthError::ProviderNotConfigured(config.provider));
        }

        let config = LlmModelConfig {
            upstream_model,
            ..config
        };
        let id = bounded(
            "upsert_model",
            self.config.gateway_timeout,
            self.admin.upsert_model(&config),
        )
        .await?;

        tracing::info!(
            user_id = principal.user_id,
            model_id = id,
            provider = %config.provider,
            "Model upserted"
        );
        Ok(id)
    }

    /// Remove a model. The id is trimmed first.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, `InvalidModelId`, or the
    /// gateway error.
    pub async fn delete_model(&self, session_id: &SessionId, id: &str) -> Result<(), AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::DeleteModel)
            .await?;

        let id = require_non_empty("id", id).map_err(|_| AuthError::InvalidModelId)?;

        bounded(
            "delete_model",
            self.config.gateway_timeout,
            self.admin.delete_model(&id),
        )
        .await?;

        tracing::info!(user_id = principal.user_id, model_id = id, "Model deleted");
        Ok(())
    }
}

impl std::fmt::Debug for LlmAdminService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAdminService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
