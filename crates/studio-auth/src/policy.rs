//! Session-to-principal resolution and role gates.

use std::sync::Arc;
use std::time::Duration;

use studio_core::{Role, SessionId};

use crate::AuthError;
use crate::deadline::bounded;
use crate::ports::{SessionStore, StoreError, UserRepository};

/// Least role an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MinimumRole {
    /// Any valid session.
    Authenticated,
    /// `admin` or `super_admin`.
    Admin,
    /// `super_admin` only.
    SuperAdmin,
}

impl MinimumRole {
    /// Whether `role` satisfies this requirement.
    #[must_use]
    pub const fn admits(self, role: Role) -> bool {
        match self {
            Self::Authenticated => true,
            Self::Admin => role.is_privileged(),
            Self::SuperAdmin => role.can_assign_roles(),
        }
    }
}

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read the caller's own profile.
    GetOwnProfile,
    /// Change the caller's own nickname.
    UpdateOwnProfile,
    /// List all users.
    ListUsers,
    /// Change another user's role.
    AssignRole,
    /// List LLM provider configs.
    ListProviderConfigs,
    /// Create or replace an LLM provider config.
    UpsertProviderConfig,
    /// Remove an LLM provider config.
    DeleteProviderConfig,
    /// List LLM models.
    ListModels,
    /// Create or replace an LLM model.
    UpsertModel,
    /// Remove an LLM model.
    DeleteModel,
    /// Obtain a data-plane token.
    IssueToken,
}

impl Operation {
    /// Role the caller needs for this operation.
    #[must_use]
    pub const fn minimum_role(self) -> MinimumRole {
        match self {
            Self::GetOwnProfile | Self::UpdateOwnProfile | Self::IssueToken => {
                MinimumRole::Authenticated
            }
            Self::AssignRole => MinimumRole::SuperAdmin,
            Self::ListUsers
            | Self::ListProviderConfigs
            | Self::UpsertProviderConfig
            | Self::DeleteProviderConfig
            | Self::ListModels
            | Self::UpsertModel
            | Self::DeleteModel => MinimumRole::Admin,
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetOwnProfile => "get_own_profile",
            Self::UpdateOwnProfile => "update_own_profile",
            Self::ListUsers => "list_users",
            Self::AssignRole => "assign_role",
            Self::ListProviderConfigs => "list_provider_configs",
            Self::UpsertProviderConfig => "upsert_provider_config",
            Self::DeleteProviderConfig => "delete_provider_config",
            Self::ListModels => "list_models",
            Self::UpsertModel => "upsert_model",
            Self::DeleteModel => "delete_model",
            Self::IssueToken => "issue_token",
        }
    }
}

/// Caller resolved from a session.
///
/// `role` is populated only when the operation required a role check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Identity-provider uid of the session owner.
    pub user_id: String,
    /// Role read during authorization, if any.
    pub role: Option<Role>,
}

/// Resolves sessions and enforces role gates.
///
/// Shared by every service so the checks cannot drift apart.
#[derive(Clone)]
pub struct Policy {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserRepository>,
    timeout: Duration,
}

impl Policy {
    /// Create a policy over the given stores.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            users,
            timeout,
        }
    }

    /// Resolve a session id to its owner.
    ///
    /// An empty id and every lookup failure, including a timeout, read as
    /// unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the session is absent or unreadable.
    pub async fn authenticate(&self, session_id: &SessionId) -> Result<String, AuthError> {
        if session_id.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        match bounded("session_get", self.timeout, self.sessions.get(session_id)).await {
            Ok(session) => Ok(session.user_id),
            Err(e) => {
                tracing::debug!(session = %session_id.redacted(), error = %e, "Session rejected");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Read the caller's role.
    ///
    /// A user that has a session but no record yet is created with role
    /// `user`.
    ///
    /// # Errors
    ///
    /// Returns error if the user directory fails.
    pub async fn resolve_role(&self, user_id: &str) -> Result<Role, AuthError> {
        match bounded("get_role", self.timeout, self.users.get_role(user_id)).await {
            Err(AuthError::Storage(StoreError::NotFound)) => {
                tracing::debug!(user_id, "Session owner has no user record, creating");
                bounded("ensure_user", self.timeout, self.users.ensure_exists(user_id)).await?;
                Ok(Role::User)
            }
            other => other,
        }
    }

    /// Authenticate the session and check the operation's role gate.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for a bad session, `Forbidden` for an
    /// insufficient role, or the directory error when the role cannot be
    /// read.
    pub async fn authorize(
        &self,
        session_id: &SessionId,
        operation: Operation,
    ) -> Result<Principal, AuthError> {
        let user_id = self.authenticate(session_id).await?;

        let required = operation.minimum_role();
        if required == MinimumRole::Authenticated {
            return Ok(Principal {
                user_id,
                role: None,
            });
        }

        let role = self.resolve_role(&user_id).await?;
        if !required.admits(role) {
            tracing::debug!(
                user_id,
                %role,
                operation = operation.as_str(),
                "Operation denied"
            );
            return Err(AuthError::Forbidden);
        }

        Ok(Principal {
            user_id,
            role: Some(role),
        })
    }
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policy")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemorySessionStore, MemoryUserDirectory};
    use studio_core::{Session, TokenPair};

    async fn policy_with(role: Option<Role>) -> (Policy, SessionId, Arc<MemoryUserDirectory>) {
        let sessions = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let id = SessionId::generate();
        sessions
            .save(
                &id,
                &Session::new("u-1", TokenPair::default()),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        if let Some(role) = role {
            users.set_role("u-1", role).await.unwrap();
        }
        let policy = Policy::new(sessions, users.clone(), Duration::from_secs(5));
        (policy, id, users)
    }

    #[test]
    fn test_minimum_roles() {
        assert!(MinimumRole::Admin.admits(Role::Admin));
        assert!(MinimumRole::Admin.admits(Role::SuperAdmin));
        assert!(!MinimumRole::Admin.admits(Role::User));
        assert!(!MinimumRole::SuperAdmin.admits(Role::Admin));
        assert_eq!(Operation::AssignRole.minimum_role(), MinimumRole::SuperAdmin);
        assert_eq!(Operation::IssueToken.minimum_role(), MinimumRole::Authenticated);
        assert_eq!(Operation::DeleteModel.minimum_role(), MinimumRole::Admin);
    }

    #[tokio::test]
    async fn test_empty_and_unknown_sessions() {
        let (policy, _, _) = policy_with(None).await;
        assert!(matches!(
            policy.authorize(&SessionId::new(""), Operation::GetOwnProfile).await,
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            policy
                .authorize(&SessionId::new("unknown"), Operation::ListUsers)
                .await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_authenticated_skips_role_lookup() {
        let (policy, id, users) = policy_with(None).await;
        let principal = policy
            .authorize(&id, Operation::GetOwnProfile)
            .await
            .unwrap();
        assert_eq!(principal.user_id, "u-1");
        assert_eq!(principal.role, None);
        assert_eq!(users.count().await, 0);
    }

    #[tokio::test]
    async fn test_admin_gate() {
        let (policy, id, _) = policy_with(Some(Role::User)).await;
        assert!(matches!(
            policy.authorize(&id, Operation::ListModels).await,
            Err(AuthError::Forbidden)
        ));

        let (policy, id, _) = policy_with(Some(Role::SuperAdmin)).await;
        let principal = policy.authorize(&id, Operation::ListModels).await.unwrap();
        assert_eq!(principal.role, Some(Role::SuperAdmin));
    }

    #[tokio::test]
    async fn test_missing_user_record_is_created_as_user() {
        let (policy, id, users) = policy_with(None).await;
        assert!(matches!(
            policy.authorize(&id, Operation::ListUsers).await,
            Err(AuthError::Forbidden)
        ));
        assert_eq!(users.get_role("u-1").await.unwrap(), Role::User);
    }
}
