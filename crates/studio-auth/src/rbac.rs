//! Self-profile and user administration use cases.

use std::sync::Arc;

use studio_core::{AdminUser, Me, Role, SessionId, validate_nickname};

use crate::AuthError;
use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::policy::{Operation, Policy};
use crate::ports::{StoreError, UserRepository};

/// Parse a role requested through role assignment.
///
/// Only `user` and `admin` are accepted.
///
/// # Errors
///
/// Returns `InvalidRole` for unknown names and for `super_admin`.
pub fn parse_assignable_role(s: &str) -> Result<Role, AuthError> {
    Role::parse(s)
        .filter(Role::is_assignable)
        .ok_or(AuthError::InvalidRole)
}

/// Profile and user-management operations behind the role gate.
#[derive(Clone)]
pub struct RbacService {
    policy: Policy,
    users: Arc<dyn UserRepository>,
    config: Arc<AuthConfig>,
}

impl RbacService {
    /// Create the service.
    #[must_use]
    pub fn new(policy: Policy, users: Arc<dyn UserRepository>, config: Arc<AuthConfig>) -> Self {
        Self {
            policy,
            users,
            config,
        }
    }

    /// The caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for a bad session, or the directory error.
    pub async fn me(&self, session_id: &SessionId) -> Result<Me, AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::GetOwnProfile)
            .await?;
        self.load_me(&principal.user_id).await
    }

    async fn load_me(&self, user_id: &str) -> Result<Me, AuthError> {
        let timeout = self.config.gateway_timeout;
        match bounded("get_me", timeout, self.users.get_me(user_id)).await {
            Err(AuthError::Storage(StoreError::NotFound)) => {
                bounded("ensure_user", timeout, self.users.ensure_exists(user_id)).await?;
                bounded("get_me", timeout, self.users.get_me(user_id)).await
            }
            other => other,
        }
    }

    /// Set the caller's nickname and return the updated profile.
    ///
    /// The nickname is trimmed; an empty result clears it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `InvalidNickname` when longer than 32
    /// characters, or the directory error.
    pub async fn update_my_nickname(
        &self,
        session_id: &SessionId,
        nickname: &str,
    ) -> Result<Me, AuthError> {
        let principal = self
            .policy
            .authorize(session_id, Operation::UpdateOwnProfile)
            .await?;

        let nickname = validate_nickname(nickname).map_err(AuthError::InvalidNickname)?;

        bounded(
            "set_nickname",
            self.config.gateway_timeout,
            self.users.set_nickname(&principal.user_id, &nickname),
        )
        .await?;

        self.load_me(&principal.user_id).await
    }

    /// Page through all users, newest first.
    ///
    /// A missing or non-positive limit uses the configured page size; a
    /// missing or negative offset starts at 0.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden` below admin, or the directory
    /// error.
    pub async fn list_users(
        &self,
        session_id: &SessionId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<AdminUser>, AuthError> {
        self.policy
            .authorize(session_id, Operation::ListUsers)
            .await?;

        let page = self.config.page(limit, offset);
        bounded(
            "list_users",
            self.config.gateway_timeout,
            self.users.list_users(page),
        )
        .await
    }

    /// Assign `user` or `admin` to another user.
    ///
    /// Only a `super_admin` may call this, and a user who is currently
    /// `super_admin` cannot be changed. The target check reads then writes
    /// without isolation, so a concurrent promotion can slip through.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated`, `Forbidden`, `InvalidRole`, or the
    /// directory error.
    pub async fn set_user_role(
        &self,
        session_id: &SessionId,
        target_user_id: &str,
        role: Role,
    ) -> Result<(), AuthError> {
        let actor = self
            .policy
            .authorize(session_id, Operation::AssignRole)
            .await?;

        if !role.is_assignable() {
            return Err(AuthError::InvalidRole);
        }

        let timeout = self.config.gateway_timeout;

        // A failed read is not a protection; the write below still ensures
        // the target exists.
        if let Ok(Role::SuperAdmin) =
            bounded("get_role", timeout, self.users.get_role(target_user_id)).await
        {
            tracing::debug!(
                actor = actor.user_id,
                target = target_user_id,
                "Refused to change a super_admin"
            );
            return Err(AuthError::Forbidden);
        }

        bounded(
            "set_role",
            timeout,
            self.users.set_role(target_user_id, role),
        )
        .await?;

        tracing::info!(
            actor = actor.user_id,
            target = target_user_id,
            %role,
            "Role assigned"
        );
        Ok(())
    }
}

impl std::fmt::Debug for RbacService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
