//! Core types used throughout LLM Studio.

mod llm;

pub use llm::{
    LlmModelCapability, LlmModelConfig, LlmModelSpec, LlmProviderConfig, LlmProviderConfigView,
    LlmProviderType,
};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User role for access control.
///
/// `Admin` and `SuperAdmin` are equivalent for privileged gates. Only
/// `SuperAdmin` may reassign roles, and it is never granted through the
/// role-assignment path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular authenticated user.
    #[default]
    User,
    /// Administrator of users, providers, and models.
    Admin,
    /// Config-driven bootstrap administrator.
    SuperAdmin,
}

impl Role {
    /// Parse a role name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Parse a stored role, reading unknown values as `User`.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Check if this role passes admin-or-above gates.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Check if this role may reassign other users' roles.
    #[must_use]
    pub const fn can_assign_roles(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Check if this role can be granted through role assignment.
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        matches!(self, Self::User | Self::Admin)
    }
}

/// Deserialize a stored role through [`Role::from_stored`].
fn stored_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Role::from_stored(&raw))
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single upstream token and its expiry.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token value.
    pub value: String,
    /// Expiration (Unix timestamp, 0 if unknown).
    #[serde(default)]
    pub expires_at: i64,
}

impl Token {
    /// Create a token.
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: i64) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Access and refresh tokens returned by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token.
    pub access_token: Token,
    /// Refresh token.
    pub refresh_token: Token,
    /// Token type (usually "Bearer").
    pub token_type: String,
}

/// Server-side session payload.
///
/// `user_id` is the identity-provider uid and the local user primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Owner of the session.
    pub user_id: String,
    /// Upstream token pair captured at login.
    pub token: TokenPair,
}

impl Session {
    /// Create a new session record.
    #[must_use]
    pub fn new(user_id: impl Into<String>, token: TokenPair) -> Self {
        Self {
            user_id: user_id.into(),
            token,
        }
    }
}

/// Number of random bytes in a session identifier.
pub const SESSION_ID_BYTES: usize = 32;

/// Opaque bearer identifier for a server-side session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh identifier from 256 bits of OS randomness.
    ///
    /// Encoded as URL-safe base64 without padding (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an identifier received from a client.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short prefix that is safe to log.
    #[must_use]
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("{prefix}…")
    }

    /// Consume into the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.redacted())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One OAuth identity linked to the user at the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConnection {
    /// OAuth provider name (e.g. "github").
    pub provider: String,
    /// User id at that provider.
    pub provider_user_id: String,
}

/// Login information reported by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    /// Identity-provider uid.
    pub user_id: String,
    /// Primary email address.
    pub email: String,
    /// GitHub id, when linked.
    #[serde(default)]
    pub github_id: Option<String>,
    /// Whether password login is enabled.
    #[serde(default)]
    pub password_enabled: bool,
    /// Linked OAuth identities.
    #[serde(default)]
    pub oauth_connections: Vec<OAuthConnection>,
}

/// Maximum nickname length in characters.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// Local user record. The primary key is the identity-provider uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity-provider uid.
    pub id: String,
    /// Display nickname (may be empty).
    #[serde(default)]
    pub nickname: String,
    /// Access role. Unknown stored values read as `user`.
    #[serde(default, deserialize_with = "stored_role")]
    pub role: Role,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            nickname: String::new(),
            role: Role::User,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the record as modified.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Current-user view: the user record joined with its login info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
    /// Identity-provider uid.
    pub user_id: String,
    /// Access role.
    pub role: Role,
    /// Email from the login-info snapshot (empty if none).
    pub email: String,
    /// GitHub id from the login-info snapshot.
    pub github_id: Option<String>,
    /// Display nickname.
    pub nickname: String,
}

impl Me {
    /// Compose the view from a user and its optional login info.
    #[must_use]
    pub fn compose(user: &User, info: Option<&LoginInfo>) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            email: info.map(|i| i.email.clone()).unwrap_or_default(),
            github_id: info.and_then(|i| i.github_id.clone()),
            nickname: user.nickname.clone(),
        }
    }
}

/// User view for the user-management listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    /// Identity-provider uid.
    pub id: String,
    /// Access role.
    pub role: Role,
    /// Email from the login-info snapshot (empty if none).
    pub email: String,
    /// GitHub id from the login-info snapshot.
    pub github_id: Option<String>,
    /// Whether password login is enabled.
    pub password_enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last modified.
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    /// Compose the view from a user and its optional login info.
    #[must_use]
    pub fn compose(user: &User, info: Option<&LoginInfo>) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
            email: info.map(|i| i.email.clone()).unwrap_or_default(),
            github_id: info.and_then(|i| i.github_id.clone()),
            password_enabled: info.is_some_and(|i| i.password_enabled),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Pagination window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rows.
    pub limit: usize,
    /// Rows to skip.
    pub offset: usize,
}

impl Page {
    /// Default page size for listings.
    pub const DEFAULT_LIMIT: usize = 50;

    /// Normalize raw caller input.
    ///
    /// A missing or non-positive limit becomes `default_limit`; a missing or
    /// negative offset becomes 0.
    #[must_use]
    pub fn normalize(limit: Option<i64>, offset: Option<i64>, default_limit: usize) -> Self {
        let limit = match limit {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(default_limit),
            _ => default_limit,
        };
        let offset = offset
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("SUPER_ADMIN"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("owner"), None);
        assert_eq!(Role::from_stored("garbage"), Role::User);
    }

    #[test]
    fn test_role_privileges() {
        assert!(!Role::User.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(Role::SuperAdmin.is_privileged());

        assert!(!Role::Admin.can_assign_roles());
        assert!(Role::SuperAdmin.can_assign_roles());

        assert!(Role::User.is_assignable());
        assert!(Role::Admin.is_assignable());
        assert!(!Role::SuperAdmin.is_assignable());
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
        assert_eq!(Role::SuperAdmin.to_string(), "super_admin");
    }

    #[test]
    fn test_user_with_unknown_stored_role_reads_as_user() {
        let mut stored = serde_json::to_value(User::new("u-1")).unwrap();
        stored["role"] = "owner".into();
        let user: User = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(user.role, Role::User);

        stored["role"] = "super_admin".into();
        let user: User = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(user.role, Role::SuperAdmin);

        stored.as_object_mut().unwrap().remove("role");
        let user: User = serde_json::from_value(stored).unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_session_id_generation() {
        let a = SessionId::generate();
        let b = SessionId::generate();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_session_id_debug_is_redacted() {
        let id = SessionId::new("abcdefghijklmnopqrstuvwxyz");
        let debug = format!("{id:?}");
        assert!(debug.contains("abcdefgh"));
        assert!(!debug.contains("ijklmnop"));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("secret-access-token", 42);
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-access-token"));
        assert!(debug.contains("42"));
    }

    #[test]
    fn test_me_compose_without_login_info() {
        let user = User::new("uid-1");
        let me = Me::compose(&user, None);
        assert_eq!(me.user_id, "uid-1");
        assert_eq!(me.role, Role::User);
        assert_eq!(me.email, "");
        assert_eq!(me.github_id, None);
    }

    #[test]
    fn test_admin_user_compose() {
        let user = User::new("uid-2");
        let info = LoginInfo {
            user_id: "uid-2".to_string(),
            email: "a@example.com".to_string(),
            github_id: Some("gh-7".to_string()),
            password_enabled: true,
            oauth_connections: vec![],
        };
        let view = AdminUser::compose(&user, Some(&info));
        assert_eq!(view.email, "a@example.com");
        assert_eq!(view.github_id.as_deref(), Some("gh-7"));
        assert!(view.password_enabled);
    }

    #[test]
    fn test_page_normalize() {
        assert_eq!(Page::normalize(None, None, 50), Page { limit: 50, offset: 0 });
        assert_eq!(Page::normalize(Some(0), Some(-3), 50), Page { limit: 50, offset: 0 });
        assert_eq!(Page::normalize(Some(10), Some(20), 50), Page { limit: 10, offset: 20 });
    }
}
