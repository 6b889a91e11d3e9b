//! # LLM Studio Auth
//!
//! Authentication, session, and role-based authorization core of the
//! LLM Studio backend-for-frontend.
//!
//! This crate provides:
//! - Ports for the identity provider, session store, user directory,
//!   LLM gateway administration, and data-plane token issuance
//! - OAuth-to-session completion with super-admin bootstrap
//! - A role gate that every privileged use case consults before acting
//! - Reference session stores and user directories (in-memory and sled)
//!
//! Services hold no mutable state of their own; everything durable lives
//! behind the injected ports.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod claims;
mod config;
/// Deadline helper for downstream calls.
pub mod deadline;
mod llm_admin;
mod orchestrator;
mod policy;
/// Port traits consumed by the services.
pub mod ports;
mod rbac;
mod sessions;
mod token_gate;
mod users;

pub use claims::JwtUidExtractor;
pub use config::{AuthConfig, AuthConfigBuilder, SuperAdminEmails};
pub use llm_admin::{LlmAdminService, parse_capabilities, parse_provider};
pub use orchestrator::{AuthService, CompletedLogin};
pub use policy::{MinimumRole, Operation, Policy, Principal};
pub use ports::{
    AuthorizationUrl, ExtractError, GatewayError, IssuedToken, LlmGatewayAdmin, OAuthGateway,
    SessionStore, StoreError, TokenIssuer, UidExtractor, UserRepository,
};
pub use rbac::{RbacService, parse_assignable_role};
pub use sessions::{MemorySessionStore, SledSessionStore};
pub use token_gate::TokenGate;
pub use users::{MemoryUserDirectory, SledUserDirectory};

use std::time::Duration;

use studio_core::{LlmProviderType, ValidationError};
use thiserror::Error;

/// Authentication and authorization errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session, or the session is unknown or expired.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Valid session, but the role is insufficient or the target is protected.
    #[error("Forbidden")]
    Forbidden,

    /// Provider type not recognized.
    #[error("Invalid provider")]
    InvalidProvider,

    /// Model capability not recognized.
    #[error("Invalid capability: {0}")]
    InvalidCapability(String),

    /// Upstream model identifier empty after trimming.
    #[error("Invalid upstream_model")]
    InvalidUpstreamModel,

    /// Model id empty after trimming.
    #[error("Invalid model id")]
    InvalidModelId,

    /// Role cannot be assigned through this operation.
    #[error("Invalid role")]
    InvalidRole,

    /// Nickname failed validation.
    #[error("Invalid nickname: {0}")]
    InvalidNickname(ValidationError),

    /// A model was submitted for a provider with no provider config.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(LlmProviderType),

    /// A required collaborator is not wired.
    #[error("Config error: {0}")]
    Config(String),

    /// Fallback user-id extraction failed.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Identity provider or admin backend failure.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Session store or user directory failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// A downstream call did not finish before its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that was bounded.
        operation: &'static str,
        /// Deadline that elapsed.
        after: Duration,
    },
}

/// Coarse error category for boundary-layer mapping (e.g. HTTP status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401-style failure.
    Unauthenticated,
    /// 403-style failure.
    Forbidden,
    /// Caller input rejected locally.
    InvalidInput,
    /// Consistency precondition not met.
    Precondition,
    /// Deployment wiring error.
    Configuration,
    /// Downstream failure propagated opaquely.
    Upstream,
}

impl AuthError {
    /// Category used by the transport layer to pick a response.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::InvalidProvider
            | Self::InvalidCapability(_)
            | Self::InvalidUpstreamModel
            | Self::InvalidModelId
            | Self::InvalidRole
            | Self::InvalidNickname(_) => ErrorKind::InvalidInput,
            Self::ProviderNotConfigured(_) => ErrorKind::Precondition,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Extraction(_) | Self::Gateway(_) | Self::Storage(_) | Self::Timeout { .. } => {
                ErrorKind::Upstream
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AuthError::Unauthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(AuthError::Forbidden.kind(), ErrorKind::Forbidden);
        assert_eq!(AuthError::InvalidRole.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            AuthError::ProviderNotConfigured(LlmProviderType::Dashscope).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            AuthError::Config("uid extractor".to_string()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            AuthError::Storage(StoreError::NotFound).kind(),
            ErrorKind::Upstream
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = AuthError::Timeout {
            operation: "login_by_oauth",
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "login_by_oauth timed out after 5s");
    }
}
