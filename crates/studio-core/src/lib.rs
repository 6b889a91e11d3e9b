//! # LLM Studio Core
//!
//! Core types, validation, and configuration for the LLM Studio
//! backend-for-frontend.
//!
//! This crate provides:
//! - Domain types for sessions, users, roles, and LLM administration
//! - Input validation for user-supplied fields
//! - Secret wrappers that keep credentials out of logs
//! - Configuration loading and validation (JSON5 format)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod secrets;
pub mod types;
pub mod validation;

pub use config::{Config, ConfigError, LogFormat};
pub use secrets::ApiKey;
pub use types::{
    AdminUser, LlmModelCapability, LlmModelConfig, LlmModelSpec, LlmProviderConfig,
    LlmProviderConfigView, LlmProviderType, LoginInfo, Me, OAuthConnection, Page, Role, Session,
    SessionId, Token, TokenPair, User,
};
pub use validation::{ValidationError, validate_nickname};

