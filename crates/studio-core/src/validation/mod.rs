//! Input validation for user-supplied fields.
//!
//! All checks run locally before any downstream call.

use thiserror::Error;

use crate::types::MAX_NICKNAME_CHARS;

/// Validation error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input exceeds maximum allowed length.
    #[error("{field} exceeds maximum length ({max} characters, got {actual})")]
    TooLong {
        /// Field being validated.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Actual input length.
        actual: usize,
    },

    /// Required input is empty after trimming.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Validate and normalize a nickname.
///
/// Surrounding whitespace is trimmed. The empty string is accepted and
/// clears the nickname.
///
/// # Errors
///
/// Returns `ValidationError::TooLong` if the trimmed nickname is longer than
/// 32 characters.
pub fn validate_nickname(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let actual = trimmed.chars().count();
    if actual > MAX_NICKNAME_CHARS {
        return Err(ValidationError::TooLong {
            field: "nickname",
            max: MAX_NICKNAME_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Trim a required identifier and reject it when empty.
///
/// # Errors
///
/// Returns `ValidationError::Empty` naming `field`.
pub fn require_non_empty(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(trimmed.to_string())
}

/// Normalize an email for allow-list comparison.
#[must_use]
pub fn normalize_email(input: &str) -> String {
    input.trim().to_lowercase()
}
