//! Secret wrappers that keep credentials out of logs.

use secrecy::{ExposeSecret, SecretString};

/// API key wrapper that prevents accidental logging.
///
/// The inner value is wrapped with `secrecy::SecretString` so it is never
/// printed in logs or debug output.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret for actual API calls.
    ///
    /// Use sparingly - only when actually sending to an API.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    /// Copy of the key with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self::new(self.expose().trim())
    }
}

impl Default for ApiKey {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}
