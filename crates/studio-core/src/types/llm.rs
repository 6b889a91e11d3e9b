//! LLM provider and model administration types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secrets::ApiKey;

/// Upstream LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Alibaba DashScope.
    Dashscope,
    /// OpenRouter.
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl LlmProviderType {
    /// Parse a provider name leniently.
    ///
    /// Accepts enum-style names such as `PROVIDER_TYPE_DASHSCOPE`, common
    /// `provider-`/`provider_` prefixes, and ignores `_`/`-` separators.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        let mut name = lowered.as_str();
        for prefix in ["provider_type_", "provider-type-", "provider_", "provider-"] {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest;
                break;
            }
        }
        let name: String = name.chars().filter(|c| *c != '_' && *c != '-').collect();

        match name.as_str() {
            "dashscope" => Some(Self::Dashscope),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    /// Wire name of the provider.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dashscope => "dashscope",
            Self::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability advertised by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmModelCapability {
    /// Text generation.
    Text,
    /// Image input.
    Images,
    /// Audio input.
    Audio,
    /// Video input.
    Video,
    /// Tool calling.
    Tools,
    /// Prompt caching.
    PromptCache,
    /// Streaming responses.
    Streaming,
    /// Extended reasoning.
    Reasoning,
}

impl LlmModelCapability {
    /// Parse a capability name leniently, accepting common aliases.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        let mut name = lowered.as_str();
        for prefix in [
            "model_capability_",
            "model-capability-",
            "capability_",
            "capability-",
        ] {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest;
                break;
            }
        }

        match name.replace('-', "_").as_str() {
            "text" => Some(Self::Text),
            "images" | "image" => Some(Self::Images),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "tools" | "tool" => Some(Self::Tools),
            "prompt_cache" | "promptcache" => Some(Self::PromptCache),
            "streaming" | "stream" => Some(Self::Streaming),
            "reasoning" | "reason" => Some(Self::Reasoning),
            _ => None,
        }
    }
}

/// Provider configuration submitted by an administrator.
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    /// Provider being configured.
    pub provider: LlmProviderType,
    /// Base URL override (may be empty).
    pub base_url: String,
    /// Upstream API key.
    pub api_key: ApiKey,
    /// Upstream request timeout.
    pub timeout_seconds: i64,
}

/// Provider configuration as listed back to callers (no secret material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmProviderConfigView {
    /// Configured provider.
    pub provider: LlmProviderType,
    /// Base URL override.
    pub base_url: String,
    /// Upstream request timeout.
    pub timeout_seconds: i64,
    /// Whether an API key is stored.
    pub api_key_present: bool,
}

/// Model configuration submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModelConfig {
    /// Provider serving the model.
    pub provider: LlmProviderType,
    /// Advertised capabilities.
    #[serde(default)]
    pub capabilities: Vec<LlmModelCapability>,
    /// Model identifier at the upstream provider.
    pub upstream_model: String,
}

/// Model as listed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModelSpec {
    /// Gateway-assigned model id.
    pub id: String,
    /// Provider serving the model.
    pub provider: LlmProviderType,
    /// Advertised capabilities.
    pub capabilities: Vec<LlmModelCapability>,
    /// Model identifier at the upstream provider.
    pub upstream_model: String,
}
