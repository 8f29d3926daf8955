//! Provider configuration
//!
//! The provider is selected by the `type` discriminator of the `llm_provider`
//! section of the agent configuration:
//!
//! ```yaml
//! llm_provider:
//!   type: anthropic
//!   model: claude-3-opus-20240229
//!   api_key: env:ANTHROPIC_API_KEY
//!   temperature: 0.2
//!   max_tokens: 2048
//! ```

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Default Anthropic model
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default Anthropic API base URL
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Default per-request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Prefix marking an API key as an environment variable reference
const ENV_PREFIX: &str = "env:";

/// Which provider family a configuration selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-style chat/completions API
    OpenAi,
    /// Anthropic-style messages API
    Anthropic,
}

impl ProviderKind {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Environment variable consulted when no API key is configured
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => DEFAULT_OPENAI_MODEL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => DEFAULT_OPENAI_BASE_URL,
            ProviderKind::Anthropic => DEFAULT_ANTHROPIC_BASE_URL,
        }
    }
}

/// Provider selection, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    /// OpenAI or any OpenAI-compatible server
    #[serde(rename = "openai", alias = "OpenAI", alias = "open_ai")]
    OpenAi(ProviderSettings),

    /// Anthropic messages API
    #[serde(rename = "anthropic", alias = "Anthropic", alias = "claude")]
    Anthropic(ProviderSettings),
}

/// Settings shared by every provider family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Model name (provider default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key, `env:VAR`, or absent to use the provider's standard variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API base URL (provider default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Provider family selected by this configuration
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::OpenAi(_) => ProviderKind::OpenAi,
            ProviderConfig::Anthropic(_) => ProviderKind::Anthropic,
        }
    }

    /// Settings of the selected provider
    pub fn settings(&self) -> &ProviderSettings {
        match self {
            ProviderConfig::OpenAi(settings) | ProviderConfig::Anthropic(settings) => settings,
        }
    }

    /// Configured model, or the provider default
    pub fn model(&self) -> &str {
        self.settings()
            .model
            .as_deref()
            .unwrap_or_else(|| self.kind().default_model())
    }

    /// Configured base URL, or the provider default
    pub fn base_url(&self) -> &str {
        self.settings()
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.kind().default_base_url())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings().timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let settings = self.settings();
        if !(0.0..=2.0).contains(&settings.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                settings.temperature
            ));
        }
        if settings.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if settings.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if let Some(model) = &settings.model {
            if model.trim().is_empty() {
                return Err("model must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Resolve the API key
    ///
    /// - `env:VAR` reads `VAR` and fails if it is unset or empty
    /// - a literal key is used as is
    /// - no key falls back to `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`
    ///
    /// OpenAI-compatible servers at a custom `base_url` may run without a
    /// key, in which case `Ok(None)` is returned.
    pub fn resolve_api_key(&self) -> Result<Option<String>, LlmError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with<F>(&self, lookup: F) -> Result<Option<String>, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self.kind();
        let configured = self
            .settings()
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());

        if let Some(key) = configured {
            if let Some(var) = key.strip_prefix(ENV_PREFIX) {
                return lookup(var)
                    .filter(|value| !value.is_empty())
                    .map(Some)
                    .ok_or_else(|| {
                        LlmError::MissingApiKey(format!(
                            "environment variable {} not set or empty",
                            var
                        ))
                    });
            }
            return Ok(Some(key.to_string()));
        }

        if let Some(value) = lookup(kind.api_key_env()).filter(|value| !value.is_empty()) {
            return Ok(Some(value));
        }

        let custom_endpoint = self.settings().base_url.is_some();
        match kind {
            ProviderKind::OpenAi if custom_endpoint => Ok(None),
            _ => Err(LlmError::MissingApiKey(format!(
                "no api_key configured for {} and {} is not set",
                kind.as_str(),
                kind.api_key_env()
            ))),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
