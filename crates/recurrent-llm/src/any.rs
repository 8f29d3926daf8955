//! Runtime provider selection

use crate::config::ProviderConfig;
use crate::retry::RetryPolicy;
use crate::{AnthropicProvider, LlmError, OpenAiProvider};
use recurrent_domain::{ChatRequest, LlmProvider};
use tracing::info;

/// Evaluates an expression against whichever provider is inside.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::OpenAi($p) => $expr,
            AnyProvider::Anthropic($p) => $expr,
        }
    };
}

/// One of the supported providers, chosen at runtime
#[derive(Debug, Clone)]
pub enum AnyProvider {
    /// OpenAI chat/completions
    OpenAi(OpenAiProvider),
    /// Anthropic messages
    Anthropic(AnthropicProvider),
}

impl AnyProvider {
    /// Build the provider a configuration selects
    ///
    /// # Errors
    ///
    /// - `LlmError::Config` if the settings are out of range
    /// - `LlmError::MissingApiKey` if a required key cannot be resolved
    pub fn from_config(config: &ProviderConfig, retry: RetryPolicy) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let settings = config.settings();
        let api_key = config.resolve_api_key()?;

        info!(
            "Using {} provider (model {}, {})",
            config.kind().as_str(),
            config.model(),
            config.base_url()
        );

        let provider = match config {
            ProviderConfig::OpenAi(_) => Self::OpenAi(
                OpenAiProvider::new(config.base_url(), config.model(), config.timeout())?
                    .with_api_key(api_key)
                    .with_temperature(settings.temperature)
                    .with_max_tokens(settings.max_tokens)
                    .with_retry_policy(retry),
            ),
            ProviderConfig::Anthropic(_) => {
                let api_key = api_key.ok_or_else(|| {
                    LlmError::MissingApiKey("anthropic requires an api_key".to_string())
                })?;
                Self::Anthropic(
                    AnthropicProvider::new(
                        config.base_url(),
                        config.model(),
                        api_key,
                        config.timeout(),
                    )?
                    .with_temperature(settings.temperature)
                    .with_max_tokens(settings.max_tokens)
                    .with_retry_policy(retry),
                )
            }
        };

        Ok(provider)
    }

    /// Model name the provider sends requests to
    pub fn model(&self) -> &str {
        delegate_provider!(self, |p| p.model())
    }
}

impl LlmProvider for AnyProvider {
    type Error = LlmError;

    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error> {
        delegate_provider!(self, |p| p.complete(request).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderSettings;

    #[test]
    fn test_from_config_openai() {
        let config = ProviderConfig::OpenAi(ProviderSettings {
            model: Some("gpt-4o-mini".to_string()),
            api_key: Some("sk-test".to_string()),
            ..ProviderSettings::default()
        });

        let provider = AnyProvider::from_config(&config, RetryPolicy::default()).unwrap();
        assert!(matches!(provider, AnyProvider::OpenAi(_)));
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_from_config_anthropic() {
        let config = ProviderConfig::Anthropic(ProviderSettings {
            api_key: Some("sk-ant-test".to_string()),
            ..ProviderSettings::default()
        });

        let provider = AnyProvider::from_config(&config, RetryPolicy::default()).unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.model(), crate::config::DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_from_config_rejects_invalid_settings() {
        let config = ProviderConfig::OpenAi(ProviderSettings {
            api_key: Some("sk-test".to_string()),
            temperature: -1.0,
            ..ProviderSettings::default()
        });

        let result = AnyProvider::from_config(&config, RetryPolicy::default());
        assert!(matches!(result, Err(LlmError::Config(_))));
    }
}
