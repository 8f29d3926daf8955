//! Recurrent LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `recurrent-domain`.
//!
//! # Providers
//!
//! - `OpenAiProvider`: OpenAI chat/completions API (and compatible servers)
//! - `AnthropicProvider`: Anthropic messages API
//! - `MockProvider`: scripted, deterministic provider for tests
//! - `AnyProvider`: the provider selected by a `ProviderConfig`
//!
//! Every network provider retries transient transport failures (connect
//! errors, timeouts, HTTP 429 and 5xx) with exponential backoff before
//! giving up. Response content is never inspected here; that is the job of
//! `recurrent-gatekeeper`.
//!
//! # Examples
//!
//! ```
//! use recurrent_domain::{ChatRequest, LlmProvider};
//! use recurrent_llm::MockProvider;
//!
//! let provider = MockProvider::new(r#"{"ok": true}"#);
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let text = runtime
//!     .block_on(provider.complete(&ChatRequest::new("system", "user")))
//!     .unwrap();
//! assert_eq!(text, r#"{"ok": true}"#);
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod any;
pub mod config;
pub mod mock;
pub mod openai;
pub mod retry;

#[cfg(test)]
mod test_support;

use std::time::Duration;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use any::AnyProvider;
pub use config::{ProviderConfig, ProviderKind, ProviderSettings};
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// The API answered with an error status
    #[error("API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the server
        body: String,
    },

    /// Still rate limited after all retries
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The response envelope could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No usable API key
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    /// Invalid provider configuration
    #[error("Invalid provider configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Build the shared HTTP client with a per-request timeout
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Join an API base URL and a versioned path
///
/// `https://host` and `https://host/v1` both resolve to `https://host/v1/{path}`.
pub(crate) fn join_endpoint(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{}/{}", base, path)
    } else {
        format!("{}/v1/{}", base, path)
    }
}
