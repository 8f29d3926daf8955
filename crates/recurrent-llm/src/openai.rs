//! OpenAI Provider Implementation
//!
//! Talks to `POST /v1/chat/completions`, which is also served by most local
//! OpenAI-compatible runtimes (LM Studio, llama.cpp server, vLLM), so a
//! custom base URL is supported.
//!
//! # Examples
//!
//! ```no_run
//! use recurrent_llm::OpenAiProvider;
//! use std::time::Duration;
//!
//! let provider = OpenAiProvider::new("http://localhost:1234", "local-model", Duration::from_secs(60))
//!     .unwrap()
//!     .with_temperature(0.2);
//! ```

use crate::retry::{send_with_retry, RetryPolicy};
use crate::{build_http_client, join_endpoint, LlmError};
use recurrent_domain::{ChatRequest, LlmProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// OpenAI-style chat/completions provider
#[derive(Clone)]
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
    retry: RetryPolicy,
}

/// Request body for the chat/completions API
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the chat/completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    ///
    /// # Parameters
    ///
    /// - `base_url`: API base URL (e.g., "https://api.openai.com")
    /// - `model`: Model to use (e.g., "gpt-4")
    /// - `timeout`: Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: join_endpoint(&base_url.into(), "chat/completions"),
            model: model.into(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 1024,
            client: build_http_client(timeout)?,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the retry policy for transient failures
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Model this provider sends requests to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Generate text for a request
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The server is unreachable after all retries
    /// - The API answers with a non-transient error status
    /// - The response envelope carries no message content
    pub async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ApiMessage {
                    role: "system",
                    content: &request.system,
                },
                ApiMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("OpenAI request to {} ({} prompt bytes)", self.endpoint, request.len());

        let response = send_with_retry("openai", &self.retry, || {
            let mut builder = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }
            builder.send()
        })
        .await?;

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Communication(format!("Failed to read response: {}", e)))?;

        parse_completion(&text)
    }
}

/// Extract the generated text from a chat/completions envelope
fn parse_completion(body: &str) -> Result<String, LlmError> {
    let envelope: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            LlmError::InvalidResponse("missing choices[0].message.content".to_string())
        })
}

impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error> {
        self.generate(request).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_response, spawn_mock_server};

    const COMPLETION: &str = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "{\"topics\": []}"}, "finish_reason": "stop"}
        ]
    }"#;

    fn provider(base: &str) -> OpenAiProvider {
        OpenAiProvider::new(base, "gpt-test", Duration::from_secs(5))
            .unwrap()
            .with_api_key(Some("sk-test".to_string()))
            .with_retry_policy(RetryPolicy::immediate(2))
    }

    #[test]
    fn test_endpoint_join() {
        let provider = OpenAiProvider::new("http://localhost:1234/", "m", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:1234/v1/chat/completions");

        let provider = OpenAiProvider::new("http://localhost:1234/v1", "m", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_parse_completion() {
        assert_eq!(parse_completion(COMPLETION).unwrap(), r#"{"topics": []}"#);
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let result = parse_completion(r#"{"choices": []}"#);
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));

        let result = parse_completion("<html>gateway</html>");
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_sends_system_and_user() {
        let (base, requests) =
            spawn_mock_server(vec![http_response("200 OK", COMPLETION)]).await;

        let request = ChatRequest::new("You are terse.", "Summarize this.");
        let text = provider(&base).complete(&request).await.unwrap();
        assert_eq!(text, r#"{"topics": []}"#);

        let captured = requests.lock().unwrap();
        let raw = &captured[0];
        assert!(raw.starts_with("POST /v1/chat/completions"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(raw.contains(r#""role":"system","content":"You are terse.""#));
        assert!(raw.contains(r#""role":"user","content":"Summarize this.""#));
        assert!(raw.contains(r#""model":"gpt-test""#));
        assert!(raw.contains(r#""max_tokens":1024"#));
    }

    #[tokio::test]
    async fn test_generate_retries_server_error() {
        let (base, requests) = spawn_mock_server(vec![
            http_response("502 Bad Gateway", "upstream"),
            http_response("200 OK", COMPLETION),
        ])
        .await;

        let text = provider(&base)
            .complete(&ChatRequest::new("s", "u"))
            .await
            .unwrap();
        assert_eq!(text, r#"{"topics": []}"#);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_unauthorized() {
        let (base, _requests) = spawn_mock_server(vec![http_response(
            "401 Unauthorized",
            r#"{"error": {"message": "Incorrect API key"}}"#,
        )])
        .await;

        let result = provider(&base).complete(&ChatRequest::new("s", "u")).await;
        match result {
            Err(LlmError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_handling_invalid_endpoint() {
        // Use invalid endpoint to trigger error
        let provider = OpenAiProvider::new("http://localhost:99999", "m", Duration::from_secs(1))
            .unwrap()
            .with_retry_policy(RetryPolicy::immediate(1));

        let result = provider.complete(&ChatRequest::new("s", "u")).await;
        match result {
            Err(LlmError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other),
        }
    }
}
