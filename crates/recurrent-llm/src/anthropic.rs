//! Anthropic Provider Implementation
//!
//! Talks to `POST /v1/messages`. The system prompt travels as the top-level
//! `system` field rather than as a message, and the generated text comes back
//! as a list of content blocks.

use crate::retry::{send_with_retry, RetryPolicy};
use crate::{build_http_client, join_endpoint, LlmError};
use recurrent_domain::{ChatRequest, LlmProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// API version sent with every request
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API provider
#[derive(Clone)]
pub struct AnthropicProvider {
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
    retry: RetryPolicy,
}

/// Request body for the messages API
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [ApiMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response from the messages API
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .finish()
    }
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    ///
    /// # Parameters
    ///
    /// - `base_url`: API base URL (e.g., "https://api.anthropic.com")
    /// - `model`: Model to use (e.g., "claude-3-opus-20240229")
    /// - `api_key`: Key sent as `x-api-key`
    /// - `timeout`: Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: join_endpoint(&base_url.into(), "messages"),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.7,
            max_tokens: 1024,
            client: build_http_client(timeout)?,
            retry: RetryPolicy::default(),
        })
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

    /// Generate text for a request
    pub async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            system: &request.system,
            messages: [ApiMessage {
                role: "user",
                content: &request.user,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("Anthropic request to {} ({} prompt bytes)", self.endpoint, request.len());

        let response = send_with_retry("anthropic", &self.retry, || {
            self.client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body)
                .send()
        })
        .await?;

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Communication(format!("Failed to read response: {}", e)))?;

        parse_message(&text)
    }
}

/// Concatenate the text blocks of a messages envelope
fn parse_message(body: &str) -> Result<String, LlmError> {
    let envelope: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let text: String = envelope
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(LlmError::InvalidResponse(
            "no text content blocks in response".to_string(),
        ));
    }

    Ok(text)
}

impl LlmProvider for AnthropicProvider {
    type Error = LlmError;

    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error> {
        self.generate(request).await
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_response, spawn_mock_server};

    const MESSAGE: &str = r#"{
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [
            {"type": "text", "text": "```json\n{\"summary\": \"A\"}\n```"}
        ],
        "stop_reason": "end_turn"
    }"#;

    fn provider(base: &str) -> AnthropicProvider {
        AnthropicProvider::new(base, "claude-test", "sk-ant-test", Duration::from_secs(5))
            .unwrap()
            .with_max_tokens(256)
            .with_retry_policy(RetryPolicy::immediate(2))
    }

    #[test]
    fn test_parse_message_joins_text_blocks() {
        let body = r#"{"content": [
            {"type": "text", "text": "{\"a\": "},
            {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
            {"type": "text", "text": "1}"}
        ]}"#;
        assert_eq!(parse_message(body).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_parse_message_without_text() {
        let result = parse_message(r#"{"content": []}"#);
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", provider("http://localhost:1"));
        assert!(!rendered.contains("sk-ant-test"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_generate_uses_messages_api() {
        let (base, requests) = spawn_mock_server(vec![http_response("200 OK", MESSAGE)]).await;

        let request = ChatRequest::new("Be precise.", "Chunk text");
        let text = provider(&base).complete(&request).await.unwrap();
        assert_eq!(text, "```json\n{\"summary\": \"A\"}\n```");

        let captured = requests.lock().unwrap();
        let raw = &captured[0];
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /v1/messages"));
        assert!(lower.contains("x-api-key: sk-ant-test"));
        assert!(lower.contains("anthropic-version: 2023-06-01"));
        assert!(raw.contains(r#""system":"Be precise.""#));
        assert!(raw.contains(r#""messages":[{"role":"user","content":"Chunk text"}]"#));
        assert!(raw.contains(r#""max_tokens":256"#));
    }

    #[tokio::test]
    async fn test_generate_retries_overloaded() {
        let (base, requests) = spawn_mock_server(vec![
            http_response("529 Overloaded", r#"{"type": "error"}"#),
            http_response("200 OK", MESSAGE),
        ])
        .await;

        let result = provider(&base).complete(&ChatRequest::new("s", "u")).await;
        assert!(result.is_ok(), "expected Ok, got {:?}", result);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }
}
