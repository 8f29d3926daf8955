//! Scripted provider for deterministic tests
//!
//! Replies are queued per system prompt, so a single mock can play both the
//! extraction model and the reviewer model of a run. When a queue runs dry
//! the default response is returned.

use crate::LlmError;
use recurrent_domain::{ChatRequest, LlmProvider};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// No network calls are made. Clones share their scripts, call count and
/// request log.
///
/// # Examples
///
/// ```
/// use recurrent_llm::MockProvider;
///
/// let provider = MockProvider::new("fallback");
/// provider.add_response("extract", r#"{"a": 1}"#);
/// provider.add_response("extract", r#"{"a": 2}"#);
/// provider.add_error("review", "reviewer offline");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    scripts: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for unscripted prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            scripts: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply for requests with the given system prompt
    pub fn add_response(&self, system: impl Into<String>, response: impl Into<String>) {
        self.push(system.into(), Reply::Text(response.into()));
    }

    /// Queue a failure for requests with the given system prompt
    pub fn add_error(&self, system: impl Into<String>, message: impl Into<String>) {
        self.push(system.into(), Reply::Error(message.into()));
    }

    fn push(&self, system: String, reply: Reply) {
        lock(&self.scripts).entry(system).or_default().push_back(reply);
    }

    /// Number of requests served so far
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Forget every request served so far
    pub fn reset_call_count(&self) {
        lock(&self.requests).clear();
    }

    /// Copy of every request served so far, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    fn next_reply(&self, request: &ChatRequest) -> Reply {
        lock(&self.requests).push(request.clone());

        lock(&self.scripts)
            .get_mut(&request.system)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Reply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, request: &ChatRequest) -> Result<String, Self::Error> {
        match self.next_reply(request) {
            Reply::Text(text) => Ok(text),
            Reply::Error(message) => Err(LlmError::Other(message)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
