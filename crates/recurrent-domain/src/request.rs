//! Request module - the payload handed to a provider

use serde::{Deserialize, Serialize};

/// A rendered chat request: one system message and one user message
///
/// Requests are built fresh for every attempt and every reviewer call, and
/// are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System prompt
    pub system: String,

    /// User message content
    pub user: String,
}

impl ChatRequest {
    /// Create a new request
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Total prompt length in bytes
    pub fn len(&self) -> usize {
        self.system.len() + self.user.len()
    }

    /// Whether both messages are empty
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }
}
