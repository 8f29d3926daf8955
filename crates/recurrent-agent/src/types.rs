//! Result and verdict types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Validated response for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Chunk the value was produced for
    pub chunk_index: usize,

    /// Parsed and validated response
    pub value: Value,
}

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Results in chunk order
    pub results: Vec<ChunkResult>,

    /// Final summary (cumulative-summary mode only)
    pub summary: Option<String>,

    /// Chunks processed
    pub chunks_processed: usize,

    /// Provider calls issued, reviewer calls included
    pub provider_calls: usize,
}

impl RunOutput {
    /// The bare values, in chunk order
    pub fn values(&self) -> Vec<&Value> {
        self.results.iter().map(|r| &r.value).collect()
    }
}

/// Reviewer answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    /// Whether the candidate summary may be committed
    pub approved: bool,

    /// What should change when not approved
    #[serde(default)]
    pub feedback: String,
}

impl ReviewVerdict {
    /// Approval without comments
    pub fn approve() -> Self {
        Self {
            approved: true,
            feedback: String::new(),
        }
    }

    /// Rejection with feedback
    pub fn reject(feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            feedback: feedback.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verdict_feedback_optional() {
        let verdict: ReviewVerdict = serde_json::from_value(json!({"approved": true})).unwrap();
        assert_eq!(verdict, ReviewVerdict::approve());
    }

    #[test]
    fn test_verdict_requires_approved() {
        let result: Result<ReviewVerdict, _> =
            serde_json::from_value(json!({"feedback": "looks fine"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_values_in_order() {
        let output = RunOutput {
            results: vec![
                ChunkResult {
                    chunk_index: 0,
                    value: json!({"a": 1}),
                },
                ChunkResult {
                    chunk_index: 2,
                    value: json!({"a": 3}),
                },
            ],
            summary: None,
            chunks_processed: 3,
            provider_calls: 3,
        };
        assert_eq!(output.values(), vec![&json!({"a": 1}), &json!({"a": 3})]);
    }
}
