//! Second-opinion check on cumulative summary candidates

use crate::prompt::ReviewPromptBuilder;
use crate::types::ReviewVerdict;
use recurrent_domain::{ChatRequest, OutputSchema};
use recurrent_gatekeeper::{Gatekeeper, ValidationFailure};
use std::collections::BTreeMap;

/// Renders reviewer requests and interprets their answers
#[derive(Debug, Clone)]
pub struct Reviewer<'a> {
    prompts: ReviewPromptBuilder<'a>,
    gatekeeper: Gatekeeper,
}

impl<'a> Reviewer<'a> {
    /// Create a reviewer with optional custom prompts
    pub fn new(system_prompt: Option<&'a str>, user_prompt: Option<&'a str>) -> Self {
        Self {
            prompts: ReviewPromptBuilder::new(system_prompt, user_prompt),
            gatekeeper: Gatekeeper::new(Some(verdict_schema())),
        }
    }

    /// System prompt reviewer calls are sent with
    pub fn system_prompt(&self) -> &str {
        self.prompts.system_prompt()
    }

    /// Request asking whether `candidate` correctly extends `prior`
    pub fn request(&self, prior: &str, candidate: &str) -> ChatRequest {
        self.prompts.build(prior, candidate)
    }

    /// Parse a reviewer answer
    pub fn parse_verdict(&self, raw: &str) -> Result<ReviewVerdict, ValidationFailure> {
        let value = self.gatekeeper.validate(raw)?;
        serde_json::from_value(value).map_err(|e| ValidationFailure::NotJson(e.to_string()))
    }
}

fn verdict_schema() -> OutputSchema {
    let properties = BTreeMap::from([
        ("approved".to_string(), OutputSchema::Boolean),
        (
            "feedback".to_string(),
            OutputSchema::String {
                allowed: Vec::new(),
            },
        ),
    ]);

    OutputSchema::Object {
        properties,
        required: vec!["approved".to_string()],
        additional_properties: true,
    }
}
