//! Prompt rendering for chunk and reviewer calls
//!
//! Everything here is pure: the same inputs always render the same request.

use recurrent_domain::{ChatRequest, OutputSchema};

/// Closing instruction of every chunk prompt
pub const JSON_INSTRUCTION: &str =
    "Respond ONLY with a valid JSON object. Do not include anything else.";

/// Reviewer system prompt used when none is configured
pub const DEFAULT_REVIEWER_SYSTEM_PROMPT: &str = "You review a running summary that is built up \
one excerpt at a time. A candidate is acceptable only if it starts with the previous summary, \
unchanged, and then adds new information. Rewording, reordering or dropping any part of the \
previous summary is not acceptable.";

/// Reviewer instructions used when none are configured
pub const DEFAULT_REVIEWER_USER_PROMPT: &str = "Compare the candidate summary with the previous \
summary. Approve it only if the previous summary appears verbatim at its start and the rest \
extends it.";

const SUMMARY_OPEN: &str = "<<<SUMMARY";
const SUMMARY_CLOSE: &str = "SUMMARY>>>";

/// Builds the request for one chunk attempt
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    system_prompt: &'a str,
    user_prompt: &'a str,
    schema: Option<&'a OutputSchema>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(system_prompt: &'a str, user_prompt: &'a str) -> Self {
        Self {
            system_prompt,
            user_prompt,
            schema: None,
        }
    }

    /// Embed the expected output structure
    pub fn with_schema(mut self, schema: Option<&'a OutputSchema>) -> Self {
        self.schema = schema;
        self
    }

    /// Request for a chunk in extract mode
    ///
    /// `feedback` explains why the previous attempt was rejected.
    pub fn chunk_request(&self, chunk: &str, feedback: Option<&str>) -> ChatRequest {
        let mut user = self.preamble();
        user.push_str(chunk);
        user.push_str("\n\n");
        self.push_feedback(&mut user, feedback);
        self.push_schema(&mut user);
        user.push_str(JSON_INSTRUCTION);

        ChatRequest::new(self.system_prompt, user)
    }

    /// Request for a chunk in cumulative-summary mode
    pub fn summary_request(
        &self,
        chunk: &str,
        prior_summary: &str,
        feedback: Option<&str>,
    ) -> ChatRequest {
        let mut user = self.preamble();

        user.push_str("Current summary (repeat it verbatim at the start of your answer):\n");
        push_block(&mut user, prior_summary);
        user.push_str("\nNew text:\n");
        user.push_str(chunk);
        user.push_str("\n\n");

        self.push_feedback(&mut user, feedback);
        user.push_str(
            "Return the extended summary as {\"summary\": \"<current summary verbatim, \
             followed by what the new text adds>\"}.\n\n",
        );
        self.push_schema(&mut user);
        user.push_str(JSON_INSTRUCTION);

        ChatRequest::new(self.system_prompt, user)
    }

    fn preamble(&self) -> String {
        if self.user_prompt.is_empty() {
            String::new()
        } else {
            format!("{}\n\n", self.user_prompt)
        }
    }

    fn push_feedback(&self, user: &mut String, feedback: Option<&str>) {
        if let Some(feedback) = feedback {
            user.push_str("Your previous answer was rejected: ");
            user.push_str(feedback);
            user.push_str("\nCorrect this in your new answer.\n\n");
        }
    }

    fn push_schema(&self, user: &mut String) {
        if let Some(schema) = self.schema {
            user.push_str("The JSON object must match this structure:\n");
            user.push_str(&schema.to_prompt_json());
            user.push_str("\n\n");
        }
    }
}

/// Builds the request for a reviewer call
#[derive(Debug, Clone, Copy)]
pub struct ReviewPromptBuilder<'a> {
    system_prompt: &'a str,
    user_prompt: &'a str,
}

impl<'a> ReviewPromptBuilder<'a> {
    /// Create a reviewer prompt builder, falling back to the built-in prompts
    pub fn new(system_prompt: Option<&'a str>, user_prompt: Option<&'a str>) -> Self {
        Self {
            system_prompt: system_prompt.unwrap_or(DEFAULT_REVIEWER_SYSTEM_PROMPT),
            user_prompt: user_prompt.unwrap_or(DEFAULT_REVIEWER_USER_PROMPT),
        }
    }

    /// System prompt reviewer calls are sent with
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
    }

    /// Request asking whether `candidate` correctly extends `prior`
    pub fn build(&self, prior: &str, candidate: &str) -> ChatRequest {
        let mut user = format!("{}\n\nPrevious summary:\n", self.user_prompt);
        push_block(&mut user, prior);
        user.push_str("\nCandidate summary:\n");
        push_block(&mut user, candidate);
        user.push_str(
            "\nRespond ONLY with a valid JSON object of the form \
             {\"approved\": true or false, \"feedback\": \"<what must change, empty when approved>\"}. \
             Do not include anything else.",
        );

        ChatRequest::new(self.system_prompt, user)
    }
}

fn push_block(user: &mut String, text: &str) {
    user.push_str(SUMMARY_OPEN);
    user.push('\n');
    user.push_str(text);
    user.push('\n');
    user.push_str(SUMMARY_CLOSE);
    user.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_request_layout() {
        let builder = PromptBuilder::new("You extract topics.", "List the topics.");
        let request = builder.chunk_request("Chapter 1. It was a dark night.", None);

        assert_eq!(request.system, "You extract topics.");
        assert_eq!(
            request.user,
            format!(
                "List the topics.\n\nChapter 1. It was a dark night.\n\n{}",
                JSON_INSTRUCTION
            )
        );
    }

    #[test]
    fn test_empty_user_prompt_is_omitted() {
        let request = PromptBuilder::new("s", "").chunk_request("text", None);
        assert!(request.user.starts_with("text\n\n"));
    }

    #[test]
    fn test_schema_is_embedded() {
        let schema = OutputSchema::object_of_strings(&["title"]);
        let request = PromptBuilder::new("s", "u")
            .with_schema(Some(&schema))
            .chunk_request("text", None);

        assert!(request.user.contains("must match this structure"));
        assert!(request.user.contains("\"title\""));
        assert!(request.user.ends_with(JSON_INSTRUCTION));
    }

    #[test]
    fn test_feedback_is_folded_in() {
        let request =
            PromptBuilder::new("s", "u").chunk_request("text", Some("$.topics: expected array"));
        assert!(request
            .user
            .contains("Your previous answer was rejected: $.topics: expected array"));
    }

    #[test]
    fn test_summary_request_embeds_prior_summary() {
        let request = PromptBuilder::new("Summarize.", "Keep it short.").summary_request(
            "Bob arrives.",
            "Alice leaves.",
            None,
        );

        assert!(request
            .user
            .contains("<<<SUMMARY\nAlice leaves.\nSUMMARY>>>"));
        assert!(request.user.contains("New text:\nBob arrives."));
        assert!(request.user.contains("{\"summary\":"));
        assert!(request.user.ends_with(JSON_INSTRUCTION));
    }

    #[test]
    fn test_review_defaults() {
        let builder = ReviewPromptBuilder::new(None, None);
        let request = builder.build("A.", "A. B.");

        assert_eq!(request.system, DEFAULT_REVIEWER_SYSTEM_PROMPT);
        assert!(request.user.starts_with(DEFAULT_REVIEWER_USER_PROMPT));
        assert!(request.user.contains("Previous summary:\n<<<SUMMARY\nA.\nSUMMARY>>>"));
        assert!(request.user.contains("Candidate summary:\n<<<SUMMARY\nA. B.\nSUMMARY>>>"));
        assert!(request.user.contains("\"approved\""));
    }

    #[test]
    fn test_review_custom_prompts() {
        let builder = ReviewPromptBuilder::new(Some("Strict reviewer."), Some("Be picky."));
        let request = builder.build("", "First.");
        assert_eq!(request.system, "Strict reviewer.");
        assert!(request.user.starts_with("Be picky.\n\n"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let builder = PromptBuilder::new("s", "u");
        assert_eq!(
            builder.summary_request("c", "p", Some("f")),
            builder.summary_request("c", "p", Some("f"))
        );
    }
}
