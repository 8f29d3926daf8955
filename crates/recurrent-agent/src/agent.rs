//! The driving loop

use crate::audit::{now_ms, AuditLog, AuditRecord, CallKind};
use crate::chunking::{read_source, TextChunker};
use crate::collector::{render_output, write_output, ResultCollector};
use crate::config::{AgentConfig, Mode, OnInvalid};
use crate::error::AgentError;
use crate::prompt::PromptBuilder;
use crate::reviewer::Reviewer;
use crate::summary::CumulativeSummary;
use crate::types::RunOutput;
use recurrent_domain::{ChatRequest, Chunk, LlmProvider, OutputSchema};
use recurrent_gatekeeper::Gatekeeper;
use recurrent_llm::AnyProvider;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Field of a cumulative-summary response that carries the candidate
const SUMMARY_FIELD: &str = "summary";

/// Runs a configuration against a provider, one chunk at a time
pub struct RecurrentAgent<L>
where
    L: LlmProvider,
{
    config: AgentConfig,
    provider: L,
    gatekeeper: Gatekeeper,
}

impl RecurrentAgent<AnyProvider> {
    /// Create an agent talking to the provider the configuration selects
    ///
    /// Provider settings that cannot be turned into a client are reported
    /// as configuration errors.
    pub fn from_config(config: AgentConfig) -> Result<Self, AgentError> {
        let provider = AnyProvider::from_config(&config.llm_provider, config.retry_policy())
            .map_err(|e| AgentError::Config(format!("llm_provider: {}", e)))?;
        Self::new(config, provider)
    }
}

/// Mutable state of one run, owned by the loop
struct RunState {
    collector: ResultCollector,
    summary: CumulativeSummary,
    provider_calls: usize,
    audit: Option<AuditLog>,
}

/// Why an attempt did not produce a committed result
enum Rejection {
    /// The response failed validation
    Invalid(String),
    /// The candidate summary was turned down
    Review(String),
}

/// What the reviewer made of a candidate
enum Verdict {
    Approved,
    Rejected(String),
    Unusable(String),
}

impl<L> RecurrentAgent<L>
where
    L: LlmProvider,
{
    /// Create an agent with an explicit provider
    pub fn new(config: AgentConfig, provider: L) -> Result<Self, AgentError> {
        config.validate()?;

        let schema = match config.mode {
            Mode::Extract => config.output_schema.clone(),
            Mode::CumulativeSummary => Some(
                config
                    .output_schema
                    .clone()
                    .unwrap_or_else(|| OutputSchema::object_of_strings(&[SUMMARY_FIELD])),
            ),
        };

        Ok(Self {
            config,
            provider,
            gatekeeper: Gatekeeper::new(schema),
        })
    }

    /// Configuration of this agent
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Provider this agent calls
    pub fn provider(&self) -> &L {
        &self.provider
    }

    /// Process the whole input file
    ///
    /// The output file, when configured, is written only after every chunk
    /// succeeded.
    pub async fn run(&self) -> Result<RunOutput, AgentError> {
        let text = read_source(&self.config.file_path)?;
        let chunker = TextChunker::new(
            self.config.chunk_size,
            self.config.chunk_overlap,
            self.config.chunk_unit,
        )?;
        let total = chunker.chunk_count(&text);

        info!(
            "Processing {} in {} chunks of {} {} with {}",
            self.config.file_path.display(),
            total,
            self.config.chunk_size,
            self.config.chunk_unit.as_str(),
            self.provider.name()
        );

        let mut state = RunState {
            collector: ResultCollector::new(self.config.skip_empty_results),
            summary: CumulativeSummary::new(),
            provider_calls: 0,
            audit: self
                .config
                .logs_path
                .as_ref()
                .map(|path| AuditLog::open(path.clone()))
                .transpose()?,
        };
        let reviewer = Reviewer::new(
            self.config.reviewer_system_prompt.as_deref(),
            self.config.reviewer_user_prompt.as_deref(),
        );

        let mut chunks_processed = 0;
        for chunk in chunker.chunks(&text) {
            info!("Processing chunk {}/{}", chunk.index + 1, total);
            match self.config.mode {
                Mode::Extract => self.extract_chunk(&chunk, &mut state).await?,
                Mode::CumulativeSummary => {
                    self.summarize_chunk(&chunk, &reviewer, &mut state).await?
                }
            }
            chunks_processed += 1;
        }

        let summary = match self.config.mode {
            Mode::Extract => None,
            Mode::CumulativeSummary => Some(state.summary.into_string()),
        };
        let skipped = state.collector.skipped();
        let output = RunOutput {
            results: state.collector.into_results(),
            summary,
            chunks_processed,
            provider_calls: state.provider_calls,
        };

        info!(
            "Processed {} chunks: {} results kept, {} empty skipped, {} provider calls",
            output.chunks_processed,
            output.results.len(),
            skipped,
            output.provider_calls
        );

        if let Some(path) = &self.config.output_file {
            let document =
                render_output(self.config.mode, &output.results, output.summary.as_deref());
            write_output(path, &document)?;
        }

        Ok(output)
    }

    fn prompts(&self) -> PromptBuilder<'_> {
        PromptBuilder::new(&self.config.system_prompt, &self.config.user_prompt)
            .with_schema(self.gatekeeper.schema())
    }

    async fn extract_chunk(&self, chunk: &Chunk, state: &mut RunState) -> Result<(), AgentError> {
        let prompts = self.prompts();
        let max_attempts = self.config.max_attempts();
        let mut feedback: Option<String> = None;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = prompts.chunk_request(&chunk.text, feedback.as_deref());
            let raw = self
                .call(state, CallKind::Chunk, chunk.index, attempt, &request)
                .await?;

            match self.gatekeeper.validate(&raw) {
                Ok(value) => {
                    debug!("Chunk {} accepted on attempt {}", chunk.index, attempt);
                    state.collector.push(chunk.index, value);
                    return Ok(());
                }
                Err(failure) => {
                    warn!(
                        "Chunk {} attempt {}/{} rejected: {}",
                        chunk.index, attempt, max_attempts, failure
                    );
                    if self.config.on_invalid == OnInvalid::Abort || attempt >= max_attempts {
                        return Err(AgentError::Validation {
                            chunk: chunk.index,
                            attempts: attempt,
                            reason: failure.to_string(),
                        });
                    }
                    feedback = Some(failure.to_string());
                }
            }
        }
    }

    async fn summarize_chunk(
        &self,
        chunk: &Chunk,
        reviewer: &Reviewer<'_>,
        state: &mut RunState,
    ) -> Result<(), AgentError> {
        let prompts = self.prompts();
        let max_attempts = self.config.max_attempts();
        let mut feedback: Option<String> = None;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request =
                prompts.summary_request(&chunk.text, state.summary.as_str(), feedback.as_deref());
            let raw = self
                .call(state, CallKind::Chunk, chunk.index, attempt, &request)
                .await?;

            let rejection = match self.gatekeeper.validate(&raw) {
                Err(failure) => Rejection::Invalid(failure.to_string()),
                Ok(value) => match candidate_summary(&value) {
                    None => Rejection::Invalid(format!(
                        "response has no string \"{}\" field",
                        SUMMARY_FIELD
                    )),
                    Some(candidate) => {
                        match self
                            .review(reviewer, chunk.index, attempt, &candidate, state)
                            .await?
                        {
                            Verdict::Approved => {
                                state.summary.commit(candidate).map_err(|e| {
                                    AgentError::ReviewRejected {
                                        chunk: chunk.index,
                                        attempts: attempt,
                                        feedback: e.to_string(),
                                    }
                                })?;
                                debug!(
                                    "Chunk {} summary committed on attempt {} ({} bytes)",
                                    chunk.index,
                                    attempt,
                                    state.summary.as_str().len()
                                );
                                state.collector.push(chunk.index, value);
                                return Ok(());
                            }
                            Verdict::Rejected(reason) => Rejection::Review(reason),
                            Verdict::Unusable(reason) => {
                                // Not the summarizer's fault, keep the last feedback
                                if attempt >= max_attempts {
                                    return Err(AgentError::ReviewRejected {
                                        chunk: chunk.index,
                                        attempts: attempt,
                                        feedback: reason,
                                    });
                                }
                                continue;
                            }
                        }
                    }
                },
            };

            match rejection {
                Rejection::Invalid(reason) => {
                    warn!(
                        "Chunk {} attempt {}/{} rejected: {}",
                        chunk.index, attempt, max_attempts, reason
                    );
                    if self.config.on_invalid == OnInvalid::Abort || attempt >= max_attempts {
                        return Err(AgentError::Validation {
                            chunk: chunk.index,
                            attempts: attempt,
                            reason,
                        });
                    }
                    feedback = Some(reason);
                }
                Rejection::Review(reason) => {
                    warn!(
                        "Chunk {} attempt {}/{} summary rejected: {}",
                        chunk.index, attempt, max_attempts, reason
                    );
                    if attempt >= max_attempts {
                        return Err(AgentError::ReviewRejected {
                            chunk: chunk.index,
                            attempts: attempt,
                            feedback: reason,
                        });
                    }
                    feedback = Some(reason);
                }
            }
        }
    }

    /// Local prefix check, then the reviewer call
    async fn review(
        &self,
        reviewer: &Reviewer<'_>,
        chunk_index: usize,
        attempt: u32,
        candidate: &str,
        state: &mut RunState,
    ) -> Result<Verdict, AgentError> {
        if let Err(violation) = state.summary.propose(candidate) {
            return Ok(Verdict::Rejected(format!(
                "the summary must start with the current summary, unchanged ({})",
                violation
            )));
        }

        let request = reviewer.request(state.summary.as_str(), candidate);
        let raw = self
            .call(state, CallKind::Review, chunk_index, attempt, &request)
            .await?;

        match reviewer.parse_verdict(&raw) {
            Ok(verdict) => {
                state.summary.record_review(verdict.approved);
                if verdict.approved {
                    Ok(Verdict::Approved)
                } else if verdict.feedback.trim().is_empty() {
                    Ok(Verdict::Rejected(
                        "the reviewer rejected the summary".to_string(),
                    ))
                } else {
                    Ok(Verdict::Rejected(verdict.feedback))
                }
            }
            Err(failure) => {
                warn!("Chunk {} reviewer verdict unusable: {}", chunk_index, failure);
                state.summary.record_review(false);
                Ok(Verdict::Unusable(format!(
                    "reviewer verdict unusable: {}",
                    failure
                )))
            }
        }
    }

    /// Issue one provider call and record it in the audit log
    async fn call(
        &self,
        state: &mut RunState,
        kind: CallKind,
        chunk_index: usize,
        attempt: u32,
        request: &ChatRequest,
    ) -> Result<String, AgentError> {
        debug!(
            "Sending {:?} request for chunk {} ({} chars)",
            kind,
            chunk_index,
            request.len()
        );
        state.provider_calls += 1;
        let result = self.provider.complete(request).await;
        let error = result.as_ref().err().map(ToString::to_string);

        if let Some(audit) = &state.audit {
            audit.append(&AuditRecord {
                timestamp_ms: now_ms(),
                provider: self.provider.name(),
                kind,
                chunk_index,
                attempt,
                system_prompt: &request.system,
                user_prompt: &request.user,
                response: result.as_ref().ok().map(String::as_str),
                error: error.as_deref(),
            })?;
        }

        result.map_err(|_| AgentError::Provider {
            chunk: chunk_index,
            message: error.unwrap_or_default(),
        })
    }
}

fn candidate_summary(value: &Value) -> Option<String> {
    value
        .get(SUMMARY_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
}
