//! Recurrent Agent
//!
//! Feeds a large text file to a language model one chunk at a time.
//!
//! # Overview
//!
//! Every chunk is sent under the same system/user prompt pair and every
//! reply must be JSON (optionally matching an output schema) before it is
//! accepted. In cumulative-summary mode the model also extends a running
//! summary, and a second reviewer call confirms the extension kept the
//! previous summary intact.
//!
//! # Architecture
//!
//! ```text
//! File → TextChunker → PromptBuilder → LlmProvider → Gatekeeper → ResultCollector
//!                                          ↑                ↓
//!                                       Reviewer ← CumulativeSummary
//! ```
//!
//! Processing is strictly sequential; the running summary and the result
//! set are owned by the loop in [`RecurrentAgent::run`].
//!
//! # Example Usage
//!
//! ```no_run
//! use recurrent_agent::{AgentConfig, RecurrentAgent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::load("agent.yaml")?;
//! let agent = RecurrentAgent::from_config(config)?;
//!
//! let output = agent.run().await?;
//! println!("Processed {} chunks", output.chunks_processed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod agent;
mod audit;
mod chunking;
mod collector;
mod config;
mod error;
mod prompt;
mod reviewer;
mod summary;
mod types;


pub use agent::RecurrentAgent;
pub use audit::{AuditLog, AuditRecord, CallKind};
pub use chunking::{read_source, Chunks, TextChunker};
pub use collector::{render_output, write_output, ResultCollector};
pub use config::{AgentConfig, ConfigFormat, Mode, OnInvalid};
pub use error::AgentError;
pub use prompt::{
    PromptBuilder, ReviewPromptBuilder, DEFAULT_REVIEWER_SYSTEM_PROMPT,
    DEFAULT_REVIEWER_USER_PROMPT, JSON_INSTRUCTION,
};
pub use reviewer::Reviewer;
pub use summary::{CommitError, CumulativeSummary, SummaryState};
pub use types::{ChunkResult, ReviewVerdict, RunOutput};
