//! Error types for the agent

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can end a run
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input text file missing, unreadable or not UTF-8
    #[error("Cannot read input file {}: {source}", path.display())]
    FileAccess {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Provider failed after its own transport retries
    #[error("Provider error on chunk {chunk}: {message}")]
    Provider {
        /// Chunk being processed
        chunk: usize,
        /// Provider error message
        message: String,
    },

    /// Every attempt for a chunk produced an invalid response
    #[error("Invalid response for chunk {chunk} after {attempts} attempt(s): {reason}")]
    Validation {
        /// Chunk being processed
        chunk: usize,
        /// Attempts made
        attempts: u32,
        /// Last validation failure
        reason: String,
    },

    /// Every candidate summary for a chunk was rejected
    #[error("Summary rejected for chunk {chunk} after {attempts} attempt(s): {feedback}")]
    ReviewRejected {
        /// Chunk being processed
        chunk: usize,
        /// Attempts made
        attempts: u32,
        /// Last rejection feedback
        feedback: String,
    },

    /// Result file could not be written
    #[error("Cannot write output file {}: {source}", path.display())]
    Output {
        /// Output file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Audit log could not be written
    #[error("Cannot write audit log {}: {source}", path.display())]
    Audit {
        /// Audit log file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl AgentError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentError::Config(_) => 2,
            AgentError::FileAccess { .. } => 3,
            AgentError::Provider { .. } => 4,
            AgentError::Validation { .. } | AgentError::ReviewRejected { .. } => 5,
            AgentError::Output { .. } | AgentError::Audit { .. } => 6,
        }
    }

    /// Chunk the run failed on, for pipeline errors
    pub fn chunk(&self) -> Option<usize> {
        match self {
            AgentError::Provider { chunk, .. }
            | AgentError::Validation { chunk, .. }
            | AgentError::ReviewRejected { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}
