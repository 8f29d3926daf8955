//! Configuration for the agent
//!
//! Loaded once from a JSON, YAML or TOML file (chosen by extension) and never
//! mutated afterwards.
//!
//! ```yaml
//! system_prompt: You extract the topics discussed in a book.
//! user_prompt: List every topic that starts in this excerpt.
//! file_path: book.txt
//! chunk_size: 4000
//! chunk_overlap: 200
//! llm_provider:
//!   type: openai
//!   model: gpt-4
//!   api_key: env:OPENAI_API_KEY
//! output_schema:
//!   type: object
//!   required: [topics]
//!   properties:
//!     topics: { type: array, items: { type: string } }
//! output_file: topics.json
//! ```

use crate::error::AgentError;
use recurrent_domain::{ChunkUnit, OutputSchema};
use recurrent_llm::{ProviderConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// What the run produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One validated JSON value per chunk
    #[default]
    Extract,

    /// A running summary, extended by every chunk and checked by a reviewer
    #[serde(alias = "summary")]
    CumulativeSummary,
}

/// What to do with a response that fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnInvalid {
    /// Ask again, up to `max_retries` times
    #[default]
    Retry,

    /// Fail the run immediately
    Abort,
}

/// Configuration for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System prompt sent with every chunk
    pub system_prompt: String,

    /// Instructions placed before each chunk
    #[serde(default)]
    pub user_prompt: String,

    /// Expected shape of each response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<OutputSchema>,

    /// Text file to process
    pub file_path: PathBuf,

    /// Chunk length in `chunk_unit`s
    pub chunk_size: usize,

    /// Units shared by consecutive chunks
    #[serde(default)]
    pub chunk_overlap: usize,

    /// Unit for `chunk_size` and `chunk_overlap`
    #[serde(default)]
    pub chunk_unit: ChunkUnit,

    /// Provider selection and settings
    #[serde(alias = "provider")]
    pub llm_provider: ProviderConfig,

    /// Retries per chunk, for both transport failures and rejected responses
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential backoff between transport retries
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Run mode
    #[serde(default)]
    pub mode: Mode,

    /// Reaction to an invalid response
    #[serde(default)]
    pub on_invalid: OnInvalid,

    /// Drop chunk results that are an empty object or array
    #[serde(default = "default_skip_empty_results")]
    pub skip_empty_results: bool,

    /// Reviewer system prompt (built-in default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_system_prompt: Option<String>,

    /// Reviewer instructions (built-in default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_user_prompt: Option<String>,

    /// Where to write the collected results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,

    /// Where to append the prompt/response audit log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_path: Option<PathBuf>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_skip_empty_results() -> bool {
    true
}

/// Configuration file syntax, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, AgentError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(AgentError::Config(format!(
                "configuration file {} must be .json, .yaml, .yml or .toml",
                path.display()
            ))),
        }
    }
}

impl AgentConfig {
    /// Load, parse and validate a configuration file
    ///
    /// Also checks that the input text file exists.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("cannot read configuration file {}: {}", path.display(), e))
        })?;

        let config = Self::parse(&contents, format)?;
        config.validate()?;
        config.check_input_file()?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text in the given format
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self, AgentError> {
        let parsed = match format {
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| AgentError::Config(format!("failed to parse configuration: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.system_prompt.trim().is_empty() {
            return Err(AgentError::Config("system_prompt must not be empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(AgentError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AgentError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.file_path.as_os_str().is_empty() {
            return Err(AgentError::Config("file_path must not be empty".to_string()));
        }
        if let Some(output) = &self.output_file {
            if output == &self.file_path {
                return Err(AgentError::Config(
                    "output_file must not overwrite the input file_path".to_string(),
                ));
            }
        }
        self.llm_provider
            .validate()
            .map_err(|e| AgentError::Config(format!("llm_provider: {}", e)))?;
        Ok(())
    }

    /// Fail early if the input file is missing or is not a regular file
    pub fn check_input_file(&self) -> Result<(), AgentError> {
        let metadata = fs::metadata(&self.file_path).map_err(|source| AgentError::FileAccess {
            path: self.file_path.clone(),
            source,
        })?;

        if !metadata.is_file() {
            return Err(AgentError::FileAccess {
                path: self.file_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        Ok(())
    }

    /// Transport retry policy for the provider client
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }

    /// Total attempts allowed per chunk
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
