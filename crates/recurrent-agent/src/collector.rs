//! Collecting chunk results and writing the output file

use crate::config::Mode;
use crate::error::AgentError;
use crate::types::ChunkResult;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Ordered, append-only result set
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    results: Vec<ChunkResult>,
    skip_empty: bool,
    skipped: usize,
}

impl ResultCollector {
    /// Create a collector; `skip_empty` drops `{}` and `[]` results
    pub fn new(skip_empty: bool) -> Self {
        Self {
            results: Vec::new(),
            skip_empty,
            skipped: 0,
        }
    }

    /// Append a chunk's value, returning whether it was kept
    pub fn push(&mut self, chunk_index: usize, value: Value) -> bool {
        if self.skip_empty && is_empty_value(&value) {
            info!("Chunk {} returned an empty result", chunk_index);
            self.skipped += 1;
            return false;
        }

        self.results.push(ChunkResult { chunk_index, value });
        true
    }

    /// Results collected so far
    pub fn results(&self) -> &[ChunkResult] {
        &self.results
    }

    /// Number of results dropped as empty
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Consume the collector
    pub fn into_results(self) -> Vec<ChunkResult> {
        self.results
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// JSON document written to `output_file`
pub fn render_output(mode: Mode, results: &[ChunkResult], summary: Option<&str>) -> Value {
    let values: Vec<&Value> = results.iter().map(|r| &r.value).collect();
    match mode {
        Mode::Extract => json!(values),
        Mode::CumulativeSummary => json!({
            "summary": summary.unwrap_or_default(),
            "results": values,
        }),
    }
}

/// Write the output document as pretty JSON, replacing any existing file
pub fn write_output(path: &Path, document: &Value) -> Result<(), AgentError> {
    let output_error = |source: std::io::Error| AgentError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_error)?;
    }

    let mut contents = serde_json::to_string_pretty(document)
        .map_err(|e| output_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    contents.push('\n');
    fs::write(path, contents).map_err(output_error)?;

    info!("Saved results to {}", path.display());
    Ok(())
}
