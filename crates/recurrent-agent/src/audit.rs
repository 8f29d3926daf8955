//! Append-only JSON Lines record of every provider call

use crate::error::AgentError;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Which step of the pipeline issued a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Chunk extraction or summary extension
    Chunk,
    /// Reviewer check of a candidate summary
    Review,
}

/// One audit line
#[derive(Debug, Serialize)]
pub struct AuditRecord<'a> {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Provider name
    pub provider: &'a str,
    /// Call kind
    pub kind: CallKind,
    /// Chunk being processed
    pub chunk_index: usize,
    /// Attempt number for this chunk (1-based)
    pub attempt: u32,
    /// System prompt sent
    pub system_prompt: &'a str,
    /// User message sent
    pub user_prompt: &'a str,
    /// Raw response text, when the call succeeded
    pub response: Option<&'a str>,
    /// Provider error, when the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

/// Audit log file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Open (creating parent directories and the file) an audit log
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AgentError> {
        let log = Self { path: path.into() };

        if let Some(parent) = log.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| log.error(source))?;
        }
        log.append_raw(b"")?;
        Ok(log)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single JSON line
    pub fn append(&self, record: &AuditRecord<'_>) -> Result<(), AgentError> {
        let mut line = serde_json::to_vec(record).map_err(|e| {
            self.error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        line.push(b'\n');
        self.append_raw(&line)
    }

    fn append_raw(&self, bytes: &[u8]) -> Result<(), AgentError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.error(source))?;
        file.write_all(bytes).map_err(|source| self.error(source))
    }

    fn error(&self, source: std::io::Error) -> AgentError {
        AgentError::Audit {
            path: self.path.clone(),
            source,
        }
    }
}

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn record<'a>(kind: CallKind, attempt: u32, response: Option<&'a str>) -> AuditRecord<'a> {
        AuditRecord {
            timestamp_ms: now_ms(),
            provider: "mock",
            kind,
            chunk_index: 2,
            attempt,
            system_prompt: "system",
            user_prompt: "user",
            response,
            error: None,
        }
    }

    #[test]
    fn test_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();

        log.append(&record(CallKind::Chunk, 1, Some("{\"a\": 1}"))).unwrap();
        log.append(&record(CallKind::Review, 1, Some("{\"approved\": true}"))).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "chunk");
        assert_eq!(lines[0]["chunk_index"], 2);
        assert_eq!(lines[0]["response"], "{\"a\": 1}");
        assert_eq!(lines[1]["kind"], "review");
        assert!(lines[1].get("error").is_none());
    }

    #[test]
    fn test_failed_call_is_recorded() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path().join("audit.jsonl")).unwrap();

        let mut failed = record(CallKind::Chunk, 3, None);
        failed.error = Some("Rate limit exceeded");
        log.append(&failed).unwrap();

        let line: Value =
            serde_json::from_str(fs::read_to_string(log.path()).unwrap().trim()).unwrap();
        assert_eq!(line["response"], Value::Null);
        assert_eq!(line["error"], "Rate limit exceeded");
        assert_eq!(line["attempt"], 3);
    }

    #[test]
    fn test_existing_log_is_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.jsonl");
        fs::write(&path, "{\"previous\": true}\n").unwrap();

        let log = AuditLog::open(&path).unwrap();
        log.append(&record(CallKind::Chunk, 1, Some("x"))).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_open_unwritable_path() {
        let dir = TempDir::new().unwrap();
        // The log path is an existing directory
        let err = AuditLog::open(dir.path()).unwrap_err();
        assert!(matches!(err, AgentError::Audit { .. }));
    }
}
