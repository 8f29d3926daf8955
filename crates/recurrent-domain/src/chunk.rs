//! Chunk module - slices of the source text

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Unit in which chunk sizes and offsets are measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkUnit {
    /// Unicode scalar values
    #[default]
    Characters,

    /// `\n`-terminated lines (a final unterminated line still counts)
    Lines,
}

impl ChunkUnit {
    /// Get the unit name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkUnit::Characters => "characters",
            ChunkUnit::Lines => "lines",
        }
    }
}

impl std::fmt::Display for ChunkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous slice of the source text
///
/// `start` and `end` are offsets in [`ChunkUnit`]s, not bytes. Consecutive
/// chunks may overlap; the last chunk may be shorter than the configured size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the sequence (0-based)
    pub index: usize,

    /// First unit covered by this chunk
    pub start: usize,

    /// One past the last unit covered by this chunk
    pub end: usize,

    /// Materialized text of the chunk
    pub text: String,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(index: usize, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Number of units covered by this chunk
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the chunk covers no units
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Offset range covered by this chunk
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
