//! Splitting the source text into overlapping chunks
//!
//! Offsets are counted in [`ChunkUnit`]s. Each chunk after the first starts
//! `chunk_size - chunk_overlap` units after the previous one, and the
//! sequence ends with the first chunk that reaches the end of the text.

use crate::error::AgentError;
use recurrent_domain::{Chunk, ChunkUnit};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read the whole input file as UTF-8
///
/// The handle is dropped before returning, on success and on error.
pub fn read_source(path: &Path) -> Result<String, AgentError> {
    let file_access = |source: std::io::Error| AgentError::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(file_access)?;
    let mut text = String::new();
    file.read_to_string(&mut text).map_err(file_access)?;
    Ok(text)
}

/// Chunks text by fixed size with overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    size: usize,
    overlap: usize,
    unit: ChunkUnit,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// `overlap` must be less than `size`.
    pub fn new(size: usize, overlap: usize, unit: ChunkUnit) -> Result<Self, AgentError> {
        if size == 0 {
            return Err(AgentError::Config("chunk_size must be greater than 0".to_string()));
        }
        if overlap >= size {
            return Err(AgentError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap, unit })
    }

    /// Units between the starts of consecutive chunks
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Lazily chunk the given text
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            chunker: *self,
            index: 0,
            cursor: 0,
            unit_start: 0,
            done: text.is_empty(),
        }
    }

    /// Resume chunking at `index`, yielding exactly what `chunks` yields from there
    pub fn chunks_from<'a>(&self, text: &'a str, index: usize) -> Chunks<'a> {
        if index >= self.chunk_count(text) {
            return Chunks {
                text,
                chunker: *self,
                index,
                cursor: text.len(),
                unit_start: 0,
                done: true,
            };
        }

        let unit_start = index * self.step();
        let (cursor, _) = advance(text, 0, unit_start, self.unit);
        Chunks {
            text,
            chunker: *self,
            index,
            cursor,
            unit_start,
            done: false,
        }
    }

    /// Number of chunks `chunks` will yield, without materializing them
    pub fn chunk_count(&self, text: &str) -> usize {
        let total = count_units(text, self.unit);
        if total == 0 {
            0
        } else if total <= self.size {
            1
        } else {
            1 + (total - self.size).div_ceil(self.step())
        }
    }
}

/// Iterator over the chunks of a text
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    chunker: TextChunker,
    index: usize,
    cursor: usize,
    unit_start: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.text.len() {
            return None;
        }

        let unit = self.chunker.unit;
        let start = self.cursor;
        let (end, taken) = advance(self.text, start, self.chunker.size, unit);
        let chunk = Chunk::new(
            self.index,
            self.unit_start,
            self.unit_start + taken,
            &self.text[start..end],
        );

        if end >= self.text.len() {
            self.done = true;
        } else {
            let step = self.chunker.step();
            self.cursor = advance(self.text, start, step, unit).0;
            self.unit_start += step;
        }
        self.index += 1;

        Some(chunk)
    }
}

/// Byte offset `n` units after `from`, and how many units were actually crossed
fn advance(text: &str, from: usize, n: usize, unit: ChunkUnit) -> (usize, usize) {
    let rest = &text[from..];
    match unit {
        ChunkUnit::Characters => match rest.char_indices().nth(n) {
            Some((offset, _)) => (from + offset, n),
            None => (text.len(), rest.chars().count()),
        },
        ChunkUnit::Lines => {
            let mut pos = 0;
            let mut taken = 0;
            while taken < n && pos < rest.len() {
                pos = match rest[pos..].find('\n') {
                    Some(i) => pos + i + 1,
                    None => rest.len(),
                };
                taken += 1;
            }
            (from + pos, taken)
        }
    }
}

fn count_units(text: &str, unit: ChunkUnit) -> usize {
    match unit {
        ChunkUnit::Characters => text.chars().count(),
        ChunkUnit::Lines => {
            let terminated = text.matches('\n').count();
            if text.is_empty() || text.ends_with('\n') {
                terminated
            } else {
                terminated + 1
            }
        }
    }
}
