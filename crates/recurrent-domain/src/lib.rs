//! Recurrent Domain Layer
//!
//! Core value types shared by every other crate in the workspace, and the
//! single capability trait the pipeline needs from a language model.
//!
//! ## Key Concepts
//!
//! - **Chunk**: a contiguous, possibly overlapping slice of the source text
//! - **ChatRequest**: the rendered system/user prompt pair sent to a provider
//! - **OutputSchema**: a structural description of the JSON a model must return
//! - **LlmProvider**: anything that turns a `ChatRequest` into raw model text
//!
//! ## Architecture
//!
//! - No I/O and no runtime dependencies
//! - Provider implementations live in `recurrent-llm`
//! - Validation against `OutputSchema` lives in `recurrent-gatekeeper`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod request;
pub mod schema;
pub mod traits;

// Re-exports for convenience
pub use chunk::{Chunk, ChunkUnit};
pub use request::ChatRequest;
pub use schema::OutputSchema;
pub use traits::LlmProvider;
