//! Trait definitions for external interactions
//!
//! These traits define the boundary between the pipeline and the model
//! backends. Implementations live in `recurrent-llm`.

use crate::ChatRequest;
use std::future::Future;

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (recurrent-llm). The pipeline is
/// written against this trait only, so every backend (and every test double)
/// is interchangeable.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error: std::fmt::Display;

    /// Send a request and return the raw text the model generated
    ///
    /// Transient transport failures are retried inside the provider; an
    /// error returned here is final for this request.
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}
