//! Answer synthesis seam
//!
//! The language-model capability is external; the pipeline consumes it
//! through the [`LanguageModel`] trait. Provider failures always surface
//! as typed errors — a missing or failed completion is never silently
//! turned into an answer.

mod ollama;
mod retry;

pub use ollama::{OllamaGenerator, SynthesisConfig};
pub use retry::RetryPolicy;

use async_trait::async_trait;

use crate::errors::Result;

/// Generates answer text from a fully assembled prompt
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
