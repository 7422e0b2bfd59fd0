//! Embedding provider seam
//!
//! The embedding capability is external: the pipeline consumes it through
//! the [`Embedder`] trait so the same implementation (and therefore the
//! same embedding space) is used at ingestion and query time, and tests
//! can substitute deterministic doubles.

mod ollama;

pub use ollama::{EmbeddingConfig, OllamaEmbedder};

use async_trait::async_trait;

use crate::errors::Result;

/// Maps text to fixed-dimension vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts; the returned vectors are in input order
    /// (vector `i` corresponds to `texts[i]`) regardless of how the
    /// underlying calls complete.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
