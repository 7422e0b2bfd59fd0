//! Error types for the docchat pipeline
//!
//! Every failure surfaces to the immediate caller as a typed variant;
//! nothing inside the core retries implicitly, and a missing grounding
//! corpus is always an explicit error rather than an empty answer.

use thiserror::Error;

/// Main error type for the RAG pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Document read/parse failure during loading
    #[error("Failed to ingest '{path}': {reason}")]
    Ingestion { path: String, reason: String },

    /// Embedding or persistence failure during index rebuild
    #[error("Index rebuild failed: {0}")]
    IndexBuild(String),

    /// Similarity search against an index with zero entries
    #[error("Vector index is empty; ingest documents first")]
    EmptyIndex,

    /// Summary requested for an index with zero entries
    #[error("No data in vector index")]
    NoData,

    /// Search returned zero results
    #[error("No results")]
    NoResults,

    /// Every result fell below the relevance threshold
    #[error("No results with relevance score >= {threshold}")]
    NoResultsAboveThreshold { threshold: f32 },

    /// Embedding provider failure
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Language-model call failed
    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    /// Operation exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;
