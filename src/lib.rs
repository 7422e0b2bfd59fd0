//! docchat - Question answering over a private PDF library
//!
//! A retrieval-augmented generation pipeline backed by a local Ollama
//! instance: documents are split into overlapping chunks, embedded, and
//! stored in a persisted vector index; questions retrieve the most
//! relevant chunks, which ground a synthesized answer with traceable
//! references.
//!
//! # Architecture
//!
//! - Ingestion: loader -> chunker -> embedder -> vector index
//! - Query: retriever -> prompt builder -> answer synthesizer

pub mod errors;
pub mod config;
pub mod document;
pub mod loader;
pub mod chunker;
pub mod embedding;
pub mod index;
pub mod retrieval;
pub mod prompt;
pub mod synthesis;
pub mod pipeline;
pub mod cli;

// Re-export commonly used types
pub use errors::{RagError, Result};
pub use document::{Chunk, Document, Page};
pub use pipeline::{Answer, RagPipeline, Reference};
