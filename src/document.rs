//! Document and chunk value types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// One page of text extracted from a source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the source
    pub number: u32,
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A source document: identifier plus ordered pages.
///
/// Immutable once loaded; PDF parsing happens upstream and the core only
/// ever sees the extracted per-page text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source identifier (the file path the pages came from)
    pub source: String,
    pub pages: Vec<Page>,
    /// Optional key/value pairs attached at ingestion time; copied onto
    /// every chunk and passed through unmodified to query results
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl Document {
    pub fn new(source: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            source: source.into(),
            pages,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, JsonValue>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A bounded text segment cut from one document page.
///
/// Invariant: `(source, page, start_offset)` resolves back to a span of
/// the original page text, so provenance survives embedding and indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub source: String,
    pub page: u32,
    /// Byte offset of this chunk within its source page text
    pub start_offset: usize,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        page: u32,
        start_offset: usize,
        metadata: HashMap<String, JsonValue>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            source: source.into(),
            page,
            start_offset,
            metadata,
        }
    }

    /// Length of the chunk text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
