//! Recursive text chunking for indexing
//!
//! Splits page text into overlapping windows, preferring to end each
//! window at a paragraph boundary, then a sentence boundary, before
//! falling back to a raw character cut. Consecutive windows of the same
//! page overlap by exactly `chunk_overlap` bytes so retrieved chunks keep
//! local context, and every chunk records its start offset within the
//! page so provenance can be reconstructed.

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, Document, Page};
use crate::errors::{RagError, Result};

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk length in bytes
    pub chunk_size: usize,
    /// Overlap between consecutive chunks of the same page, in bytes
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 250,
        }
    }
}

/// Splits documents into chunks with provenance metadata
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be non-zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split documents into chunks, lazily, in document and page order.
    ///
    /// The iterator is restartable: calling `split` again re-chunks from
    /// the immutable documents. Empty or whitespace-only pages yield zero
    /// chunks rather than an error.
    pub fn split<'a>(&'a self, documents: &'a [Document]) -> impl Iterator<Item = Chunk> + 'a {
        documents.iter().flat_map(move |doc| {
            doc.pages
                .iter()
                .flat_map(move |page| self.split_page(doc, page))
        })
    }

    /// Split one page into overlapping windows
    pub fn split_page(&self, document: &Document, page: &Page) -> Vec<Chunk> {
        let text = page.text.as_str();
        if text.trim().is_empty() {
            return Vec::new();
        }

        let n = text.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < n {
            let mut hard_end = floor_char_boundary(text, (start + self.config.chunk_size).min(n));
            if hard_end <= start {
                // chunk_size smaller than one character; take the character anyway
                hard_end = ceil_char_boundary(text, start + 1);
            }

            let end = if hard_end < n {
                break_point(&text[start..hard_end])
                    .map(|offset| start + offset)
                    .unwrap_or(hard_end)
            } else {
                n
            };

            chunks.push(Chunk::new(
                &text[start..end],
                &document.source,
                page.number,
                start,
                document.metadata.clone(),
            ));

            if end >= n {
                break;
            }

            let next = ceil_char_boundary(text, end.saturating_sub(self.config.chunk_overlap));
            // a window shorter than the overlap must still make progress
            start = if next > start { next } else { end };
        }

        chunks
    }
}

/// Find the coarsest boundary to end a window at: paragraph first, then
/// sentence, then any newline. Returns the offset just past the separator,
/// or None to fall back to a raw character cut.
fn break_point(window: &str) -> Option<usize> {
    let min_pos = window.len() / 3;

    if let Some(pos) = window.rfind("\n\n") {
        if pos > min_pos {
            return Some(pos + 2);
        }
    }

    for pattern in &[". ", "! ", "? ", ".\n", "!\n", "?\n"] {
        if let Some(pos) = window.rfind(pattern) {
            if pos > min_pos {
                return Some(pos + pattern.len());
            }
        }
    }

    if let Some(pos) = window.rfind('\n') {
        if pos > min_pos {
            return Some(pos + 1);
        }
    }

    None
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
