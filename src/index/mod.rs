//! Persisted vector index with atomic rebuild
//!
//! The index is an immutable snapshot behind `RwLock<Arc<..>>`: readers
//! clone the `Arc` and search without holding the lock, while a rebuild
//! constructs and persists a complete new snapshot before swapping it in.
//! Readers therefore see either the old snapshot or the new one, never a
//! mix, and a failed rebuild leaves both the in-memory snapshot and the
//! file on disk untouched.

mod similarity;

pub use similarity::cosine_similarity;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::document::Chunk;
use crate::embedding::Embedder;
use crate::errors::{RagError, Result};

/// One indexed chunk with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Immutable contents of the index at one point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub entries: Vec<IndexEntry>,
    /// Embedding dimension shared by every entry (0 when empty)
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            dimension: 0,
            created_at: Utc::now(),
        }
    }
}

/// Per-source coverage in an [`IndexSummary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    /// Highest page number observed for this source
    pub nb_pages: u32,
}

/// Coverage report over the current snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    pub total_chunks: usize,
    pub per_source: BTreeMap<String, SourceSummary>,
}

/// Vector index over chunk embeddings, persisted as a JSON snapshot
pub struct VectorIndex {
    path: PathBuf,
    snapshot: RwLock<Arc<IndexSnapshot>>,
}

impl VectorIndex {
    /// Open the index at `path`, reloading the last successfully
    /// persisted snapshot; a missing file opens an empty index.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            IndexSnapshot::empty()
        };

        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// The snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot; the clone stays consistent for the caller even
    /// if a rebuild swaps in a new one concurrently
    pub async fn current(&self) -> Arc<IndexSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.current().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Replace the entire index contents atomically.
    ///
    /// Embeds every chunk (batched by the embedder), builds the new
    /// snapshot, persists it with write-to-temp-then-rename, then swaps
    /// it in. Any failure reports `IndexBuild` and leaves the prior
    /// snapshot readable in memory and on disk.
    pub async fn rebuild(&self, chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<()> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| RagError::IndexBuild(format!("embedding failed: {}", e)))?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::IndexBuild(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimension = embeddings.first().map(|v| v.len()).unwrap_or(0);
        if !chunks.is_empty() && dimension == 0 {
            return Err(RagError::IndexBuild("embedder returned empty vectors".to_string()));
        }
        for (i, vector) in embeddings.iter().enumerate() {
            if vector.len() != dimension {
                return Err(RagError::IndexBuild(format!(
                    "chunk {} embedded to dimension {} (expected {})",
                    i,
                    vector.len(),
                    dimension
                )));
            }
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        let snapshot = IndexSnapshot {
            entries,
            dimension,
            created_at: Utc::now(),
        };

        persist(&snapshot, &self.path)
            .map_err(|e| RagError::IndexBuild(format!("persistence failed: {}", e)))?;

        *self.snapshot.write().await = Arc::new(snapshot);
        Ok(())
    }

    /// Return the `k` nearest entries to `query` by cosine similarity,
    /// descending, ties broken by insertion order. Fewer than `k` entries
    /// returns all of them.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(IndexEntry, f32)>> {
        let snapshot = self.current().await;
        if snapshot.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if query.len() != snapshot.dimension {
            return Err(RagError::Config(format!(
                "query embedding dimension {} does not match index dimension {}",
                query.len(),
                snapshot.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = snapshot
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        // stable sort keeps insertion order for tied scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| (snapshot.entries[i].clone(), score))
            .collect())
    }

    /// Enumerate distinct sources and their highest observed page number
    pub async fn summarize(&self) -> Result<IndexSummary> {
        let snapshot = self.current().await;
        if snapshot.entries.is_empty() {
            return Err(RagError::NoData);
        }

        let mut per_source: BTreeMap<String, SourceSummary> = BTreeMap::new();
        for entry in &snapshot.entries {
            let summary = per_source
                .entry(entry.chunk.source.clone())
                .or_insert(SourceSummary { nb_pages: 0 });
            summary.nb_pages = summary.nb_pages.max(entry.chunk.page);
        }

        Ok(IndexSummary {
            total_chunks: snapshot.entries.len(),
            per_source,
        })
    }
}

/// Write the snapshot next to its final location, then rename over it so
/// the file is replaced atomically and never observable half-written.
fn persist(snapshot: &IndexSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string(snapshot)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
