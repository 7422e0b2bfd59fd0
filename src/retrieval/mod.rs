//! Retrieval engine: embed the question, search the index, apply the
//! relevance threshold
//!
//! The retriever holds the same [`Embedder`] used at ingestion, so query
//! and chunk vectors live in the same embedding space. It keeps three
//! failure modes distinct: an empty index, a search that returned
//! nothing, and results that all fell below the threshold.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::document::Chunk;
use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::index::VectorIndex;

/// Retrieval policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Cap applied when the caller requests a full scan (`k` unspecified);
    /// an unbounded scan over an arbitrarily large index is never issued
    pub max_scan: usize,
    /// Threshold applied when the caller leaves it unspecified
    pub default_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_scan: 100,
            default_threshold: 0.0,
        }
    }
}

/// Per-query search parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum results; `None` means a capped full scan of the index
    pub k: Option<usize>,
    /// Minimum relevance score in [-1, 1]; `None` means the configured
    /// default (0.0)
    pub threshold: Option<f32>,
}

/// One retrieved chunk with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    /// Cosine-derived relevance in [-1, 1], higher is better
    pub score: f32,
}

/// Retrieval engine over a vector index
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(index, embedder, RetrievalConfig::default())
    }

    pub fn with_config(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve chunks relevant to `question`, ranked by descending
    /// score, keeping only results with `score >= threshold`.
    pub async fn search(&self, question: &str, params: &SearchParams) -> Result<Vec<RetrievalResult>> {
        let threshold = params.threshold.unwrap_or(self.config.default_threshold);
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(RagError::Config(format!(
                "threshold {} outside [-1, 1]",
                threshold
            )));
        }
        if params.k == Some(0) {
            return Err(RagError::Config("k must be at least 1".to_string()));
        }

        let k = match params.k {
            Some(k) => k,
            None => self.index.len().await.min(self.config.max_scan).max(1),
        };

        let query = self.embedder.embed(question).await?;
        let raw = self.index.search(&query, k).await?;

        if raw.is_empty() {
            return Err(RagError::NoResults);
        }

        let results: Vec<RetrievalResult> = raw
            .into_iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(entry, score)| RetrievalResult {
                chunk: entry.chunk,
                score,
            })
            .collect();

        if results.is_empty() {
            return Err(RagError::NoResultsAboveThreshold { threshold });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Embeds text onto a fixed 2d plane by keyword so scores are known
    struct PlaneEmbedder;

    fn plane(text: &str) -> Vec<f32> {
        if text.contains("sun") {
            vec![1.0, 0.0]
        } else if text.contains("moon") {
            vec![0.8, 0.6]
        } else if text.contains("which") {
            vec![0.6, 0.8]
        } else {
            vec![0.0, 1.0]
        }
    }

    #[async_trait]
    impl Embedder for PlaneEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(plane(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| plane(t)).collect())
        }
    }

    async fn retriever_with_corpus(dir: &TempDir) -> Retriever {
        let index = Arc::new(VectorIndex::open(dir.path().join("index.json")).unwrap());
        let chunks = vec![
            Chunk::new("the sun is bright", "sky.pdf", 1, 0, HashMap::new()),
            Chunk::new("the moon is pale", "sky.pdf", 2, 0, HashMap::new()),
            Chunk::new("soil drains well", "garden.pdf", 1, 0, HashMap::new()),
        ];
        let embedder: Arc<dyn Embedder> = Arc::new(PlaneEmbedder);
        index.rebuild(chunks, embedder.as_ref()).await.unwrap();
        Retriever::new(index, embedder)
    }

    #[tokio::test]
    async fn test_results_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let retriever = retriever_with_corpus(&dir).await;

        let results = retriever
            .search("sun", &SearchParams { k: Some(3), threshold: Some(0.5) })
            .await
            .unwrap();

        // "sun" scores 1.0, "moon" 0.8, "soil" 0.0 (dropped)
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| r.score >= 0.5));
        assert_eq!(results[0].chunk.page, 1);
    }

    #[tokio::test]
    async fn test_raising_threshold_shrinks_results() {
        let dir = TempDir::new().unwrap();
        let retriever = retriever_with_corpus(&dir).await;

        let loose = retriever
            .search("sun", &SearchParams { k: Some(3), threshold: Some(0.0) })
            .await
            .unwrap();
        let tight = retriever
            .search("sun", &SearchParams { k: Some(3), threshold: Some(0.9) })
            .await
            .unwrap();

        assert!(tight.len() <= loose.len());
    }

    #[tokio::test]
    async fn test_threshold_too_high_is_distinct_error() {
        let dir = TempDir::new().unwrap();
        let retriever = retriever_with_corpus(&dir).await;

        // "which" embeds off-axis from every chunk, so no score reaches 0.99
        let err = retriever
            .search("which is pale", &SearchParams { k: Some(3), threshold: Some(0.99) })
            .await
            .unwrap_err();
        match err {
            RagError::NoResultsAboveThreshold { threshold } => {
                assert!((threshold - 0.99).abs() < 1e-6)
            }
            other => panic!("expected NoResultsAboveThreshold, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_index_propagates_empty_error() {
        let dir = TempDir::new().unwrap();
        let index = Arc::new(VectorIndex::open(dir.path().join("index.json")).unwrap());
        let retriever = Retriever::new(index, Arc::new(PlaneEmbedder));

        let err = retriever.search("sun", &SearchParams::default()).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_unspecified_k_scans_whole_small_index() {
        let dir = TempDir::new().unwrap();
        let retriever = retriever_with_corpus(&dir).await;

        let results = retriever
            .search("sun", &SearchParams { k: None, threshold: Some(-1.0) })
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_unspecified_k_is_capped() {
        let dir = TempDir::new().unwrap();
        let index = Arc::new(VectorIndex::open(dir.path().join("index.json")).unwrap());
        let embedder: Arc<dyn Embedder> = Arc::new(PlaneEmbedder);
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| Chunk::new(format!("sun chunk {}", i), "big.pdf", 1, 0, HashMap::new()))
            .collect();
        index.rebuild(chunks, embedder.as_ref()).await.unwrap();

        let retriever = Retriever::with_config(
            index,
            embedder,
            RetrievalConfig {
                max_scan: 4,
                default_threshold: 0.0,
            },
        );

        let results = retriever.search("sun", &SearchParams::default()).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_params_rejected() {
        let dir = TempDir::new().unwrap();
        let retriever = retriever_with_corpus(&dir).await;

        assert!(matches!(
            retriever
                .search("sun", &SearchParams { k: Some(0), threshold: None })
                .await
                .unwrap_err(),
            RagError::Config(_)
        ));
        assert!(matches!(
            retriever
                .search("sun", &SearchParams { k: Some(1), threshold: Some(1.5) })
                .await
                .unwrap_err(),
            RagError::Config(_)
        ));
    }
}
