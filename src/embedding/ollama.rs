//! Ollama embedding client
//!
//! Calls POST /api/embed with batched inputs. Batches are issued
//! concurrently up to a configured limit; results are reassembled in
//! input order.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Embedding model identifier
    pub model: String,
    /// Texts per request
    pub batch_size: usize,
    /// Concurrent in-flight batch requests
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            batch_size: 32,
            concurrency: 4,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by an Ollama server
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(RagError::Config("embedding batch_size must be non-zero".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RagError::Http)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    async fn embed_one_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.config.base_url);
        let request = EmbedRequest {
            model: &self.config.model,
            input: batch,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagError::Timeout {
                        duration_ms: self.config.timeout_secs * 1000,
                    }
                } else {
                    RagError::Embedding(format!("request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("malformed response: {}", e)))?;

        if parsed.embeddings.len() != batch.len() {
            return Err(RagError::Embedding(format!(
                "provider returned {} vectors for {} inputs",
                parsed.embeddings.len(),
                batch.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut vectors = self.embed_one_batch(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("provider returned no vector".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // buffered() yields in input order no matter which request
        // finishes first, so vector i always belongs to texts[i]
        let batches: Vec<Vec<String>> = texts
            .chunks(self.config.batch_size)
            .map(|c| c.to_vec())
            .collect();
        let results: Vec<Result<Vec<Vec<f32>>>> = stream::iter(batches)
            .map(|batch| async move { self.embed_one_batch(&batch).await })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut vectors = Vec::with_capacity(texts.len());
        for batch_result in results {
            vectors.extend(batch_result?);
        }

        Ok(vectors)
    }
}
