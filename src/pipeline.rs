//! End-to-end RAG pipeline orchestration
//!
//! Ingestion runs chunking and an atomic index rebuild; querying runs
//! retrieval, prompt assembly, and synthesis. The references returned
//! with an answer are projected from the exact retrieval results that
//! built the prompt, so citations always match what the model saw.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::chunker::Chunker;
use crate::document::Document;
use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::index::{IndexSummary, VectorIndex};
use crate::prompt::PromptBuilder;
use crate::retrieval::{RetrievalConfig, RetrievalResult, Retriever, SearchParams};
use crate::synthesis::LanguageModel;

/// A citation returned alongside an answer: a presentation projection of
/// one retrieval result, never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub score: f32,
    pub source: String,
    pub page: u32,
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl From<&RetrievalResult> for Reference {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            score: result.score,
            source: result.chunk.source.clone(),
            page: result.chunk.page,
            text: result.chunk.text.clone(),
            metadata: result.chunk.metadata.clone(),
        }
    }
}

/// Generated answer plus the ordered references that grounded it.
/// Produced fresh per query; the core does not cache or persist answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub references: Vec<Reference>,
}

/// Orchestrates ingestion and querying over one document corpus
pub struct RagPipeline {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    model: Arc<dyn LanguageModel>,
    retriever: Retriever,
}

impl RagPipeline {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        index: Arc<VectorIndex>,
        model: Arc<dyn LanguageModel>,
        retrieval: RetrievalConfig,
    ) -> Self {
        let retriever = Retriever::with_config(index.clone(), embedder.clone(), retrieval);
        Self {
            chunker,
            embedder,
            index,
            model,
            retriever,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Chunk the documents and rebuild the index from the batch.
    ///
    /// Any failure aborts the whole ingestion; the prior index, if any,
    /// stays queryable.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IndexSummary> {
        let chunks: Vec<_> = self.chunker.split(documents).collect();
        self.index.rebuild(chunks, self.embedder.as_ref()).await?;
        self.index.summarize().await
    }

    /// Answer a question from the ingested corpus
    pub async fn ask(
        &self,
        question: &str,
        k: Option<usize>,
        threshold: Option<f32>,
    ) -> Result<Answer> {
        self.ask_with_deadline(question, k, threshold, None).await
    }

    /// Answer a question, bounding the synthesis call by `deadline`.
    ///
    /// The deadline covers only synthesis (the most latency-variable
    /// step); hitting it aborts the call without touching the index or
    /// any persisted state.
    pub async fn ask_with_deadline(
        &self,
        question: &str,
        k: Option<usize>,
        threshold: Option<f32>,
        deadline: Option<Duration>,
    ) -> Result<Answer> {
        let params = SearchParams { k, threshold };
        let results = self.retriever.search(question, &params).await?;

        let prompt = PromptBuilder::build(question, &results);

        let text = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.model.complete(&prompt))
                .await
                .map_err(|_| RagError::Timeout {
                    duration_ms: limit.as_millis() as u64,
                })??,
            None => self.model.complete(&prompt).await?,
        };

        let references = results.iter().map(Reference::from).collect();

        Ok(Answer { text, references })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkerConfig;
    use crate::document::Page;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ConstEmbedder;

    #[async_trait]
    impl Embedder for ConstEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    /// Records every prompt it receives and answers with canned text
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingModel {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("canned answer".to_string())
        }
    }

    struct StallingModel;

    #[async_trait]
    impl LanguageModel for StallingModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    fn pipeline_in(dir: &TempDir, model: Arc<dyn LanguageModel>) -> RagPipeline {
        RagPipeline::new(
            Chunker::new(ChunkerConfig::default()).unwrap(),
            Arc::new(ConstEmbedder),
            Arc::new(VectorIndex::open(dir.path().join("index.json")).unwrap()),
            model,
            RetrievalConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_references_match_prompt_contents() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(RecordingModel::new());
        let pipeline = pipeline_in(&dir, model.clone());

        let docs = vec![Document::new(
            "notes.pdf",
            vec![Page::new(1, "alpha facts"), Page::new(2, "beta facts")],
        )];
        pipeline.ingest(&docs).await.unwrap();

        let answer = pipeline.ask("anything", Some(2), Some(0.0)).await.unwrap();
        assert_eq!(answer.text, "canned answer");
        assert_eq!(answer.references.len(), 2);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        for reference in &answer.references {
            assert!(prompts[0].contains(&reference.text));
        }
    }

    #[tokio::test]
    async fn test_ingest_returns_summary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, Arc::new(RecordingModel::new()));

        let docs = vec![Document::new(
            "notes.pdf",
            vec![Page::new(1, "alpha facts"), Page::new(2, "beta facts")],
        )];
        let summary = pipeline.ingest(&docs).await.unwrap();
        assert_eq!(summary.total_chunks, 2);
        assert_eq!(summary.per_source["notes.pdf"].nb_pages, 2);
    }

    #[tokio::test]
    async fn test_ingest_empty_corpus_reports_no_data() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, Arc::new(RecordingModel::new()));
        let err = pipeline.ingest(&[]).await.unwrap_err();
        assert!(matches!(err, RagError::NoData));
    }

    #[tokio::test]
    async fn test_deadline_aborts_synthesis() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, Arc::new(StallingModel));

        let docs = vec![Document::new("notes.pdf", vec![Page::new(1, "alpha facts")])];
        pipeline.ingest(&docs).await.unwrap();

        let err = pipeline
            .ask_with_deadline("anything", Some(1), None, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Timeout { .. }));

        // index still queryable afterwards
        assert_eq!(pipeline.index().len().await, 1);
    }

    #[tokio::test]
    async fn test_synthesis_error_propagates() {
        struct BrokenModel;

        #[async_trait]
        impl LanguageModel for BrokenModel {
            async fn complete(&self, _prompt: &str) -> Result<String> {
                Err(RagError::Synthesis("provider 500".to_string()))
            }
        }

        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_in(&dir, Arc::new(BrokenModel));

        let docs = vec![Document::new("notes.pdf", vec![Page::new(1, "alpha facts")])];
        pipeline.ingest(&docs).await.unwrap();

        let err = pipeline.ask("anything", Some(1), None).await.unwrap_err();
        assert!(matches!(err, RagError::Synthesis(_)));
    }
}
