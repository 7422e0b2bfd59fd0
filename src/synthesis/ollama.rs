//! Ollama generation client
//!
//! Issues non-streaming POST /api/generate requests and returns the
//! completed response text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::synthesis::{LanguageModel, RetryPolicy};

/// Answer synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Generation model identifier
    pub model: String,
    /// Optional bearer token forwarded when the server requires one
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retry policy; the default makes no extra attempts
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            api_key: None,
            timeout_secs: 120,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Language model backed by an Ollama server
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    config: SynthesisConfig,
}

impl OllamaGenerator {
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RagError::Http)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RagError::Timeout {
                    duration_ms: self.config.timeout_secs * 1000,
                }
            } else {
                RagError::Synthesis(format!("request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::Synthesis(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RagError::Synthesis(format!("malformed response: {}", e)))?;

        Ok(parsed.response)
    }
}

#[async_trait]
impl LanguageModel for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.config
            .retry
            .execute(|| self.generate_once(prompt))
            .await
    }
}
