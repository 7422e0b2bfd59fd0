//! Command-line argument parsing for docchat

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docchat - Ask questions of a private PDF library through a local
/// Ollama model
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(version = "0.3.0")]
#[command(about = "Ask questions of your PDF library", long_about = None)]
pub struct Args {
    /// Ollama host (overrides the configured base URL)
    #[arg(long)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long)]
    pub port: Option<u16>,

    /// Embedding model to use
    #[arg(long)]
    pub embed_model: Option<String>,

    /// Generation model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load documents, rebuild the index, and print a coverage summary
    Ingest {
        /// Directory of extracted document text (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Ask a question against the ingested corpus
    Ask {
        /// The question to answer
        question: String,

        /// Maximum references to retrieve (default: capped full scan)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum relevance score in [-1, 1] (default 0.0)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Abort synthesis after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show statistics for the persisted index
    Stats,
}

impl Args {
    /// Ollama base URL when host/port overrides are present
    pub fn ollama_url(&self) -> Option<String> {
        match (&self.host, self.port) {
            (None, None) => None,
            (host, port) => Some(format!(
                "http://{}:{}",
                host.as_deref().unwrap_or("127.0.0.1"),
                port.unwrap_or(11434)
            )),
        }
    }
}
