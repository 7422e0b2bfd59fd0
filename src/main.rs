//! docchat - Main CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use docchat::chunker::Chunker;
use docchat::cli::{Args, Commands};
use docchat::config::Config;
use docchat::embedding::OllamaEmbedder;
use docchat::index::{IndexSummary, VectorIndex};
use docchat::loader;
use docchat::pipeline::RagPipeline;
use docchat::synthesis::OllamaGenerator;
use docchat::Answer;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, &args);

    let chunker = Chunker::new(config.chunking.clone())?;
    let embedder = Arc::new(OllamaEmbedder::new(config.embedding.clone())?);
    let index = Arc::new(VectorIndex::open(config.storage.index_path.clone())?);
    let model = Arc::new(OllamaGenerator::new(config.synthesis.clone())?);

    let pipeline = RagPipeline::new(
        chunker,
        embedder,
        index,
        model,
        config.retrieval.clone(),
    );

    match args.command {
        Commands::Ingest { data_dir } => {
            let data_dir = data_dir.unwrap_or_else(|| config.storage.data_dir.clone());
            run_ingest(&pipeline, &data_dir, &config.storage.index_path).await?;
        }
        Commands::Ask {
            question,
            top_k,
            threshold,
            timeout_secs,
        } => {
            let deadline = timeout_secs.map(Duration::from_secs);
            let answer = pipeline
                .ask_with_deadline(&question, top_k, threshold, deadline)
                .await?;
            print_answer(&answer);
        }
        Commands::Stats => {
            let summary = pipeline.index().summarize().await?;
            print_summary(&summary);
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(url) = args.ollama_url() {
        config.embedding.base_url = url.clone();
        config.synthesis.base_url = url;
    }
    if let Some(model) = &args.embed_model {
        config.embedding.model = model.clone();
    }
    if let Some(model) = &args.model {
        config.synthesis.model = model.clone();
    }
}

async fn run_ingest(pipeline: &RagPipeline, data_dir: &PathBuf, index_path: &PathBuf) -> Result<()> {
    let documents = loader::load_dir(data_dir)?;
    println!("> {} documents loaded.", documents.len());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Embedding chunks and rebuilding index...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let summary = pipeline.ingest(&documents).await;
    pb.finish_and_clear();
    let summary = summary?;

    println!("> {} splits created.", summary.total_chunks);
    println!("> Vector index created ('{}')", index_path.display());
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &IndexSummary) {
    println!("{}", "Index coverage:".bold());
    println!("  total chunks: {}", summary.total_chunks);
    for (source, per_source) in &summary.per_source {
        println!("  {} ({} pages)", source, per_source.nb_pages);
    }
}

fn print_answer(answer: &Answer) {
    println!("\n{} {}", "> Answer:".bold().green(), answer.text);
    println!("\n{}", "> References:".bold());
    for reference in &answer.references {
        let text_sample: String = reference.text.replace('\n', " ").chars().take(100).collect();
        println!(
            ">> \"...{}...\" (source: {}, page: {}, score: {:.3})",
            text_sample.cyan(),
            reference.source,
            reference.page,
            reference.score
        );
    }
}
