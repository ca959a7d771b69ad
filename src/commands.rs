
use anyhow::{Context, Result, bail};
use console::style;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::DocentError;
use crate::config::Config;
use crate::corpus::load_artwork_chunks;
use crate::embeddings::{Embedder, create_embedder};
use crate::index::{BundlePaths, IndexBuilder};
use crate::prompt::{ResponseMode, assemble_prompt};
use crate::retrieval::{Retriever, ScoredChunk};

/// Outcome of a successful index build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub chunks: usize,
    pub skipped: usize,
    pub dimension: usize,
    pub paths: BundlePaths,
    pub duration: Duration,
}

/// Options for a single query run
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub question: String,
    pub top_k: Option<usize>,
    pub index_base: Option<PathBuf>,
    pub show_prompt: bool,
    pub mode: ResponseMode,
}

/// Build and persist the index for the configured (or overridden) paths
#[inline]
pub fn build_index(
    config: &Config,
    data_path: Option<&Path>,
    index_base: Option<&Path>,
) -> Result<BuildSummary> {
    let data_path = data_path.unwrap_or(&config.data.artworks_path);
    let index_base = index_base.unwrap_or(&config.data.index_base);

    let embedder = create_embedder(config).context("Failed to create embedding provider")?;
    let summary = build_index_with(embedder, data_path, index_base)?;

    println!(
        "{} Indexed {} artworks ({} dimensions) in {:.1?}",
        style("✓").green(),
        summary.chunks,
        summary.dimension,
        summary.duration
    );
    if summary.skipped > 0 {
        println!(
            "  {} Skipped {} malformed line(s)",
            style("⚠").yellow(),
            summary.skipped
        );
    }
    println!("  Index: {}", style(summary.paths.index.display()).cyan());
    println!("  Chunks: {}", style(summary.paths.chunks.display()).cyan());

    Ok(summary)
}

/// Build the bundle at `index_base` from the ingestion file at `data_path`
///
/// Nothing is written when the file is missing or yields no chunks.
#[inline]
pub fn build_index_with(
    embedder: Arc<dyn Embedder>,
    data_path: &Path,
    index_base: &Path,
) -> Result<BuildSummary> {
    let started = Instant::now();

    let corpus = match load_artwork_chunks(data_path) {
        Ok(corpus) => corpus,
        Err(DocentError::CorpusNotFound(path)) => bail!(
            "Artwork data file {} not found. Run the scraper first to create it.",
            path.display()
        ),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", data_path.display()));
        }
    };

    if corpus.chunks.is_empty() {
        bail!(
            "{}: {} contains no valid artwork records ({} malformed line(s))",
            DocentError::EmptyCorpus,
            data_path.display(),
            corpus.skipped
        );
    }

    let chunk_count = corpus.chunks.len();
    let bundle = IndexBuilder::new(embedder)
        .build_and_persist(corpus.chunks, index_base)
        .with_context(|| format!("Failed to build index at {}", index_base.display()))?;

    let summary = BuildSummary {
        chunks: chunk_count,
        skipped: corpus.skipped,
        dimension: bundle.index.dimension(),
        paths: BundlePaths::new(index_base),
        duration: started.elapsed(),
    };
    info!(
        "Build finished: {} chunks, {} skipped, {:?}",
        summary.chunks, summary.skipped, summary.duration
    );

    Ok(summary)
}

/// Answer a question from the command line
#[inline]
pub fn run_query(config: &Config, options: &QueryOptions) -> Result<()> {
    let retriever = Retriever::from_config(config).context("Failed to create retriever")?;
    let index_base = options
        .index_base
        .as_deref()
        .unwrap_or(&config.data.index_base);
    let top_k = options.top_k.unwrap_or(config.retrieval.top_k);

    let hits = retriever
        .retrieve_scored(&options.question, index_base, top_k)
        .context("Retrieval failed")?;

    let output = if options.show_prompt && !hits.is_empty() {
        render_prompt(&options.question, &hits, options.mode)
    } else {
        render_hits(&hits)
    };
    println!("{}", output);

    Ok(())
}

/// Human readable listing of ranked chunks
#[inline]
pub fn render_hits(hits: &[ScoredChunk]) -> String {
    let mut out = String::new();

    if hits.is_empty() {
        let _ = writeln!(out, "{}", style("No relevant context found.").yellow());
        let _ = write!(
            out,
            "Build the index first with '{}'.",
            style("museum-docent build").cyan()
        );
        return out;
    }

    for hit in hits {
        let _ = writeln!(
            out,
            "{} {}",
            style(format!("#{}", hit.rank + 1)).bold().cyan(),
            style(format!("(distance {:.4})", hit.distance)).dim()
        );
        for line in hit.text.lines() {
            let _ = writeln!(out, "   {}", line);
        }
        let _ = writeln!(out);
    }

    out.trim_end().to_string()
}

/// System instruction and user prompt for a chat-completion request
#[inline]
pub fn render_prompt(question: &str, hits: &[ScoredChunk], mode: ResponseMode) -> String {
    let chunks: Vec<String> = hits.iter().map(|hit| hit.text.clone()).collect();

    let mut out = String::new();
    let _ = writeln!(out, "{}", style("System:").bold().yellow());
    let _ = writeln!(out, "{}", mode.system_instruction());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style("Prompt:").bold().yellow());
    let _ = write!(out, "{}", assemble_prompt(question, &chunks));
    out
}
