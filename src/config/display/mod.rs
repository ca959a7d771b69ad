
use console::style;
use std::fmt::Write as _;

use super::{Config, EmbeddingProviderKind};

/// Render the effective configuration as a human readable report
#[inline]
pub fn render_config(config: &Config) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", style("📋 Current Configuration").bold().cyan());
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", style("Data:").bold().yellow());
    let _ = writeln!(
        out,
        "  Artworks file: {}",
        style(config.data.artworks_path.display()).cyan()
    );
    let _ = writeln!(
        out,
        "  Index base: {}",
        style(config.data.index_base.display()).cyan()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style("Embedding:").bold().yellow());
    let _ = writeln!(out, "  Provider: {}", style(config.embedding.provider).cyan());
    match config.embedding.provider {
        EmbeddingProviderKind::Onnx => {
            let _ = writeln!(out, "  Model: {}", style(&config.embedding.model).cyan());
            let _ = writeln!(
                out,
                "  Model cache: {}",
                style(config.model_cache_dir().display()).cyan()
            );
            let _ = writeln!(
                out,
                "  Max sequence length: {}",
                style(config.embedding.max_length).cyan()
            );
        }
        EmbeddingProviderKind::Ollama => {
            let _ = writeln!(out, "  Model: {}", style(&config.ollama.model).cyan());
            match config.ollama_url() {
                Ok(url) => {
                    let _ = writeln!(out, "  Ollama URL: {}", style(url).cyan());
                }
                Err(e) => {
                    let _ = writeln!(out, "  Ollama URL: {} ({})", style("Invalid").red(), e);
                }
            }
        }
    }
    let _ = writeln!(
        out,
        "  Dimension: {}",
        style(config.embedding.dimension).cyan()
    );
    let _ = writeln!(
        out,
        "  Batch size: {}",
        style(config.embedding.batch_size).cyan()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style("Retrieval:").bold().yellow());
    let _ = writeln!(out, "  Top K: {}", style(config.retrieval.top_k).cyan());
    let _ = writeln!(
        out,
        "  Strict bundle check: {}",
        style(config.retrieval.strict_bundle).cyan()
    );

    let _ = writeln!(out);
    let _ = write!(
        out,
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    out
}

#[inline]
pub fn show_config(config: &Config) {
    eprintln!("{}", render_config(config));
}
