use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use museum_docent::commands::{QueryOptions, build_index, run_query};
use museum_docent::config::{Config, get_config_dir, show_config};
use museum_docent::prompt::ResponseMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "museum-docent")]
#[command(about = "Retrieval over museum artwork descriptions for a docent chatbot")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and downloaded models
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the similarity index from the artwork data file
    Build {
        /// Newline-delimited JSON artwork records
        #[arg(long)]
        data: Option<PathBuf>,
        /// Base path of the index artifacts
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Retrieve the artworks most relevant to a question
    Query {
        question: String,
        /// Number of chunks to retrieve
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
        /// Base path of the index artifacts
        #[arg(long)]
        index: Option<PathBuf>,
        /// Print the assembled model prompt instead of the raw chunks
        #[arg(long)]
        prompt: bool,
        /// Response style requested in the prompt
        #[arg(long, value_enum, default_value_t = ResponseMode::Concise)]
        mode: ResponseMode,
    },
    /// Write or show the configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir().context("Could not determine configuration directory")?,
    };
    let config = Config::load(&config_dir)?;

    match cli.command {
        Commands::Build { data, index } => {
            build_index(&config, data.as_deref(), index.as_deref())?;
        }
        Commands::Query {
            question,
            top_k,
            index,
            prompt,
            mode,
        } => {
            run_query(
                &config,
                &QueryOptions {
                    question,
                    top_k,
                    index_base: index,
                    show_prompt: prompt,
                    mode,
                },
            )?;
        }
        Commands::Config { show } => {
            if !show {
                config.save()?;
                eprintln!(
                    "{} Configuration written to {}",
                    style("✓").green(),
                    config.config_file_path().display()
                );
            }
            show_config(&config);
        }
    }

    Ok(())
}
