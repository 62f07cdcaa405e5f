//! Command-line interface for llm-cost
//!
//! Provides `estimate`, `count`, `models` and `cache` subcommands. Settings
//! are loaded once here and passed down by reference.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{load_settings, Settings};

mod cache;
mod count;
mod estimate;
mod models;
mod utils;

/// Estimate and compare what a batch of documents costs across LLM APIs
#[derive(Parser)]
#[command(name = "llm-cost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (.toml, .yaml or .yml); defaults to llm-cost.toml or
    /// llm-cost.yaml in the working directory
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count tokens in files and compare model costs
    Estimate(Box<estimate::EstimateArgs>),

    /// Count tokens of one file or a text snippet
    Count(count::CountArgs),

    /// List the models in the price catalog
    Models(models::ModelsArgs),

    /// Inspect or manage the price catalog cache
    Cache(cache::CacheArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let settings = settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Estimate(args) => estimate::run(*args, &settings),
        Commands::Count(args) => count::run(args, &settings),
        Commands::Models(args) => models::run(args, &settings),
        Commands::Cache(args) => cache::run(args, &settings),
    }
}

fn settings(config_path: Option<&std::path::Path>) -> Result<Settings> {
    let work_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let settings = load_settings(&work_dir, config_path)?;
    if let Err(e) = settings.ensure_directories() {
        tracing::warn!("{}; continuing without a writable price cache", e);
    }
    Ok(settings)
}
