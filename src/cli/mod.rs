// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `clean` — downloaded HTML → Parquet corpus
//   2. `vocab` — corpus → vocab.txt, evaluation-term check
//   3. `init`  — write a default config.yaml
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use commands::{CleanArgs, Commands, InitArgs, VocabArgs};

use crate::infra::config::{Config, DEFAULT_CONFIG_PATH};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "fed-corpus",
    version,
    about = "Clean Federal Reserve HTML into a tokenized Parquet corpus for Word2Vec."
)]
pub struct Cli {
    /// Path to the YAML config (missing file → defaults)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Clean(args) => run_clean(&self.config, args),
            Commands::Vocab(args) => run_vocab(&self.config, args),
            Commands::Init(args) => run_init(args),
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Cannot load config '{}'", path.display()))
}

/// Handles the `clean` subcommand.
fn run_clean(config_path: &Path, args: CleanArgs) -> Result<()> {
    use crate::application::clean_use_case::CleanUseCase;

    let config = load_config(config_path)?;
    let use_case = CleanUseCase::new(config, args.into())?;
    let summary = use_case.execute()?;

    println!("Clean complete: {summary}");
    Ok(())
}

/// Handles the `vocab` subcommand.
fn run_vocab(config_path: &Path, args: VocabArgs) -> Result<()> {
    use crate::application::vocab_use_case::VocabUseCase;

    let config = load_config(config_path)?;
    let report = VocabUseCase::new(config, args.into()).execute()?;

    println!(
        "Vocabulary: {} distinct tokens from {} documents → {}",
        report.distinct,
        report.documents,
        report.output.display()
    );
    if !report.missing_terms.is_empty() {
        println!("Missing evaluation terms ({}):", report.missing_terms.len());
        for term in &report.missing_terms {
            println!("  {term}");
        }
    }
    Ok(())
}

/// Handles the `init` subcommand.
fn run_init(args: InitArgs) -> Result<()> {
    Config::default()
        .save(&args.output, args.force)
        .with_context(|| format!("Cannot write config '{}'", args.output.display()))?;
    println!("Wrote default config to {}", args.output.display());
    Ok(())
}
