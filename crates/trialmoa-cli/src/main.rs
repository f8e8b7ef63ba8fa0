//! trialmoa: annotate clinical trials with target, mechanism of action and
//! innovation status.
//!
//! Subcommands:
//! - `classify`: CSV in, annotated CSV out (optionally a JSON run summary)
//! - `discover`: list candidate targets mentioned in a CSV

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trialmoa_classify::{discover_targets, Annotator, Summary};
use trialmoa_cli::{io, Config};
use trialmoa_common::Vocabulary;

#[derive(Parser)]
#[command(name = "trialmoa", version, about = "Clinical trial mechanism-of-action annotator")]
struct Cli {
    /// Path to trialmoa.toml
    #[arg(long, global = true, env = "TRIALMOA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate every trial in a CSV file
    Classify {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Vocabulary file (YAML or JSON); overrides [paths].vocabulary
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        /// Write a JSON run summary here
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Write skipped rows as CSV here
        #[arg(long)]
        skipped: Option<PathBuf>,

        /// Judge innovation from the mechanism table only
        #[arg(long)]
        no_signals: bool,
    },
    /// List candidate molecular targets mentioned in a CSV file
    Discover {
        #[arg(long)]
        input: PathBuf,

        /// Minimum number of mentions; overrides [discovery].min_frequency
        #[arg(long)]
        min_frequency: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_source) = Config::resolve(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(source = %config_source, "Configuration loaded");

    match cli.command {
        Commands::Classify { input, output, vocabulary, summary, skipped, no_signals } => {
            let vocabulary_path = vocabulary.unwrap_or_else(|| config.paths.vocabulary.clone());
            let summary_path = summary.or_else(|| config.paths.summary.clone());
            run_classify(
                &config,
                ClassifyArgs { input, output, vocabulary_path, summary_path, skipped, no_signals },
            )
        }
        Commands::Discover { input, min_frequency, json } => {
            let min_frequency = min_frequency.unwrap_or(config.discovery.min_frequency);
            run_discover(&config, input, min_frequency, json)
        }
    }
}

struct ClassifyArgs {
    input: PathBuf,
    output: PathBuf,
    vocabulary_path: PathBuf,
    summary_path: Option<PathBuf>,
    skipped: Option<PathBuf>,
    no_signals: bool,
}

fn run_classify(config: &Config, args: ClassifyArgs) -> anyhow::Result<()> {
    // Vocabulary and header problems stop the run before any record.
    let vocabulary = Vocabulary::from_path(&args.vocabulary_path)
        .with_context(|| format!("loading vocabulary {}", args.vocabulary_path.display()))?;
    let mut annotator = Annotator::new(&vocabulary).context("compiling vocabulary")?;
    if args.no_signals {
        annotator = annotator.without_signals();
    }

    let input = io::read_input(&args.input, &config.columns)?;
    let outcome = annotator.run_batch(input.rows.iter().cloned(), &config.columns);

    io::write_output(&args.output, &input, &outcome)?;

    if let Some(path) = &args.skipped {
        io::write_skipped(path, &outcome.skipped)?;
        info!(path = %path.display(), skipped = outcome.skipped.len(), "Skip report written");
    }

    let summary = Summary::from_outcome(&outcome);
    summary.log();
    if let Some(path) = &args.summary_path {
        std::fs::write(path, summary.to_json_pretty()?)
            .with_context(|| format!("writing summary {}", path.display()))?;
        info!(path = %path.display(), "Summary written");
    }
    Ok(())
}

fn run_discover(config: &Config, input: PathBuf, min_frequency: usize, json: bool) -> anyhow::Result<()> {
    let input = io::read_input(&input, &config.columns)?;
    let texts = input.texts(&config.columns);
    let found = discover_targets(texts.iter().map(String::as_str), min_frequency);

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("(no targets with at least {min_frequency} mentions)");
        return Ok(());
    }
    println!("{:<30} {:>8}  pattern", "target", "mentions");
    for target in &found {
        println!("{:<30} {:>8}  {}", target.name, target.mentions, target.pattern);
    }
    Ok(())
}
