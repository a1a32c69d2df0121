//! Link Validator CLI
//!
//! Runs the full validation pipeline over a directory of entity records
//! and emits the report as JSON or Markdown. Exits non-zero when the
//! broken-link ratio exceeds the configured threshold.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use mythlink::{run_directory, RunBudget, ValidatorConfig};

#[derive(Parser)]
#[command(name = "mythlink")]
#[command(about = "Validate cross-entity links in a mythology entity collection")]
struct Cli {
    /// Directory tree of entity JSON files
    #[arg(short, long)]
    source: PathBuf,

    /// Only validate entities in this domain (e.g. "greek")
    #[arg(long)]
    domain: Option<String>,

    /// Report output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (defaults to mythlink.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail (exit 1) when broken links exceed this share of all links
    #[arg(long)]
    fail_threshold: Option<f64>,

    /// Abort validation after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Cap the number of suggestions in the report
    #[arg(long)]
    max_suggestions: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Markdown,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = ValidatorConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(threshold) = cli.fail_threshold {
        config.report.fail_threshold = threshold;
    }
    if let Some(max) = cli.max_suggestions {
        config.suggestions.max = max;
    }

    let mut budget = RunBudget::unbounded();
    if let Some(secs) = cli.timeout_secs {
        budget = budget.with_timeout(Duration::from_secs(secs));
    }

    let report = run_directory(&cli.source, &config, cli.domain.as_deref(), &budget)
        .with_context(|| format!("validation failed for {}", cli.source.display()))?;

    let rendered = match cli.format {
        Format::Json => report.to_json()?,
        Format::Markdown => report.to_markdown(),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    let ratio = report.summary.broken_ratio;
    if ratio > config.report.fail_threshold {
        eprintln!(
            "broken-link ratio {:.1}% exceeds threshold {:.1}%",
            ratio * 100.0,
            config.report.fail_threshold * 100.0
        );
        return Ok(1);
    }

    Ok(0)
}
