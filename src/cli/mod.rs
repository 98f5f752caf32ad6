//! Command-line interface for ytmeta.
//!
//! Provides commands for fetching video metadata, reconciling against a
//! decks tree, and inspecting inputs and configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::adapters::YouTubeClient;
use crate::config::{ResolvedConfig, API_KEY_ENV};
use crate::core::{
    scan_known_ids, BatchError, BatchOptions, FailurePolicy, InputBatch, Orchestrator,
};
use crate::domain::BatchReport;

/// ytmeta - YouTube metadata batch fetcher
#[derive(Parser, Debug)]
#[command(name = "ytmeta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YouTube Data API key (falls back to $YOUTUBE_API_KEY, then the credential file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch metadata for every video listed in the input file
    Fetch {
        /// Input file with one URL per line
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for <id>.json files
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Fetch metadata only for videos not already present in the decks tree
    Sync {
        /// Input file with one URL per line
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Decks directory to scan for .metadata.json files
        #[arg(short, long)]
        decks: Option<PathBuf>,

        /// Output directory (default: <decks>/processing)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// List video ids already recorded in a decks tree
    Scan {
        /// Decks directory to scan
        #[arg(short, long)]
        decks: Option<PathBuf>,
    },

    /// Print the video ids found in the input file without fetching
    Extract {
        /// Input file with one URL per line
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Options shared by batch commands
#[derive(Args, Debug, Clone, Default)]
pub struct BatchArgs {
    /// Stop at the first video that fails instead of continuing
    #[arg(long)]
    pub fail_fast: bool,

    /// Fetch each video id at most once per run
    #[arg(long)]
    pub dedupe: bool,

    /// Write a JSON report of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl BatchArgs {
    fn apply(&self, options: BatchOptions) -> BatchOptions {
        let policy = if self.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Isolate
        };
        options.with_policy(policy).with_dedupe(self.dedupe)
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = ResolvedConfig::load()?;

        match self.command {
            Commands::Fetch {
                input,
                output,
                batch,
            } => {
                let options = batch.apply(BatchOptions::fetch(
                    input.unwrap_or_else(|| config.input.clone()),
                    output.unwrap_or_else(|| config.output.clone()),
                ));
                run_batch(&config, self.api_key, options, batch.report).await
            }
            Commands::Sync {
                input,
                decks,
                output,
                batch,
            } => {
                let output = match (&output, &decks) {
                    (Some(out), _) => out.clone(),
                    (None, Some(decks)) => decks.join(crate::config::PROCESSING_SUBDIR),
                    (None, None) => config.processing.clone(),
                };
                let options = batch.apply(BatchOptions::sync(
                    input.unwrap_or_else(|| config.input.clone()),
                    decks.unwrap_or_else(|| config.decks.clone()),
                    output,
                ));
                run_batch(&config, self.api_key, options, batch.report).await
            }
            Commands::Scan { decks } => {
                scan_decks(&decks.unwrap_or_else(|| config.decks.clone())).await
            }
            Commands::Extract { input } => {
                extract_ids(&input.unwrap_or_else(|| config.input.clone())).await
            }
            Commands::Config => show_config(&config, self.api_key),
        }
    }
}

/// Resolve the credential, run the batch and print its outcome
async fn run_batch(
    config: &ResolvedConfig,
    api_key: Option<String>,
    options: BatchOptions,
    report_path: Option<PathBuf>,
) -> Result<()> {
    // Credential is resolved before any input is read
    let credential = config.resolve_credential(api_key)?;
    let client = YouTubeClient::new(config.fetcher_config(&credential))
        .context("Failed to build HTTP client")?;

    eprintln!(
        "📥 {} {} → {}",
        options.mode,
        options.input.display(),
        options.output_dir.display()
    );

    let orchestrator = Orchestrator::new(client);
    let report = match orchestrator.run(&options).await {
        Ok(report) => report,
        Err(err) => {
            if let Some(BatchError::Aborted { report, .. }) = err.downcast_ref::<BatchError>() {
                print_report(report);
                save_report(report, report_path.as_deref()).await?;
            }
            return Err(err);
        }
    };

    print_report(&report);
    save_report(&report, report_path.as_deref()).await?;

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

async fn save_report(report: &BatchReport, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        report.save(path).await?;
        eprintln!("📝 Report written to {}", path.display());
    }
    Ok(())
}

/// Print the batch summary to stderr
///
/// Per-item events are already emitted through `tracing` while the batch runs.
fn print_report(report: &BatchReport) {
    for line in summary_lines(report) {
        eprintln!("{}", line);
    }
}

fn summary_lines(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!("\n[{} complete]", report.mode)];
    lines.push(format!("✅ {} saved", report.saved()));
    lines.push(format!("⏭️ {} skipped", report.skipped()));
    if report.failed() > 0 {
        lines.push(format!("❌ {} failed", report.failed()));
    }
    if !report.invalid_lines.is_empty() {
        lines.push(format!("⚠️ {} invalid lines", report.invalid_lines.len()));
    }
    if !report.scan_warnings.is_empty() {
        lines.push(format!("⚠️ {} scan warnings", report.scan_warnings.len()));
    }
    lines
}

/// List known ids in a decks tree
async fn scan_decks(decks: &Path) -> Result<()> {
    let result = scan_known_ids(decks).await?;

    let mut ids: Vec<_> = result.known.iter().collect();
    ids.sort();
    for id in ids {
        println!("{}", id);
    }

    eprintln!(
        "\n[{} known ids from {} metadata files, {} warnings]",
        result.known.len(),
        result.files_read,
        result.warnings.len()
    );

    Ok(())
}

/// Print ids extracted from the input file
async fn extract_ids(input: &Path) -> Result<()> {
    let batch = InputBatch::read(input).await?;

    for id in &batch.ids {
        println!("{}", id);
    }
    for invalid in &batch.invalid {
        eprintln!("⚠️ Skipping invalid URL (line {}): {}", invalid.line, invalid.content);
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(config: &ResolvedConfig, api_key: Option<String>) -> Result<()> {
    println!("ytmeta configuration");
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Input:       {}", config.input.display());
    println!("  Output:      {}", config.output.display());
    println!("  Decks:       {}", config.decks.display());
    println!("  Processing:  {}", config.processing.display());
    println!();
    println!("API:");
    println!("  Base URL:    {}", config.api_base);
    println!("  Timeout:     {}s", config.timeout_seconds);
    match config.resolve_credential(api_key) {
        Ok(credential) => println!("  Key:         set (from {})", credential.source),
        Err(_) => println!("  Key:         missing (set {} or a credential file)", API_KEY_ENV),
    }
    println!("  Key files:");
    for path in &config.credentials_files {
        println!("    {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_flags() {
        let cli = Cli::parse_from([
            "ytmeta",
            "fetch",
            "--input",
            "list.txt",
            "--fail-fast",
            "--report",
            "run.json",
        ]);

        match cli.command {
            Commands::Fetch {
                input,
                output,
                batch,
            } => {
                assert_eq!(input, Some(PathBuf::from("list.txt")));
                assert!(output.is_none());
                assert!(batch.fail_fast);
                assert!(!batch.dedupe);
                assert_eq!(batch.report, Some(PathBuf::from("run.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_api_key_after_subcommand() {
        let cli = Cli::parse_from(["ytmeta", "sync", "--decks", "../decks", "--api-key", "k"]);
        assert_eq!(cli.api_key, Some("k".to_string()));
        assert!(matches!(cli.command, Commands::Sync { .. }));
    }

    #[test]
    fn test_batch_args_policy() {
        let args = BatchArgs {
            fail_fast: true,
            dedupe: true,
            report: None,
        };
        let options = args.apply(BatchOptions::fetch("in", "out"));
        assert_eq!(options.policy, FailurePolicy::Abort);
        assert!(options.dedupe);

        let options = BatchArgs::default().apply(BatchOptions::fetch("in", "out"));
        assert_eq!(options.policy, FailurePolicy::Isolate);
    }

    #[test]
    fn test_summary_does_not_repeat_logged_items() {
        use crate::domain::{BatchMode, InvalidLine, ItemOutcome, VideoId};

        let mut report = BatchReport::new(BatchMode::Sync);
        report.invalid_lines.push(InvalidLine {
            line: 2,
            content: "not a video".to_string(),
        });
        report
            .scan_warnings
            .push("Invalid JSON in decks/a/.metadata.json".to_string());
        report.record(ItemOutcome::Failed {
            id: VideoId::parse("AAAAAAAAAAA").unwrap(),
            error: "video not found".to_string(),
        });

        let lines = summary_lines(&report);
        assert!(lines.iter().all(|l| !l.contains("not a video")));
        assert!(lines.iter().all(|l| !l.contains("AAAAAAAAAAA")));
        assert!(lines.iter().all(|l| !l.contains("Invalid JSON")));
        assert!(lines.contains(&"❌ 1 failed".to_string()));
        assert!(lines.contains(&"⚠️ 1 invalid lines".to_string()));
        assert!(lines.contains(&"⚠️ 1 scan warnings".to_string()));
    }
}
