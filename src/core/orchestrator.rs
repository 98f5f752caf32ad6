//! Main orchestrator for batch execution.
//!
//! Reads the input file, optionally reconciles against existing deck
//! metadata, fetches each remaining video in order and writes one JSON file
//! per success.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::adapters::MetadataSource;
use crate::domain::{BatchMode, BatchReport, ItemOutcome, SkipReason, VideoId};

use super::input::InputBatch;
use super::scanner::{scan_known_ids, KnownIdSet};

/// What to do when a single video fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and continue with the next video
    #[default]
    Isolate,

    /// Stop the batch at the first failure
    Abort,
}

/// Batch-level failures
#[derive(Debug, Error)]
pub enum BatchError {
    /// Fail-fast batch stopped; files written before the failure remain
    #[error("Batch aborted at video {id}: {error}")]
    Aborted {
        id: VideoId,
        error: String,
        report: Box<BatchReport>,
    },
}

/// Inputs for one batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: BatchMode,

    /// Newline-delimited file of video URLs
    pub input: PathBuf,

    /// Where `<id>.json` files are written
    pub output_dir: PathBuf,

    /// Decks tree to reconcile against (required for `BatchMode::Sync`)
    pub decks_dir: Option<PathBuf>,

    pub policy: FailurePolicy,

    /// Drop repeated ids from the input
    pub dedupe: bool,
}

impl BatchOptions {
    /// Fetch every id in `input` into `output_dir`
    pub fn fetch(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: BatchMode::Fetch,
            input: input.into(),
            output_dir: output_dir.into(),
            decks_dir: None,
            policy: FailurePolicy::default(),
            dedupe: false,
        }
    }

    /// Fetch only ids missing from `decks_dir`
    pub fn sync(
        input: impl Into<PathBuf>,
        decks_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode: BatchMode::Sync,
            input: input.into(),
            output_dir: output_dir.into(),
            decks_dir: Some(decks_dir.into()),
            policy: FailurePolicy::default(),
            dedupe: false,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }
}

/// Main batch orchestrator
pub struct Orchestrator<S> {
    source: S,
}

impl<S: MetadataSource> Orchestrator<S> {
    /// Create an orchestrator around a metadata source
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one batch
    #[instrument(skip(self, options), fields(mode = %options.mode, source = self.source.name()))]
    pub async fn run(&self, options: &BatchOptions) -> Result<BatchReport> {
        let mut report = BatchReport::new(options.mode);

        let input = InputBatch::read(&options.input).await?;
        for invalid in &input.invalid {
            warn!(line = invalid.line, "Skipping invalid URL: {}", invalid.content);
        }
        info!(
            ids = input.ids.len(),
            invalid = input.invalid.len(),
            "Input read"
        );
        report.invalid_lines = input.invalid;

        let known = match options.mode {
            BatchMode::Fetch => KnownIdSet::new(),
            BatchMode::Sync => {
                let decks = options
                    .decks_dir
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("Sync requires a decks directory"))?;
                let scan = scan_known_ids(decks).await?;
                info!(
                    known = scan.known.len(),
                    files = scan.files_read,
                    "Decks scanned"
                );
                report.scan_warnings = scan.warnings.iter().map(|w| w.to_string()).collect();
                scan.known
            }
        };

        let mut seen: HashSet<VideoId> = HashSet::new();

        for id in input.ids {
            if known.contains(&id) {
                info!(%id, "Already known, skipping");
                report.record(ItemOutcome::Skipped {
                    id,
                    reason: SkipReason::AlreadyKnown,
                });
                continue;
            }

            if options.dedupe && !seen.insert(id.clone()) {
                info!(%id, "Skipping duplicate");
                report.record(ItemOutcome::Skipped {
                    id,
                    reason: SkipReason::Duplicate,
                });
                continue;
            }

            let outcome = self.process(&id, options).await;
            let failure = match &outcome {
                ItemOutcome::Failed { error, .. } => Some(error.clone()),
                _ => None,
            };
            report.record(outcome);

            if let (Some(error), FailurePolicy::Abort) = (failure, options.policy) {
                report.finish();
                return Err(BatchError::Aborted {
                    id,
                    error,
                    report: Box::new(report),
                }
                .into());
            }
        }

        report.finish();
        info!(
            saved = report.saved(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Batch complete"
        );

        Ok(report)
    }

    /// Fetch and persist one video
    async fn process(&self, id: &VideoId, options: &BatchOptions) -> ItemOutcome {
        let metadata = match self.source.fetch(id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(%id, error = %e, "Fetch failed");
                return ItemOutcome::Failed {
                    id: id.clone(),
                    error: e.to_string(),
                };
            }
        };

        match metadata.save(&options.output_dir).await {
            Ok(path) => {
                info!(%id, path = %path.display(), "Saved");
                ItemOutcome::Saved {
                    id: id.clone(),
                    path,
                }
            }
            Err(e) => {
                error!(%id, error = %e, "Write failed");
                ItemOutcome::Failed {
                    id: id.clone(),
                    error: format!("{:#}", e),
                }
            }
        }
    }
}
