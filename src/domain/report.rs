//! Batch report: per-video outcomes of a single run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::video::VideoId;

/// Which variant of the batch produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Fetch every id from the input file
    Fetch,

    /// Fetch only ids not already present in the decks tree
    Sync,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::Fetch => write!(f, "fetch"),
            BatchMode::Sync => write!(f, "sync"),
        }
    }
}

/// Why an id was not fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A deck already carries metadata for this id
    AlreadyKnown,

    /// The id appeared earlier in the input (only with dedupe enabled)
    ///
    /// Ids already known from the decks tree are always `AlreadyKnown`.
    Duplicate,
}

/// Result of processing one id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Metadata fetched and written
    Saved { id: VideoId, path: PathBuf },

    /// Not fetched
    Skipped { id: VideoId, reason: SkipReason },

    /// Fetch or write failed
    Failed { id: VideoId, error: String },
}

impl ItemOutcome {
    /// Id this outcome refers to
    pub fn id(&self) -> &VideoId {
        match self {
            ItemOutcome::Saved { id, .. }
            | ItemOutcome::Skipped { id, .. }
            | ItemOutcome::Failed { id, .. } => id,
        }
    }
}

/// A non-blank input line that held no video id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidLine {
    /// 1-based line number in the input file
    pub line: usize,

    /// Trimmed line content
    pub content: String,
}

/// Summary of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub mode: BatchMode,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Lines skipped because no id could be extracted
    #[serde(default)]
    pub invalid_lines: Vec<InvalidLine>,

    /// Deck metadata files that could not contribute an id
    #[serde(default)]
    pub scan_warnings: Vec<String>,

    /// One entry per extracted id, in input order
    #[serde(default)]
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Start a new, empty report
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            finished_at: None,
            invalid_lines: Vec::new(),
            scan_warnings: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Saved { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    /// True when no id failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    /// Persist the report as pretty JSON
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> VideoId {
        VideoId::parse(s).unwrap()
    }

    #[test]
    fn test_report_counters() {
        let mut report = BatchReport::new(BatchMode::Sync);
        report.record(ItemOutcome::Saved {
            id: id("AAAAAAAAAAA"),
            path: PathBuf::from("out/AAAAAAAAAAA.json"),
        });
        report.record(ItemOutcome::Skipped {
            id: id("BBBBBBBBBBB"),
            reason: SkipReason::AlreadyKnown,
        });
        report.record(ItemOutcome::Failed {
            id: id("CCCCCCCCCCC"),
            error: "Video not found: CCCCCCCCCCC".to_string(),
        });

        assert_eq!(report.saved(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.outcomes[2].id().as_str(), "CCCCCCCCCCC");
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let outcome = ItemOutcome::Skipped {
            id: id("BBBBBBBBBBB"),
            reason: SkipReason::Duplicate,
        };

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["reason"], "duplicate");
        assert_eq!(value["id"], "BBBBBBBBBBB");
    }

    #[tokio::test]
    async fn test_report_save() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("reports").join("run.json");

        let mut report = BatchReport::new(BatchMode::Fetch);
        report.finish();
        report.save(&path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: BatchReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.mode, BatchMode::Fetch);
        assert!(parsed.finished_at.is_some());
        assert!(parsed.is_success());
    }
}
