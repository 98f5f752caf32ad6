//! Existing deck metadata scanner.
//!
//! Walks a decks tree with an explicit worklist and collects the `id` field of
//! every `.metadata.json` it finds. Per-file problems become warnings; only a
//! missing root is an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::domain::VideoId;

/// File name of a deck's metadata descriptor
pub const DECK_METADATA_FILE: &str = ".metadata.json";

/// Ids already represented by deck metadata
pub type KnownIdSet = HashSet<VideoId>;

/// Errors that abort a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Decks directory does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Decks path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What was wrong with one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarningKind {
    /// File or directory could not be read
    Unreadable(String),

    /// Content is not valid JSON
    MalformedJson(String),

    /// `id` missing, not a string, or empty
    MissingId,

    /// `id` is a string but not a valid video id
    InvalidId(String),
}

/// A non-fatal problem found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: ScanWarningKind,
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ScanWarningKind::Unreadable(e) => {
                write!(f, "Failed to read {}: {}", self.path.display(), e)
            }
            ScanWarningKind::MalformedJson(e) => {
                write!(f, "Invalid JSON in {}: {}", self.path.display(), e)
            }
            ScanWarningKind::MissingId => {
                write!(f, "Missing or invalid video id in {}", self.path.display())
            }
            ScanWarningKind::InvalidId(id) => {
                write!(f, "Malformed video id {:?} in {}", id, self.path.display())
            }
        }
    }
}

/// Result of scanning a decks tree
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub known: KnownIdSet,
    pub warnings: Vec<ScanWarning>,
    /// Number of `.metadata.json` files visited
    pub files_read: usize,
}

impl ScanResult {
    fn warn(&mut self, path: PathBuf, kind: ScanWarningKind) {
        let warning = ScanWarning { path, kind };
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Collect every video id recorded in `.metadata.json` files under `root`
///
/// Symlinks are not followed, so every reachable regular file is visited once.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn scan_known_ids(root: &Path) -> Result<ScanResult, ScanError> {
    let meta = match fs::metadata(root).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut result = ScanResult::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                result.warn(dir, ScanWarningKind::Unreadable(e.to_string()));
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    result.warn(dir.clone(), ScanWarningKind::Unreadable(e.to_string()));
                    break;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    result.warn(path, ScanWarningKind::Unreadable(e.to_string()));
                    continue;
                }
            };

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && entry.file_name() == DECK_METADATA_FILE {
                result.files_read += 1;
                read_deck_metadata(path, &mut result).await;
            }
        }
    }

    debug!(
        known = result.known.len(),
        files = result.files_read,
        warnings = result.warnings.len(),
        "Scan complete"
    );

    Ok(result)
}

async fn read_deck_metadata(path: PathBuf, result: &mut ScanResult) {
    let content = match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) => {
            result.warn(path, ScanWarningKind::Unreadable(e.to_string()));
            return;
        }
    };

    let json: Value = match serde_json::from_str(&content) {
        Ok(json) => json,
        Err(e) => {
            result.warn(path, ScanWarningKind::MalformedJson(e.to_string()));
            return;
        }
    };

    match json.get("id").and_then(Value::as_str) {
        Some(raw) if !raw.is_empty() => match VideoId::parse(raw) {
            Ok(id) => {
                debug!(%id, path = %path.display(), "Known video");
                result.known.insert(id);
            }
            Err(_) => result.warn(path, ScanWarningKind::InvalidId(raw.to_string())),
        },
        _ => result.warn(path, ScanWarningKind::MissingId),
    }
}
