//! Video identifiers and the metadata records written to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

/// Length of a YouTube video identifier
pub const VIDEO_ID_LEN: usize = 11;

/// Rejected video identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVideoId {
    #[error("Video ID must be 11 characters, got {0}")]
    Length(usize),

    #[error("Video ID contains invalid character {0:?}")]
    Character(char),
}

/// An 11-character YouTube video identifier (`[a-zA-Z0-9_-]{11}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate and wrap a raw identifier
    pub fn parse(raw: &str) -> Result<Self, InvalidVideoId> {
        let len = raw.chars().count();
        if len != VIDEO_ID_LEN {
            return Err(InvalidVideoId::Length(len));
        }

        if let Some(c) = raw.chars().find(|c| !is_id_char(*c)) {
            return Err(InvalidVideoId::Character(c));
        }

        Ok(Self(raw.to_string()))
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the metadata record for this video (`<id>.json`)
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = InvalidVideoId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Title and description of a single video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video identifier
    pub id: VideoId,

    /// Video title
    pub title: String,

    /// Video description
    pub description: String,
}

impl VideoMetadata {
    /// Create a new metadata record
    pub fn new(id: VideoId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Path of this record inside `dir`
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.id.file_name())
    }

    /// Write the record as pretty JSON to `<dir>/<id>.json`, replacing any existing file
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let path = self.path_in(dir);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write metadata: {}", path.display()))?;

        Ok(path)
    }

    /// Load a record previously written by [`VideoMetadata::save`]
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata JSON: {}", path.display()))
    }
}
