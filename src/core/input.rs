//! Input file reading.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use super::extractor::{classify_line, LineKind};
use crate::domain::{InvalidLine, VideoId};

/// Ids and rejected lines read from one input file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBatch {
    /// Extracted ids in input order, duplicates included
    pub ids: Vec<VideoId>,

    /// Non-blank lines without a video id
    pub invalid: Vec<InvalidLine>,
}

impl InputBatch {
    /// Classify every line of `text`
    ///
    /// Accepts `\n`, `\r\n` and bare `\r` line endings.
    pub fn parse(text: &str) -> Self {
        Self::parse_bytes(text.as_bytes())
    }

    /// Classify every line of raw file content
    ///
    /// Each line is decoded on its own, so invalid UTF-8 only affects the
    /// line it appears on.
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        let mut batch = Self::default();

        for (idx, raw) in split_lines(bytes).into_iter().enumerate() {
            let line = String::from_utf8_lossy(raw);
            match classify_line(&line) {
                LineKind::Blank => {}
                LineKind::Video(id) => batch.ids.push(id),
                LineKind::Invalid(content) => batch.invalid.push(InvalidLine {
                    line: idx + 1,
                    content,
                }),
            }
        }

        batch
    }

    /// Read and classify an input file
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;

        Ok(Self::parse_bytes(&bytes))
    }
}

fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&bytes[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&bytes[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&bytes[start..]);

    lines
}
