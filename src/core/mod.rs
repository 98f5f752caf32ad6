//! Core batch logic.
//!
//! This module contains:
//! - Extractor: video id extraction from input lines
//! - Input: input file reading and line classification
//! - Scanner: existing deck metadata discovery
//! - Orchestrator: main batch engine

pub mod extractor;
pub mod input;
pub mod orchestrator;
pub mod scanner;

// Re-export commonly used types
pub use extractor::{classify_line, extract, LineKind};
pub use input::InputBatch;
pub use orchestrator::{BatchError, BatchOptions, FailurePolicy, Orchestrator};
pub use scanner::{
    scan_known_ids, KnownIdSet, ScanError, ScanResult, ScanWarning, ScanWarningKind,
    DECK_METADATA_FILE,
};
