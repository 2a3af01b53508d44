//! # Scanner Module
//!
//! Walks the source tree once and lists every file to organize.
//!
//! Unlike a photo-only scan, nothing is filtered by extension here: every
//! regular file is a candidate, and the classifier decides what it is.
//! Hidden files are included by default so nothing silently stays behind.
//!
//! ## Example
//! ```rust,ignore
//! use media_sorter::core::scanner::{ScanConfig, SourceScanner, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/Users/me/Unsorted"), None)?;
//! ```

mod filter;
mod walker;

pub use filter::EntryFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::classifier::{classify_path, MediaKind};
use crate::error::ConfigurationError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file discovered in the source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// Lowercase extension without the dot (empty if none)
    pub extension: String,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Last modified time at discovery time, if the filesystem reports one
    pub modified: Option<SystemTime>,
}

impl MediaFile {
    /// The classification of this file
    pub fn kind(&self) -> MediaKind {
        classify_path(&self.path)
    }

    /// File name without directories, exactly as the filesystem spells it
    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }

    /// File name for display; invalid UTF-8 is replaced
    pub fn display_name(&self) -> String {
        self.file_name().to_string_lossy().into_owned()
    }
}

/// An entry that could not be read during the walk (non-fatal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Files in walk order
    pub files: Vec<MediaFile>,
    /// Entries that could not be read
    pub issues: Vec<ScanIssue>,
}

/// Trait for source scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait SourceScanner: Send + Sync {
    /// Walk `root` and list its files. `exclude` is a subtree to skip
    /// (the destination, when it lives inside the source).
    fn scan(&self, root: &Path, exclude: Option<&Path>) -> Result<ScanResult, ConfigurationError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        root: &Path,
        exclude: Option<&Path>,
        events: &EventSender,
    ) -> Result<ScanResult, ConfigurationError>;
}
