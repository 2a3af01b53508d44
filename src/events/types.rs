//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the organizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Run-level events
    Run(RunEvent),
    /// Events about the file currently being processed
    File(FileEvent),
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The run has started
    Started {
        source: PathBuf,
        destination: PathBuf,
    },
    /// The source tree has been walked
    FilesDiscovered { total: usize },
    /// Emitted after each file finishes, whatever its outcome
    OverallProgress { processed: usize, total: usize },
    /// Run completed and the report has been written
    Completed { summary: RunSummary },
    /// Run was cancelled between files or mid-transfer
    Cancelled,
    /// Run aborted before processing any file
    Error { message: String },
}

/// Events about a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FileEvent {
    /// Processing of a file has started
    Started { path: PathBuf },
    /// Sub-file progress (0-100) during conversion or copy
    Progress(FileProgress),
    /// Processing of a file has finished
    Finished { path: PathBuf, outcome: FileOutcome },
}

/// Sub-file progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProgress {
    /// Percentage of the current step (0.0 - 100.0)
    pub percent: f64,
    /// File name (without directories) the progress refers to
    pub name: String,
    /// What the worker is doing right now
    pub status: FileStatus,
}

/// Phase of the current file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Converting,
    Copying,
    Error,
    Done,
}

/// Where a file ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOutcome {
    /// Image placed in the dated tree
    Photo,
    /// Video placed under `Videos/`
    Video,
    /// Image set aside under `Suspect Duplicates/`
    SuspectDuplicate,
    /// Unrecognized file placed under `Manually Check/`
    ManualCheck,
    /// Processing failed; the original was copied to `Errors/`
    Quarantined,
    /// Processing failed and the original could not be quarantined either
    Failed,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Files discovered in the source tree
    pub total_files: usize,
    /// Files that went through the pipeline
    pub processed_files: usize,
    pub photos_copied: usize,
    pub videos_copied: usize,
    pub suspect_duplicates: usize,
    pub manually_checked: usize,
    pub moved_to_errors: usize,
    pub converted: usize,
    pub error_count: usize,
    /// Path of the persisted text report, if it could be written
    pub report_path: Option<PathBuf>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Converting => write!(f, "Converting"),
            FileStatus::Copying => write!(f, "Copying"),
            FileStatus::Error => write!(f, "Error"),
            FileStatus::Done => write!(f, "Done"),
        }
    }
}
