//! Types for the organize module.

use crate::core::classifier::ConvertibleFormat;
use crate::core::scanner::ScanConfig;
use crate::core::transfer::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use crate::core::destination::FolderStructure;

/// Configuration for an organize run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Unsorted tree to read from (never modified)
    pub source: PathBuf,
    /// Root of the sorted layout
    pub destination: PathBuf,
    pub structure: FolderStructure,
    pub scan: ScanConfig,
    /// Transfer chunk size in bytes
    pub chunk_size: usize,
    /// Where converted artifacts are staged; system temp dir when unset
    pub work_dir: Option<PathBuf>,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            structure: FolderStructure::default(),
            scan: ScanConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            work_dir: None,
        }
    }
}

/// Pipeline step at which a file failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The entry could not be read during the walk
    Scan,
    /// RAW/HEIC/TIFF conversion
    Convert,
    /// Decoding or fingerprinting
    Hash,
    /// Destination folder or name
    Resolve,
    /// Copying into the destination
    Transfer,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Scan => write!(f, "scan"),
            FailureStage::Convert => write!(f, "convert"),
            FailureStage::Hash => write!(f, "hash"),
            FailureStage::Resolve => write!(f, "resolve"),
            FailureStage::Transfer => write!(f, "transfer"),
        }
    }
}

/// What happened to the original of a failed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quarantine {
    /// Copied into `Errors/` at this path
    Copied(PathBuf),
    /// Copying into `Errors/` failed too
    Failed(String),
    /// Not attempted (walk issues have nothing to copy)
    NotAttempted,
}

/// A per-file failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub message: String,
    pub quarantine: Quarantine,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} failed): {}",
            self.path.display(),
            self.stage,
            self.message
        )?;
        match &self.quarantine {
            Quarantine::Copied(path) => write!(f, " -> copied to {}", path.display()),
            Quarantine::Failed(reason) => write!(f, " -> could not copy to Errors: {}", reason),
            Quarantine::NotAttempted => Ok(()),
        }
    }
}

/// Counters and logs accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub photos_copied: usize,
    pub videos_copied: usize,
    pub suspect_duplicates: usize,
    pub manually_checked: usize,
    pub files_moved_to_errors: usize,
    /// Successful conversions by original format
    pub conversions: BTreeMap<ConvertibleFormat, usize>,
    /// Per-file failures, in processing order
    pub errors: Vec<FileFailure>,
    /// Best-effort steps that failed, in processing order
    pub warnings: Vec<String>,
}

impl RunStatistics {
    pub fn total_conversions(&self) -> usize {
        self.conversions.values().sum()
    }

    pub(crate) fn record_conversion(&mut self, format: ConvertibleFormat) {
        *self.conversions.entry(format).or_insert(0) += 1;
    }
}

/// Result of an organize run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: uuid::Uuid,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub structure: FolderStructure,
    pub stats: RunStatistics,
    /// Files discovered by the walk
    pub total_files: usize,
    /// Files that went through the pipeline (less than total when cancelled)
    pub processed_files: usize,
    pub cancelled: bool,
    pub started_at: chrono::DateTime<chrono::Local>,
    pub duration_ms: u64,
    /// `organize_report.txt`, if it could be written
    pub report_path: Option<PathBuf>,
}
