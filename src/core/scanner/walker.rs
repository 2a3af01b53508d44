//! Directory walking implementation using walkdir.

use super::{filter::EntryFilter, MediaFile, ScanIssue, ScanResult, SourceScanner};
use crate::error::ConfigurationError;
use crate::events::{null_sender, Event, EventSender, RunEvent};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Sort entries by file name within each directory.
    /// Off by default: files are processed in directory-listing order.
    pub sort_entries: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            sort_entries: false,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    fn walk(&self, root: &Path, exclude: Option<&Path>) -> ScanResult {
        let filter = EntryFilter::new()
            .with_hidden(self.config.include_hidden)
            .with_excluded(exclude.map(Path::to_path_buf));

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        if self.config.sort_entries {
            walker = walker.sort_by_file_name();
        }

        let mut files = Vec::new();
        let mut issues = Vec::new();

        for entry_result in walker
            .into_iter()
            .filter_entry(|e| filter.should_visit(e.path(), root))
        {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                    issues.push(ScanIssue {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();

            // Resolves symlinks so a link to a regular file is organized like one
            match fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => {
                    files.push(MediaFile {
                        path: path.to_path_buf(),
                        extension: path
                            .extension()
                            .map(|e| e.to_string_lossy().to_lowercase())
                            .unwrap_or_default(),
                        size: metadata.len(),
                        modified: metadata.modified().ok(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    issues.push(ScanIssue {
                        path: path.to_path_buf(),
                        message: format!("Failed to read file metadata: {}", e),
                    });
                }
            }
        }

        ScanResult { files, issues }
    }
}

impl SourceScanner for WalkDirScanner {
    fn scan(&self, root: &Path, exclude: Option<&Path>) -> Result<ScanResult, ConfigurationError> {
        self.scan_with_events(root, exclude, &null_sender())
    }

    fn scan_with_events(
        &self,
        root: &Path,
        exclude: Option<&Path>,
        events: &EventSender,
    ) -> Result<ScanResult, ConfigurationError> {
        if !root.exists() {
            return Err(ConfigurationError::SourceNotFound {
                path: root.to_path_buf(),
            });
        }

        if !root.is_dir() {
            return Err(ConfigurationError::SourceNotDirectory {
                path: root.to_path_buf(),
            });
        }

        let result = self.walk(root, exclude);

        events.send(Event::Run(RunEvent::FilesDiscovered {
            total: result.files.len(),
        }));

        Ok(result)
    }
}
