//! # Destination Module
//!
//! Fixed destination layout and collision-free path resolution.
//!
//! ```text
//! <destination>/
//! ├── 2021/03/IMG_0001.jpg        organized tree (year or year/month)
//! ├── Videos/2021/03/clip.mp4
//! ├── Suspect Duplicates/
//! ├── Manually Check/
//! ├── Errors/
//! └── organize_report.txt
//! ```

use crate::core::dating::DateKey;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const VIDEOS_DIR: &str = "Videos";
pub const SUSPECT_DUPLICATES_DIR: &str = "Suspect Duplicates";
pub const MANUALLY_CHECK_DIR: &str = "Manually Check";
pub const ERRORS_DIR: &str = "Errors";
pub const REPORT_FILE_NAME: &str = "organize_report.txt";

/// How the dated trees are subdivided
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FolderStructure {
    /// `2021/`
    Year,
    /// `2021/03/`
    #[default]
    YearMonth,
}

impl FolderStructure {
    /// Relative folder for a date key
    pub fn relative_dir(&self, key: &DateKey) -> PathBuf {
        match self {
            FolderStructure::Year => PathBuf::from(key.year_dir()),
            FolderStructure::YearMonth => Path::new(&key.year_dir()).join(key.month_dir()),
        }
    }
}

impl std::fmt::Display for FolderStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FolderStructure::Year => write!(f, "year"),
            FolderStructure::YearMonth => write!(f, "year/month"),
        }
    }
}

/// The fixed folder layout under a destination root
#[derive(Debug, Clone)]
pub struct DestinationLayout {
    root: PathBuf,
    structure: FolderStructure,
}

impl DestinationLayout {
    pub fn new(root: impl Into<PathBuf>, structure: FolderStructure) -> Self {
        Self {
            root: root.into(),
            structure,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder for a photo with this date key
    pub fn photo_dir(&self, key: &DateKey) -> PathBuf {
        self.root.join(self.structure.relative_dir(key))
    }

    /// Folder for a video with this date key
    pub fn video_dir(&self, key: &DateKey) -> PathBuf {
        self.root
            .join(VIDEOS_DIR)
            .join(self.structure.relative_dir(key))
    }

    pub fn suspect_duplicates_dir(&self) -> PathBuf {
        self.root.join(SUSPECT_DUPLICATES_DIR)
    }

    pub fn manually_check_dir(&self) -> PathBuf {
        self.root.join(MANUALLY_CHECK_DIR)
    }

    pub fn errors_dir(&self) -> PathBuf {
        self.root.join(ERRORS_DIR)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE_NAME)
    }

    /// Create the root and the special folders.
    ///
    /// Fails if the root exists as something other than a directory.
    pub fn prepare(&self) -> Result<(), ConfigurationError> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(ConfigurationError::DestinationNotDirectory {
                path: self.root.clone(),
            });
        }

        let dirs = [
            self.root.clone(),
            self.root.join(VIDEOS_DIR),
            self.suspect_duplicates_dir(),
            self.manually_check_dir(),
            self.errors_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)
                .map_err(|e| ConfigurationError::CreateDestination { path: dir, source: e })?;
        }

        Ok(())
    }
}

/// Collision-free path for `file_name` inside `target_dir`.
///
/// Creates `target_dir` if needed. When the name is taken, tries
/// `stem_1.ext`, `stem_2.ext`, ... and returns the first free one.
/// Names are kept as raw OS strings, so non-UTF-8 names survive unchanged.
pub fn resolve(target_dir: &Path, file_name: &OsStr) -> io::Result<PathBuf> {
    fs::create_dir_all(target_dir)?;

    let candidate = target_dir.join(file_name);
    if !is_taken(&candidate) {
        return Ok(candidate);
    }

    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let ext = name.extension();

    let mut counter = 1usize;
    loop {
        let mut new_name = OsString::from(stem);
        new_name.push(format!("_{}", counter));
        if let Some(ext) = ext {
            new_name.push(".");
            new_name.push(ext);
        }
        let path = target_dir.join(new_name);
        if !is_taken(&path) {
            return Ok(path);
        }
        counter += 1;
    }
}

/// Any directory entry counts, including a dangling symlink
fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// `IMG_0001.CR2` → `IMG_0001.jpg`
pub fn converted_file_name(source: &Path) -> OsString {
    let mut name = source
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from("converted"));
    name.push(".jpg");
    name
}
