//! # Error Module
//!
//! User-friendly error types for the media sorter.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Fatal vs per-file** - only [`ConfigurationError`] stops a run; the
//!   rest are caught per file and end up in the run report
//! - **Best-effort is explicit** - [`MetadataError`] is logged, never routed

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConversionError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Failed to load settings from {path}: {reason}")]
    Settings { path: PathBuf, reason: String },
}

/// Problems with the run's source or destination roots.
///
/// These abort the run before any file is processed.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Source path is not a directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    #[error("Destination is the source directory itself: {path}")]
    DestinationIsSource { path: PathBuf },

    #[error("Destination path exists but is not a directory: {path}")]
    DestinationNotDirectory { path: PathBuf },

    #[error("Failed to create destination directory {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create work directory in {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// Errors that occur while decoding a convertible image and re-encoding it as JPEG
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("No decoder available for {format} file {path}")]
    Unsupported { path: PathBuf, format: String },

    #[error("Failed to encode converted image for {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("I/O error while converting {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur during image hashing
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    /// `path` is unknown when an in-memory bitmap is fingerprinted
    #[error("Image is empty or corrupted{}", path_suffix(.path))]
    EmptyImage { path: Option<PathBuf> },

    #[error("Hash computation failed: {0}")]
    ComputationFailed(String),

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(": {}", p.display()))
        .unwrap_or_default()
}

/// Errors that occur while copying a file into the destination tree
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer of {path} was cancelled")]
    Cancelled { path: PathBuf },
}

/// Failure to produce a normalized bitmap.
///
/// Convertible images fail with [`ConversionError`]; native images that
/// can't be decoded fail with [`HashError`], since they were only decoded
/// to be fingerprinted.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Best-effort metadata failures. Logged, never fatal.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata from {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Capture timestamp {value:?} in {path} is not in EXIF format")]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("EXIF block from {path} is too large to embed ({size} bytes)")]
    TooLarge { path: PathBuf, size: usize },

    #[error("{path} is not a JPEG file, EXIF can't be embedded")]
    NotJpeg { path: PathBuf },

    #[error("Failed to write metadata to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrganizerError>;
