//! # Transfer Module
//!
//! Chunked copy of a single file into the destination tree.
//!
//! Content is copied in bounded chunks with a progress event after each
//! one. Then, for images, the EXIF block is carried over (best-effort),
//! and finally permissions and access/modification times are copied.
//! A failed or cancelled copy never leaves a partial destination behind.

use crate::core::cancel::CancellationToken;
use crate::core::classifier::MediaKind;
use crate::core::metadata::{copy_metadata, MetadataStep};
use crate::error::TransferError;
use crate::events::{Event, EventSender, FileEvent, FileProgress, FileStatus};
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Default chunk size: 1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub bytes_copied: u64,
    /// EXIF carry-over; `None` for non-images
    pub metadata: Option<MetadataStep>,
}

/// Copies files chunk by chunk, reporting progress
#[derive(Debug, Clone)]
pub struct TransferEngine {
    chunk_size: usize,
    cancel: CancellationToken,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl TransferEngine {
    /// Engine with the given chunk size (0 is treated as 1)
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Copy `source` to `destination`
    pub fn transfer(
        &self,
        source: &Path,
        destination: &Path,
        kind: MediaKind,
        events: &EventSender,
    ) -> Result<TransferOutcome, TransferError> {
        self.transfer_with_origin(source, source, destination, kind, events)
    }

    /// Copy the bytes of `content` to `destination`, taking EXIF,
    /// permissions and times from `origin`.
    ///
    /// Used for converted images: the content is the JPEG artifact, the
    /// origin is the original RAW/HEIC/TIFF file.
    #[instrument(skip(self, events), fields(content = %content.display(), destination = %destination.display()))]
    pub fn transfer_with_origin(
        &self,
        content: &Path,
        origin: &Path,
        destination: &Path,
        kind: MediaKind,
        events: &EventSender,
    ) -> Result<TransferOutcome, TransferError> {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let bytes_copied = match self.copy_content(content, destination, &name, events) {
            Ok(bytes) => bytes,
            Err(e) => {
                if !matches!(e, TransferError::Cancelled { .. }) {
                    send_progress(events, &name, 0.0, FileStatus::Error);
                }
                return Err(e);
            }
        };

        let metadata = kind
            .is_image()
            .then(|| MetadataStep::from_result(copy_metadata(origin, destination)));

        if let Err(e) = copy_attributes(origin, destination) {
            discard_partial(destination);
            send_progress(events, &name, 0.0, FileStatus::Error);
            return Err(e);
        }

        debug!(bytes_copied, ?metadata, "transfer complete");
        Ok(TransferOutcome {
            bytes_copied,
            metadata,
        })
    }

    fn copy_content(
        &self,
        source: &Path,
        destination: &Path,
        name: &str,
        events: &EventSender,
    ) -> Result<u64, TransferError> {
        let reader = File::open(source).map_err(|e| TransferError::Open {
            path: source.to_path_buf(),
            source: e,
        })?;
        let total = reader
            .metadata()
            .map_err(|e| TransferError::Read {
                path: source.to_path_buf(),
                source: e,
            })?
            .len();

        // create_new: an existing file is never truncated or overwritten
        let writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .map_err(|e| TransferError::Write {
                path: destination.to_path_buf(),
                source: e,
            })?;

        if total == 0 {
            send_progress(events, name, 100.0, FileStatus::Copying);
        }

        let result = self.copy_chunks(reader, writer, total, source, destination, name, events);
        if result.is_err() {
            discard_partial(destination);
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_chunks(
        &self,
        mut reader: File,
        mut writer: File,
        total: u64,
        source: &Path,
        destination: &Path,
        name: &str,
        events: &EventSender,
    ) -> Result<u64, TransferError> {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut copied = 0u64;
        let mut last_percent = 0.0f64;

        loop {
            if self.cancel.is_cancelled() {
                return Err(TransferError::Cancelled {
                    path: source.to_path_buf(),
                });
            }

            let read = reader.read(&mut buffer).map_err(|e| TransferError::Read {
                path: source.to_path_buf(),
                source: e,
            })?;
            if read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..read])
                .map_err(|e| TransferError::Write {
                    path: destination.to_path_buf(),
                    source: e,
                })?;
            copied += read as u64;

            // Clamped so a file that grows mid-copy never reports past 100
            let percent = (copied as f64 * 100.0 / total.max(1) as f64).clamp(last_percent, 100.0);
            send_progress(events, name, percent, FileStatus::Copying);
            last_percent = percent;
        }

        writer.flush().map_err(|e| TransferError::Write {
            path: destination.to_path_buf(),
            source: e,
        })?;

        if total > 0 && last_percent < 100.0 {
            send_progress(events, name, 100.0, FileStatus::Copying);
        }

        Ok(copied)
    }
}

/// Copy access/modification times, then permissions (which may make the
/// destination read-only)
fn copy_attributes(origin: &Path, destination: &Path) -> Result<(), TransferError> {
    let write_error = |e: std::io::Error| TransferError::Write {
        path: destination.to_path_buf(),
        source: e,
    };

    let metadata = fs::metadata(origin).map_err(|e| TransferError::Read {
        path: origin.to_path_buf(),
        source: e,
    })?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }

    OpenOptions::new()
        .write(true)
        .open(destination)
        .and_then(|file| file.set_times(times))
        .map_err(write_error)?;

    fs::set_permissions(destination, metadata.permissions()).map_err(write_error)
}

fn discard_partial(destination: &Path) {
    if destination.exists() {
        if let Err(e) = fs::remove_file(destination) {
            warn!(path = %destination.display(), error = %e, "Failed to remove partial file");
        }
    }
}

fn send_progress(events: &EventSender, name: &str, percent: f64, status: FileStatus) {
    events.send(Event::File(FileEvent::Progress(FileProgress {
        percent,
        name: name.to_string(),
        status,
    })));
}
