//! # Normalizer Module
//!
//! Brings every image to a standard bitmap before fingerprinting.
//!
//! - Native images (JPEG, PNG) are decoded as-is, nothing is written.
//! - Convertible images (CR2, RAW, TIFF, HEIC) are decoded by their
//!   [`FormatDecoder`], re-encoded as a quality-95 JPEG artifact in the
//!   work directory, and get the source's EXIF block copied over.
//!
//! The artifact is a [`NamedTempFile`]; it is removed by
//! [`NormalizedImage::cleanup`] or, failing that, when it is dropped.

mod decoders;
mod raw;

pub use decoders::{DecoderSet, FormatDecoder, HeicDecoder, TiffDecoder};
pub use raw::RawDecoder;

use crate::core::classifier::{ConvertibleFormat, MediaKind};
use crate::core::hasher::fast_decode::FastDecoder;
use crate::core::metadata::{copy_metadata, MetadataStep};
use crate::error::{ConversionError, NormalizeError};
use crate::events::{Event, EventSender, FileEvent, FileProgress, FileStatus};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// JPEG quality of converted artifacts
pub const CONVERTED_JPEG_QUALITY: u8 = 95;

/// A decoded image, plus the JPEG artifact when it had to be converted
#[derive(Debug)]
pub struct NormalizedImage {
    /// Bitmap to fingerprint
    pub bitmap: DynamicImage,
    /// Format the image was converted from, if any
    pub converted_from: Option<ConvertibleFormat>,
    /// Outcome of carrying the source EXIF over to the artifact
    pub metadata: Option<MetadataStep>,
    artifact: Option<NamedTempFile>,
}

impl NormalizedImage {
    /// The converted JPEG, for convertible sources
    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(|a| a.path())
    }

    /// Delete the artifact now, surfacing any deletion failure
    pub fn cleanup(self) -> io::Result<()> {
        match self.artifact {
            Some(artifact) => artifact.close(),
            None => Ok(()),
        }
    }
}

/// Turns source images into [`NormalizedImage`]s
pub struct Normalizer {
    decoders: Arc<DecoderSet>,
    work_dir: PathBuf,
}

impl Normalizer {
    /// Normalizer with the default decoders, writing artifacts to `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            decoders: Arc::new(DecoderSet::new(work_dir.clone())),
            work_dir,
        }
    }

    /// Use `decoders` instead of the defaults; the set may be shared
    pub fn with_decoders(mut self, decoders: impl Into<Arc<DecoderSet>>) -> Self {
        self.decoders = decoders.into();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Normalize the image at `path`.
    ///
    /// Emits `Converting` progress for convertible formats. Non-image
    /// kinds are rejected with [`ConversionError::Unsupported`].
    #[instrument(skip(self, events), fields(path = %path.display()))]
    pub fn normalize(
        &self,
        path: &Path,
        kind: MediaKind,
        events: &EventSender,
    ) -> Result<NormalizedImage, NormalizeError> {
        match kind {
            MediaKind::NativeImage => {
                let bitmap = FastDecoder::decode(path)?;
                Ok(NormalizedImage {
                    bitmap,
                    converted_from: None,
                    metadata: None,
                    artifact: None,
                })
            }
            MediaKind::ConvertibleImage(format) => self.convert(path, format, events),
            other => Err(ConversionError::Unsupported {
                path: path.to_path_buf(),
                format: other.to_string(),
            }
            .into()),
        }
    }

    fn convert(
        &self,
        path: &Path,
        format: ConvertibleFormat,
        events: &EventSender,
    ) -> Result<NormalizedImage, NormalizeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let progress = |percent: f64| {
            events.send(Event::File(FileEvent::Progress(FileProgress {
                percent,
                name: name.clone(),
                status: FileStatus::Converting,
            })));
        };

        progress(0.0);

        let decoded = self.decoders.for_format(format).decode(path)?;
        let bitmap = DynamicImage::ImageRgb8(decoded.to_rgb8());
        let artifact = self.write_artifact(path, &bitmap)?;

        let metadata = MetadataStep::from_result(copy_metadata(path, artifact.path()));
        debug!(artifact = %artifact.path().display(), ?metadata, "converted {}", format);

        progress(100.0);

        Ok(NormalizedImage {
            bitmap,
            converted_from: Some(format),
            metadata: Some(metadata),
            artifact: Some(artifact),
        })
    }

    fn write_artifact(
        &self,
        source: &Path,
        bitmap: &DynamicImage,
    ) -> Result<NamedTempFile, ConversionError> {
        let io_error = |e: io::Error| ConversionError::Io {
            path: source.to_path_buf(),
            source: e,
        };

        let mut artifact = tempfile::Builder::new()
            .prefix(".converted-")
            .suffix(".jpg")
            .tempfile_in(&self.work_dir)
            .map_err(io_error)?;

        {
            let mut writer = BufWriter::new(artifact.as_file_mut());
            let encoder = JpegEncoder::new_with_quality(&mut writer, CONVERTED_JPEG_QUALITY);
            bitmap
                .write_with_encoder(encoder)
                .map_err(|e| ConversionError::Encode {
                    path: source.to_path_buf(),
                    reason: e.to_string(),
                })?;
            writer.flush().map_err(io_error)?;
        }

        Ok(artifact)
    }
}
