//! Format-specific decoder collaborators.
//!
//! Each convertible format is decoded by a [`FormatDecoder`]. The
//! [`DecoderSet`] maps a [`ConvertibleFormat`] to its decoder; shells and
//! tests can swap any of them out.

use super::raw::RawDecoder;
use crate::core::classifier::ConvertibleFormat;
use crate::error::ConversionError;
use image::{DynamicImage, ImageFormat};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Decodes one family of formats into a standard bitmap
pub trait FormatDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConversionError>;
}

/// Decoder registry keyed by convertible format
pub struct DecoderSet {
    raw: Box<dyn FormatDecoder>,
    tiff: Box<dyn FormatDecoder>,
    heic: Box<dyn FormatDecoder>,
}

impl DecoderSet {
    /// Default decoders. `work_dir` holds the HEIC converter's scratch output.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw: Box::new(RawDecoder::new()),
            tiff: Box::new(TiffDecoder),
            heic: Box::new(HeicDecoder::new(work_dir)),
        }
    }

    /// Replace the camera RAW decoder (CR2, RAW)
    pub fn with_raw(mut self, decoder: Box<dyn FormatDecoder>) -> Self {
        self.raw = decoder;
        self
    }

    /// Replace the TIFF decoder
    pub fn with_tiff(mut self, decoder: Box<dyn FormatDecoder>) -> Self {
        self.tiff = decoder;
        self
    }

    /// Replace the HEIC decoder
    pub fn with_heic(mut self, decoder: Box<dyn FormatDecoder>) -> Self {
        self.heic = decoder;
        self
    }

    /// The decoder responsible for `format`
    pub fn for_format(&self, format: ConvertibleFormat) -> &dyn FormatDecoder {
        match format {
            ConvertibleFormat::Cr2 | ConvertibleFormat::Raw => self.raw.as_ref(),
            ConvertibleFormat::Tiff => self.tiff.as_ref(),
            ConvertibleFormat::Heic => self.heic.as_ref(),
        }
    }
}

/// TIFF decoding through the image crate
pub struct TiffDecoder;

impl FormatDecoder for TiffDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConversionError> {
        let mut reader = image::ImageReader::open(path).map_err(|e| ConversionError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        reader.set_format(ImageFormat::Tiff);

        reader.decode().map_err(|e| ConversionError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// HEIC decoding through the platform's converter.
///
/// macOS ships `sips`; elsewhere `heif-convert` from libheif is used.
/// The converter writes a scratch JPEG into the work directory, which is
/// removed as soon as it has been read back.
pub struct HeicDecoder {
    work_dir: PathBuf,
}

impl HeicDecoder {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    #[cfg(target_os = "macos")]
    fn converter(input: &Path, output: &Path) -> Command {
        let mut command = Command::new("sips");
        command
            .args(["-s", "format", "jpeg"])
            .arg(input)
            .arg("--out")
            .arg(output);
        command
    }

    #[cfg(not(target_os = "macos"))]
    fn converter(input: &Path, output: &Path) -> Command {
        let mut command = Command::new("heif-convert");
        command.args(["-q", "95"]).arg(input).arg(output);
        command
    }
}

impl FormatDecoder for HeicDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConversionError> {
        let scratch = tempfile::Builder::new()
            .prefix(".heic-")
            .suffix(".jpg")
            .tempfile_in(&self.work_dir)
            .map_err(|e| ConversionError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut command = Self::converter(path, scratch.path());
        debug!(?command, "running HEIC converter");

        let output = command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConversionError::Unsupported {
                    path: path.to_path_buf(),
                    format: format!("HEIC (converter {:?} not installed)", command.get_program()),
                }
            } else {
                ConversionError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if !output.status.success() {
            return Err(ConversionError::Decode {
                path: path.to_path_buf(),
                reason: format!(
                    "HEIC converter failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        // `scratch` is deleted when it goes out of scope
        image::open(scratch.path()).map_err(|e| ConversionError::Decode {
            path: path.to_path_buf(),
            reason: format!("Failed to read converted HEIC: {}", e),
        })
    }
}
