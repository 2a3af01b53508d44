//! # Classifier Module
//!
//! Maps a file extension to the kind of media it holds.
//!
//! ## Kinds
//! - **Native image** - JPEG, PNG; hashed and copied as-is
//! - **Convertible image** - CR2, RAW, TIFF, HEIC; decoded and re-encoded as JPEG
//! - **Video** - MP4, MOV, AVI, MKV, WebM, FLV
//! - **Other** - everything else, set aside for a human to look at

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions copied without conversion
pub const NATIVE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions that must be converted to JPEG before hashing and storage
pub const CONVERTIBLE_IMAGE_EXTENSIONS: &[&str] = &["cr2", "raw", "tif", "tiff", "heic"];

/// Extensions treated as video
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "flv"];

/// The classification of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    NativeImage,
    ConvertibleImage(ConvertibleFormat),
    Video,
    Other,
}

/// Original format of a convertible image
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConvertibleFormat {
    /// Canon RAW
    Cr2,
    /// Generic camera RAW
    Raw,
    /// TIFF (.tif and .tiff)
    Tiff,
    /// Apple HEIC
    Heic,
}

impl MediaKind {
    /// True for native and convertible images
    pub fn is_image(&self) -> bool {
        matches!(self, MediaKind::NativeImage | MediaKind::ConvertibleImage(_))
    }
}

impl ConvertibleFormat {
    /// Label used in the run report
    pub fn label(&self) -> &'static str {
        match self {
            ConvertibleFormat::Cr2 => "CR2",
            ConvertibleFormat::Raw => "RAW",
            ConvertibleFormat::Tiff => "TIF",
            ConvertibleFormat::Heic => "HEIC",
        }
    }
}

impl std::fmt::Display for ConvertibleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::NativeImage => write!(f, "image"),
            MediaKind::ConvertibleImage(format) => write!(f, "{} image", format),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// Classify an extension (with or without the leading dot). Case-insensitive.
pub fn classify(extension: &str) -> MediaKind {
    let ext = extension.trim_start_matches('.').to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" | "png" => MediaKind::NativeImage,
        "cr2" => MediaKind::ConvertibleImage(ConvertibleFormat::Cr2),
        "raw" => MediaKind::ConvertibleImage(ConvertibleFormat::Raw),
        "tif" | "tiff" => MediaKind::ConvertibleImage(ConvertibleFormat::Tiff),
        "heic" => MediaKind::ConvertibleImage(ConvertibleFormat::Heic),
        e if VIDEO_EXTENSIONS.contains(&e) => MediaKind::Video,
        _ => MediaKind::Other,
    }
}

/// Classify a path by its extension. Files without one are `Other`.
pub fn classify_path(path: &Path) -> MediaKind {
    path.extension()
        .and_then(|e| e.to_str())
        .map(classify)
        .unwrap_or(MediaKind::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_images_classify_as_native() {
        for ext in NATIVE_IMAGE_EXTENSIONS {
            assert_eq!(classify(ext), MediaKind::NativeImage, "{}", ext);
        }
    }

    #[test]
    fn convertible_images_keep_their_format() {
        assert_eq!(classify("cr2"), MediaKind::ConvertibleImage(ConvertibleFormat::Cr2));
        assert_eq!(classify("raw"), MediaKind::ConvertibleImage(ConvertibleFormat::Raw));
        assert_eq!(classify("tif"), MediaKind::ConvertibleImage(ConvertibleFormat::Tiff));
        assert_eq!(classify("tiff"), MediaKind::ConvertibleImage(ConvertibleFormat::Tiff));
        assert_eq!(classify("heic"), MediaKind::ConvertibleImage(ConvertibleFormat::Heic));
        for ext in CONVERTIBLE_IMAGE_EXTENSIONS {
            assert!(matches!(classify(ext), MediaKind::ConvertibleImage(_)));
        }
    }

    #[test]
    fn videos_classify_as_video() {
        for ext in VIDEO_EXTENSIONS {
            assert_eq!(classify(ext), MediaKind::Video, "{}", ext);
        }
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            classify_path(Path::new("IMG.JPG")),
            classify_path(Path::new("img.jpg"))
        );
        assert_eq!(classify("HEIC"), classify("heic"));
        assert_eq!(classify("Mov"), MediaKind::Video);
    }

    #[test]
    fn leading_dot_is_accepted() {
        assert_eq!(classify(".png"), MediaKind::NativeImage);
    }

    #[test]
    fn unknown_and_missing_extensions_are_other() {
        assert_eq!(classify("pdf"), MediaKind::Other);
        assert_eq!(classify(""), MediaKind::Other);
        assert_eq!(classify_path(Path::new("/photos/README")), MediaKind::Other);
        assert_eq!(classify("gif"), MediaKind::Other);
    }

    #[test]
    fn is_image_covers_both_image_kinds() {
        assert!(MediaKind::NativeImage.is_image());
        assert!(MediaKind::ConvertibleImage(ConvertibleFormat::Heic).is_image());
        assert!(!MediaKind::Video.is_image());
        assert!(!MediaKind::Other.is_image());
    }

    #[test]
    fn report_labels() {
        assert_eq!(ConvertibleFormat::Tiff.label(), "TIF");
        assert_eq!(ConvertibleFormat::Cr2.to_string(), "CR2");
    }
}
