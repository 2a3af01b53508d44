//! # Metadata Module
//!
//! Reads and carries over EXIF metadata.
//!
//! ## Operations
//! - Capture time (DateTimeOriginal) for the temporal sort key
//! - Copying the EXIF block of a source file into a JPEG destination,
//!   used after RAW/HEIC/TIFF conversion
//!
//! Every operation here is best-effort. Callers get an explicit
//! `Result`/[`MetadataStep`] and decide to log and move on.
//!
//! ## Supported Formats
//! kamadak-exif reads EXIF from JPEG, TIFF (and TIFF-based RAW such as
//! CR2), HEIF/HEIC, PNG and WebP containers. Embedding is JPEG only.

use crate::error::MetadataError;
use chrono::NaiveDateTime;
use exif::experimental::Writer;
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use tracing::warn;

/// EXIF timestamp layout, e.g. `2021:03:15 10:00:00`
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Offsets, sizes and sub-IFD pointers that only make sense inside the
/// original container
const IMAGE_DATA_TAGS: &[Tag] = &[
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
];

/// Outcome of a best-effort metadata step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataStep {
    /// Metadata was written to the destination
    Applied,
    /// Nothing to do
    Skipped(SkipReason),
    /// The step failed; the failure was logged and otherwise ignored
    Ignored(String),
}

/// Why a metadata step had nothing to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The source carries no EXIF block
    NoSourceMetadata,
    /// The destination already has an EXIF block (e.g. a byte copy)
    AlreadyPresent,
    /// The destination is not a JPEG (PNG copies keep their own chunks)
    DestinationNotJpeg,
}

impl MetadataStep {
    /// Fold a best-effort result into a step, logging the failure branch
    pub fn from_result(result: Result<MetadataStep, MetadataError>) -> Self {
        match result {
            Ok(step) => step,
            Err(e) => {
                warn!(error = %e, "metadata step failed, continuing");
                MetadataStep::Ignored(e.to_string())
            }
        }
    }

    /// True when the step failed and was ignored
    pub fn is_ignored(&self) -> bool {
        matches!(self, MetadataStep::Ignored(_))
    }
}

/// Read the original capture time (EXIF DateTimeOriginal).
///
/// `Ok(None)` when the file has no EXIF or no such field.
pub fn read_capture_timestamp(path: &Path) -> Result<Option<NaiveDateTime>, MetadataError> {
    let exif = match read_exif(path)? {
        Some(exif) => exif,
        None => return Ok(None),
    };

    let field = match exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        Some(field) => field,
        None => return Ok(None),
    };

    let raw = match field.value {
        Value::Ascii(ref vec) => vec
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default(),
        _ => field.display_value().to_string(),
    };
    let trimmed = raw.trim_end_matches('\0').trim();

    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT)
        .map(Some)
        .map_err(|_| MetadataError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: trimmed.to_string(),
        })
}

/// Raw TIFF-structured EXIF block of a file, if it has one.
///
/// For TIFF-based containers (TIFF, CR2) the whole file is the EXIF
/// structure, so the primary IFD fields are re-serialized without the
/// image data they point at.
pub fn read_exif_block(path: &Path) -> Result<Option<Vec<u8>>, MetadataError> {
    let exif = match read_exif(path)? {
        Some(exif) => exif,
        None => return Ok(None),
    };

    if is_tiff_container(path) {
        rebuild_block(&exif, path).map(Some)
    } else {
        Ok(Some(exif.buf().to_vec()))
    }
}

fn is_tiff_container(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| &magic == b"II*\0" || &magic == b"MM\0*")
        .unwrap_or(false)
}

fn rebuild_block(exif: &exif::Exif, path: &Path) -> Result<Vec<u8>, MetadataError> {
    let mut writer = Writer::new();
    for field in exif.fields().filter(|f| {
        f.ifd_num == In::PRIMARY
            && !IMAGE_DATA_TAGS.contains(&f.tag)
            && !matches!(f.value, Value::Unknown(..))
    }) {
        writer.push_field(field);
    }

    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, exif.little_endian())
        .map_err(|e| MetadataError::Read {
            path: path.to_path_buf(),
            reason: format!("Failed to re-serialize EXIF: {}", e),
        })?;
    Ok(buf.into_inner())
}

fn read_exif(path: &Path) -> Result<Option<exif::Exif>, MetadataError> {
    let file = File::open(path).map_err(|e| MetadataError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(MetadataError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Copy the EXIF block of `source` into the JPEG at `destination`.
///
/// The destination is left untouched when it already carries EXIF or
/// is not a JPEG.
pub fn copy_metadata(source: &Path, destination: &Path) -> Result<MetadataStep, MetadataError> {
    let jpeg = fs::read(destination).map_err(|e| MetadataError::Read {
        path: destination.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !is_jpeg(&jpeg) {
        return Ok(MetadataStep::Skipped(SkipReason::DestinationNotJpeg));
    }

    if has_exif_segment(&jpeg) {
        return Ok(MetadataStep::Skipped(SkipReason::AlreadyPresent));
    }

    let tiff = match read_exif_block(source)? {
        Some(tiff) => tiff,
        None => return Ok(MetadataStep::Skipped(SkipReason::NoSourceMetadata)),
    };

    let spliced = insert_exif_segment(&jpeg, &tiff, source)?;
    fs::write(destination, spliced).map_err(|e| MetadataError::Write {
        path: destination.to_path_buf(),
        source: e,
    })?;

    Ok(MetadataStep::Applied)
}

/// Embed a TIFF-structured EXIF block into an existing JPEG file
pub fn embed_exif(jpeg_path: &Path, tiff: &[u8]) -> Result<(), MetadataError> {
    let jpeg = fs::read(jpeg_path).map_err(|e| MetadataError::Read {
        path: jpeg_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !is_jpeg(&jpeg) {
        return Err(MetadataError::NotJpeg {
            path: jpeg_path.to_path_buf(),
        });
    }

    let spliced = insert_exif_segment(&jpeg, tiff, jpeg_path)?;
    fs::write(jpeg_path, spliced).map_err(|e| MetadataError::Write {
        path: jpeg_path.to_path_buf(),
        source: e,
    })
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[0] == 0xFF && bytes[1] == 0xD8
}

/// Iterate the leading APPn/COM segments as (marker, offset, total length)
fn header_segments(jpeg: &[u8]) -> Vec<(u8, usize, usize)> {
    let mut segments = Vec::new();
    let mut pos = 2;

    while pos + 4 <= jpeg.len() && jpeg[pos] == 0xFF {
        let marker = jpeg[pos + 1];
        if !(0xE0..=0xEF).contains(&marker) && marker != 0xFE {
            break;
        }
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > jpeg.len() {
            break;
        }
        segments.push((marker, pos, 2 + len));
        pos += 2 + len;
    }

    segments
}

fn has_exif_segment(jpeg: &[u8]) -> bool {
    header_segments(jpeg).iter().any(|&(marker, offset, _)| {
        marker == 0xE1 && jpeg[offset + 4..].starts_with(EXIF_HEADER)
    })
}

/// Splice an APP1 Exif segment in right after SOI (after JFIF APP0 if present)
fn insert_exif_segment(jpeg: &[u8], tiff: &[u8], origin: &Path) -> Result<Vec<u8>, MetadataError> {
    let payload_len = 2 + EXIF_HEADER.len() + tiff.len();
    if payload_len > u16::MAX as usize {
        return Err(MetadataError::TooLarge {
            path: origin.to_path_buf(),
            size: tiff.len(),
        });
    }

    let insert_at = match header_segments(jpeg).first() {
        Some(&(0xE0, offset, len)) => offset + len,
        _ => 2,
    };

    let mut out = Vec::with_capacity(jpeg.len() + payload_len + 2);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&(payload_len as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[insert_at..]);
    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn capture_timestamp_roundtrips_through_embedded_exif() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        write_jpeg(&path);
        embed_exif(&path, &tiff_with_capture_time("2021:03:15 10:00:00")).unwrap();

        let ts = read_capture_timestamp(&path).unwrap().unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2021-03-15 10:00:00");
    }

    #[test]
    fn jpeg_without_exif_has_no_timestamp() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.jpg");
        write_jpeg(&path);

        assert_eq!(read_capture_timestamp(&path).unwrap(), None);
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("odd.jpg");
        write_jpeg(&path);
        embed_exif(&path, &tiff_with_capture_time("last tuesday")).unwrap();

        let result = read_capture_timestamp(&path);
        assert!(matches!(result, Err(MetadataError::InvalidTimestamp { .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = read_capture_timestamp(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(MetadataError::Read { .. })));
    }

    #[test]
    fn copy_metadata_carries_exif_into_plain_jpeg() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.jpg");
        let destination = temp.path().join("converted.jpg");
        write_jpeg(&source);
        embed_exif(&source, &tiff_with_capture_time("2020:07:04 18:30:00")).unwrap();
        write_jpeg(&destination);

        let step = copy_metadata(&source, &destination).unwrap();

        assert_eq!(step, MetadataStep::Applied);
        let ts = read_capture_timestamp(&destination).unwrap().unwrap();
        assert_eq!(ts.format("%Y").to_string(), "2020");
        // Still a decodable JPEG
        assert!(image::open(&destination).is_ok());
    }

    #[test]
    fn copy_metadata_skips_when_destination_has_exif() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.jpg");
        write_jpeg(&source);
        embed_exif(&source, &tiff_with_capture_time("2020:07:04 18:30:00")).unwrap();
        let destination = temp.path().join("copy.jpg");
        fs::copy(&source, &destination).unwrap();

        let step = copy_metadata(&source, &destination).unwrap();
        assert_eq!(step, MetadataStep::Skipped(SkipReason::AlreadyPresent));
    }

    #[test]
    fn copy_metadata_skips_without_source_exif() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.jpg");
        let destination = temp.path().join("dest.jpg");
        write_jpeg(&source);
        write_jpeg(&destination);

        let step = copy_metadata(&source, &destination).unwrap();
        assert_eq!(step, MetadataStep::Skipped(SkipReason::NoSourceMetadata));
    }

    #[test]
    fn copy_metadata_skips_non_jpeg_destination() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("dest.png");
        image::RgbImage::new(4, 4).save(&destination).unwrap();

        let step = copy_metadata(Path::new("/whatever.jpg"), &destination).unwrap();
        assert_eq!(step, MetadataStep::Skipped(SkipReason::DestinationNotJpeg));
    }

    #[test]
    fn embed_refuses_non_jpeg() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, b"hello there").unwrap();

        let result = embed_exif(&path, &tiff_with_capture_time("2020:07:04 18:30:00"));
        assert!(matches!(result, Err(MetadataError::NotJpeg { .. })));
    }

    #[test]
    fn from_result_turns_errors_into_ignored() {
        let step = MetadataStep::from_result(Err(MetadataError::NotJpeg {
            path: "/x.txt".into(),
        }));
        assert!(step.is_ignored());
        assert_eq!(
            MetadataStep::from_result(Ok(MetadataStep::Applied)),
            MetadataStep::Applied
        );
    }

    #[test]
    fn tiff_block_excludes_pixel_data() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.tif");
        image::RgbImage::from_pixel(200, 200, image::Rgb([10, 20, 30]))
            .save_with_format(&path, image::ImageFormat::Tiff)
            .unwrap();
        let file_len = fs::metadata(&path).unwrap().len() as usize;

        let block = read_exif_block(&path).unwrap().unwrap();

        assert!(block.len() < file_len / 10);
        assert!(Reader::new().read_raw(block).is_ok());
    }
}
