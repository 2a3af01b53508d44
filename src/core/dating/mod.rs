//! # Dating Module
//!
//! Derives the (year, month) key a file is sorted under.
//!
//! Images prefer the embedded capture time; everything else, and any
//! image whose metadata is missing or unreadable, falls back to the file's
//! modification time.

use crate::core::classifier::MediaKind;
use crate::core::metadata::read_capture_timestamp;
use chrono::{DateTime, Datelike, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Sort key for the dated folder layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey {
    pub year: i32,
    pub month: u32,
}

/// Where a [`DateKey`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSource {
    /// EXIF DateTimeOriginal
    CaptureTime,
    /// Filesystem modification time
    Modified,
    /// Neither was available; the current time was used
    Now,
}

/// A resolved date key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub key: DateKey,
    pub source: DateSource,
}

impl DateKey {
    pub fn from_datetime(datetime: &NaiveDateTime) -> Self {
        Self {
            year: datetime.year(),
            month: datetime.month(),
        }
    }

    /// Four-digit year folder name, e.g. `2021`
    pub fn year_dir(&self) -> String {
        format!("{:04}", self.year)
    }

    /// Two-digit month folder name, e.g. `03`
    pub fn month_dir(&self) -> String {
        format!("{:02}", self.month)
    }
}

impl std::fmt::Display for DateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.year_dir(), self.month_dir())
    }
}

/// Resolve the date key of `path`.
///
/// `kind` is the classification of the original file; only images consult
/// embedded metadata. Metadata failures are logged and treated as absent.
/// `modified` is the mtime recorded when the file was discovered.
pub fn resolve_date(path: &Path, kind: MediaKind, modified: Option<SystemTime>) -> ResolvedDate {
    if kind.is_image() {
        match read_capture_timestamp(path) {
            Ok(Some(taken)) => {
                return ResolvedDate {
                    key: DateKey::from_datetime(&taken),
                    source: DateSource::CaptureTime,
                }
            }
            Ok(None) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "ignoring unreadable capture time"),
        }
    }

    match modified {
        Some(modified) => ResolvedDate {
            key: DateKey::from_datetime(&local_time(modified)),
            source: DateSource::Modified,
        },
        None => ResolvedDate {
            key: DateKey::from_datetime(&Local::now().naive_local()),
            source: DateSource::Now,
        },
    }
}

fn local_time(time: SystemTime) -> NaiveDateTime {
    let datetime: DateTime<Local> = time.into();
    datetime.naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::ConvertibleFormat;
    use crate::core::metadata::embed_exif;
    use crate::core::metadata::test_support::{tiff_with_capture_time, write_jpeg};
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::TempDir;

    /// 2019-06-15 12:00:00 UTC, mid-month so no timezone moves it
    fn june_2019() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_560_600_000)
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    fn mtime(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).ok()?.modified().ok()
    }

    #[test]
    fn capture_time_wins_over_mtime() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        write_jpeg(&path);
        embed_exif(&path, &tiff_with_capture_time("2021:03:15 10:00:00")).unwrap();
        set_mtime(&path, june_2019());

        let resolved = resolve_date(&path, MediaKind::NativeImage, mtime(&path));

        assert_eq!(resolved.key, DateKey { year: 2021, month: 3 });
        assert_eq!(resolved.source, DateSource::CaptureTime);
        assert_eq!(resolved.key.year_dir(), "2021");
        assert_eq!(resolved.key.month_dir(), "03");
    }

    #[test]
    fn image_without_exif_uses_mtime() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        write_jpeg(&path);
        set_mtime(&path, june_2019());

        let resolved = resolve_date(&path, MediaKind::NativeImage, mtime(&path));

        assert_eq!(resolved.key, DateKey { year: 2019, month: 6 });
        assert_eq!(resolved.source, DateSource::Modified);
    }

    #[test]
    fn corrupt_image_falls_back_to_mtime() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.cr2");
        fs::write(&path, b"definitely not a raw file").unwrap();
        set_mtime(&path, june_2019());

        let resolved =
            resolve_date(&path, MediaKind::ConvertibleImage(ConvertibleFormat::Cr2), mtime(&path));

        assert_eq!(resolved.key, DateKey { year: 2019, month: 6 });
    }

    #[test]
    fn videos_ignore_embedded_metadata() {
        let temp = TempDir::new().unwrap();
        // A JPEG with EXIF, misnamed as a video: only the mtime counts
        let path = temp.path().join("clip.mp4");
        write_jpeg(&path);
        embed_exif(&path, &tiff_with_capture_time("2021:03:15 10:00:00")).unwrap();
        set_mtime(&path, june_2019());

        let resolved = resolve_date(&path, MediaKind::Video, mtime(&path));

        assert_eq!(resolved.key, DateKey { year: 2019, month: 6 });
    }

    #[test]
    fn missing_mtime_uses_now() {
        let resolved = resolve_date(Path::new("/nonexistent/clip.mov"), MediaKind::Video, None);
        assert_eq!(resolved.source, DateSource::Now);
    }

    #[test]
    fn recorded_mtime_is_used_without_touching_the_file() {
        let resolved = resolve_date(
            Path::new("/nonexistent/clip.mov"),
            MediaKind::Video,
            Some(june_2019()),
        );
        assert_eq!(resolved.key, DateKey { year: 2019, month: 6 });
        assert_eq!(resolved.source, DateSource::Modified);
    }

    #[test]
    fn date_key_display() {
        assert_eq!(DateKey { year: 2024, month: 1 }.to_string(), "2024/01");
    }
}
