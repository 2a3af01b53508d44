//! Integration tests for a full organize run.
//!
//! These tests drive the public API end to end:
//! - Routing of photos, videos, duplicates and unknown files
//! - EXIF capture time versus modification time
//! - Quarantine of broken files
//! - The persisted report

use assert_fs::prelude::*;
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{ImageFormat, Rgb, RgbImage};
use media_sorter::core::metadata::embed_exif;
use media_sorter::core::organize::{FolderStructure, Organizer, RunReport};
use media_sorter::core::scanner::ScanConfig;
use predicates::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// 2019-06-15 12:00 UTC
const MTIME_SECS: u64 = 1_560_600_000;

fn set_mtime(path: &Path) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(MTIME_SECS))
        .unwrap();
}

fn gradient(horizontal: bool) -> RgbImage {
    RgbImage::from_fn(64, 64, |x, y| {
        let v = (if horizontal { x * 4 } else { y * 4 }) as u8;
        Rgb([v, v, v])
    })
}

fn write_image(child: &assert_fs::fixture::ChildPath, horizontal: bool, format: ImageFormat) {
    std::fs::create_dir_all(child.path().parent().unwrap()).unwrap();
    gradient(horizontal).save_with_format(child.path(), format).unwrap();
    set_mtime(child.path());
}

fn write_bytes(child: &assert_fs::fixture::ChildPath, bytes: &[u8]) {
    child.write_binary(bytes).unwrap();
    set_mtime(child.path());
}

fn capture_time_block(timestamp: &str) -> Vec<u8> {
    let field = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![timestamp.as_bytes().to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

fn run(source: &Path, destination: &Path, work: &Path) -> RunReport {
    Organizer::builder()
        .source(source)
        .destination(destination)
        .work_dir(work)
        .scan_config(ScanConfig {
            sort_entries: true,
            ..Default::default()
        })
        .build()
        .run()
        .unwrap()
}

#[test]
fn mixed_tree_is_sorted_into_the_layout() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("unsorted");
    let destination = temp.child("sorted");
    let work = temp.child("work");
    work.create_dir_all().unwrap();

    write_image(&source.child("a_first.png"), true, ImageFormat::Png);
    write_image(&source.child("b_copy.png"), true, ImageFormat::Png);
    write_image(&source.child("trip/c_other.png"), false, ImageFormat::Png);
    write_bytes(&source.child("trip/clip.mov"), b"not really a movie");
    write_bytes(&source.child("notes.docx"), b"document");
    write_bytes(&source.child("trip/d_broken.jpg"), b"\xff\xd8\xffbroken");

    let report = run(source.path(), destination.path(), work.path());

    assert_eq!(report.total_files, 6);
    assert_eq!(report.processed_files, 6);
    assert_eq!(report.stats.photos_copied, 2);
    assert_eq!(report.stats.suspect_duplicates, 1);
    assert_eq!(report.stats.videos_copied, 1);
    assert_eq!(report.stats.manually_checked, 1);
    assert_eq!(report.stats.files_moved_to_errors, 1);

    destination
        .child("2019/06/a_first.png")
        .assert(predicate::path::is_file());
    destination
        .child("2019/06/c_other.png")
        .assert(predicate::path::is_file());
    destination
        .child("Suspect Duplicates/b_copy.png")
        .assert(predicate::path::is_file());
    destination
        .child("Videos/2019/06/clip.mov")
        .assert("not really a movie");
    destination
        .child("Manually Check/notes.docx")
        .assert("document");
    destination
        .child("Errors/d_broken.jpg")
        .assert(predicate::path::is_file());

    // Sources are copied, never moved
    source.child("a_first.png").assert(predicate::path::exists());
    source.child("trip/d_broken.jpg").assert(predicate::path::exists());

    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[test]
fn capture_time_wins_over_modification_time() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("in");
    let destination = temp.child("out");
    let work = temp.child("work");
    work.create_dir_all().unwrap();

    let photo = source.child("IMG_0042.jpg");
    write_image(&photo, true, ImageFormat::Jpeg);
    embed_exif(photo.path(), &capture_time_block("2021:03:15 10:00:00")).unwrap();
    set_mtime(photo.path());

    let report = run(source.path(), destination.path(), work.path());

    assert_eq!(report.stats.photos_copied, 1);
    destination
        .child("2021/03/IMG_0042.jpg")
        .assert(predicate::path::is_file());
    destination
        .child("2019")
        .assert(predicate::path::missing());
}

#[test]
fn year_structure_uses_single_level_folders() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("in");
    let destination = temp.child("out");
    let work = temp.child("work");
    work.create_dir_all().unwrap();
    write_image(&source.child("pic.png"), false, ImageFormat::Png);

    Organizer::builder()
        .source(source.path())
        .destination(destination.path())
        .work_dir(work.path())
        .structure(FolderStructure::Year)
        .build()
        .run()
        .unwrap();

    destination
        .child("2019/pic.png")
        .assert(predicate::path::is_file());
}

#[test]
fn report_is_written_to_destination() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("in");
    let destination = temp.child("out");
    let work = temp.child("work");
    source.create_dir_all().unwrap();
    work.create_dir_all().unwrap();
    write_bytes(&source.child("broken.png"), b"nope");

    let report = run(source.path(), destination.path(), work.path());

    let report_file = destination.child("organize_report.txt");
    let written = report.report_path.unwrap();
    assert_eq!(written.file_name(), report_file.path().file_name());
    report_file.assert(
        predicate::str::contains("Files Moved to 'Errors' Folder: 1")
            .and(predicate::str::contains("broken.png"))
            .and(predicate::str::contains("Files Converted (to JPG):\n  None")),
    );
}

#[test]
fn empty_source_still_produces_layout_and_report() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("in");
    let destination = temp.child("out");
    let work = temp.child("work");
    source.create_dir_all().unwrap();
    work.create_dir_all().unwrap();

    let report = run(source.path(), destination.path(), work.path());

    assert_eq!(report.total_files, 0);
    for dir in ["Videos", "Suspect Duplicates", "Manually Check", "Errors"] {
        destination.child(dir).assert(predicate::path::is_dir());
    }
    destination
        .child("organize_report.txt")
        .assert(predicate::str::contains("--- Errors Encountered ---\nNone"));
}

#[test]
fn run_report_serializes_to_json() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("in");
    let destination = temp.child("out");
    let work = temp.child("work");
    work.create_dir_all().unwrap();
    write_image(&source.child("scan.tif"), true, ImageFormat::Tiff);

    let report = run(source.path(), destination.path(), work.path());
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["stats"]["conversions"]["Tiff"], 1);
    assert_eq!(json["structure"], "year_month");
    destination
        .child("2019/06/scan.jpg")
        .assert(predicate::path::is_file());
}
