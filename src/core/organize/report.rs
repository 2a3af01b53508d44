//! Plain-text run report (`organize_report.txt`).

use super::types::RunReport;
use std::io::Write;

/// Write the human-readable summary of a run
pub fn write_report<W: Write>(report: &RunReport, mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "Photo and Video Organization Summary ({})",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer)?;
    writeln!(writer, "Run ID: {}", report.id)?;
    writeln!(writer, "Source Directory: {}", report.source.display())?;
    writeln!(writer, "Destination Directory: {}", report.destination.display())?;
    writeln!(writer, "Organization Structure: {}", report.structure)?;
    writeln!(
        writer,
        "Files Processed: {} of {}",
        report.processed_files, report.total_files
    )?;
    if report.cancelled {
        writeln!(writer, "Run was cancelled before all files were processed.")?;
    }
    writeln!(writer)?;

    let stats = &report.stats;
    writeln!(writer, "--- Summary of Processed Files ---")?;
    writeln!(writer, "Photos Copied to Organized Folders: {}", stats.photos_copied)?;
    writeln!(writer, "Videos Copied to Organized Folders: {}", stats.videos_copied)?;
    writeln!(
        writer,
        "Suspect Duplicates Copied (Photos only): {}",
        stats.suspect_duplicates
    )?;
    writeln!(
        writer,
        "Other Files Copied to 'Manually Check': {}",
        stats.manually_checked
    )?;
    writeln!(
        writer,
        "Files Moved to 'Errors' Folder: {}",
        stats.files_moved_to_errors
    )?;

    writeln!(writer)?;
    writeln!(writer, "Files Converted (to JPG):")?;
    if stats.conversions.is_empty() {
        writeln!(writer, "  None")?;
    } else {
        for (format, count) in &stats.conversions {
            writeln!(writer, "  {}: {}", format.label(), count)?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "--- Errors Encountered ---")?;
    if stats.errors.is_empty() {
        writeln!(writer, "None")?;
    } else {
        for failure in &stats.errors {
            writeln!(writer, "- {}", failure)?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "--- Warnings ---")?;
    if stats.warnings.is_empty() {
        writeln!(writer, "None")?;
    } else {
        for warning in &stats.warnings {
            writeln!(writer, "- {}", warning)?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Duration: {:.1}s", report.duration_ms as f64 / 1000.0)?;

    Ok(())
}
