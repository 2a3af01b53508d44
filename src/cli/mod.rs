//! # CLI Module
//!
//! Command-line interface for the media sorter.
//!
//! ## Usage
//! ```bash
//! # Sort into year/month folders
//! media-sort organize ~/Unsorted ~/Sorted
//!
//! # Year folders only
//! media-sort organize ~/Unsorted ~/Sorted --structure year
//!
//! # Settings from a file, flags override
//! media-sort organize --config organize.json --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use media_sorter::core::organize::{FolderStructure, OrganizeConfig, Organizer, RunReport};
use media_sorter::error::{OrganizerError, Result};
use media_sorter::events::{Event, EventChannel, FileEvent, RunEvent};
use std::path::{Path, PathBuf};
use std::thread;

/// Media Sorter - Sort photos and videos by date without losing a file
#[derive(Parser, Debug)]
#[command(name = "media-sort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy a media tree into a dated layout
    Organize {
        /// Unsorted source directory (never modified)
        #[arg(required_unless_present = "config")]
        source: Option<PathBuf>,

        /// Destination root for the sorted layout
        #[arg(required_unless_present = "config")]
        destination: Option<PathBuf>,

        /// Folder structure
        #[arg(short, long)]
        structure: Option<Structure>,

        /// Copy chunk size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Directory for converted RAW/HEIC/TIFF files (default: system temp)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Skip hidden files and directories
        #[arg(long)]
        skip_hidden: bool,

        /// Follow symbolic links while walking the source
        #[arg(long)]
        follow_symlinks: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// JSON settings file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Structure {
    /// 2021/
    Year,
    /// 2021/03/ (default)
    YearMonth,
}

impl From<Structure> for FolderStructure {
    fn from(structure: Structure) -> Self {
        match structure {
            Structure::Year => FolderStructure::Year,
            Structure::YearMonth => FolderStructure::YearMonth,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Organize {
            source,
            destination,
            structure,
            chunk_size,
            work_dir,
            skip_hidden,
            follow_symlinks,
            output,
            verbose,
            config,
        } => {
            media_sorter::init_tracing(if verbose { "debug" } else { "warn" });

            let mut settings = match config {
                Some(path) => load_settings(&path)?,
                None => OrganizeConfig::default(),
            };

            if let Some(source) = source {
                settings.source = source;
            }
            if let Some(destination) = destination {
                settings.destination = destination;
            }
            if let Some(structure) = structure {
                settings.structure = structure.into();
            }
            if let Some(chunk_size) = chunk_size {
                settings.chunk_size = chunk_size;
            }
            if work_dir.is_some() {
                settings.work_dir = work_dir;
            }
            if skip_hidden {
                settings.scan.include_hidden = false;
            }
            if follow_symlinks {
                settings.scan.follow_symlinks = true;
            }

            run_organize(settings, output, verbose)
        }
    }
}

fn load_settings(path: &Path) -> Result<OrganizeConfig> {
    let settings_error = |reason: String| OrganizerError::Settings {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| settings_error(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| settings_error(e.to_string()))
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

fn run_organize(settings: OrganizeConfig, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Media Sorter").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let organizer = Organizer::builder().config(settings).build();

    let (sender, receiver) = EventChannel::new();

    let bars = pretty.then(|| {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(bar_style(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files",
        ));
        let current = multi.add(ProgressBar::new(100));
        current.set_style(bar_style("  [{bar:40.white/black}] {percent:>3}% {msg}"));
        (multi, overall, current)
    });
    let bars_clone = bars.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some((_, overall, current)) = &bars_clone else {
                continue;
            };
            match event {
                Event::Run(RunEvent::FilesDiscovered { total }) => {
                    overall.set_length(total as u64);
                }
                Event::Run(RunEvent::OverallProgress { processed, .. }) => {
                    overall.set_position(processed as u64);
                }
                Event::File(FileEvent::Progress(p)) => {
                    current.set_position(p.percent.round() as u64);
                    current.set_message(format!("{} {}", p.status, p.name));
                }
                Event::File(FileEvent::Finished { path, outcome }) if verbose => {
                    overall.println(format!(
                        "  {} {:?}",
                        style(display_path(&path)).dim(),
                        outcome
                    ));
                }
                Event::Run(RunEvent::Completed { .. } | RunEvent::Cancelled) => {
                    current.finish_and_clear();
                    overall.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = organizer.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some((multi, _, _)) = bars {
        multi.clear().ok();
    }

    let report = result?;

    match output {
        OutputFormat::Pretty => print_pretty_report(&term, &report, verbose),
        OutputFormat::Json => print_json_report(&report),
    }

    Ok(())
}

fn print_pretty_report(term: &Term, report: &RunReport, verbose: bool) {
    let stats = &report.stats;
    let headline = if report.cancelled {
        format!("{} Organize Cancelled", style("!").yellow().bold())
    } else {
        format!("{} Organize Complete", style("✓").green().bold())
    };
    term.write_line(&headline).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} of {} files processed in {:.1}s",
        style(report.processed_files).cyan(),
        report.total_files,
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    let lines = [
        ("photos copied", stats.photos_copied),
        ("videos copied", stats.videos_copied),
        ("suspect duplicates", stats.suspect_duplicates),
        ("files to check manually", stats.manually_checked),
        ("files moved to Errors", stats.files_moved_to_errors),
        ("images converted to JPG", stats.total_conversions()),
    ];
    for (label, count) in lines {
        term.write_line(&format!("  {} {}", style(count).cyan(), label)).ok();
    }

    if !stats.errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Errors:").bold().red())).ok();
        for failure in &stats.errors {
            term.write_line(&format!(
                "  {} {} ({}): {}",
                style("✗").red(),
                display_path(&failure.path),
                failure.stage,
                failure.message
            ))
            .ok();
        }
    }

    if verbose && !stats.warnings.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Warnings:").bold().yellow()))
            .ok();
        for warning in &stats.warnings {
            term.write_line(&format!("  {} {}", style("!").yellow(), warning))
                .ok();
        }
    }

    term.write_line("").ok();
    match &report.report_path {
        Some(path) => term.write_line(&format!(
            "{} {}",
            style("Report saved to").dim(),
            display_path(path)
        )),
        None => term.write_line(&format!(
            "{}",
            style("The report file could not be written.").yellow()
        )),
    }
    .ok();
    term.write_line(&format!(
        "{}",
        style("No source files were modified.").dim()
    ))
    .ok();
}

fn print_json_report(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize report: {}", e),
    }
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    match path.strip_prefix(&home) {
        Ok(rest) if !home.as_os_str().is_empty() => format!("~/{}", rest.display()),
        _ => path.display().to_string(),
    }
}
