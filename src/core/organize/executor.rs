//! Run orchestration: one pass over the source tree, one file at a time.

use super::report::write_report;
use super::types::*;
use crate::core::cancel::CancellationToken;
use crate::core::classifier::MediaKind;
use crate::core::dating::{resolve_date, DateSource};
use crate::core::destination::{converted_file_name, resolve, DestinationLayout};
use crate::core::hasher::{fingerprint, SeenFingerprints};
use crate::core::metadata::MetadataStep;
use crate::core::normalizer::{DecoderSet, NormalizedImage, Normalizer};
use crate::core::scanner::{MediaFile, ScanConfig, SourceScanner, WalkDirScanner};
use crate::core::transfer::{TransferEngine, TransferOutcome};
use crate::error::{ConfigurationError, NormalizeError, OrganizerError, TransferError};
use crate::events::{
    null_sender, Event, EventSender, FileEvent, FileOutcome, FileProgress, FileStatus, RunEvent,
    RunSummary,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Builder for an [`Organizer`]
pub struct OrganizerBuilder {
    config: OrganizeConfig,
    cancel: CancellationToken,
    decoders: Option<DecoderSet>,
    scanner: Option<Box<dyn SourceScanner>>,
}

impl OrganizerBuilder {
    pub fn new() -> Self {
        Self {
            config: OrganizeConfig::default(),
            cancel: CancellationToken::new(),
            decoders: None,
            scanner: None,
        }
    }

    /// Start from a complete configuration (e.g. loaded from JSON)
    pub fn config(mut self, config: OrganizeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = destination.into();
        self
    }

    pub fn structure(mut self, structure: FolderStructure) -> Self {
        self.config.structure = structure;
        self
    }

    pub fn scan_config(mut self, scan: ScanConfig) -> Self {
        self.config.scan = scan;
        self
    }

    /// Include hidden files and directories
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    /// Transfer chunk size in bytes
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    /// Directory for converted artifacts
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replace the format decoders
    pub fn decoders(mut self, decoders: DecoderSet) -> Self {
        self.decoders = Some(decoders);
        self
    }

    /// Replace the source scanner
    pub fn scanner(mut self, scanner: Box<dyn SourceScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn build(self) -> Organizer {
        let work_root = self
            .config
            .work_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let decoders = self
            .decoders
            .unwrap_or_else(|| DecoderSet::new(work_root.clone()));
        let scanner = self
            .scanner
            .unwrap_or_else(|| Box::new(WalkDirScanner::new(self.config.scan.clone())));

        Organizer {
            config: self.config,
            work_root,
            cancel: self.cancel,
            decoders: Arc::new(decoders),
            scanner,
        }
    }
}

impl Default for OrganizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts a source tree into the destination layout
pub struct Organizer {
    config: OrganizeConfig,
    work_root: PathBuf,
    cancel: CancellationToken,
    decoders: Arc<DecoderSet>,
    scanner: Box<dyn SourceScanner>,
}

/// Why a file left the happy path
enum StepError {
    Failed { stage: FailureStage, message: String },
    Cancelled,
}

fn failed_at(stage: FailureStage, error: impl std::fmt::Display) -> StepError {
    StepError::Failed {
        stage,
        message: error.to_string(),
    }
}

impl From<TransferError> for StepError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::Cancelled { .. } => StepError::Cancelled,
            other => StepError::Failed {
                stage: FailureStage::Transfer,
                message: other.to_string(),
            },
        }
    }
}

impl From<NormalizeError> for StepError {
    fn from(e: NormalizeError) -> Self {
        let stage = match e {
            NormalizeError::Conversion(_) => FailureStage::Convert,
            NormalizeError::Hash(_) => FailureStage::Hash,
        };
        StepError::Failed {
            stage,
            message: e.to_string(),
        }
    }
}

/// State owned by a single run
struct RunState {
    layout: DestinationLayout,
    normalizer: Normalizer,
    engine: TransferEngine,
    seen: SeenFingerprints,
    stats: RunStatistics,
}

impl Organizer {
    pub fn builder() -> OrganizerBuilder {
        OrganizerBuilder::new()
    }

    pub fn config(&self) -> &OrganizeConfig {
        &self.config
    }

    /// The token that cancels this organizer's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run without events
    pub fn run(&self) -> Result<RunReport, OrganizerError> {
        self.run_with_events(&null_sender())
    }

    /// Run with event reporting.
    ///
    /// Only configuration problems are returned as errors; every per-file
    /// failure ends up in the report.
    pub fn run_with_events(&self, events: &EventSender) -> Result<RunReport, OrganizerError> {
        let start = Instant::now();
        let started_at = chrono::Local::now();
        let id = uuid::Uuid::new_v4();

        let (source, layout, scratch) = match self.prepare() {
            Ok(prepared) => prepared,
            Err(e) => {
                events.send(Event::Run(RunEvent::Error {
                    message: e.to_string(),
                }));
                return Err(e.into());
            }
        };

        info!(%id, source = %source.display(), destination = %layout.root().display(), "Starting organize run");
        events.send(Event::Run(RunEvent::Started {
            source: source.clone(),
            destination: layout.root().to_path_buf(),
        }));

        let exclude = layout.root().starts_with(&source).then(|| layout.root());
        let scan = self.scanner.scan_with_events(&source, exclude, events)?;
        let total = scan.files.len();

        let mut run = RunState {
            normalizer: Normalizer::new(scratch.path()).with_decoders(Arc::clone(&self.decoders)),
            engine: TransferEngine::new(self.config.chunk_size)
                .with_cancellation(self.cancel.clone()),
            layout,
            seen: SeenFingerprints::new(),
            stats: RunStatistics::default(),
        };

        for issue in scan.issues {
            run.stats.errors.push(FileFailure {
                path: issue.path,
                stage: FailureStage::Scan,
                message: issue.message,
                quarantine: Quarantine::NotAttempted,
            });
        }

        let mut processed = 0usize;
        let mut cancelled = false;

        for file in &scan.files {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            events.send(Event::File(FileEvent::Started {
                path: file.path.clone(),
            }));

            let Some(outcome) = self.process_file(&mut run, file, events) else {
                cancelled = true;
                break;
            };

            processed += 1;
            events.send(Event::File(FileEvent::Finished {
                path: file.path.clone(),
                outcome,
            }));
            events.send(Event::Run(RunEvent::OverallProgress { processed, total }));
        }

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            run.stats.warnings.push(format!(
                "Failed to remove work directory {}: {}",
                scratch_path.display(),
                e
            ));
        }

        let mut report = RunReport {
            id,
            source,
            destination: run.layout.root().to_path_buf(),
            structure: self.config.structure,
            stats: run.stats,
            total_files: total,
            processed_files: processed,
            cancelled,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            report_path: None,
        };

        let report_path = run.layout.report_path();
        match persist_report(&report, &report_path) {
            Ok(()) => report.report_path = Some(report_path),
            Err(e) => {
                warn!(path = %report_path.display(), error = %e, "Failed to write report");
                report.stats.warnings.push(format!(
                    "Failed to write report {}: {}",
                    report_path.display(),
                    e
                ));
            }
        }

        info!(
            processed,
            total,
            errors = report.stats.errors.len(),
            cancelled,
            "Organize run finished"
        );

        if cancelled {
            events.send(Event::Run(RunEvent::Cancelled));
        } else {
            events.send(Event::Run(RunEvent::Completed {
                summary: summarize(&report),
            }));
        }

        Ok(report)
    }

    /// Validate roots, create the layout and the run's scratch directory
    fn prepare(&self) -> Result<(PathBuf, DestinationLayout, TempDir), ConfigurationError> {
        if self.config.chunk_size == 0 {
            return Err(ConfigurationError::ZeroChunkSize);
        }

        let source = &self.config.source;
        if !source.exists() {
            return Err(ConfigurationError::SourceNotFound {
                path: source.clone(),
            });
        }
        if !source.is_dir() {
            return Err(ConfigurationError::SourceNotDirectory {
                path: source.clone(),
            });
        }

        // Canonical roots so the destination subtree is recognized inside the source
        let source = fs::canonicalize(source).unwrap_or_else(|_| source.clone());
        if fs::canonicalize(&self.config.destination).is_ok_and(|d| d == source) {
            return Err(ConfigurationError::DestinationIsSource { path: source });
        }

        let layout = DestinationLayout::new(&self.config.destination, self.config.structure);
        layout.prepare()?;

        let destination = fs::canonicalize(&self.config.destination)
            .unwrap_or_else(|_| self.config.destination.clone());
        let layout = DestinationLayout::new(destination, self.config.structure);

        fs::create_dir_all(&self.work_root).map_err(|e| ConfigurationError::WorkDir {
            path: self.work_root.clone(),
            source: e,
        })?;
        let scratch = tempfile::Builder::new()
            .prefix("media-sorter-")
            .tempdir_in(&self.work_root)
            .map_err(|e| ConfigurationError::WorkDir {
                path: self.work_root.clone(),
                source: e,
            })?;

        Ok((source, layout, scratch))
    }

    /// Drive one file through the pipeline. `None` when cancelled mid-file.
    fn process_file(
        &self,
        run: &mut RunState,
        file: &MediaFile,
        events: &EventSender,
    ) -> Option<FileOutcome> {
        let kind = file.kind();
        debug!(path = %file.path.display(), %kind, size = file.size, "processing");

        let result = match kind {
            MediaKind::NativeImage | MediaKind::ConvertibleImage(_) => {
                self.process_image(run, file, kind, events)
            }
            MediaKind::Video => self.process_video(run, file, events),
            MediaKind::Other => self.process_other(run, file, events),
        };

        match result {
            Ok(outcome) => {
                send_status(events, file, 100.0, FileStatus::Done);
                Some(outcome)
            }
            Err(StepError::Cancelled) => None,
            Err(StepError::Failed { stage, message }) => {
                Some(self.quarantine(run, file, kind, stage, message, events))
            }
        }
    }

    fn process_image(
        &self,
        run: &mut RunState,
        file: &MediaFile,
        kind: MediaKind,
        events: &EventSender,
    ) -> Result<FileOutcome, StepError> {
        let normalized = run.normalizer.normalize(&file.path, kind, events)?;

        if let Some(format) = normalized.converted_from {
            run.stats.record_conversion(format);
        }
        if let Some(MetadataStep::Ignored(reason)) = &normalized.metadata {
            run.stats.warnings.push(format!(
                "EXIF not carried over to converted {}: {}",
                file.path.display(),
                reason
            ));
        }

        let result = self.place_image(run, file, kind, &normalized, events);

        if let Err(e) = normalized.cleanup() {
            run.stats.warnings.push(format!(
                "Failed to delete converted artifact for {}: {}",
                file.path.display(),
                e
            ));
        }

        result
    }

    fn place_image(
        &self,
        run: &mut RunState,
        file: &MediaFile,
        kind: MediaKind,
        normalized: &NormalizedImage,
        events: &EventSender,
    ) -> Result<FileOutcome, StepError> {
        let fp = fingerprint(&normalized.bitmap).map_err(|e| failed_at(FailureStage::Hash, e))?;

        let (content, file_name) = match normalized.artifact_path() {
            Some(artifact) => (artifact, converted_file_name(&file.path)),
            None => (file.path.as_path(), file.file_name().to_os_string()),
        };

        if run.seen.is_duplicate(&fp) {
            debug!(path = %file.path.display(), fingerprint = %fp, "suspect duplicate");
            let target = resolve(&run.layout.suspect_duplicates_dir(), &file_name)
                .map_err(|e| failed_at(FailureStage::Resolve, e))?;
            let outcome = run
                .engine
                .transfer_with_origin(content, &file.path, &target, kind, events)?;
            record_metadata_warning(&mut run.stats, &target, &outcome);
            run.stats.suspect_duplicates += 1;
            return Ok(FileOutcome::SuspectDuplicate);
        }
        run.seen.record(fp);

        // Dated from the original, never from a converted artifact
        let date = resolve_date(&file.path, kind, file.modified);
        record_date_warning(&mut run.stats, file, date.source);

        let target = resolve(&run.layout.photo_dir(&date.key), &file_name)
            .map_err(|e| failed_at(FailureStage::Resolve, e))?;
        let outcome = run
            .engine
            .transfer_with_origin(content, &file.path, &target, kind, events)?;
        record_metadata_warning(&mut run.stats, &target, &outcome);
        run.stats.photos_copied += 1;

        Ok(FileOutcome::Photo)
    }

    fn process_video(
        &self,
        run: &mut RunState,
        file: &MediaFile,
        events: &EventSender,
    ) -> Result<FileOutcome, StepError> {
        let date = resolve_date(&file.path, MediaKind::Video, file.modified);
        record_date_warning(&mut run.stats, file, date.source);

        let target = resolve(&run.layout.video_dir(&date.key), file.file_name())
            .map_err(|e| failed_at(FailureStage::Resolve, e))?;
        run.engine
            .transfer(&file.path, &target, MediaKind::Video, events)?;
        run.stats.videos_copied += 1;

        Ok(FileOutcome::Video)
    }

    fn process_other(
        &self,
        run: &mut RunState,
        file: &MediaFile,
        events: &EventSender,
    ) -> Result<FileOutcome, StepError> {
        let target = resolve(&run.layout.manually_check_dir(), file.file_name())
            .map_err(|e| failed_at(FailureStage::Resolve, e))?;
        run.engine
            .transfer(&file.path, &target, MediaKind::Other, events)?;
        run.stats.manually_checked += 1;

        Ok(FileOutcome::ManualCheck)
    }

    /// Copy the original of a failed file into `Errors/` and record the failure
    fn quarantine(
        &self,
        run: &mut RunState,
        file: &MediaFile,
        kind: MediaKind,
        stage: FailureStage,
        message: String,
        events: &EventSender,
    ) -> FileOutcome {
        warn!(path = %file.path.display(), %stage, %message, "File failed, quarantining");
        send_status(events, file, 0.0, FileStatus::Error);

        let quarantine = resolve(&run.layout.errors_dir(), file.file_name())
            .map_err(|e| e.to_string())
            .and_then(|target| {
                run.engine
                    .transfer(&file.path, &target, kind, events)
                    .map(|_| target)
                    .map_err(|e| e.to_string())
            });

        let (quarantine, outcome) = match quarantine {
            Ok(target) => {
                run.stats.files_moved_to_errors += 1;
                (Quarantine::Copied(target), FileOutcome::Quarantined)
            }
            Err(reason) => (Quarantine::Failed(reason), FileOutcome::Failed),
        };

        run.stats.errors.push(FileFailure {
            path: file.path.clone(),
            stage,
            message,
            quarantine,
        });

        outcome
    }
}

fn persist_report(report: &RunReport, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    write_report(report, BufWriter::new(file))
}

fn summarize(report: &RunReport) -> RunSummary {
    let stats = &report.stats;
    RunSummary {
        total_files: report.total_files,
        processed_files: report.processed_files,
        photos_copied: stats.photos_copied,
        videos_copied: stats.videos_copied,
        suspect_duplicates: stats.suspect_duplicates,
        manually_checked: stats.manually_checked,
        moved_to_errors: stats.files_moved_to_errors,
        converted: stats.total_conversions(),
        error_count: stats.errors.len(),
        report_path: report.report_path.clone(),
        duration_ms: report.duration_ms,
    }
}

fn record_metadata_warning(stats: &mut RunStatistics, target: &Path, outcome: &TransferOutcome) {
    if let Some(MetadataStep::Ignored(reason)) = &outcome.metadata {
        stats.warnings.push(format!(
            "EXIF not copied to {}: {}",
            target.display(),
            reason
        ));
    }
}

fn record_date_warning(stats: &mut RunStatistics, file: &MediaFile, source: DateSource) {
    if source == DateSource::Now {
        stats.warnings.push(format!(
            "No date available for {}, using current time",
            file.path.display()
        ));
    }
}

fn send_status(events: &EventSender, file: &MediaFile, percent: f64, status: FileStatus) {
    events.send(Event::File(FileEvent::Progress(FileProgress {
        percent,
        name: file.display_name(),
        status,
    })));
}
