//! Main file processor
//!
//! Walks the source tree one file at a time:
//! - resolving the earliest creation time of processable images
//! - planning a collision-free destination
//! - copying or moving the file and stamping its modification time

use crate::config::{Config, FileOperation};
use crate::error::{Error, Result};
use crate::fs_ops::{copy_to_dest, create_directory, move_to_dest};
use crate::plan::plan_destination;
use crate::progress::ProgressBar;
use crate::scan::{Scanner, is_processable};
use crate::time::{ResolvedTimestamp, TimezoneTable, resolve_creation_time};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,
    /// Destination file path (if planned)
    pub destination: Option<PathBuf>,
    /// Resolved creation time (processable files only)
    pub time_info: Option<ResolvedTimestamp>,
    /// Processing status
    pub status: ProcessingStatus,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Status of file processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// Renamed by its creation time
    Renamed,
    /// Relocated under its original name
    Relocated,
    /// Processing failed
    Failed,
    /// Dry run - would have processed
    DryRun,
}

/// Processing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub renamed: usize,
    pub relocated: usize,
    pub unresolved: usize,
    pub failed: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Renamed: {}, Relocated: {}, Unresolved: {}, Failed: {}",
            self.total_files, self.renamed, self.relocated, self.unresolved, self.failed
        )
    }
}

/// Main processor for organizing image files
pub struct Processor {
    config: Config,
    source_dir: PathBuf,
    output_dir: PathBuf,
    extension: String,
    timezones: TimezoneTable,
    progress_bar: ProgressBar,
    stats: ProcessingStats,
}

impl Processor {
    /// Validate the configuration and prepare a run.
    ///
    /// Fails on a missing or non-directory source and on unknown timezone
    /// ids. Creates the output directory unless this is a dry run.
    pub fn new(mut config: Config) -> Result<Self> {
        let source_dir = validate_source_dir(&config.source_dir)?;
        let timezones = config.timezone_table()?;

        // Scanned paths are canonical, so the excluded output dir must be too
        config.source_dir = source_dir.clone();
        let output_dir = config.resolved_output_dir();
        if !config.dry_run {
            create_directory(&output_dir)?;
        }
        let output_dir = fs::canonicalize(&output_dir).unwrap_or(output_dir);

        info!(
            source = %source_dir.display(),
            output = %output_dir.display(),
            extension = %config.normalized_extension(),
            recursive = config.recursive,
            operation = ?config.operation,
            timezones = timezones.len(),
            "Processor ready"
        );

        Ok(Self {
            extension: config.normalized_extension(),
            config,
            source_dir,
            output_dir,
            timezones,
            progress_bar: ProgressBar::default(),
            stats: ProcessingStats::new(),
        })
    }

    /// Replace the console progress bar (e.g. with `ProgressBar::hidden()`)
    pub fn with_progress_bar(mut self, progress_bar: ProgressBar) -> Self {
        self.progress_bar = progress_bar;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the processing pipeline
    pub fn run(&mut self) -> Result<Vec<FileResult>> {
        let _span = span!(Level::INFO, "processor_run").entered();

        info!("Scanning source directory...");
        let mut scanner = Scanner::new(&self.source_dir, &self.output_dir, self.config.recursive);
        self.stats.total_files = scanner.progress().to_process_count;
        info!(count = self.stats.total_files, "Found files");

        let mut results = Vec::new();
        while let Some(entry) = scanner.next() {
            let result = self.process_entry(&entry.path);
            match result.status {
                ProcessingStatus::Renamed => self.stats.renamed += 1,
                ProcessingStatus::Relocated => self.stats.relocated += 1,
                ProcessingStatus::Failed => self.stats.failed += 1,
                ProcessingStatus::DryRun => {}
            }
            results.push(result);

            if let Err(e) = self.progress_bar.draw(scanner.progress_mut()) {
                debug!(error = %e, "Failed to draw progress bar");
            }
        }

        // Entries may have appeared or vanished since the upfront count
        self.stats.total_files = scanner.progress().processed_count;

        info!("{}", self.stats.summary());
        Ok(results)
    }

    /// Process one file. Per-file errors are captured in the result.
    fn process_entry(&mut self, path: &Path) -> FileResult {
        let _file_span = span!(Level::DEBUG, "process_file", ?path).entered();

        let processable = is_processable(path, &self.extension);
        let time_info = if processable {
            match resolve_creation_time(path, &self.timezones) {
                Ok(resolved) => Some(resolved),
                Err(e) => {
                    warn!(?path, error = %e, "Couldn't get creation time");
                    self.stats.unresolved += 1;
                    None
                }
            }
        } else {
            info!(
                ?path,
                extension = %self.extension,
                "Extension does not match, relocating without renaming"
            );
            None
        };

        match self.place_file(path, processable, time_info.as_ref()) {
            Ok((destination, status)) => FileResult {
                source: path.to_path_buf(),
                destination: Some(destination),
                time_info,
                status,
                error: None,
            },
            Err(e) => {
                error!(?path, error = %e, "Failed to process file");
                FileResult {
                    source: path.to_path_buf(),
                    destination: None,
                    time_info,
                    status: ProcessingStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Plan the destination and perform the copy/move
    fn place_file(
        &self,
        path: &Path,
        processable: bool,
        time_info: Option<&ResolvedTimestamp>,
    ) -> Result<(PathBuf, ProcessingStatus)> {
        let local_time = time_info.map(|t| t.instant.with_timezone(&Local));
        let dest_path = plan_destination(
            &self.source_dir,
            path,
            local_time.as_ref(),
            &self.output_dir,
            processable,
        )?;

        if self.config.dry_run {
            info!(
                source = ?path,
                destination = ?dest_path,
                time_source = ?time_info.map(|t| t.source),
                "Would process file"
            );
            return Ok((dest_path, ProcessingStatus::DryRun));
        }

        if let Some(parent) = dest_path.parent() {
            create_directory(parent)?;
        }

        let instant = time_info.map(|t| &t.instant);
        match self.config.operation {
            FileOperation::Copy => copy_to_dest(path, &dest_path, instant)?,
            FileOperation::Move => move_to_dest(path, &dest_path, instant)?,
        }

        let status = match time_info {
            Some(t) => {
                info!(
                    source = ?path,
                    destination = ?dest_path,
                    time_source = ?t.source,
                    timestamp = %t.instant,
                    "Renamed file"
                );
                ProcessingStatus::Renamed
            }
            None => {
                debug!(source = ?path, destination = ?dest_path, "Relocated file");
                ProcessingStatus::Relocated
            }
        };

        Ok((dest_path, status))
    }

    /// Get processing statistics reference
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }
}

/// Check that the source is an existing directory and canonicalize it
fn validate_source_dir(source: &Path) -> Result<PathBuf> {
    if source.as_os_str().is_empty() {
        return Err(Error::Config("No source directory given".into()));
    }

    let metadata = fs::metadata(source).map_err(|e| Error::SourceDirectory {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(Error::SourceDirectory {
            path: source.to_path_buf(),
            message: "not a directory".into(),
        });
    }

    fs::canonicalize(source).map_err(|e| Error::SourceDirectory {
        path: source.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::dated_file_name;
    use crate::time::exif::fixture::jpeg_with_exif;
    use chrono::{TimeZone, Utc};
    use filetime::FileTime;
    use std::collections::BTreeMap;

    fn config_for(source: &Path) -> Config {
        Config {
            source_dir: source.to_path_buf(),
            timezones: BTreeMap::from([("test cam".to_string(), "UTC".to_string())]),
            ..Config::default()
        }
    }

    fn processor(config: Config) -> Processor {
        Processor::new(config)
            .unwrap()
            .with_progress_bar(ProgressBar::hidden())
    }

    fn capture_name() -> String {
        let capture = Utc.with_ymd_and_hms(2019, 3, 14, 9, 30, 0).unwrap();
        dated_file_name(&capture.with_timezone(&Local), ".jpg")
    }

    #[test]
    fn test_processing_stats() {
        let stats = ProcessingStats {
            total_files: 9,
            renamed: 5,
            relocated: 2,
            unresolved: 1,
            failed: 1,
        };

        let summary = stats.summary();
        assert!(summary.contains("Total: 9"));
        assert!(summary.contains("Renamed: 5"));
        assert!(summary.contains("Relocated: 2"));
        assert!(summary.contains("Failed: 1"));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("nope"));
        assert!(matches!(
            Processor::new(config),
            Err(Error::SourceDirectory { .. })
        ));
    }

    #[test]
    fn test_invalid_timezone_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config
            .timezones
            .insert("bad cam".into(), "Not/AZone".into());
        assert!(matches!(
            Processor::new(config),
            Err(Error::InvalidTimezone { .. })
        ));
    }

    #[test]
    fn test_copy_renames_image_and_relocates_misc() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("trip")).unwrap();
        fs::write(
            src.path().join("trip/a.jpg"),
            jpeg_with_exif("2019:03:14 09:30:00", Some("Test Cam")),
        )
        .unwrap();
        fs::write(src.path().join("trip/notes.txt"), b"notes").unwrap();

        let mut processor = processor(config_for(src.path()));
        let results = processor.run().unwrap();
        let out = processor.output_dir().to_path_buf();

        assert_eq!(results.len(), 2);
        assert!(out.join("trip").join(capture_name()).is_file());
        assert_eq!(fs::read(out.join("trip/notes.txt")).unwrap(), b"notes");
        assert!(src.path().join("trip/a.jpg").exists());

        let stats = processor.stats();
        assert_eq!(stats.renamed, 1);
        assert_eq!(stats.relocated, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.total_files, 2);
    }

    #[test]
    fn test_move_stamps_resolved_time() {
        let src = tempfile::tempdir().unwrap();
        let source = src.path().join("a.jpg");
        fs::write(
            &source,
            jpeg_with_exif("2019:03:14 09:30:00", Some("Test Cam")),
        )
        .unwrap();

        let mut config = config_for(src.path());
        config.operation = FileOperation::Move;
        let mut processor = processor(config);
        let results = processor.run().unwrap();

        assert_eq!(results.len(), 1);
        let dest = results[0].destination.clone().unwrap();
        assert!(!source.exists());
        assert!(dest.is_file());

        let expected = Utc.with_ymd_and_hms(2019, 3, 14, 9, 30, 0).unwrap();
        let mtime = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(mtime.unix_seconds(), expected.timestamp());
        assert_eq!(results[0].time_info.unwrap().instant, expected);
    }

    #[test]
    fn test_rerun_suffixes_instead_of_overwriting() {
        let src = tempfile::tempdir().unwrap();
        fs::write(
            src.path().join("a.jpg"),
            jpeg_with_exif("2019:03:14 09:30:00", Some("Test Cam")),
        )
        .unwrap();

        let mut first = processor(config_for(src.path()));
        first.run().unwrap();
        let mut second = processor(config_for(src.path()));
        let results = second.run().unwrap();

        let out = second.output_dir().to_path_buf();
        let base = capture_name();
        let suffixed = format!("{}_1.jpg", base.trim_end_matches(".jpg"));
        assert_eq!(results.len(), 1);
        assert!(out.join(&base).is_file());
        assert!(out.join(&suffixed).is_file());
    }

    #[test]
    fn test_non_recursive_leaves_subdirectories() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("nested")).unwrap();
        fs::write(src.path().join("top.txt"), b"t").unwrap();
        fs::write(src.path().join("nested/deep.txt"), b"d").unwrap();

        let mut config = config_for(src.path());
        config.recursive = false;
        let mut processor = processor(config);
        let results = processor.run().unwrap();

        assert_eq!(results.len(), 1);
        assert!(processor.output_dir().join("top.txt").is_file());
        assert!(!processor.output_dir().join("nested").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("notes.txt"), b"n").unwrap();

        let mut config = config_for(src.path());
        config.dry_run = true;
        let mut processor = processor(config);
        let results = processor.run().unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ProcessingStatus::DryRun);
        assert!(!src.path().join("output").exists());
    }

    #[test]
    fn test_separate_destination() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(src.path().join("b.txt"), b"b").unwrap();

        let mut config = config_for(src.path());
        config.output_dir = Some(out.path().join("sorted"));
        let mut processor = processor(config);
        processor.run().unwrap();

        assert!(out.path().join("sorted/b.txt").is_file());
    }
}
