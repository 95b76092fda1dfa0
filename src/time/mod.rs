//! Creation time resolution
//!
//! A file's creation time is the earliest of:
//! - file system modification time
//! - file system birth time (modification time where the platform has none)
//! - EXIF `DateTimeOriginal`, corrected for the device's timezone

pub mod exif;
pub mod timezone;

pub use self::exif::{ExifSnapshot, read_exif_snapshot};
pub use self::timezone::TimezoneTable;

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Source of the resolved timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// File system modification time
    Modified,
    /// File system birth time
    Created,
    /// EXIF capture time
    Exif,
}

/// Earliest known creation instant of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub instant: DateTime<Utc>,
    pub source: TimeSource,
}

/// Modification and birth time of a file, as UTC instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSystemTimes {
    pub modified: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

/// Stat a file and read both of its file system timestamps
pub fn file_system_times(path: &Path) -> Result<FileSystemTimes> {
    let metadata = fs::metadata(path)?;
    let modified = metadata.modified()?;
    let created = match metadata.created() {
        Ok(created) => created,
        Err(e) => {
            trace!(?path, error = %e, "No birth time on this platform, using modification time");
            modified
        }
    };

    Ok(FileSystemTimes {
        modified: modified.into(),
        created: created.into(),
    })
}

/// Capture instant from EXIF, if the file is an image that carries one
pub fn capture_instant(path: &Path, timezones: &TimezoneTable) -> Option<DateTime<Utc>> {
    let snapshot = match read_exif_snapshot(path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(?path, error = %e, "No EXIF metadata, using file system times only");
            return None;
        }
    };

    let capture = snapshot.capture_timestamp?;
    Some(timezones.localize_capture(&capture, snapshot.device_model.as_deref()))
}

/// Resolve the earliest creation instant of a file.
///
/// Fails only when the file itself cannot be stat'ed; missing or corrupt
/// EXIF just drops that candidate.
pub fn resolve_creation_time(path: &Path, timezones: &TimezoneTable) -> Result<ResolvedTimestamp> {
    let fs_times = file_system_times(path)?;

    let mut candidates = vec![
        (fs_times.modified, TimeSource::Modified),
        (fs_times.created, TimeSource::Created),
    ];
    if let Some(capture) = capture_instant(path, timezones) {
        candidates.push((capture, TimeSource::Exif));
    }

    // min_by_key keeps the first of equal minimums, so ties favour file system times
    let (instant, source) = candidates
        .into_iter()
        .min_by_key(|(instant, _)| *instant)
        .unwrap_or((fs_times.modified, TimeSource::Modified));

    debug!(?path, %instant, ?source, "Resolved creation time");
    Ok(ResolvedTimestamp { instant, source })
}
