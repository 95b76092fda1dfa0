//! Destination path planning
//!
//! Maps a source file to its place under the output root: the relative
//! subdirectory is mirrored, processable files get a date-based name and
//! nothing that already exists is ever returned.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Directory of `source_path` relative to `source_root`.
///
/// The root is removed once from the front of the parent directory;
/// trailing separators on the root are tolerated and leading separators on
/// the remainder are trimmed.
pub fn relative_subdirectory(source_root: &Path, source_path: &Path) -> PathBuf {
    let parent = source_path.parent().unwrap_or_else(|| Path::new(""));

    if let Ok(relative) = parent.strip_prefix(source_root) {
        return relative.to_path_buf();
    }

    // Not a component-wise prefix, fall back to textual removal
    let root = source_root.to_string_lossy();
    let root = root.trim_end_matches(['/', MAIN_SEPARATOR]);
    let parent = parent.to_string_lossy();
    let stripped = if root.is_empty() {
        parent.to_string()
    } else {
        parent.replacen(root, "", 1)
    };
    PathBuf::from(stripped.trim_start_matches(['/', MAIN_SEPARATOR]))
}

/// Extension of `path` with its leading dot, case preserved (`".JPG"`)
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// `{year}_{month}_{day}_{hour}_{minute}_{second}{extension}`, unpadded.
///
/// Components are read in the timezone `time` carries; pass a `Local`
/// instant to name files by local wall-clock time.
pub fn dated_file_name<Z: TimeZone>(time: &DateTime<Z>, extension: &str) -> String {
    format!(
        "{}_{}_{}_{}_{}_{}{}",
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
        extension
    )
}

/// Plan where `source_path` goes under `output_root`.
///
/// Processable files with a resolved time are renamed by date; everything
/// else keeps its original file name. The result never names an existing
/// file at the time of the call.
pub fn plan_destination<Z: TimeZone>(
    source_root: &Path,
    source_path: &Path,
    resolved: Option<&DateTime<Z>>,
    output_root: &Path,
    is_processable: bool,
) -> Result<PathBuf> {
    let file_name = match resolved {
        Some(time) if is_processable => dated_file_name(time, &dotted_extension(source_path)),
        _ => source_path
            .file_name()
            .ok_or_else(|| Error::InvalidFileName {
                path: source_path.to_path_buf(),
            })?
            .to_string_lossy()
            .into_owned(),
    };

    let candidate = output_root
        .join(relative_subdirectory(source_root, source_path))
        .join(file_name);

    resolve_filename_conflict(candidate)
}

/// Resolve filename conflicts by adding a numeric suffix before the extension
pub fn resolve_filename_conflict(path: PathBuf) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path);
    }

    let stem = path
        .file_stem()
        .ok_or_else(|| Error::InvalidFileName { path: path.clone() })?
        .to_string_lossy()
        .into_owned();
    let extension = dotted_extension(&path);
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    (1u64..)
        .map(|i| parent.join(format!("{}_{}{}", stem, i, extension)))
        .find(|candidate| !candidate.exists())
        .ok_or(Error::InvalidFileName { path })
}
