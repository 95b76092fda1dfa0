//! Source tree traversal
//!
//! Yields non-directory entries one at a time, skipping the output
//! directory when it lives inside the source.

use crate::error::Error;
use crate::progress::Progress;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A file handed out by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Regular file whose extension matches `extension` (`".jpg"`), ignoring case
pub fn is_processable(path: &Path, extension: &str) -> bool {
    if !path.is_file() {
        return false;
    }

    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

fn walker(
    root: &Path,
    excluded: &Path,
    recursive: bool,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + use<> {
    let excluded = excluded.to_path_buf();
    let mut walk = WalkDir::new(root).min_depth(1);
    if !recursive {
        walk = walk.max_depth(1);
    }
    walk.into_iter().filter_entry(move |e| {
        if e.path() == excluded {
            debug!(path = ?e.path(), "Excluding output directory from scan");
            return false;
        }
        true
    })
}

/// Count the files a scan of `root` will yield
pub fn count_files(root: &Path, excluded: &Path, recursive: bool) -> usize {
    walker(root, excluded, recursive)
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .count()
}

/// Lazy depth-first walk over a source tree.
///
/// Not resumable: create a new scanner to start over.
pub struct Scanner {
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
    progress: Progress,
}

impl Scanner {
    /// Start a scan of `root`; `excluded` and everything under it is skipped
    pub fn new(root: &Path, excluded: &Path, recursive: bool) -> Self {
        let total = count_files(root, excluded, recursive);
        debug!(?root, total, recursive, "Counted files to scan");

        Self {
            entries: Box::new(walker(root, excluded, recursive)),
            progress: Progress::new(total),
        }
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl Iterator for Scanner {
    type Item = SourceEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.entries.next()? {
                Ok(entry) if entry.file_type().is_dir() => continue,
                Ok(entry) => {
                    self.progress.record_processed();
                    if self.progress.processed_count > self.progress.to_process_count {
                        self.progress.to_process_count = self.progress.processed_count;
                    }
                    return Some(SourceEntry {
                        path: entry.into_path(),
                        is_dir: false,
                    });
                }
                Err(e) => {
                    let e = Error::from(e);
                    warn!(error = %e, "Skipping unreadable entry");
                }
            }
        }
    }
}
