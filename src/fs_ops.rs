//! Copy and move primitives

use crate::error::Result;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, trace};

/// Create a directory and its parents; an existing directory is fine
pub fn create_directory(path: &Path) -> Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Copy `source` to `dest`, then stamp `dest` with `time` (or the source's
/// own modification time when `time` is `None`)
pub fn copy_to_dest(source: &Path, dest: &Path, time: Option<&DateTime<Utc>>) -> Result<()> {
    let source_mtime = source_modification_time(source);
    copy_file(source, dest)?;
    stamp(dest, time, source_mtime)
}

/// Move `source` to `dest`, falling back to copy + delete across file systems
pub fn move_to_dest(source: &Path, dest: &Path, time: Option<&DateTime<Utc>>) -> Result<()> {
    let source_mtime = source_modification_time(source);
    if let Err(e) = fs::rename(source, dest) {
        debug!(?source, ?dest, error = %e, "Rename failed, copying instead");
        copy_file(source, dest)?;
        fs::remove_file(source)?;
    }
    stamp(dest, time, source_mtime)
}

fn source_modification_time(source: &Path) -> Option<FileTime> {
    fs::metadata(source)
        .ok()
        .map(|metadata| FileTime::from_last_modification_time(&metadata))
}

fn stamp(dest: &Path, time: Option<&DateTime<Utc>>, fallback: Option<FileTime>) -> Result<()> {
    let file_time = match time {
        Some(time) => Some(FileTime::from_unix_time(
            time.timestamp(),
            time.timestamp_subsec_nanos(),
        )),
        None => fallback,
    };

    if let Some(file_time) = file_time {
        trace!(?dest, ?file_time, "Setting file times");
        filetime::set_file_times(dest, file_time, file_time)?;
    }
    Ok(())
}

/// Copy file with buffered I/O
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mtime_of(path: &Path) -> i64 {
        FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
    }

    #[test]
    fn test_create_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        create_directory(&nested).unwrap();
        create_directory(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_create_directory_over_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, b"x").unwrap();
        assert!(create_directory(&file).is_err());
    }

    #[test]
    fn test_copy_sets_resolved_time() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        let dest = dir.path().join("b.jpg");
        fs::write(&source, b"image").unwrap();
        let time = Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap();

        copy_to_dest(&source, &dest, Some(&time)).unwrap();

        assert!(source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"image");
        assert_eq!(mtime_of(&dest), time.timestamp());
    }

    #[test]
    fn test_copy_preserves_source_time() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        let dest = dir.path().join("copy.txt");
        fs::write(&source, b"text").unwrap();
        filetime::set_file_mtime(&source, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();

        copy_to_dest(&source, &dest, None).unwrap();

        assert_eq!(mtime_of(&dest), 1_000_000_000);
    }

    #[test]
    fn test_move_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        let dest = dir.path().join("moved.jpg");
        fs::write(&source, b"image").unwrap();
        let time = Utc.with_ymd_and_hms(2018, 7, 4, 12, 0, 0).unwrap();

        move_to_dest(&source, &dest, Some(&time)).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"image");
        assert_eq!(mtime_of(&dest), time.timestamp());
    }
}
