//! Error types for reimage

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for reimage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for reimage
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read EXIF data from {path}: {message}")]
    ExifRead { path: PathBuf, message: String },

    #[error("Invalid timezone '{timezone}' configured for device model '{model}'")]
    InvalidTimezone { model: String, timezone: String },

    #[error("Source directory {path} is not usable: {message}")]
    SourceDirectory { path: PathBuf, message: String },

    #[error("Path has no usable file name: {path}")]
    InvalidFileName { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
