//! reimage - copy or move images into a tree named by creation time
//!
//! This library provides:
//! - Creation time resolution from file system timestamps and EXIF
//!   `DateTimeOriginal`, with per-device timezone correction
//! - Destination planning that mirrors the source tree, renames images
//!   by date and never overwrites an existing file
//! - A lazy source scanner with run progress
//! - Copy/move primitives that stamp the resolved time on the result

pub mod cli;
pub mod config;
pub mod error;
pub mod fs_ops;
pub mod plan;
pub mod process;
pub mod progress;
pub mod scan;
pub mod time;

pub use cli::Cli;
pub use config::{Config, ConfigError, FileOperation};
pub use error::{Error, Result};
pub use plan::plan_destination;
pub use process::{FileResult, ProcessingStats, ProcessingStatus, Processor};
pub use progress::{Progress, ProgressBar};
pub use scan::{Scanner, SourceEntry, is_processable};
pub use time::{ResolvedTimestamp, TimeSource, TimezoneTable, resolve_creation_time};
