//! CLI argument parsing with clap

use crate::config::{Config, FileOperation};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// reimage - copy or move images into a tree named by when they were taken
///
/// Every file under the source is copied (or moved) to the destination,
/// keeping its relative folder. Files with the chosen extension are renamed
/// to their earliest known creation time, taken from file system timestamps
/// and EXIF capture data.
#[derive(Parser, Debug)]
#[command(name = "reimage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// Settings from the file are used as defaults; CLI arguments override them.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Source directory to scan
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Destination directory. If not specified then an `output` directory
    /// is created within the source directory.
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// File extension of images to rename, by default .jpg
    #[arg(short = 'x', long)]
    pub extension: Option<String>,

    /// Descend into subdirectories (default: true)
    #[arg(long, num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    pub recursive: Option<bool>,

    /// Move instead of copying to the destination directory
    #[arg(long = "move")]
    pub move_files: bool,

    /// Device timezone override, e.g. "nikon d5600=Asia/Tokyo" (repeatable)
    #[arg(short = 't', long = "timezone", value_parser = parse_timezone_entry)]
    pub timezones: Vec<(String, String)>,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Write an annotated sample configuration file to this path and exit
    #[arg(long, value_name = "PATH")]
    pub init_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

/// Parse `MODEL=ZONE`; the model is lowercased
fn parse_timezone_entry(s: &str) -> Result<(String, String), String> {
    let (model, zone) = s
        .split_once('=')
        .ok_or_else(|| format!("expected MODEL=ZONE, got '{}'", s))?;
    let model = model.trim().to_lowercase();
    let zone = zone.trim().to_string();
    if model.is_empty() || zone.is_empty() {
        return Err(format!("expected MODEL=ZONE, got '{}'", s));
    }
    Ok((model, zone))
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref source) = self.source {
            config.source_dir = source.clone();
        }
        if let Some(ref destination) = self.destination {
            config.output_dir = Some(destination.clone());
        }
        if let Some(ref extension) = self.extension {
            config.extension = extension.clone();
        }
        if let Some(recursive) = self.recursive {
            config.recursive = recursive;
        }
        if self.move_files {
            config.operation = FileOperation::Move;
        }
        for (model, zone) in &self.timezones {
            config.timezones.insert(model.clone(), zone.clone());
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
