//! Configuration types for reimage

use crate::error::Result;
use crate::time::TimezoneTable;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the output directory created inside the source when none is given
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "output";

/// File operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    /// Copy files to destination
    #[default]
    Copy,
    /// Move files to destination
    Move,
}

/// Configuration for a reimage run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory to scan
    pub source_dir: PathBuf,

    /// Root directory to write into (defaults to `<source>/output`)
    pub output_dir: Option<PathBuf>,

    /// Extension of files that get renamed by date
    pub extension: String,

    /// Descend into subdirectories
    pub recursive: bool,

    /// File operation mode
    pub operation: FileOperation,

    /// Plan destinations without touching the file system
    pub dry_run: bool,

    /// Verbose output
    pub verbose: bool,

    /// Device model (lowercase) -> IANA timezone of its clock
    pub timezones: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            output_dir: None,
            extension: ".jpg".into(),
            recursive: true,
            operation: FileOperation::default(),
            dry_run: false,
            verbose: false,
            timezones: BTreeMap::from([("nikon d5600".to_string(), "Asia/Tokyo".to_string())]),
        }
    }
}

impl Config {
    /// Target extension, lowercased with a leading dot (`"JPG"` -> `".jpg"`)
    pub fn normalized_extension(&self) -> String {
        let ext = self.extension.trim().trim_start_matches('.').to_lowercase();
        format!(".{}", ext)
    }

    /// Output directory, falling back to `<source>/output`
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.source_dir.join(DEFAULT_OUTPUT_DIR_NAME))
    }

    /// Build the timezone table, failing on the first unknown IANA id
    pub fn timezone_table(&self) -> Result<TimezoneTable> {
        TimezoneTable::from_entries(&self.timezones)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Write the annotated sample configuration to `path`, creating parent directories
    pub fn write_sample_config<P: AsRef<Path>>(path: P) -> std::result::Result<(), ConfigError> {
        let path = path.as_ref();
        let write_error = |e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, Self::sample_config()).map_err(write_error)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# reimage configuration file
# This file uses TOML format (https://toml.io)

# Directory to scan for images
source_dir = "D:/Camera"

# Directory to write into. Defaults to an `output` folder inside source_dir,
# which is never scanned itself.
output_dir = "D:/Sorted"

# Files with this extension are renamed to YYYY_M_D_h_m_s.<ext>;
# everything else is copied/moved under its original name.
extension = ".jpg"

# Descend into subdirectories
recursive = true

# File operation: "copy" or "move"
operation = "copy"

# Show what would be done without doing it
dry_run = false

# Verbose output
verbose = false

# Timezone each camera's clock was set to, keyed by lowercase EXIF model.
# Unlisted models are read in the local system timezone.
[timezones]
"nikon d5600" = "Asia/Tokyo"
"#
        .to_string()
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to write configuration file
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path.display(), source)
            }
            ConfigError::ParseError { path, source } => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), source)
            }
            ConfigError::WriteError { path, source } => {
                write!(f, "Failed to write config file '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::WriteError { source, .. } => Some(source),
        }
    }
}
