//! reimage - image file organizing utility
//!
//! Copies or moves files from a source tree into a destination tree,
//! renaming images by the earliest time they are known to have been taken.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use reimage::{Cli, Config, ProcessingStatus, Processor};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli_output {
    //! Colored summary output for the terminal

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    pub fn print_separator() {
        let _ = stdout().execute(Print(format!("{}\n", "─".repeat(60))));
    }

    pub fn print_title(title: &str) {
        let _ = stdout().execute(Print(format!("{:^60}\n", title).bold()));
    }

    pub fn print_warning(msg: &str) {
        let _ = stdout().execute(Print(style("⚠ ").with(CliTheme::WARNING).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a statistic line
    pub fn print_stat(key: &str, value: &str, color: Color) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(key).with(CliTheme::HINT)));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(style(value).with(color).bold()));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print one processed file
    pub fn print_result(status_icon: &str, status_color: Color, source: &str, dest_or_msg: &str) {
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(style(status_icon).with(status_color).bold()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(source).italic()));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(style(dest_or_msg).with(CliTheme::HINT)));
        let _ = stdout().execute(Print("\n"));
    }

    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print(style("  Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }

    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.init_config {
        Config::write_sample_config(path)?;
        println!("Sample configuration written to {}", path.display());
        return Ok(());
    }

    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, &cli);
    let _guard = setup_logging(&cli, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "reimage starting");

    // Configuration errors end the run here with a non-zero exit code
    let config = load_config(&cli)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    let dry_run = config.dry_run;
    let mut processor = Processor::new(config).context("Invalid configuration")?;
    let results = processor.run()?;

    print_summary(&processor, &results, cli.verbose, dry_run);

    cli_output::print_separator();
    cli_output::print_log_path(&log_path.display().to_string());
    info!(log_file = %log_path.display(), "Processing complete. Log saved to");

    Ok(())
}

fn print_summary(
    processor: &Processor,
    results: &[reimage::FileResult],
    verbose: bool,
    dry_run: bool,
) {
    use cli_output::*;

    let stats = processor.stats();

    print_separator();
    print_title("Processing complete");
    print_separator();
    print_blank();
    print_stat("Renamed", &stats.renamed.to_string(), CliTheme::SUCCESS);
    print_stat("Relocated", &stats.relocated.to_string(), CliTheme::ACCENT);
    print_stat("No creation time", &stats.unresolved.to_string(), CliTheme::WARNING);
    print_stat("Failed", &stats.failed.to_string(), CliTheme::ERROR);
    print_blank();

    if verbose {
        print_separator();
        for result in results {
            let source = result.source.display().to_string();
            let dest = result
                .destination
                .as_ref()
                .map(|p| format!("→ {}", p.display()))
                .unwrap_or_default();
            match result.status {
                ProcessingStatus::Renamed => print_result("✓", CliTheme::SUCCESS, &source, &dest),
                ProcessingStatus::Relocated => print_result("→", CliTheme::ACCENT, &source, &dest),
                ProcessingStatus::DryRun => print_result("~", CliTheme::ACCENT, &source, &dest),
                ProcessingStatus::Failed => print_result(
                    "✗",
                    CliTheme::ERROR,
                    &source,
                    result.error.as_deref().unwrap_or("unknown error"),
                ),
            }
        }
    }

    let failed: Vec<_> = results
        .iter()
        .filter(|r| r.status == ProcessingStatus::Failed)
        .collect();
    if !failed.is_empty() {
        print_separator();
        print_error(&format!("{} files failed", failed.len()));
        for result in failed {
            print_result(
                "✗",
                CliTheme::ERROR,
                &result.source.display().to_string(),
                result.error.as_deref().unwrap_or("unknown error"),
            );
        }
    }

    if dry_run {
        print_separator();
        print_warning("Dry run: no files were copied or moved");
    }
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        log_dir
            .join(&config_name)
            .join(format!("{}_{}.log", config_name, timestamp))
    } else {
        log_dir.join(format!("Reimage_{}.log", timestamp))
    }
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    if config.source_dir.as_os_str().is_empty() {
        anyhow::bail!("No source directory given. Use --source <DIR> or set source_dir in a config file");
    }

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}
