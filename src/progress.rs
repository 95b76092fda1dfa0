//! Run progress
//!
//! `Progress` is owned by the scanner and read by whoever reports; there is
//! no global counter.

use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    style::Print,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

/// Counters for one run of the tool
#[derive(Debug, Clone, Default)]
pub struct Progress {
    /// Entries handed out so far
    pub processed_count: usize,
    /// Best-effort count of entries the run will see
    pub to_process_count: usize,
    last_fraction: f64,
}

impl Progress {
    pub fn new(to_process_count: usize) -> Self {
        Self {
            to_process_count,
            ..Self::default()
        }
    }

    pub fn record_processed(&mut self) {
        self.processed_count += 1;
    }

    /// Fraction done, clamped to `[0, 1]` and never lower than a previous call
    pub fn fraction(&mut self) -> f64 {
        let raw = self.processed_count as f64 / self.to_process_count.max(1) as f64;
        let fraction = raw.clamp(0.0, 1.0).max(self.last_fraction);
        self.last_fraction = fraction;
        fraction
    }
}

/// Single console line redrawn in place
#[derive(Debug, Clone)]
pub struct ProgressBar {
    length: usize,
    fill: char,
    enabled: bool,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            length: 40,
            fill: '█',
            enabled: true,
        }
    }
}

impl ProgressBar {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// A bar that renders nothing
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Text of one bar line, e.g. `Files processed 3/4 |██████----| 75.0%`
    pub fn render(&self, progress: &mut Progress) -> String {
        let fraction = progress.fraction();
        let filled = ((self.length as f64) * fraction) as usize;
        let bar: String = std::iter::repeat_n(self.fill, filled)
            .chain(std::iter::repeat_n('-', self.length - filled))
            .collect();
        format!(
            "Files processed {}/{} |{}| {:.1}%",
            progress.processed_count,
            progress.to_process_count,
            bar,
            fraction * 100.0
        )
    }

    /// Redraw the bar on stdout, ending the line once complete
    pub fn draw(&self, progress: &mut Progress) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let line = self.render(progress);
        let mut out = io::stdout();
        out.queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(line))?;
        if progress.fraction() >= 1.0 {
            out.queue(Print("\n"))?;
        }
        out.flush()
    }
}
