//! Console rendering of the shared timer state.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use xrsplit_core::{Config, TimerReading, format_time};

/// Run time at which each split was entered, derived from index changes.
#[derive(Debug, Default)]
pub struct SplitLog {
    entered: Vec<f64>,
}

impl SplitLog {
    /// Follow the split index. Index 0 clears the log; a lower index drops
    /// the newest entries; a higher one records `total` for each step, up to
    /// one past the last split. Run time going backwards means a new run
    /// started without passing through index 0, so the log starts over.
    ///
    /// Returns the 1-based numbers of splits completed by this call.
    pub fn observe(&mut self, index: usize, total: f64, split_count: usize) -> Vec<usize> {
        if index == 0 {
            self.entered.clear();
            return Vec::new();
        }
        if self.entered.last().is_some_and(|&last| total < last) {
            self.entered.clear();
        }

        self.entered.truncate(index);
        let mut completed = Vec::new();
        while self.entered.len() < index && self.entered.len() <= split_count {
            self.entered.push(total);
            if self.entered.len() > 1 {
                completed.push(self.entered.len() - 1);
            }
        }
        completed
    }

    /// Time spent in the current split.
    pub fn segment_time(&self, total: f64) -> f64 {
        total - self.entered.last().copied().unwrap_or(0.0)
    }

    /// Duration of completed split `number` (1-based), or its end time if `cumulative`.
    pub fn split_time(&self, number: usize, cumulative: bool) -> Option<f64> {
        let end = *self.entered.get(number)?;
        if cumulative {
            Some(end)
        } else {
            Some(end - self.entered[number - 1])
        }
    }
}

pub struct ConsoleDisplay {
    config: Config,
    log: SplitLog,
    last_width: usize,
}

impl ConsoleDisplay {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            log: SplitLog::default(),
            last_width: 0,
        }
    }

    /// Build the status line without colors.
    pub fn status_line(&self, reading: &TimerReading) -> String {
        let precision = self.config.precision();
        let label = match (reading.running, reading.paused) {
            (false, _) if reading.display_total => "DONE",
            (false, _) => "IDLE",
            (true, true) => "LOAD",
            (true, false) => "RUN ",
        };

        let mut line = format!("[{}] {}", label, format_time(reading.accumulated_time, precision));
        if self.config.segment_time {
            let segment = self.log.segment_time(reading.accumulated_time);
            line.push_str(&format!("  seg {}", format_time(segment, precision)));
        }

        let splits = &self.config.splits;
        if !splits.is_empty() && reading.split_index > 0 {
            let shown = reading.split_index.min(splits.len());
            line.push_str(&format!("  [{}/{}] {}", shown, splits.len(), splits[shown - 1].name));
        }

        if reading.display_total {
            line.push_str(&format!("  Total {}", format_time(reading.accumulated_time, 3)));
        }
        line
    }

    /// Track splits and redraw the status line in place.
    pub fn draw(&mut self, reading: &TimerReading) -> io::Result<()> {
        let completed = self.log.observe(
            reading.split_index,
            reading.accumulated_time,
            self.config.splits.len(),
        );

        let mut out = io::stdout().lock();
        if self.config.show_splits {
            for number in completed {
                let Some(split) = self.config.splits.get(number - 1) else {
                    continue;
                };
                let time = self
                    .log
                    .split_time(number, self.config.splits_total)
                    .unwrap_or_default();
                let reference = if split.time.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", split.time)
                };
                writeln!(
                    out,
                    "\r{:<width$}\r{:>3}. {:<24} {}{}",
                    "",
                    number,
                    split.name,
                    format_time(time, 3).bold(),
                    reference.dimmed(),
                    width = self.last_width
                )?;
            }
        }

        let line = self.status_line(reading);
        let padding = self.last_width.saturating_sub(line.len());
        self.last_width = line.len();
        let colored = if reading.running && !reading.paused {
            line.bright_green().to_string()
        } else if reading.running {
            line.yellow().to_string()
        } else if reading.display_total {
            line.bright_yellow().bold().to_string()
        } else {
            line.dimmed().to_string()
        };
        write!(out, "\r{}{}", colored, " ".repeat(padding))?;
        out.flush()
    }

    /// Leave the cursor on a fresh line.
    pub fn finish(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        out.flush()
    }
}
