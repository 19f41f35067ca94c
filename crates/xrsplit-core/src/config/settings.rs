use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::input::HotkeyBindings;

/// One row of the split table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub name: String,
    /// Reference time as written by the user, e.g. `"4:12.3"`.
    #[serde(default)]
    pub time: String,
}

/// Settings file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub category: String,
    /// Show the time of the current split next to the total.
    pub segment_time: bool,
    pub show_splits: bool,
    /// Show the total time once the run is finished.
    pub splits_total: bool,
    pub two_decimal_points: bool,
    pub hotkeys: HotkeyBindings,
    pub splits: Vec<Split>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            category: String::new(),
            segment_time: true,
            show_splits: false,
            splits_total: false,
            two_decimal_points: false,
            hotkeys: HotkeyBindings::default(),
            splits: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if let Some(index) = config.splits.iter().position(|s| s.name.trim().is_empty()) {
            return Err(Error::ConfigParseError(format!(
                "split #{} has an empty name",
                index + 1
            )));
        }
        Ok(config)
    }

    /// Digits after the decimal point in displayed times.
    pub fn precision(&self) -> usize {
        if self.two_decimal_points { 2 } else { 1 }
    }
}
