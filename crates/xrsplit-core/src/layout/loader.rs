use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::layout::LayoutTable;

/// Load a layout table from a TOML file, replacing the built-in table.
pub fn load_layouts<P: AsRef<Path>>(path: P) -> Result<LayoutTable> {
    let content = fs::read_to_string(&path)?;
    let table = parse_layouts(&content)?;
    info!(
        "Loaded {} layout(s) from {}",
        table.layouts.len(),
        path.as_ref().display()
    );
    Ok(table)
}

pub fn parse_layouts(content: &str) -> Result<LayoutTable> {
    let table: LayoutTable = toml::from_str(content)?;
    validate(&table)?;
    Ok(table)
}

pub fn format_layouts(table: &LayoutTable) -> Result<String> {
    Ok(toml::to_string_pretty(table)?)
}

fn validate(table: &LayoutTable) -> Result<()> {
    if table.layouts.is_empty() {
        return Err(Error::ConfigParseError(
            "layout table defines no layouts".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for layout in &table.layouts {
        if !names.insert(layout.name.as_str()) {
            return Err(Error::ConfigParseError(format!(
                "duplicate layout name '{}'",
                layout.name
            )));
        }
        if layout.sync_bounds.lower >= layout.sync_bounds.upper {
            return Err(Error::ConfigParseError(format!(
                "layout '{}' has an empty sync interval",
                layout.name
            )));
        }
    }

    if let Some(fallback) = &table.fallback {
        if !names.contains(fallback.as_str()) {
            return Err(Error::UnknownLayout(fallback.clone()));
        }
    }

    Ok(())
}
