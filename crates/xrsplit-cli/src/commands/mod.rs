pub mod layouts;
pub mod run;
pub mod status;

use std::path::Path;

use tracing::{debug, info, warn};
use xrsplit_core::{Config, LayoutTable, load_layouts};

/// Load settings, falling back to defaults for the whole file on any error.
pub fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config {}: {}, using defaults", path.display(), e);
            Config::default()
        }
    }
}

/// Load the layout table, or the built-in one if the file is absent or invalid.
pub fn load_layout_table(path: &Path) -> LayoutTable {
    if !path.exists() {
        debug!("No layout file at {}, using built-in layouts", path.display());
        return LayoutTable::builtin();
    }
    match load_layouts(path) {
        Ok(table) => table,
        Err(e) => {
            warn!("Failed to load layouts {}: {}, using built-in layouts", path.display(), e);
            LayoutTable::builtin()
        }
    }
}
