//! Per-build field layouts and their resolution to absolute addresses.

mod loader;
mod resolved;
mod table;

pub use loader::{format_layouts, load_layouts, parse_layouts};
pub use resolved::{BulkWindow, VersionOffsets};
pub use table::{DeepPointerDef, FieldLocation, LayoutDef, LayoutTable, SyncBounds};
