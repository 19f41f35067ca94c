//! Manual timer controls.

mod hotkeys;
mod keys;

pub use hotkeys::{AsyncKeyPoller, HotkeyBindings, HotkeyEdges, Hotkeys, KeyPoller, ScriptedKeys};
pub use keys::KeyCode;
