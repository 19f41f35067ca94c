pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod layout;
pub mod memory;
pub mod process;
pub mod shutdown;
pub mod timer;

pub use config::{Config, Split};
pub use error::{Error, Result};
pub use game::{FocusState, Snapshot};
pub use input::{AsyncKeyPoller, HotkeyBindings, Hotkeys, KeyCode};
pub use layout::{LayoutTable, VersionOffsets, load_layouts};
pub use memory::{DeepPointer, HopStrategy};
pub use process::{ProcessHandle, ProcessProvider, ReadMemory, SystemProcessProvider};
pub use shutdown::ShutdownSignal;
pub use timer::{TimerEngine, TimerReading, TimerState, format_time};
