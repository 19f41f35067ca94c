mod handle;
pub mod module;
pub mod provider;
mod reader;

// Mock process access for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use handle::ProcessHandle;
pub use module::{ModuleInfo, ModuleKind, ModuleSet, PROCESS_NAME, PointerWidth};
pub use provider::{ProcessInfo, ProcessProvider, SystemProcessProvider};
pub use reader::ReadMemory;

// Re-export mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockMemory, MockMemoryBuilder, MockProcess, MockProvider};
