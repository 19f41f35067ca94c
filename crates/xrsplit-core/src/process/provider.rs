//! Process provider abstraction for testability.
//!
//! This module provides traits that abstract process discovery and access,
//! enabling mock implementations for testing without a running game process.

use crate::error::Result;
use crate::process::{ModuleSet, ProcessHandle, ReadMemory};

/// Trait for accessing process information.
pub trait ProcessInfo {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Get the resolved module set.
    fn modules(&self) -> &ModuleSet;

    /// Check if the process is still running.
    fn is_alive(&self) -> bool;
}

/// Trait for finding and opening the game process.
///
/// Attaching either yields a process with every required module resolved or
/// fails; there is no partially attached state.
pub trait ProcessProvider {
    /// The type of process returned by this provider.
    type Process: ProcessInfo + ReadMemory;

    /// Find and open the target game process.
    fn attach(&self) -> Result<Self::Process>;
}

/// Provider backed by the operating system's process list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProvider;

impl ProcessProvider for SystemProcessProvider {
    type Process = ProcessHandle;

    fn attach(&self) -> Result<Self::Process> {
        ProcessHandle::find_and_open()
    }
}
