//! Mock process access for testing
//!
//! Provides configurable implementations of [`ReadMemory`], [`ProcessInfo`] and
//! [`ProcessProvider`] backed by a sparse in-memory address space instead of a
//! real process. Clones share state, so a test can keep a handle and mutate
//! memory while the engine owns another.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::process::{ModuleSet, PointerWidth, ProcessInfo, ProcessProvider, ReadMemory};

/// Sparse mock address space
///
/// Only bytes that were written are mapped; reading any unmapped byte fails
/// the whole read.
#[derive(Debug, Clone)]
pub struct MockMemory {
    bytes: Arc<Mutex<BTreeMap<u64, u8>>>,
    pointer_width: PointerWidth,
    reads: Arc<AtomicUsize>,
}

impl MockMemory {
    pub fn new(pointer_width: PointerWidth) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(BTreeMap::new())),
            pointer_width,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<u64, u8>> {
        self.bytes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write raw bytes at an absolute address
    pub fn write_bytes(&self, address: u64, bytes: &[u8]) {
        let mut map = self.map();
        for (i, byte) in bytes.iter().enumerate() {
            map.insert(address + i as u64, *byte);
        }
    }

    pub fn write_u8(&self, address: u64, value: u8) {
        self.write_bytes(address, &[value]);
    }

    pub fn write_bool(&self, address: u64, value: bool) {
        self.write_u8(address, value as u8);
    }

    pub fn write_u32(&self, address: u64, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_u64(&self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_f32(&self, address: u64, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a pointer using the configured pointer width
    pub fn write_pointer(&self, address: u64, value: u64) {
        match self.pointer_width {
            PointerWidth::Four => self.write_u32(address, value as u32),
            PointerWidth::Eight => self.write_u64(address, value),
        }
    }

    /// Remove `len` bytes starting at `address` from the address space
    pub fn unmap(&self, address: u64, len: usize) {
        let mut map = self.map();
        for i in 0..len as u64 {
            map.remove(&(address + i));
        }
    }

    /// Number of `read_into` calls made so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl ReadMemory for MockMemory {
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if buf.is_empty() {
            return Err(Error::read_failed(address, "empty read"));
        }
        let map = self.map();
        for (i, slot) in buf.iter_mut().enumerate() {
            let at = address.wrapping_add(i as u64);
            *slot = *map
                .get(&at)
                .ok_or_else(|| Error::read_failed(address, format!("unmapped byte at {:#x}", at)))?;
        }
        Ok(())
    }

    fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }
}

/// Builder for creating test memory
///
/// Provides a fluent API for constructing memory layouts for testing.
#[derive(Debug, Clone)]
pub struct MockMemoryBuilder {
    memory: MockMemory,
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemoryBuilder {
    /// Create a new builder for 4-byte pointers, matching the game's 32-bit build
    pub fn new() -> Self {
        Self {
            memory: MockMemory::new(PointerWidth::Four),
        }
    }

    /// Set the pointer width of the mock target
    pub fn pointer_width(mut self, width: PointerWidth) -> Self {
        let memory = MockMemory::new(width);
        let existing: Vec<(u64, u8)> = self.memory.map().iter().map(|(a, b)| (*a, *b)).collect();
        {
            let mut map = memory.map();
            map.extend(existing);
        }
        self.memory = memory;
        self
    }

    pub fn write_bytes(self, address: u64, bytes: &[u8]) -> Self {
        self.memory.write_bytes(address, bytes);
        self
    }

    pub fn write_u8(self, address: u64, value: u8) -> Self {
        self.memory.write_u8(address, value);
        self
    }

    pub fn write_u32(self, address: u64, value: u32) -> Self {
        self.memory.write_u32(address, value);
        self
    }

    pub fn write_u64(self, address: u64, value: u64) -> Self {
        self.memory.write_u64(address, value);
        self
    }

    pub fn write_f32(self, address: u64, value: f32) -> Self {
        self.memory.write_f32(address, value);
        self
    }

    pub fn write_pointer(self, address: u64, value: u64) -> Self {
        self.memory.write_pointer(address, value);
        self
    }

    pub fn build(self) -> MockMemory {
        self.memory
    }
}

/// Mock game process: a module set over a shared mock address space
#[derive(Debug, Clone)]
pub struct MockProcess {
    pid: u32,
    modules: ModuleSet,
    memory: MockMemory,
    alive: Arc<AtomicBool>,
}

impl MockProcess {
    pub fn new(pid: u32, modules: ModuleSet, memory: MockMemory) -> Self {
        Self {
            pid,
            modules,
            memory,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn memory(&self) -> &MockMemory {
        &self.memory
    }

    /// Mark the process as exited; every clone observes it
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl ProcessInfo for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl ReadMemory for MockProcess {
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::read_failed(address, "process has exited"));
        }
        self.memory.read_into(address, buf)
    }

    fn pointer_width(&self) -> PointerWidth {
        self.memory.pointer_width()
    }
}

/// Provider that hands out clones of a launched [`MockProcess`]
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    process: Arc<Mutex<Option<MockProcess>>>,
    attaches: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<MockProcess>> {
        self.process.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `process` discoverable
    pub fn launch(&self, process: MockProcess) {
        *self.slot() = Some(process);
    }

    /// Make the game undiscoverable again
    pub fn clear(&self) {
        *self.slot() = None;
    }

    /// Number of attach attempts, successful or not
    pub fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::Relaxed)
    }
}

impl ProcessProvider for MockProvider {
    type Process = MockProcess;

    fn attach(&self) -> Result<Self::Process> {
        self.attaches.fetch_add(1, Ordering::Relaxed);
        match self.slot().as_ref() {
            Some(process) if process.is_alive() => Ok(process.clone()),
            _ => Err(Error::ProcessNotFound("mock process not launched".to_string())),
        }
    }
}
