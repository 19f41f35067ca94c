#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_variables))]

use crate::error::{Error, Result};
use crate::process::{PointerWidth, ProcessHandle};

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

/// Trait for reading memory from another process
///
/// This trait enables mocking for tests and abstracts over different memory sources.
/// Every read is all-or-nothing: a short read is an error.
pub trait ReadMemory {
    /// Fill `buf` with the bytes at `address`
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()>;

    /// Width of pointers stored in this memory
    fn pointer_width(&self) -> PointerWidth;

    /// Read raw bytes from memory at the given address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a one-byte boolean (non-zero is true)
    fn read_bool(&self, address: u64) -> Result<bool> {
        Ok(self.read_u8(address)? != 0)
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(address, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_into(address, &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Dereference a pointer-sized value using the target's pointer width.
    ///
    /// Address 0 is never read.
    fn read_pointer(&self, address: u64) -> Result<u64> {
        if address == 0 {
            return Err(Error::read_failed(address, "null pointer dereference"));
        }
        match self.pointer_width() {
            PointerWidth::Four => self.read_u32(address).map(u64::from),
            PointerWidth::Eight => self.read_u64(address),
        }
    }
}

impl ProcessHandle {
    #[cfg(target_os = "windows")]
    fn read_into_impl(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        let mut bytes_read = 0;

        // SAFETY: ReadProcessMemory is called with:
        // - A valid process handle (obtained via OpenProcess with PROCESS_VM_READ)
        // - An address within the target process's address space
        // - A caller-owned buffer of exactly `buf.len()` bytes
        // - A pointer to receive the actual bytes read
        // The function may fail if the address is invalid, but this is handled via Result.
        unsafe {
            ReadProcessMemory(
                self.handle(),
                address as *const _,
                buf.as_mut_ptr() as *mut _,
                buf.len(),
                Some(&mut bytes_read),
            )
            .map_err(|e| Error::read_failed(address, e.to_string()))?;
        }

        if bytes_read != buf.len() {
            return Err(Error::read_failed(
                address,
                format!("Expected {} bytes, read {}", buf.len(), bytes_read),
            ));
        }

        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn read_into_impl(&self, address: u64, _buf: &mut [u8]) -> Result<()> {
        Err(Error::read_failed(
            address,
            "Windows only: memory reading not supported on this platform",
        ))
    }
}

impl ReadMemory for ProcessHandle {
    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Err(Error::read_failed(address, "empty read"));
        }
        self.read_into_impl(address, buf)
    }

    fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }
}
