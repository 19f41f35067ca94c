#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use crate::error::{Error, Result};
use crate::process::module::{ModuleInfo, ModuleSet, PROCESS_NAME, PointerWidth};
use crate::process::provider::ProcessInfo;

#[cfg(target_os = "windows")]
use tracing::{debug, warn};

#[cfg(target_os = "windows")]
use std::ffi::OsString;
#[cfg(target_os = "windows")]
use std::os::windows::ffi::OsStringExt;
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE, HWND, LPARAM};
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, PROCESSENTRY32W,
    Process32FirstW, Process32NextW, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, IsWow64Process, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};
#[cfg(target_os = "windows")]
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GW_OWNER, GetWindow, GetWindowThreadProcessId, IsWindowVisible,
};

/// Kernel handle that is closed when dropped.
#[cfg(target_os = "windows")]
struct OwnedHandle(HANDLE);

#[cfg(target_os = "windows")]
impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            // SAFETY: self.0 is a valid handle obtained from OpenProcess or
            // CreateToolhelp32Snapshot and has not been closed yet.
            if let Err(e) = unsafe { CloseHandle(self.0) } {
                warn!("Failed to close handle: {}", e);
            }
        }
    }
}

/// Read-only handle to the running game.
#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: OwnedHandle,
    pub pid: u32,
    pub(crate) pointer_width: PointerWidth,
    pub modules: ModuleSet,
}

#[cfg(not(target_os = "windows"))]
pub struct ProcessHandle {
    pub pid: u32,
    pub(crate) pointer_width: PointerWidth,
    pub modules: ModuleSet,
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Locate the game by its visible main window and open it.
    pub fn find_and_open() -> Result<Self> {
        let pid = find_windowed_process(PROCESS_NAME)?;
        debug!("Found {} with PID {}", PROCESS_NAME, pid);
        Self::open(pid)
    }

    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess is called with valid flags (query + VM read) and a
        // process ID obtained from CreateToolhelp32Snapshot. The returned handle is
        // owned by OwnedHandle and closed in Drop, including on the error paths below.
        let handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid)
                .map(OwnedHandle)
                .map_err(|e| Error::ProcessOpenFailed(e.to_string()))?
        };

        let pointer_width = query_pointer_width(handle.0);
        let loaded = enumerate_modules(pid)?;
        let modules = ModuleSet::resolve(|kind| {
            loaded
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(kind.file_name()))
                .map(|(_, info)| *info)
        })?;

        Ok(Self {
            handle,
            pid,
            pointer_width,
            modules,
        })
    }

    pub fn handle(&self) -> HANDLE {
        self.handle.0
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        let mut exit_code: u32 = 0;
        // SAFETY: GetExitCodeProcess is called with a valid process handle obtained
        // from OpenProcess and an initialized out-parameter.
        unsafe {
            if GetExitCodeProcess(self.handle.0, &mut exit_code).is_ok() {
                exit_code == STILL_ACTIVE
            } else {
                false
            }
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn find_and_open() -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    pub fn is_alive(&self) -> bool {
        false
    }
}

impl ProcessInfo for ProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    fn is_alive(&self) -> bool {
        ProcessHandle::is_alive(self)
    }
}

/// 32-bit targets under WOW64 store 4-byte pointers; otherwise (including when the
/// query fails) the host width applies.
#[cfg(target_os = "windows")]
fn query_pointer_width(handle: HANDLE) -> PointerWidth {
    let mut is_wow64 = BOOL(0);
    // SAFETY: IsWow64Process is called with a valid process handle that has
    // PROCESS_QUERY_INFORMATION access and a properly initialized BOOL out-parameter.
    match unsafe { IsWow64Process(handle, &mut is_wow64) } {
        Ok(()) => PointerWidth::for_target(is_wow64.as_bool()),
        Err(e) => {
            debug!("IsWow64Process failed, assuming native pointer width: {}", e);
            PointerWidth::native()
        }
    }
}

/// Convert a NUL-terminated UTF-16 buffer into a `String`.
#[cfg(target_os = "windows")]
fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    OsString::from_wide(&buffer[..len])
        .to_string_lossy()
        .into_owned()
}

/// Find the PID of the process named `name` that owns a visible, unowned top-level window.
///
/// Launchers and helper processes share the executable name but have no such window.
#[cfg(target_os = "windows")]
fn find_windowed_process(name: &str) -> Result<u32> {
    let candidates = find_process_ids(name)?;
    candidates
        .into_iter()
        .find(|&pid| has_main_window(pid))
        .ok_or_else(|| Error::ProcessNotFound(format!("No visible window for '{}'", name)))
}

#[cfg(target_os = "windows")]
fn find_process_ids(name: &str) -> Result<Vec<u32>> {
    // SAFETY: CreateToolhelp32Snapshot with TH32CS_SNAPPROCESS is safe to call.
    // The returned handle is closed when `snapshot` is dropped.
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map(OwnedHandle)
            .map_err(|e| Error::ProcessNotFound(e.to_string()))?
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut pids = Vec::new();
    // SAFETY: Process32FirstW and Process32NextW are safe to call with a valid snapshot handle
    // and properly initialized PROCESSENTRY32W structure.
    unsafe {
        if Process32FirstW(snapshot.0, &mut entry).is_ok() {
            loop {
                if wide_to_string(&entry.szExeFile).eq_ignore_ascii_case(name) {
                    pids.push(entry.th32ProcessID);
                }
                if Process32NextW(snapshot.0, &mut entry).is_err() {
                    break;
                }
            }
        }
    }

    if pids.is_empty() {
        return Err(Error::ProcessNotFound(format!(
            "Process '{}' not found",
            name
        )));
    }
    Ok(pids)
}

#[cfg(target_os = "windows")]
struct WindowSearch {
    pid: u32,
    found: bool,
}

#[cfg(target_os = "windows")]
fn has_main_window(pid: u32) -> bool {
    let mut search = WindowSearch { pid, found: false };

    // SAFETY: EnumWindows calls the callback synchronously for each top-level window;
    // `search` outlives the call and is only accessed through the LPARAM pointer inside it.
    unsafe {
        let _ = EnumWindows(
            Some(enum_window_callback),
            LPARAM(&mut search as *mut WindowSearch as isize),
        );
    }

    search.found
}

#[cfg(target_os = "windows")]
unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam carries the &mut WindowSearch passed by has_main_window.
    let search = unsafe { &mut *(lparam.0 as *mut WindowSearch) };

    let mut window_pid: u32 = 0;
    // SAFETY: hwnd is supplied by EnumWindows and valid for the duration of the callback.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut window_pid)) };
    if window_pid != search.pid {
        return BOOL(1);
    }

    // SAFETY: hwnd is valid for the duration of the callback.
    let visible = unsafe { IsWindowVisible(hwnd) }.as_bool();
    // SAFETY: hwnd is valid for the duration of the callback; GW_OWNER only
    // queries the owner and does not transfer ownership.
    let unowned = unsafe { GetWindow(hwnd, GW_OWNER) }.map_or(true, |owner| owner.is_invalid());

    if visible && unowned {
        search.found = true;
        return BOOL(0); // Stop enumeration
    }
    BOOL(1)
}

/// List (name, base, size) for every module loaded in `pid`, 32-bit modules included.
#[cfg(target_os = "windows")]
fn enumerate_modules(pid: u32) -> Result<Vec<(String, ModuleInfo)>> {
    // SAFETY: CreateToolhelp32Snapshot with module flags is safe to call for any PID;
    // the returned handle is closed when `snapshot` is dropped.
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
            .map(OwnedHandle)
            .map_err(|e| Error::ModuleNotFound(format!("Failed to enumerate modules: {}", e)))?
    };

    let mut entry = MODULEENTRY32W {
        dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
        ..Default::default()
    };

    let mut modules = Vec::new();
    // SAFETY: Module32FirstW and Module32NextW are called with a valid snapshot handle and
    // a MODULEENTRY32W whose dwSize is set.
    unsafe {
        if Module32FirstW(snapshot.0, &mut entry).is_ok() {
            loop {
                modules.push((
                    wide_to_string(&entry.szModule),
                    ModuleInfo::new(entry.modBaseAddr as u64, entry.modBaseSize),
                ));
                if Module32NextW(snapshot.0, &mut entry).is_err() {
                    break;
                }
            }
        }
    }

    Ok(modules)
}
