//! Status command implementation.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use xrsplit_core::game::{Snapshot, capture};
use xrsplit_core::process::{ModuleKind, PointerWidth, ProcessInfo};
use xrsplit_core::{FocusState, ProcessProvider, ReadMemory, SystemProcessProvider, VersionOffsets};

use crate::commands::load_layout_table;

#[derive(Debug, Serialize)]
pub struct ModuleStatus {
    pub name: &'static str,
    pub base_address: String,
    pub size: u32,
}

#[derive(Debug, Serialize)]
pub struct SnapshotStatus {
    pub loading: bool,
    pub prompt: bool,
    pub paused: bool,
    pub sync: f32,
    pub global_timer: f32,
    pub focus_state: u8,
    pub focus: Option<FocusState>,
    pub end_raw: String,
    pub end_text: Option<String>,
}

impl From<&Snapshot> for SnapshotStatus {
    fn from(s: &Snapshot) -> Self {
        Self {
            loading: s.loading,
            prompt: s.prompt,
            paused: s.paused,
            sync: s.sync,
            global_timer: s.global_timer,
            focus_state: s.focus_state,
            focus: s.focus(),
            end_raw: s
                .end_raw
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" "),
            end_text: s.end_sanitized.map(|t| t.as_str().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusInfo {
    pub pid: u32,
    pub pointer_width: PointerWidth,
    pub modules: Vec<ModuleStatus>,
    pub layout: String,
    pub bulk_window: Option<String>,
    pub snapshot: SnapshotStatus,
}

/// Attach once, read one snapshot and report it.
pub fn run(layouts_path: &Path, json: bool) -> Result<()> {
    let layouts = load_layout_table(layouts_path);
    let process = SystemProcessProvider.attach()?;
    let offsets = VersionOffsets::select(&layouts, process.modules())?;

    let mut snapshot = Snapshot::default();
    capture(&process, &offsets, &mut snapshot);

    let modules = ModuleKind::ALL
        .iter()
        .map(|&kind| {
            let info = process.modules().get(kind);
            ModuleStatus {
                name: kind.file_name(),
                base_address: format!("{:#X}", info.base_address),
                size: info.size,
            }
        })
        .collect();

    let info = StatusInfo {
        pid: process.pid(),
        pointer_width: process.pointer_width(),
        modules,
        layout: offsets.layout.clone(),
        bulk_window: offsets
            .bulk
            .map(|b| format!("{:#X} (+{} bytes)", b.base, b.size)),
        snapshot: SnapshotStatus::from(&snapshot),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_status(&info);
    }
    Ok(())
}

fn print_status(info: &StatusInfo) {
    println!("Process:        PID {}", info.pid);
    println!("Pointer width:  {} bytes", info.pointer_width.bytes());
    for module in &info.modules {
        println!("  {:<16} {} (size {})", module.name, module.base_address, module.size);
    }
    println!("Layout:         {}", info.layout);
    match &info.bulk_window {
        Some(window) => println!("Bulk window:    {}", window),
        None => println!("Bulk window:    none (individual reads)"),
    }

    let s = &info.snapshot;
    println!();
    println!("loading={} prompt={} paused={}", s.loading, s.prompt, s.paused);
    println!("sync={} global_timer={}", s.sync, s.global_timer);
    match s.focus {
        Some(focus) => println!("focus_state={} ({})", s.focus_state, focus),
        None => println!("focus_state={} (unknown)", s.focus_state),
    }
    println!(
        "end marker: [{}] {}",
        s.end_raw,
        s.end_text.as_deref().unwrap_or("<not printable>")
    );
}
