use crate::error::Result;
use crate::layout::{FieldLocation, LayoutDef, LayoutTable, SyncBounds};
use crate::memory::DeepPointer;
use crate::process::ModuleSet;

/// Largest span read in one call for the flat fields.
pub const MAX_BULK_SPAN: u64 = 0x10000;

/// One contiguous read covering focus state, paused, sync and global timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkWindow {
    pub base: u64,
    pub size: usize,
    pub focus_state: usize,
    pub paused: usize,
    pub sync: usize,
    pub global_timer: usize,
}

impl BulkWindow {
    /// Smallest window containing all four fields (1, 1, 4 and 4 bytes wide).
    ///
    /// `None` if the fields are too far apart to be worth one read.
    pub fn covering(focus_state: u64, paused: u64, sync: u64, global_timer: u64) -> Option<Self> {
        let fields = [(focus_state, 1u64), (paused, 1), (sync, 4), (global_timer, 4)];
        let start = fields.iter().map(|(addr, _)| *addr).min()?;
        let end = fields
            .iter()
            .map(|(addr, len)| addr.checked_add(*len))
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .max()?;

        let size = end - start;
        if size > MAX_BULK_SPAN {
            return None;
        }

        Some(Self {
            base: start,
            size: size as usize,
            focus_state: (focus_state - start) as usize,
            paused: (paused - start) as usize,
            sync: (sync - start) as usize,
            global_timer: (global_timer - start) as usize,
        })
    }
}

/// A layout bound to the module bases of one attached process.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionOffsets {
    pub layout: String,
    pub loading: u64,
    pub prompt: u64,
    pub paused: u64,
    pub sync: u64,
    pub global_timer: u64,
    pub focus_state: u64,
    pub end_marker: DeepPointer,
    pub sync_bounds: SyncBounds,
    pub bulk: Option<BulkWindow>,
}

impl VersionOffsets {
    /// Select the layout for `modules` from `table` and resolve it.
    pub fn select(table: &LayoutTable, modules: &ModuleSet) -> Result<Self> {
        let def = table.select(modules.main().size)?;
        Ok(Self::resolve(def, modules))
    }

    pub fn resolve(def: &LayoutDef, modules: &ModuleSet) -> Self {
        let absolute = |field: &FieldLocation| {
            modules
                .get(field.module)
                .base_address
                .wrapping_add(field.offset)
        };

        let focus_state = absolute(&def.focus_state);
        let paused = absolute(&def.paused);
        let sync = absolute(&def.sync);
        let global_timer = absolute(&def.global_timer);

        let end_base = modules
            .get(def.end_marker.module)
            .base_address
            .wrapping_add(def.end_marker.offset);

        Self {
            layout: def.name.clone(),
            loading: absolute(&def.loading),
            prompt: absolute(&def.prompt),
            paused,
            sync,
            global_timer,
            focus_state,
            end_marker: DeepPointer::new(end_base, def.end_marker.chain.clone()),
            sync_bounds: def.sync_bounds,
            bulk: BulkWindow::covering(focus_state, paused, sync, global_timer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ModuleInfo, ModuleKind};

    fn modules(main_size: u32) -> ModuleSet {
        ModuleSet::new(
            ModuleInfo::new(0x40_0000, main_size),
            ModuleInfo::new(0x1000_0000, 0x4_0000),
            ModuleInfo::new(0x2000_0000, 0x80_0000),
            ModuleInfo::new(0x3000_0000, 0x10_0000),
        )
    }

    #[test]
    fn test_resolve_v1_0000() {
        let offsets = VersionOffsets::select(&LayoutTable::builtin(), &modules(1_613_824)).unwrap();

        assert_eq!(offsets.layout, "1.0000");
        assert_eq!(offsets.loading, 0x1000_0000 + 0xFAC4);
        assert_eq!(offsets.prompt, 0x2000_0000 + 0x54C2F9);
        assert_eq!(offsets.paused, 0x40_0000 + 0x1047C0);
        assert_eq!(offsets.end_marker.base, 0x40_0000 + 0x1048BC);
        assert_eq!(offsets.end_marker.offsets, vec![0x54, 0x14, 0x0, 0x0, 0x44, 0xC, 0x12]);
    }

    #[test]
    fn test_resolve_fallback_v1_0006() {
        let offsets = VersionOffsets::select(&LayoutTable::builtin(), &modules(999)).unwrap();

        assert_eq!(offsets.layout, "1.0006");
        assert_eq!(offsets.global_timer, 0x40_0000 + 0x10BE84);
        assert_eq!(offsets.sync_bounds.lower, 0.09);
    }

    #[test]
    fn test_bulk_window_geometry() {
        let offsets = VersionOffsets::select(&LayoutTable::builtin(), &modules(1_662_976)).unwrap();
        let bulk = offsets.bulk.unwrap();

        // focus_state is lowest, global_timer ends the window
        assert_eq!(bulk.base, offsets.focus_state);
        assert_eq!(bulk.focus_state, 0);
        assert_eq!(bulk.paused, 0x1047C0 - 0x10300C);
        assert_eq!(bulk.sync, 0x104928 - 0x10300C);
        assert_eq!(bulk.global_timer, 0x10492C - 0x10300C);
        assert_eq!(bulk.size, 0x10492C + 4 - 0x10300C);
    }

    #[test]
    fn test_bulk_window_unordered_fields() {
        let bulk = BulkWindow::covering(0x110, 0x100, 0x104, 0x108).unwrap();

        assert_eq!(bulk.base, 0x100);
        assert_eq!(bulk.size, 0x11);
        assert_eq!(bulk.focus_state, 0x10);
        assert_eq!(bulk.paused, 0);
    }

    #[test]
    fn test_bulk_window_rejects_distant_fields() {
        let mut def = LayoutTable::builtin().get("1.0006").unwrap().clone();
        def.focus_state = FieldLocation::new(ModuleKind::Core, 0x10);

        let offsets = VersionOffsets::resolve(&def, &modules(999));
        assert_eq!(offsets.bulk, None);
    }
}
