//! Version layout table.
//!
//! A layout describes where one build of the game keeps every polled field,
//! relative to the module that owns it. Layouts are chosen by the size of the
//! main executable image.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{Error, Result};
use crate::process::ModuleKind;

/// A flat field at `module + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLocation {
    pub module: ModuleKind,
    pub offset: u64,
}

impl FieldLocation {
    pub const fn new(module: ModuleKind, offset: u64) -> Self {
        Self { module, offset }
    }
}

/// A pointer chain rooted at `module + offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepPointerDef {
    pub module: ModuleKind,
    pub offset: u64,
    pub chain: Vec<u64>,
}

/// Open interval of `sync` values that indicate a loading screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncBounds {
    #[serde(serialize_with = "serialize_f32", deserialize_with = "deserialize_f32")]
    pub lower: f32,
    #[serde(serialize_with = "serialize_f32", deserialize_with = "deserialize_f32")]
    pub upper: f32,
}

impl SyncBounds {
    pub const fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// Strict on both ends.
    pub fn contains(&self, value: f32) -> bool {
        value > self.lower && value < self.upper
    }
}

// TOML only has f64; going through the shortest decimal keeps `0.057` readable.
fn serialize_f32<S: Serializer>(
    value: &f32,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let widened = value.to_string().parse::<f64>().unwrap_or(f64::from(*value));
    serializer.serialize_f64(widened)
}

fn deserialize_f32<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<f32, D::Error> {
    f64::deserialize(deserializer).map(|v| v as f32)
}

/// Field layout of one game build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDef {
    pub name: String,
    /// Main executable image sizes that identify this build.
    #[serde(default)]
    pub module_sizes: Vec<u32>,
    pub loading: FieldLocation,
    pub prompt: FieldLocation,
    pub paused: FieldLocation,
    pub sync: FieldLocation,
    pub global_timer: FieldLocation,
    pub focus_state: FieldLocation,
    pub end_marker: DeepPointerDef,
    pub sync_bounds: SyncBounds,
}

impl LayoutDef {
    pub fn matches(&self, main_size: u32) -> bool {
        self.module_sizes.contains(&main_size)
    }
}

/// Ordered set of layouts plus the layout used for unrecognized builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(rename = "layout", default)]
    pub layouts: Vec<LayoutDef>,
}

impl LayoutTable {
    /// The two known retail builds, falling back to 1.0006.
    pub fn builtin() -> Self {
        use ModuleKind::{Game, Main, NetServer};

        let v1_0000 = LayoutDef {
            name: "1.0000".to_string(),
            module_sizes: vec![1_662_976, 1_613_824],
            loading: FieldLocation::new(NetServer, 0xFAC4),
            prompt: FieldLocation::new(Game, 0x54C2F9),
            paused: FieldLocation::new(Main, 0x1047C0),
            sync: FieldLocation::new(Main, 0x104928),
            global_timer: FieldLocation::new(Main, 0x10492C),
            focus_state: FieldLocation::new(Main, 0x10300C),
            end_marker: DeepPointerDef {
                module: Main,
                offset: 0x1048BC,
                chain: vec![0x54, 0x14, 0x0, 0x0, 0x44, 0xC, 0x12],
            },
            sync_bounds: SyncBounds::new(0.057, 0.11),
        };

        let v1_0006 = LayoutDef {
            name: "1.0006".to_string(),
            module_sizes: Vec::new(),
            loading: FieldLocation::new(NetServer, 0x13E84),
            prompt: FieldLocation::new(Game, 0x560668),
            paused: FieldLocation::new(Main, 0x10BCD0),
            sync: FieldLocation::new(Main, 0x10BE80),
            global_timer: FieldLocation::new(Main, 0x10BE84),
            focus_state: FieldLocation::new(Main, 0x10A10C),
            end_marker: DeepPointerDef {
                module: Main,
                offset: 0x10BDB0,
                chain: vec![0x3C, 0x10, 0x0, 0x0, 0x44, 0xC, 0x12],
            },
            sync_bounds: SyncBounds::new(0.09, 0.11),
        };

        Self {
            fallback: Some(v1_0006.name.clone()),
            layouts: vec![v1_0000, v1_0006],
        }
    }

    pub fn get(&self, name: &str) -> Option<&LayoutDef> {
        self.layouts.iter().find(|l| l.name == name)
    }

    /// Pick the layout for a main module of `main_size` bytes.
    ///
    /// Unrecognized sizes use the fallback layout when one is configured.
    pub fn select(&self, main_size: u32) -> Result<&LayoutDef> {
        if let Some(layout) = self.layouts.iter().find(|l| l.matches(main_size)) {
            return Ok(layout);
        }

        let name = self
            .fallback
            .as_deref()
            .ok_or(Error::VersionMismatch {
                module_size: main_size,
            })?;
        let layout = self
            .get(name)
            .ok_or_else(|| Error::UnknownLayout(name.to_string()))?;
        warn!(
            "Unrecognized main module size {} ({:#x}), assuming layout {}",
            main_size, main_size, layout.name
        );
        Ok(layout)
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_signature() {
        let table = LayoutTable::builtin();

        assert_eq!(table.select(1_662_976).unwrap().name, "1.0000");
        assert_eq!(table.select(1_613_824).unwrap().name, "1.0000");
    }

    #[test]
    fn test_unknown_size_uses_fallback() {
        let table = LayoutTable::builtin();

        let layout = table.select(1_234_567).unwrap();
        assert_eq!(layout.name, "1.0006");
        assert_eq!(layout.sync_bounds, SyncBounds::new(0.09, 0.11));
    }

    #[test]
    fn test_no_fallback_is_version_mismatch() {
        let mut table = LayoutTable::builtin();
        table.fallback = None;

        match table.select(42) {
            Err(Error::VersionMismatch { module_size }) => assert_eq!(module_size, 42),
            other => panic!("expected VersionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_fallback_is_unknown_layout() {
        let mut table = LayoutTable::builtin();
        table.fallback = Some("2.0".to_string());

        assert!(matches!(table.select(42), Err(Error::UnknownLayout(name)) if name == "2.0"));
    }

    #[test]
    fn test_sync_bounds_are_strict() {
        let bounds = SyncBounds::new(0.057, 0.11);

        assert!(bounds.contains(0.08));
        assert!(!bounds.contains(0.057));
        assert!(!bounds.contains(0.11));
        assert!(!bounds.contains(0.0));
    }
}
