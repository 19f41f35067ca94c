//! Loaded-module bookkeeping for the target process.
//!
//! The timer needs the main executable plus three engine libraries. A process
//! that is missing any of them is treated as not ready.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::{Error, Result};

/// Executable name of the game process.
pub const PROCESS_NAME: &str = "XR_3DA.exe";

/// The modules whose base addresses anchor every polled field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    #[strum(serialize = "XR_3DA.exe")]
    Main,
    #[strum(serialize = "xrNetServer.dll")]
    NetServer,
    #[strum(serialize = "xrGame.dll")]
    Game,
    #[strum(serialize = "xrCore.dll")]
    Core,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Main,
        ModuleKind::NetServer,
        ModuleKind::Game,
        ModuleKind::Core,
    ];

    /// File name as it appears in the module list (compared case-insensitively).
    pub fn file_name(self) -> &'static str {
        self.into()
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Base address and image size of one loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleInfo {
    pub base_address: u64,
    pub size: u32,
}

impl ModuleInfo {
    pub fn new(base_address: u64, size: u32) -> Self {
        Self { base_address, size }
    }
}

/// All four required modules, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSet {
    modules: [ModuleInfo; 4],
}

impl ModuleSet {
    pub fn new(
        main: ModuleInfo,
        net_server: ModuleInfo,
        game: ModuleInfo,
        core: ModuleInfo,
    ) -> Self {
        Self {
            modules: [main, net_server, game, core],
        }
    }

    /// Build the set from a lookup function, failing on the first missing module.
    pub fn resolve<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(ModuleKind) -> Option<ModuleInfo>,
    {
        let mut modules = [ModuleInfo::default(); 4];
        for kind in ModuleKind::iter() {
            let info = lookup(kind)
                .filter(|m| m.base_address != 0)
                .ok_or_else(|| Error::ModuleNotFound(kind.file_name().to_string()))?;
            modules[kind.index()] = info;
        }
        Ok(Self { modules })
    }

    pub fn get(&self, kind: ModuleKind) -> ModuleInfo {
        self.modules[kind.index()]
    }

    pub fn main(&self) -> ModuleInfo {
        self.get(ModuleKind::Main)
    }
}

/// Width of a pointer inside the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerWidth {
    Four,
    Eight,
}

impl PointerWidth {
    /// Pointer width of the host build.
    pub fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Eight
        } else {
            Self::Four
        }
    }

    /// A WOW64 target is a 32-bit process on a 64-bit host; everything else
    /// shares the host's width.
    pub fn for_target(is_wow64: bool) -> Self {
        if is_wow64 { Self::Four } else { Self::native() }
    }

    pub fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}
