use serde::Serialize;
use strum::{Display, FromRepr};

/// Bytes read through the end-marker pointer each tick.
pub const END_MARKER_LEN: usize = 5;

/// Marker text shown on the final cutscene.
pub const FINAL_MARKER: &[u8; END_MARKER_LEN] = b"final";

/// Window focus combined with whether a level is active.
///
/// The game writes the same value for "minimized in a level" and "focused in a
/// menu, level-change trigger or cutscene".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr, Serialize)]
#[repr(u8)]
pub enum FocusState {
    /// Focused and in a level.
    FocusedInGame = 1,
    /// Minimized in a level, or focused outside one.
    BackgroundOrMenu = 2,
    /// Minimized outside a level.
    MinimizedMenu = 3,
}

/// Printable prefix of the raw end-marker bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerText {
    bytes: [u8; END_MARKER_LEN],
    len: usize,
}

impl MarkerText {
    /// The bytes before the first NUL, if there is at least one and all are
    /// printable ASCII.
    pub fn sanitize(raw: &[u8; END_MARKER_LEN]) -> Option<Self> {
        let len = raw.iter().position(|&b| b == 0).unwrap_or(END_MARKER_LEN);
        if len == 0 || !raw[..len].iter().all(|b| (0x20..=0x7E).contains(b)) {
            return None;
        }

        let mut bytes = [0u8; END_MARKER_LEN];
        bytes[..len].copy_from_slice(&raw[..len]);
        Some(Self { bytes, len })
    }

    pub fn as_str(&self) -> &str {
        // Only printable ASCII is ever stored.
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }
}

/// Values of every polled field at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub loading: bool,
    pub prompt: bool,
    pub paused: bool,
    pub sync: f32,
    pub global_timer: f32,
    pub focus_state: u8,
    pub end_raw: [u8; END_MARKER_LEN],
    pub end_sanitized: Option<MarkerText>,
}

impl Snapshot {
    /// `None` for values outside the known set.
    pub fn focus(&self) -> Option<FocusState> {
        FocusState::from_repr(self.focus_state)
    }

    pub fn is_final(&self) -> bool {
        &self.end_raw == FINAL_MARKER
    }
}

/// Fields that changed between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub loading_changed: bool,
    pub paused_changed: bool,
    pub global_timer_changed: bool,
}

/// This tick's snapshot and the one before it.
#[derive(Debug, Clone, Default)]
pub struct SnapshotPair {
    pub previous: Snapshot,
    pub current: Snapshot,
}

impl SnapshotPair {
    pub fn edges(&self) -> Edges {
        Edges {
            loading_changed: self.current.loading != self.previous.loading,
            paused_changed: self.current.paused != self.previous.paused,
            global_timer_changed: self.current.global_timer != self.previous.global_timer,
        }
    }

    /// Make the current snapshot the previous one. `current` keeps its values
    /// so that fields which fail to read next tick carry over.
    pub fn rotate(&mut self) {
        self.previous = self.current;
    }
}
