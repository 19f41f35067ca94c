use tracing::trace;

use crate::game::{END_MARKER_LEN, MarkerText, Snapshot};
use crate::layout::{BulkWindow, VersionOffsets};
use crate::process::ReadMemory;

/// Refresh `snapshot` in place from process memory.
///
/// A field whose read fails keeps its previous value. The raw end marker is
/// always cleared first, so a failed marker read leaves it zeroed.
pub fn capture<R: ReadMemory + ?Sized>(
    reader: &R,
    offsets: &VersionOffsets,
    snapshot: &mut Snapshot,
) {
    keep_on_error(reader.read_bool(offsets.loading), &mut snapshot.loading, "loading");
    keep_on_error(reader.read_bool(offsets.prompt), &mut snapshot.prompt, "prompt");

    let bulk_ok = match &offsets.bulk {
        Some(window) => read_bulk(reader, window, snapshot),
        None => false,
    };
    if !bulk_ok {
        keep_on_error(
            reader.read_u8(offsets.focus_state),
            &mut snapshot.focus_state,
            "focus_state",
        );
        keep_on_error(reader.read_bool(offsets.paused), &mut snapshot.paused, "paused");
        keep_on_error(reader.read_f32(offsets.sync), &mut snapshot.sync, "sync");
        keep_on_error(
            reader.read_f32(offsets.global_timer),
            &mut snapshot.global_timer,
            "global_timer",
        );
    }

    snapshot.end_raw = [0; END_MARKER_LEN];
    let mut raw = [0u8; END_MARKER_LEN];
    match offsets.end_marker.read_into(reader, &mut raw) {
        Ok(_) => {
            snapshot.end_raw = raw;
            snapshot.end_sanitized = MarkerText::sanitize(&raw);
        }
        Err(e) => {
            trace!("end marker: {}", e);
            snapshot.end_sanitized = None;
        }
    }
}

fn keep_on_error<T>(result: crate::Result<T>, slot: &mut T, field: &str) {
    match result {
        Ok(value) => *slot = value,
        Err(e) => trace!("{}: {}", field, e),
    }
}

fn read_bulk<R: ReadMemory + ?Sized>(
    reader: &R,
    window: &BulkWindow,
    snapshot: &mut Snapshot,
) -> bool {
    let bytes = match reader.read_bytes(window.base, window.size) {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!("bulk read failed, falling back to individual reads: {}", e);
            return false;
        }
    };

    let f32_at = |offset: usize| {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[offset..offset + 4]);
        f32::from_le_bytes(buf)
    };

    snapshot.focus_state = bytes[window.focus_state];
    snapshot.paused = bytes[window.paused] != 0;
    snapshot.sync = f32_at(window.sync);
    snapshot.global_timer = f32_at(window.global_timer);
    true
}
