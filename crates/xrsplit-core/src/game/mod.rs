mod capture;
mod snapshot;

pub use capture::capture;
pub use snapshot::{
    END_MARKER_LEN, Edges, FINAL_MARKER, FocusState, MarkerText, Snapshot, SnapshotPair,
};
