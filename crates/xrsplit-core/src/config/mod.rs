//! User settings and timing constants.

mod settings;

pub use settings::{Config, Split};

/// Engine loop timing.
pub mod timing {
    use std::time::Duration;

    /// Target period of one engine tick (2000 Hz).
    pub const TICK_PERIOD: Duration = Duration::from_micros(500);

    /// Sleep between attach attempts while the game is unavailable.
    pub const NOT_READY_RETRY_INTERVAL: Duration = Duration::from_micros(500);

    /// Default refresh interval of the console display.
    pub const DISPLAY_REFRESH_INTERVAL: Duration = Duration::from_millis(100);
}
