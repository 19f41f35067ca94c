mod clock;
mod engine;
mod format;
mod rules;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineOptions, TickOutcome, TimerEngine};
pub use format::format_time;
pub use rules::{SplitRules, TickEvents, TickInput};
pub use state::{AtomicF64, TimerReading, TimerState};
