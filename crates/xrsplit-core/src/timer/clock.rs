use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source for the engine loop.
pub trait Clock {
    fn now(&self) -> Instant;

    /// Block until `deadline`; returns immediately if it has passed.
    fn sleep_until(&self, deadline: Instant);

    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Clock that only moves when told to. Sleeping advances it instantly.
///
/// Clones share the same time and the same record of deadlines.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_nanos: Arc<AtomicU64>,
    deadlines: Arc<Mutex<Vec<Instant>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
            deadlines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.elapsed_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }

    /// Every deadline passed to `sleep_until`, in order.
    pub fn deadlines(&self) -> Vec<Instant> {
        self.deadlines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep_until(&self, deadline: Instant) {
        self.deadlines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(deadline);
        let now = self.now();
        if deadline > now {
            self.advance(deadline - now);
        }
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
