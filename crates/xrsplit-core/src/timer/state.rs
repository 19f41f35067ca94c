//! Timer state shared with the display thread.
//!
//! Each field is individually atomic. Only the engine thread writes; readers
//! may observe fields from adjacent ticks but never a torn value.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// `f64` stored as its bit pattern in an `AtomicU64`.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }

    /// Add `delta` with a compare-and-swap loop; returns the previous value.
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }
}

#[derive(Debug)]
pub struct TimerState {
    running: AtomicBool,
    paused: AtomicBool,
    accumulated_time: AtomicF64,
    display_total: AtomicBool,
    split_index: AtomicUsize,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerState {
    /// Stopped, paused, zero time, index 0.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(true),
            accumulated_time: AtomicF64::new(0.0),
            display_total: AtomicBool::new(false),
            split_index: AtomicUsize::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Seconds of unpaused run time.
    pub fn accumulated_time(&self) -> f64 {
        self.accumulated_time.load()
    }

    pub fn set_accumulated_time(&self, seconds: f64) {
        self.accumulated_time.store(seconds);
    }

    pub fn add_time(&self, seconds: f64) {
        self.accumulated_time.fetch_add(seconds);
    }

    pub fn display_total(&self) -> bool {
        self.display_total.load(Ordering::Acquire)
    }

    pub fn set_display_total(&self, display_total: bool) {
        self.display_total.store(display_total, Ordering::Release);
    }

    /// 0 means no split has started; 1 is the first split.
    pub fn split_index(&self) -> usize {
        self.split_index.load(Ordering::Acquire)
    }

    pub fn set_split_index(&self, index: usize) {
        self.split_index.store(index, Ordering::Release);
    }

    pub fn advance_split(&self) {
        self.split_index.fetch_add(1, Ordering::AcqRel);
    }

    /// Step back one split, never below 0.
    pub fn undo_split(&self) {
        let _ = self
            .split_index
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| i.checked_sub(1));
    }

    /// Load every field. Fields may come from adjacent ticks.
    pub fn read(&self) -> TimerReading {
        TimerReading {
            running: self.is_running(),
            paused: self.is_paused(),
            accumulated_time: self.accumulated_time(),
            display_total: self.display_total(),
            split_index: self.split_index(),
        }
    }
}

/// Plain copy of [`TimerState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerReading {
    pub running: bool,
    pub paused: bool,
    pub accumulated_time: f64,
    pub display_total: bool,
    pub split_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        let reading = TimerState::new().read();

        assert!(!reading.running);
        assert!(reading.paused);
        assert_eq!(reading.accumulated_time, 0.0);
        assert!(!reading.display_total);
        assert_eq!(reading.split_index, 0);
    }

    #[test]
    fn test_fetch_add_concurrent() {
        let value = Arc::new(AtomicF64::new(0.0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let value = Arc::clone(&value);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        value.fetch_add(0.5);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(value.load(), 2000.0);
    }

    #[test]
    fn test_undo_floors_at_zero() {
        let state = TimerState::new();
        state.undo_split();
        assert_eq!(state.split_index(), 0);

        state.set_split_index(2);
        state.undo_split();
        assert_eq!(state.split_index(), 1);
    }
}
