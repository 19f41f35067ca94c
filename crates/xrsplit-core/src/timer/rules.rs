//! Per-tick timer transitions.
//!
//! Rules run in a fixed order each tick: final-split latch, auto-start,
//! load detection, auto-split, pause update, manual hotkeys, then time
//! accumulation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::game::{FocusState, SnapshotPair};
use crate::input::HotkeyEdges;
use crate::layout::SyncBounds;
use crate::timer::TimerState;

/// Everything the rules look at for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub snapshots: &'a SnapshotPair,
    pub bounds: SyncBounds,
    pub hotkeys: HotkeyEdges,
    /// Monotonic time since the previous tick.
    pub delta: Duration,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickEvents {
    pub final_split: bool,
    pub auto_started: bool,
    pub auto_split: bool,
    pub is_loading: bool,
    pub reset: bool,
    pub manual_start: bool,
    pub manual_split: bool,
    pub skipped: bool,
    pub undone: bool,
    /// Seconds added to the accumulated time.
    pub accumulated: f64,
}

#[derive(Debug)]
pub struct SplitRules {
    final_latch: AtomicBool,
    was_running: bool,
    was_paused: bool,
}

impl Default for SplitRules {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitRules {
    pub fn new() -> Self {
        Self {
            final_latch: AtomicBool::new(false),
            was_running: false,
            was_paused: true,
        }
    }

    pub fn is_latched(&self) -> bool {
        self.final_latch.load(Ordering::SeqCst)
    }

    /// Re-arm the final split.
    pub fn clear_latch(&self) {
        self.final_latch.store(false, Ordering::SeqCst);
    }

    pub fn apply(&mut self, state: &TimerState, input: &TickInput<'_>) -> TickEvents {
        let mut events = TickEvents::default();
        let current = &input.snapshots.current;
        let previous = &input.snapshots.previous;
        let edges = input.snapshots.edges();

        if current.is_final()
            && self
                .final_latch
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            if state.is_running() {
                state.advance_split();
            }
            state.set_running(false);
            state.set_display_total(true);
            state.set_paused(true);
            events.final_split = true;
        }

        if !self.is_latched() && !state.is_running() {
            state.set_display_total(false);

            // New game or loaded save: the level starts loading.
            if current.loading && edges.loading_changed {
                self.start(state, true);
                events.auto_started = true;
            }
            // Level already loaded and the pause menu was just closed.
            if !current.paused && edges.paused_changed && current.loading {
                self.start(state, false);
                events.auto_started = true;
            }
        }

        let is_loading = !current.loading
            || input.bounds.contains(current.sync)
            || current.prompt
            || (!current.paused && current.sync == 0.0 && !edges.global_timer_changed);
        events.is_loading = is_loading;

        if state.is_running()
            && self.was_running
            && !self.was_paused
            && is_loading
            && previous.focus() == Some(FocusState::FocusedInGame)
            && current.focus() != Some(FocusState::FocusedInGame)
        {
            state.advance_split();
            events.auto_split = true;
        }

        if state.is_running() {
            state.set_paused(is_loading);
        }

        let keys = input.hotkeys;
        if keys.reset {
            state.set_running(false);
            state.set_accumulated_time(0.0);
            state.set_split_index(0);
            self.clear_latch();
            events.reset = true;
        }
        if keys.start_split {
            if state.is_running() {
                state.advance_split();
                events.manual_split = true;
            } else {
                state.set_running(true);
                state.set_accumulated_time(0.0);
                state.set_split_index(0);
                self.clear_latch();
                events.manual_start = true;
            }
        }
        if keys.skip {
            state.advance_split();
            events.skipped = true;
        }
        if keys.undo && state.split_index() > 0 {
            state.undo_split();
            events.undone = true;
        }

        if state.is_running() && !state.is_paused() {
            let seconds = input.delta.as_secs_f64();
            state.add_time(seconds);
            events.accumulated = seconds;
        }

        self.was_running = state.is_running();
        self.was_paused = state.is_paused();
        events
    }

    fn start(&self, state: &TimerState, paused: bool) {
        state.set_running(true);
        state.set_paused(paused);
        state.set_accumulated_time(0.0);
        state.set_split_index(1);
        self.clear_latch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Snapshot;

    const BOUNDS: SyncBounds = SyncBounds::new(0.057, 0.11);
    const TICK: Duration = Duration::from_millis(1);

    /// In a level, unpaused, game clock ticking.
    fn playing(global_timer: f32) -> Snapshot {
        Snapshot {
            loading: true,
            paused: false,
            sync: 0.5,
            global_timer,
            focus_state: 1,
            ..Default::default()
        }
    }

    fn step(
        rules: &mut SplitRules,
        state: &TimerState,
        pair: &mut SnapshotPair,
        next: Snapshot,
        hotkeys: HotkeyEdges,
    ) -> TickEvents {
        pair.current = next;
        let events = rules.apply(
            state,
            &TickInput {
                snapshots: pair,
                bounds: BOUNDS,
                hotkeys,
                delta: TICK,
            },
        );
        pair.rotate();
        events
    }

    #[test]
    fn test_loading_edge_starts_paused() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();

        let events = step(
            &mut rules,
            &state,
            &mut pair,
            Snapshot {
                loading: true,
                paused: true,
                sync: 0.08,
                ..Default::default()
            },
            HotkeyEdges::default(),
        );

        assert!(events.auto_started);
        assert!(state.is_running());
        assert!(state.is_paused());
        assert_eq!(state.split_index(), 1);
        assert_eq!(state.accumulated_time(), 0.0);
    }

    #[test]
    fn test_unpause_while_loaded_starts_running() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        pair.previous = Snapshot {
            loading: true,
            paused: true,
            ..Default::default()
        };

        let events = step(&mut rules, &state, &mut pair, playing(1.0), HotkeyEdges::default());

        assert!(events.auto_started);
        assert!(!events.is_loading);
        assert!(!state.is_paused());
        assert_eq!(events.accumulated, TICK.as_secs_f64());
    }

    #[test]
    fn test_frozen_clock_counts_as_loading() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        pair.previous = playing(5.0);
        state.set_running(true);

        let mut frozen = playing(5.0);
        frozen.sync = 0.0;
        let events = step(&mut rules, &state, &mut pair, frozen, HotkeyEdges::default());

        assert!(events.is_loading);
        assert!(state.is_paused());
        assert_eq!(state.accumulated_time(), 0.0);
    }

    #[test]
    fn test_prompt_counts_as_loading() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        pair.previous = playing(1.0);
        state.set_running(true);

        let mut prompt = playing(2.0);
        prompt.prompt = true;
        assert!(step(&mut rules, &state, &mut pair, prompt, HotkeyEdges::default()).is_loading);
    }

    #[test]
    fn test_auto_split_on_focus_loss_into_load() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        pair.previous = playing(1.0);
        state.set_running(true);
        state.set_split_index(1);

        // One running, unpaused tick to set the last-frame flags.
        step(&mut rules, &state, &mut pair, playing(2.0), HotkeyEdges::default());

        let mut transition = playing(3.0);
        transition.sync = 0.08;
        transition.focus_state = 2;
        let events = step(&mut rules, &state, &mut pair, transition, HotkeyEdges::default());

        assert!(events.auto_split);
        assert_eq!(state.split_index(), 2);
        assert!(state.is_paused());
    }

    #[test]
    fn test_no_auto_split_when_already_paused() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        state.set_running(true);
        state.set_split_index(1);

        let mut loading = playing(1.0);
        loading.sync = 0.08;
        step(&mut rules, &state, &mut pair, loading, HotkeyEdges::default());
        loading.focus_state = 2;
        let events = step(&mut rules, &state, &mut pair, loading, HotkeyEdges::default());

        assert!(!events.auto_split);
        assert_eq!(state.split_index(), 1);
    }

    #[test]
    fn test_final_latch_blocks_auto_start() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();

        let mut ending = Snapshot {
            end_raw: *b"final",
            ..Default::default()
        };
        let events = step(&mut rules, &state, &mut pair, ending, HotkeyEdges::default());
        assert!(events.final_split);
        assert!(state.display_total());

        ending.loading = true;
        let events = step(&mut rules, &state, &mut pair, ending, HotkeyEdges::default());
        assert!(!events.auto_started);
        assert!(!state.is_running());
        assert!(state.display_total());
    }

    #[test]
    fn test_start_split_hotkey() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        let press = HotkeyEdges {
            start_split: true,
            ..Default::default()
        };

        let events = step(&mut rules, &state, &mut pair, Snapshot::default(), press);
        assert!(events.manual_start);
        assert!(state.is_running());
        assert_eq!(state.split_index(), 0);

        let events = step(&mut rules, &state, &mut pair, Snapshot::default(), press);
        assert!(events.manual_split);
        assert_eq!(state.split_index(), 1);
    }

    #[test]
    fn test_hotkey_order_reset_then_start() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();
        state.set_running(true);
        state.set_split_index(4);

        let both = HotkeyEdges {
            reset: true,
            start_split: true,
            ..Default::default()
        };
        let events = step(&mut rules, &state, &mut pair, Snapshot::default(), both);

        // Reset stops the timer, so start/split starts a fresh run.
        assert!(events.reset);
        assert!(events.manual_start);
        assert!(state.is_running());
        assert_eq!(state.split_index(), 0);
    }

    #[test]
    fn test_skip_and_undo() {
        let state = TimerState::new();
        let mut rules = SplitRules::new();
        let mut pair = SnapshotPair::default();

        let undo = HotkeyEdges {
            undo: true,
            ..Default::default()
        };
        let events = step(&mut rules, &state, &mut pair, Snapshot::default(), undo);
        assert!(!events.undone);
        assert_eq!(state.split_index(), 0);

        let skip = HotkeyEdges {
            skip: true,
            ..Default::default()
        };
        step(&mut rules, &state, &mut pair, Snapshot::default(), skip);
        assert_eq!(state.split_index(), 1);

        let events = step(&mut rules, &state, &mut pair, Snapshot::default(), undo);
        assert!(events.undone);
        assert_eq!(state.split_index(), 0);
    }
}
