//! End-to-end tests for the timer engine
//!
//! A mock game process with the 1.0000 layout is driven tick by tick through
//! the engine with a manual clock and scripted hotkeys.

use std::sync::Arc;
use std::time::Duration;

use xrsplit_core::input::{HotkeyBindings, Hotkeys, KeyCode, ScriptedKeys};
use xrsplit_core::layout::{LayoutTable, VersionOffsets};
use xrsplit_core::process::{
    MockMemory, MockMemoryBuilder, MockProcess, MockProvider, ModuleInfo, ModuleSet,
};
use xrsplit_core::ShutdownSignal;
use xrsplit_core::timer::{
    EngineOptions, ManualClock, TickEvents, TickOutcome, TimerEngine, TimerState,
};

const MAIN_SIZE: u32 = 1_613_824;
const TICK: Duration = Duration::from_micros(500);

fn modules(main_size: u32) -> ModuleSet {
    ModuleSet::new(
        ModuleInfo::new(0x40_0000, main_size),
        ModuleInfo::new(0x1000_0000, 0x4_0000),
        ModuleInfo::new(0x2000_0000, 0x80_0000),
        ModuleInfo::new(0x3000_0000, 0x10_0000),
    )
}

/// Mock game memory with every polled field mapped.
struct Game {
    memory: MockMemory,
    offsets: VersionOffsets,
    marker: u64,
    game_time: f32,
}

impl Game {
    fn new(main_size: u32) -> Self {
        let offsets = VersionOffsets::select(&LayoutTable::builtin(), &modules(main_size)).unwrap();
        let bulk = offsets.bulk.unwrap();
        let memory = MockMemoryBuilder::new()
            .write_bytes(bulk.base, &vec![0u8; bulk.size])
            .write_u8(offsets.loading, 0)
            .write_u8(offsets.prompt, 0)
            .write_u8(offsets.paused, 1)
            .write_u8(offsets.focus_state, 1)
            .build();

        let chain = &offsets.end_marker.offsets;
        let mut address = offsets.end_marker.base;
        for (i, offset) in chain.iter().enumerate() {
            address += offset;
            if i + 1 < chain.len() {
                let next = 0x5000_0000 + (i as u64) * 0x100;
                memory.write_pointer(address, next);
                address = next;
            }
        }
        memory.write_bytes(address, &[0; 5]);

        Self {
            memory,
            offsets,
            marker: address,
            game_time: 0.0,
        }
    }

    fn set_loading(&self, value: bool) {
        self.memory.write_bool(self.offsets.loading, value);
    }

    fn set_paused(&self, value: bool) {
        self.memory.write_bool(self.offsets.paused, value);
    }

    fn set_sync(&self, value: f32) {
        self.memory.write_f32(self.offsets.sync, value);
    }

    fn set_focus(&self, value: u8) {
        self.memory.write_u8(self.offsets.focus_state, value);
    }

    fn set_marker(&self, bytes: &[u8; 5]) {
        self.memory.write_bytes(self.marker, bytes);
    }

    /// Advance the in-game clock by one frame.
    fn frame(&mut self) {
        self.game_time += 0.016;
        self.memory.write_f32(self.offsets.global_timer, self.game_time);
    }
}

struct Rig {
    engine: TimerEngine<MockProvider, ScriptedKeys, ManualClock>,
    provider: MockProvider,
    process: MockProcess,
    keys: ScriptedKeys,
    clock: ManualClock,
    state: Arc<TimerState>,
    game: Game,
}

impl Rig {
    fn new() -> Self {
        Self::with_layouts(LayoutTable::builtin(), MAIN_SIZE)
    }

    fn with_layouts(layouts: LayoutTable, main_size: u32) -> Self {
        let game = Game::new(MAIN_SIZE);
        let process = MockProcess::new(1234, modules(main_size), game.memory.clone());
        let provider = MockProvider::new();
        let keys = ScriptedKeys::new();
        let clock = ManualClock::new();
        let state = Arc::new(TimerState::new());
        let engine = TimerEngine::new(
            provider.clone(),
            layouts,
            Hotkeys::new(HotkeyBindings::default()),
            keys.clone(),
            clock.clone(),
            Arc::clone(&state),
        );
        Self {
            engine,
            provider,
            process,
            keys,
            clock,
            state,
            game,
        }
    }

    /// Launch the game and step until the engine has attached.
    fn connect(&mut self) {
        self.provider.launch(self.process.clone());
        for _ in 0..3 {
            if let TickOutcome::Ticked(_) = self.engine.step() {
                return;
            }
        }
        panic!("engine did not attach");
    }

    fn tick(&mut self) -> TickEvents {
        match self.engine.step() {
            TickOutcome::Ticked(events) => events,
            TickOutcome::NotReady => panic!("engine not ready"),
        }
    }

    /// Press and release `key` across two ticks; returns the first tick's events.
    fn tap(&mut self, key: KeyCode) -> TickEvents {
        self.keys.press(key);
        let events = self.tick();
        self.keys.release(key);
        self.tick();
        events
    }

    /// Connect and get a run going: in a level, unpaused, game clock moving.
    fn running(&mut self) {
        self.connect();
        self.game.set_loading(true);
        self.game.set_sync(0.08);
        assert!(self.tick().auto_started);
        self.game.set_paused(false);
        self.game.set_sync(0.5);
        self.game.frame();
        self.tick();
        assert!(self.state.is_running());
        assert!(!self.state.is_paused());
    }
}

/// Scenarios from first attach through a finished run
mod scenario_tests {
    use super::*;

    // Scenario A
    #[test]
    fn test_process_never_found_stays_not_ready() {
        let mut rig = Rig::new();

        for _ in 0..100 {
            assert_eq!(rig.engine.step(), TickOutcome::NotReady);
        }

        assert!(!rig.engine.is_ready());
        assert!(!rig.state.is_running());
        assert_eq!(rig.state.accumulated_time(), 0.0);
        assert_eq!(rig.provider.attach_count(), 100);
        assert_eq!(rig.clock.elapsed(), TICK * 100);
    }

    // Scenario B
    #[test]
    fn test_loading_edge_starts_run() {
        let mut rig = Rig::new();
        rig.connect();
        assert_eq!(rig.engine.layout_name(), Some("1.0000"));

        rig.game.set_loading(true);
        rig.game.set_sync(0.08);
        let events = rig.tick();

        assert!(events.auto_started);
        assert!(rig.state.is_running());
        assert_eq!(rig.state.accumulated_time(), 0.0);
        assert_eq!(rig.state.split_index(), 1);
    }

    // Scenario C
    #[test]
    fn test_sync_in_bounds_pauses_without_accumulating() {
        let mut rig = Rig::new();
        rig.running();

        rig.game.frame();
        rig.tick();
        let before = rig.state.accumulated_time();
        assert!(before > 0.0);

        rig.game.frame();
        rig.game.set_sync(0.08);
        let events = rig.tick();

        assert!(events.is_loading);
        assert!(rig.state.is_paused());
        assert_eq!(rig.state.accumulated_time(), before);
    }

    // Scenario D
    #[test]
    fn test_final_marker_stops_once() {
        let mut rig = Rig::new();
        rig.running();
        let index = rig.state.split_index();

        rig.game.set_marker(b"final");
        let events = rig.tick();

        assert!(events.final_split);
        assert_eq!(rig.state.split_index(), index + 1);
        assert!(!rig.state.is_running());
        assert!(rig.state.display_total());

        let frozen = rig.state.read();
        for _ in 0..50 {
            rig.game.frame();
            assert!(!rig.tick().final_split);
        }
        assert_eq!(rig.state.read(), frozen);
        assert!(rig.engine.is_latched());
    }

    // Scenario E
    #[test]
    fn test_reset_clears_run_and_latch() {
        let mut rig = Rig::new();
        rig.connect();
        rig.game.set_marker(b"final");
        rig.tick();
        assert!(rig.engine.is_latched());

        rig.state.set_running(true);
        rig.state.set_accumulated_time(42.0);
        rig.state.set_split_index(3);

        rig.keys.press(KeyCode::F8);
        let events = rig.tick();

        assert!(events.reset);
        assert!(!rig.state.is_running());
        assert_eq!(rig.state.accumulated_time(), 0.0);
        assert_eq!(rig.state.split_index(), 0);
        assert!(!rig.engine.is_latched());
    }
}

/// Manual hotkeys and automatic splits
mod hotkey_tests {
    use super::*;

    #[test]
    fn test_manual_start_clears_latch() {
        let mut rig = Rig::new();
        rig.connect();
        rig.game.set_marker(b"final");
        rig.tick();
        rig.game.set_marker(b"\0\0\0\0\0");

        let events = rig.tap(KeyCode::F9);

        assert!(events.manual_start);
        assert!(rig.state.is_running());
        assert!(!rig.engine.is_latched());
    }

    #[test]
    fn test_undo_reverts_last_split() {
        let mut rig = Rig::new();
        rig.running();
        assert_eq!(rig.state.split_index(), 1);

        rig.tap(KeyCode::F9);
        rig.tap(KeyCode::F10);
        assert_eq!(rig.state.split_index(), 3);

        rig.tap(KeyCode::F11);
        assert_eq!(rig.state.split_index(), 2);

        for _ in 0..5 {
            rig.tap(KeyCode::F11);
        }
        assert_eq!(rig.state.split_index(), 0);
    }

    #[test]
    fn test_held_key_fires_once() {
        let mut rig = Rig::new();
        rig.running();

        rig.keys.press(KeyCode::F10);
        for _ in 0..20 {
            rig.tick();
        }

        assert_eq!(rig.state.split_index(), 2);
    }

    #[test]
    fn test_auto_split_on_level_change() {
        let mut rig = Rig::new();
        rig.running();

        // Level-change trigger: focus leaves "in game" and a load begins.
        rig.game.set_focus(2);
        rig.game.set_sync(0.08);
        let events = rig.tick();

        assert!(events.auto_split);
        assert_eq!(rig.state.split_index(), 2);
        assert!(rig.state.is_paused());

        // Still loading on the next tick: no second split.
        assert!(!rig.tick().auto_split);
    }

    #[test]
    fn test_split_index_is_not_clamped_to_split_count() {
        let splits = 2;
        let mut rig = Rig::new();
        rig.running();

        for _ in 0..5 {
            rig.tap(KeyCode::F10);
        }

        // The engine has no notion of the split list length.
        assert!(rig.state.split_index() > splits);
        assert_eq!(rig.state.split_index(), 6);
    }
}

/// Time accumulation and tick scheduling
mod timing_tests {
    use super::*;

    #[test]
    fn test_accumulated_time_never_decreases_while_running() {
        let mut rig = Rig::new();
        rig.running();

        let mut last = rig.state.accumulated_time();
        for i in 0..400 {
            if i % 50 < 10 {
                rig.game.set_sync(0.08);
            } else {
                rig.game.set_sync(0.5);
                rig.game.frame();
            }
            let paused_before = rig.state.is_paused();
            rig.tick();

            let now = rig.state.accumulated_time();
            assert!(now >= last);
            if rig.state.is_paused() && paused_before {
                assert_eq!(now, last);
            }
            last = now;
        }
        assert!(last > 0.0);
    }

    #[test]
    fn test_deadlines_do_not_drift() {
        let mut rig = Rig::new();
        rig.connect();
        let start = rig.clock.deadlines().len();

        for i in 0..200 {
            // Simulated work, occasionally longer than a whole period.
            let work = if i % 37 == 0 { 700 } else { 100 };
            rig.clock.advance(Duration::from_micros(work));
            rig.tick();
        }

        let deadlines = rig.clock.deadlines();
        let deadlines = &deadlines[start..];
        assert_eq!(deadlines.len(), 200);
        for pair in deadlines.windows(2) {
            assert_eq!(pair[1] - pair[0], TICK);
        }
    }

    #[test]
    fn test_custom_retry_interval() {
        let mut rig = Rig::new();
        rig.engine = rig.engine.with_options(EngineOptions {
            tick_period: Duration::from_millis(1),
            retry_interval: Duration::from_millis(3),
        });

        for _ in 0..4 {
            assert_eq!(rig.engine.step(), TickOutcome::NotReady);
        }
        assert_eq!(rig.clock.elapsed(), Duration::from_millis(12));

        rig.connect();
        let start = rig.clock.deadlines().len();
        rig.tick();
        rig.tick();
        let deadlines = rig.clock.deadlines();
        assert_eq!(deadlines[start + 1] - deadlines[start], Duration::from_millis(1));
    }
}

/// Attaching, detaching and layout selection
mod session_tests {
    use super::*;

    #[test]
    fn test_process_exit_drops_session_and_ignores_gap() {
        let mut rig = Rig::new();
        rig.running();
        rig.game.set_marker(b"final");
        rig.tick();
        assert!(rig.engine.is_latched());
        rig.game.set_marker(b"\0\0\0\0\0");

        // Restart the run by hand so time is accumulating again.
        rig.tap(KeyCode::F9);
        rig.game.frame();
        rig.tick();
        assert!(rig.state.is_running() && !rig.state.is_paused());

        rig.process.kill();
        assert_eq!(rig.engine.step(), TickOutcome::NotReady);
        assert!(!rig.engine.is_ready());
        assert!(!rig.engine.is_latched());

        let frozen = rig.state.accumulated_time();
        for _ in 0..1000 {
            assert_eq!(rig.engine.step(), TickOutcome::NotReady);
        }
        assert_eq!(rig.state.accumulated_time(), frozen);

        // Same memory, new process instance.
        rig.process = MockProcess::new(5678, modules(MAIN_SIZE), rig.game.memory.clone());
        rig.game.frame();
        rig.connect();

        // The reattach tick starts a fresh delta baseline.
        assert_eq!(rig.state.accumulated_time(), frozen);
    }

    #[test]
    fn test_unknown_build_without_fallback_never_attaches() {
        let mut layouts = LayoutTable::builtin();
        layouts.fallback = None;
        let mut rig = Rig::with_layouts(layouts, 999_999);
        rig.provider.launch(rig.process.clone());

        for _ in 0..10 {
            assert_eq!(rig.engine.step(), TickOutcome::NotReady);
        }
        assert!(!rig.engine.is_ready());
        assert_eq!(rig.provider.attach_count(), 10);
    }

    #[test]
    fn test_unknown_build_uses_fallback_layout() {
        let mut rig = Rig::with_layouts(LayoutTable::builtin(), 999_999);
        rig.connect();

        assert_eq!(rig.engine.layout_name(), Some("1.0006"));
    }

    #[test]
    fn test_run_returns_on_shutdown_and_releases_process() {
        let mut rig = Rig::new();
        rig.connect();
        assert!(rig.engine.is_ready());

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        rig.engine.run(&shutdown);

        assert!(!rig.engine.is_ready());
        assert_eq!(rig.engine.layout_name(), None);
    }
}
