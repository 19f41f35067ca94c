//! The polling loop that drives the timer from game memory.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::config::timing;
use crate::error::Result;
use crate::game::{SnapshotPair, capture};
use crate::input::{Hotkeys, KeyPoller};
use crate::layout::{LayoutTable, VersionOffsets};
use crate::process::{ProcessInfo, ProcessProvider};
use crate::shutdown::ShutdownSignal;
use crate::timer::{Clock, SplitRules, TickEvents, TickInput, TimerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub tick_period: Duration,
    pub retry_interval: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick_period: timing::TICK_PERIOD,
            retry_interval: timing::NOT_READY_RETRY_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The game is not attached; nothing was read.
    NotReady,
    Ticked(TickEvents),
}

/// An attached process with its layout resolved.
struct Session<T> {
    process: T,
    offsets: VersionOffsets,
}

pub struct TimerEngine<P: ProcessProvider, K, C> {
    provider: P,
    layouts: LayoutTable,
    hotkeys: Hotkeys,
    keys: K,
    clock: C,
    options: EngineOptions,
    session: Option<Session<P::Process>>,
    snapshots: SnapshotPair,
    rules: SplitRules,
    state: Arc<TimerState>,
    last_instant: Instant,
    next_deadline: Instant,
    was_not_ready: bool,
    last_attach_error: Option<String>,
}

impl<P, K, C> TimerEngine<P, K, C>
where
    P: ProcessProvider,
    K: KeyPoller,
    C: Clock,
{
    pub fn new(
        provider: P,
        layouts: LayoutTable,
        hotkeys: Hotkeys,
        keys: K,
        clock: C,
        state: Arc<TimerState>,
    ) -> Self {
        let now = clock.now();
        Self {
            provider,
            layouts,
            hotkeys,
            keys,
            clock,
            options: EngineOptions::default(),
            session: None,
            snapshots: SnapshotPair::default(),
            rules: SplitRules::new(),
            state,
            last_instant: now,
            next_deadline: now,
            was_not_ready: true,
            last_attach_error: None,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    /// Name of the layout in use, if attached.
    pub fn layout_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.offsets.layout.as_str())
    }

    pub fn is_latched(&self) -> bool {
        self.rules.is_latched()
    }

    /// Run one tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.next_deadline += self.options.tick_period;

        if !self.ensure_session() {
            self.rules.clear_latch();
            self.was_not_ready = true;
            return TickOutcome::NotReady;
        }

        if self.was_not_ready {
            let now = self.clock.now();
            self.last_instant = now;
            self.next_deadline = now;
            self.was_not_ready = false;
        }

        let Some(session) = self.session.as_ref() else {
            return TickOutcome::NotReady;
        };
        capture(&session.process, &session.offsets, &mut self.snapshots.current);
        let bounds = session.offsets.sync_bounds;

        let hotkeys = self.hotkeys.poll(&mut self.keys);
        let now = self.clock.now();
        let delta = now.saturating_duration_since(self.last_instant);
        self.last_instant = now;

        let events = self.rules.apply(
            &self.state,
            &TickInput {
                snapshots: &self.snapshots,
                bounds,
                hotkeys,
                delta,
            },
        );
        self.snapshots.rotate();

        log_events(&events, &self.state);
        TickOutcome::Ticked(events)
    }

    /// Run one tick, then sleep until the next one is due.
    pub fn step(&mut self) -> TickOutcome {
        let outcome = self.tick();
        match outcome {
            TickOutcome::NotReady => self.clock.sleep(self.options.retry_interval),
            TickOutcome::Ticked(_) => self.clock.sleep_until(self.next_deadline),
        }
        outcome
    }

    /// Tick until `shutdown` is triggered.
    pub fn run(&mut self, shutdown: &ShutdownSignal) {
        info!("Timer engine started");
        while !shutdown.is_shutdown() {
            self.step();
        }
        if self.session.take().is_some() {
            debug!("Released game process handle");
        }
        info!("Timer engine stopped");
    }

    /// `true` when an attached, live process is available.
    fn ensure_session(&mut self) -> bool {
        if let Some(session) = &self.session {
            if session.process.is_alive() {
                return true;
            }
            info!("Game process {} exited", session.process.pid());
            self.session = None;
            self.last_attach_error = None;
        }

        match self.attach() {
            Ok(session) => {
                info!(
                    "Attached to game (PID {}), layout {}",
                    session.process.pid(),
                    session.offsets.layout
                );
                if session.offsets.bulk.is_none() {
                    debug!("Polled fields too far apart for a single read");
                }
                self.session = Some(session);
                self.last_attach_error = None;
            }
            Err(e) => {
                let message = e.to_string();
                if self.last_attach_error.as_deref() != Some(message.as_str()) {
                    debug!("Game not ready: {}", message);
                    self.last_attach_error = Some(message);
                } else {
                    trace!("Game not ready: {}", message);
                }
            }
        }
        // A fresh session is used from the next tick on.
        false
    }

    fn attach(&self) -> Result<Session<P::Process>> {
        let process = self.provider.attach()?;
        let offsets = VersionOffsets::select(&self.layouts, process.modules())?;
        Ok(Session { process, offsets })
    }
}

fn log_events(events: &TickEvents, state: &TimerState) {
    let index = state.split_index();
    if events.final_split {
        info!("Final split, run finished at {:.3}s", state.accumulated_time());
    }
    if events.auto_started {
        info!("Run started");
    }
    if events.auto_split {
        info!("Auto split, now on split {}", index);
    }
    if events.reset {
        info!("Timer reset");
    }
    if events.manual_start {
        info!("Timer started manually");
    }
    if events.manual_split || events.skipped || events.undone {
        debug!("Split index now {}", index);
    }
}
