//! Timer mode: engine thread plus console display.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use xrsplit_core::timer::SystemClock;
use xrsplit_core::{
    AsyncKeyPoller, Hotkeys, ShutdownSignal, SystemProcessProvider, TimerEngine, TimerState,
};

use crate::commands::{load_config, load_layout_table};
use crate::display::ConsoleDisplay;

pub fn run(config_path: &Path, layouts_path: &Path, refresh: Duration) -> Result<()> {
    println!("xrsplit v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(config_path);
    let layouts = load_layout_table(layouts_path);
    let bindings = config.hotkeys;
    println!(
        "Start/split {}, reset {}, skip {}, undo {}. Ctrl+C to quit.",
        bindings.start_split, bindings.reset, bindings.skip, bindings.undo
    );
    if !config.category.is_empty() {
        println!("{}", config.category);
    }

    let shutdown = Arc::new(ShutdownSignal::new());
    let handler_shutdown = Arc::clone(&shutdown);
    ctrlc::set_handler(move || handler_shutdown.trigger())
        .context("Failed to install Ctrl+C handler")?;

    let state = Arc::new(TimerState::new());
    let engine_state = Arc::clone(&state);
    let engine_shutdown = Arc::clone(&shutdown);
    // The process handle is not Send, so the engine is built on its own thread.
    let engine = thread::Builder::new()
        .name("timer-engine".to_string())
        .spawn(move || {
            let mut engine = TimerEngine::new(
                SystemProcessProvider,
                layouts,
                Hotkeys::new(bindings),
                AsyncKeyPoller,
                SystemClock,
                engine_state,
            );
            engine.run(&engine_shutdown);
        })
        .context("Failed to spawn timer engine thread")?;

    let mut display = ConsoleDisplay::new(config);
    loop {
        display.draw(&state.read())?;
        if shutdown.wait(refresh) {
            break;
        }
    }
    display.finish()?;

    engine
        .join()
        .map_err(|_| anyhow!("Timer engine thread panicked"))?;
    info!("Shutdown complete");
    Ok(())
}
