mod cli;
mod commands;
mod display;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;
use xrsplit_core::config::timing;

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the timer line on stdout stays intact.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("xrsplit=info,xrsplit_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Some(Command::Run { refresh_ms }) => commands::run::run(
            &args.config,
            &args.layouts,
            Duration::from_millis(refresh_ms.max(1)),
        ),
        Some(Command::Status { json }) => commands::status::run(&args.layouts, json),
        Some(Command::Layouts) => commands::layouts::run(),
        None => commands::run::run(&args.config, &args.layouts, timing::DISPLAY_REFRESH_INTERVAL),
    }
}
