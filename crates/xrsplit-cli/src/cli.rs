//! CLI argument definitions for xrsplit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xrsplit")]
#[command(about = "Load-removing autosplitter for S.T.A.L.K.E.R.: Shadow of Chernobyl", version)]
pub struct Args {
    /// Settings file
    #[arg(short, long, value_name = "FILE", default_value = "xrsplit.toml", env = "XRSPLIT_CONFIG")]
    pub config: PathBuf,

    /// Layout table replacing the built-in one (ignored if missing)
    #[arg(short, long, value_name = "FILE", default_value = "layouts.toml")]
    pub layouts: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the timer with a console display (default)
    Run {
        /// Display refresh interval in milliseconds
        #[arg(long, default_value = "100")]
        refresh_ms: u64,
    },
    /// Attach once and show modules, layout and a snapshot
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in layout table as TOML
    Layouts,
}
