//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "muxadc", version, about = "Multi-channel ADC acquisition with median filtering")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/muxadc.toml")]
    pub config: PathBuf,

    /// Print reports and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Override filter.window (5, 7, 9 or 11)
    #[arg(long, value_name = "N")]
    pub window: Option<usize>,

    /// Override filter.noise_floor (raw counts)
    #[arg(long = "noise-floor", value_name = "COUNTS")]
    pub noise_floor: Option<u16>,

    /// Override drain.interval_ms
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire continuously and print every published set of values
    Run {
        /// Stop after this many publications
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Print only this channel (0..=7)
        #[arg(long, value_name = "CH", value_parser = clap::value_parser!(u8).range(0..8))]
        channel: Option<u8>,
        /// Handle conversions in the drain loop instead of a background thread
        #[arg(long, action = ArgAction::SetTrue)]
        direct: bool,
    },
    /// Wait for the first publication and print one channel's value
    Read {
        #[arg(long, value_name = "CH", value_parser = clap::value_parser!(u8).range(0..8))]
        channel: u8,
        /// Give up when nothing is published within this time
        #[arg(long = "timeout-ms", value_name = "MS", default_value_t = 2_000)]
        timeout_ms: u64,
    },
    /// Build the pipeline and verify that a publication happens
    SelfCheck,
}
