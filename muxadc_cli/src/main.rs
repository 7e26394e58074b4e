#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod acquire;
mod cli;
mod error_fmt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::error!(error = %format!("{err:#}"), "muxadc failed");
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(path: &Path) -> eyre::Result<muxadc_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    muxadc_config::load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))
}

/// Console layer on stderr (JSON with `--json`), plus an optional JSON file layer from
/// `[logging]`. `RUST_LOG` takes precedence over both levels.
fn init_tracing(json: bool, console_level: &str, logging: &muxadc_config::Logging) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level));

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .with_filter(console_filter)
            .boxed()
    };

    let file = logging.file.as_deref().map(|path| {
        let path = Path::new(path);
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "muxadc.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let level = logging.level.as_deref().unwrap_or("info");
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(EnvFilter::new(level))
            .boxed()
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
    {
        eprintln!("tracing already initialised: {e}");
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let mut cfg = load_config(&cli.config)?;

    // CLI overrides
    if let Some(n) = cli.window {
        cfg.filter.window = n;
    }
    if let Some(t) = cli.noise_floor {
        cfg.filter.noise_floor = t;
    }
    if let Some(ms) = cli.interval_ms {
        cfg.drain.interval_ms = ms;
    }
    cfg.validate()?;

    init_tracing(cli.json, &cli.log_level, &cfg.logging);
    tracing::debug!(config = %cli.config.display(), backend = ?cfg.hardware.backend, "config loaded");

    let converter = acquire::make_converter(&cfg, &cli.config)?;

    match cli.cmd {
        Commands::Run {
            cycles,
            channel,
            direct,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }
            let out = acquire::Output {
                json: cli.json,
                channel,
            };
            let published = acquire::run_cmd(&cfg, converter, cycles, direct, out, shutdown)?;
            tracing::info!(published, "run finished");
        }
        Commands::Read {
            channel,
            timeout_ms,
        } => {
            acquire::read_cmd(&cfg, converter, channel, timeout_ms, cli.json)?;
        }
        Commands::SelfCheck => acquire::self_check(&cfg, converter, cli.json)?,
    }
    Ok(())
}
