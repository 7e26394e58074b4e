//! Backend assembly, config mapping and the `run` / `read` / `self-check` commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use muxadc_config::{Backend, Config};
use muxadc_core::runner::{Report, RunParams, SamplingMode};
use muxadc_core::{CHANNEL_COUNT, DrainCfg, MultiChannelAdc};
use muxadc_hardware::{ReplayAdc, SimParams, SimulatedAdc};
use muxadc_traits::Converter;

/// Stall deadline used by `self-check` when the config leaves the watchdog off.
const CHECK_STALL_MS: u64 = 1_000;

/// Map `[sim]` to simulator parameters. Expects a validated config.
pub fn sim_params(cfg: &Config) -> eyre::Result<SimParams> {
    let levels: [u16; CHANNEL_COUNT] = cfg
        .sim
        .levels
        .as_slice()
        .try_into()
        .wrap_err("sim.levels must list exactly 8 channel levels")?;
    Ok(SimParams {
        levels,
        noise_amp: cfg.sim.noise_amp,
        spike_every: cfg.sim.spike_every,
        spike_value: cfg.sim.spike_value,
        seed: cfg.sim.seed,
        conversion_time: Duration::from_micros(cfg.sim.conversion_us),
        max_raw: cfg.max_raw(),
    })
}

/// Relative trace paths are resolved against the config file's directory.
fn resolve_relative(config_path: &Path, p: &str) -> PathBuf {
    let path = PathBuf::from(p);
    if path.is_absolute() {
        return path;
    }
    config_path
        .parent()
        .map_or_else(|| path.clone(), |dir| dir.join(&path))
}

/// Build the converter selected by `[hardware] backend`.
pub fn make_converter(cfg: &Config, config_path: &Path) -> eyre::Result<Box<dyn Converter + Send>> {
    match cfg.hardware.backend {
        Backend::Sim => {
            let params = sim_params(cfg)?;
            // Test hook: a converter that never completes
            if std::env::var_os("MUXADC_TEST_SIM_DISABLED").is_some() {
                tracing::warn!("simulated converter disabled; no conversion will complete");
                return Ok(Box::new(SimulatedAdc::disabled(params)));
            }
            Ok(Box::new(SimulatedAdc::new(params)))
        }
        Backend::Replay => {
            let Some(p) = cfg.hardware.replay.as_deref() else {
                eyre::bail!("hardware.replay must be set when backend = \"replay\"");
            };
            let path = resolve_relative(config_path, p);
            let trace = muxadc_config::load_trace_csv(&path)?;
            tracing::info!(path = %path.display(), "replaying trace");
            Ok(Box::new(ReplayAdc::new(
                trace.channels,
                Duration::from_micros(cfg.sim.conversion_us),
            )))
        }
        Backend::Mcp3008 => make_mcp3008(cfg),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn make_mcp3008(cfg: &Config) -> eyre::Result<Box<dyn Converter + Send>> {
    let adc = muxadc_hardware::mcp3008::Mcp3008::new(
        cfg.hardware.spi_bus,
        cfg.hardware.spi_cs,
        cfg.hardware.spi_clock_hz,
    )
    .map_err(eyre::Report::new)
    .wrap_err("open mcp3008")?;
    tracing::info!(
        bus = cfg.hardware.spi_bus,
        cs = cfg.hardware.spi_cs,
        clock_hz = cfg.hardware.spi_clock_hz,
        "mcp3008 ready"
    );
    Ok(Box::new(adc))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn make_mcp3008(_cfg: &Config) -> eyre::Result<Box<dyn Converter + Send>> {
    eyre::bail!("mcp3008 backend requires a Linux build with --features hardware")
}

fn build(cfg: &Config, converter: Box<dyn Converter + Send>) -> eyre::Result<MultiChannelAdc> {
    muxadc_core::build_adc(converter, cfg).wrap_err("build acquisition pipeline")
}

/// How a report is printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub channel: Option<u8>,
}

pub fn format_report(report: &Report, out: Output) -> String {
    match (out.json, out.channel) {
        (true, Some(ch)) => serde_json::json!({
            "cycle": report.cycle,
            "elapsed_us": report.elapsed_us,
            "channel": ch,
            "value": report.values[usize::from(ch)],
        })
        .to_string(),
        (true, None) => serde_json::json!({
            "cycle": report.cycle,
            "elapsed_us": report.elapsed_us,
            "values": report.values,
        })
        .to_string(),
        (false, Some(ch)) => format!("ADC_{ch}: {}", report.values[usize::from(ch)]),
        (false, None) => {
            let mut s = format!("cycle {} ({} us)", report.cycle, report.elapsed_us);
            for (i, v) in report.values.iter().enumerate() {
                s.push_str(&format!("\nADC_{i}: {v}"));
            }
            s
        }
    }
}

pub fn run_cmd(
    cfg: &Config,
    converter: Box<dyn Converter + Send>,
    cycles: Option<u64>,
    direct: bool,
    out: Output,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<u64> {
    let mut adc = build(cfg, converter)?;
    let params = RunParams {
        mode: if direct {
            SamplingMode::Direct
        } else {
            SamplingMode::Threaded
        },
        drain: DrainCfg::from(cfg),
        max_cycles: cycles,
    };
    muxadc_core::runner::run(&mut adc, &params, &shutdown, |r| {
        println!("{}", format_report(r, out));
    })
}

/// Run until the first publication; fails with `Stalled` once no conversion has
/// completed for `stall_ms`.
fn first_publication(
    cfg: &Config,
    converter: Box<dyn Converter + Send>,
    stall_ms: u64,
) -> eyre::Result<Report> {
    let mut adc = build(cfg, converter)?;
    let drain = DrainCfg {
        stall_ms,
        ..DrainCfg::from(cfg)
    };
    let params = RunParams {
        mode: SamplingMode::Threaded,
        drain,
        max_cycles: Some(1),
    };
    let stop = AtomicBool::new(false);
    let mut first = None;
    muxadc_core::runner::run(&mut adc, &params, &stop, |r| first = Some(*r))?;
    first.ok_or_else(|| eyre::eyre!("acquisition stopped before the first publication"))
}

pub fn read_cmd(
    cfg: &Config,
    converter: Box<dyn Converter + Send>,
    channel: u8,
    timeout_ms: u64,
    json: bool,
) -> eyre::Result<u16> {
    let report = first_publication(cfg, converter, timeout_ms.max(1))?;
    let value = report.values[usize::from(channel)];
    if json {
        println!(
            "{}",
            serde_json::json!({ "channel": channel, "value": value })
        );
    } else {
        println!("ADC_{channel}: {value}");
    }
    Ok(value)
}

pub fn self_check(
    cfg: &Config,
    converter: Box<dyn Converter + Send>,
    json: bool,
) -> eyre::Result<()> {
    let stall_ms = match cfg.acquisition.stall_ms {
        0 => CHECK_STALL_MS,
        ms => ms,
    };
    let report = first_publication(cfg, converter, stall_ms)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "backend": format!("{:?}", cfg.hardware.backend).to_lowercase(),
                "elapsed_us": report.elapsed_us,
                "values": report.values,
            })
        );
    } else {
        println!("OK: first publication after {} us", report.elapsed_us);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        Report {
            cycle: 3,
            elapsed_us: 1500,
            values: [0, 1, 2, 3, 4, 5, 6, 7],
        }
    }

    #[test]
    fn text_report_lists_every_channel() {
        let s = format_report(
            &report(),
            Output {
                json: false,
                channel: None,
            },
        );
        assert!(s.starts_with("cycle 3 (1500 us)"));
        assert!(s.contains("\nADC_7: 7"));
        assert_eq!(s.lines().count(), 9);
    }

    #[test]
    fn json_report_for_single_channel() {
        let s = format_report(
            &report(),
            Output {
                json: true,
                channel: Some(5),
            },
        );
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["value"], 5);
        assert_eq!(v["cycle"], 3);
    }

    #[test]
    fn relative_trace_resolves_next_to_config() {
        let p = resolve_relative(Path::new("/etc/muxadc/cfg.toml"), "trace.csv");
        assert_eq!(p, PathBuf::from("/etc/muxadc/trace.csv"));
        let abs = resolve_relative(Path::new("/etc/muxadc/cfg.toml"), "/tmp/t.csv");
        assert_eq!(abs, PathBuf::from("/tmp/t.csv"));
    }

    #[test]
    fn sim_params_follow_resolution() {
        let mut cfg = muxadc_config::load_toml("").unwrap();
        cfg.acquisition.resolution_bits = 12;
        let p = sim_params(&cfg).unwrap();
        assert_eq!(p.max_raw, 4095);
        assert_eq!(p.levels.len(), CHANNEL_COUNT);
    }
}
