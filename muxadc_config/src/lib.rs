#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and trace parsing for the multi-channel acquisition pipeline.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The trace CSV loader enforces headers and groups recorded readings per channel
//!   so the replay converter can play them back in scan order.
use serde::Deserialize;

/// Number of analog inputs a trace or a simulated level table covers.
pub const CHANNELS: usize = 8;

/// Filter window sizes the median stage supports.
pub const ALLOWED_WINDOWS: [usize; 4] = [5, 7, 9, 11];

/// Trace CSV schema.
///
/// Expected headers:
/// channel,raw
///
/// Example:
/// channel,raw
/// 0,18
/// 3,1000
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TraceRow {
    pub channel: u8,
    pub raw: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Median window, also the per-channel ring capacity (5, 7, 9 or 11).
    pub window: usize,
    /// Readings strictly below this are stored as 0.
    pub noise_floor: u16,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            window: 5,
            noise_floor: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AcquisitionCfg {
    /// Converter resolution in bits (10 or 12).
    pub resolution_bits: u8,
    /// Max wait for a single conversion to complete (ms).
    pub conversion_timeout_ms: u64,
    /// Abort the run loop when no conversion completes for this long (0 disables).
    pub stall_ms: u64,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            resolution_bits: 10,
            conversion_timeout_ms: 50,
            stall_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DrainCfg {
    /// Foreground drain cadence in milliseconds.
    pub interval_ms: u64,
}

impl Default for DrainCfg {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sim,
    Replay,
    Mcp3008,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    pub backend: Backend,
    /// SPI bus index for the MCP3008 backend
    pub spi_bus: u8,
    /// SPI chip-select line for the MCP3008 backend
    pub spi_cs: u8,
    pub spi_clock_hz: u32,
    /// Trace CSV used by the replay backend
    pub replay: Option<String>,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            backend: Backend::Sim,
            spi_bus: 0,
            spi_cs: 0,
            spi_clock_hz: 1_000_000,
            replay: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    /// Steady level per channel in raw counts.
    pub levels: Vec<u16>,
    /// Peak amplitude of the uniform jitter added to each reading.
    pub noise_amp: u16,
    /// Inject an impulse every N conversions per channel (0 disables).
    pub spike_every: u32,
    pub spike_value: u16,
    pub seed: u32,
    /// Modelled conversion time in microseconds.
    pub conversion_us: u64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            levels: vec![0, 128, 256, 384, 512, 640, 768, 896],
            noise_amp: 4,
            spike_every: 7,
            spike_value: 1023,
            seed: 1,
            conversion_us: 60,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub filter: FilterCfg,
    pub acquisition: AcquisitionCfg,
    pub drain: DrainCfg,
    pub hardware: Hardware,
    pub sim: SimCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Recorded readings grouped per channel, in file order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trace {
    pub channels: [Vec<u16>; CHANNELS],
}

impl Trace {
    pub fn from_rows(rows: &[TraceRow]) -> eyre::Result<Self> {
        let mut trace = Trace::default();
        for (idx, row) in rows.iter().enumerate() {
            let Some(slot) = trace.channels.get_mut(row.channel as usize) else {
                eyre::bail!(
                    "trace row {} has channel {} (expected 0..={})",
                    idx,
                    row.channel,
                    CHANNELS - 1
                );
            };
            slot.push(row.raw);
        }
        Ok(trace)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }
}

impl TryFrom<Vec<TraceRow>> for Trace {
    type Error = eyre::Report;
    fn try_from(rows: Vec<TraceRow>) -> Result<Self, Self::Error> {
        Self::from_rows(&rows)
    }
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Trace> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["channel", "raw"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 'channel,raw', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    let trace = Trace::try_from(rows)?;
    if trace.is_empty() {
        eyre::bail!("trace CSV {:?} contains no readings", path);
    }
    Ok(trace)
}

impl Config {
    /// Largest raw reading the configured resolution can produce.
    pub fn max_raw(&self) -> u16 {
        match self.acquisition.resolution_bits {
            12 => 4095,
            _ => 1023,
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Acquisition
        if !matches!(self.acquisition.resolution_bits, 10 | 12) {
            eyre::bail!("acquisition.resolution_bits must be 10 or 12");
        }
        if self.acquisition.conversion_timeout_ms == 0 {
            eyre::bail!("acquisition.conversion_timeout_ms must be >= 1");
        }
        if self.acquisition.stall_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("acquisition.stall_ms is unreasonably large (>24h)");
        }

        // Filter
        if !ALLOWED_WINDOWS.contains(&self.filter.window) {
            eyre::bail!("filter.window must be one of 5, 7, 9, 11");
        }
        if self.filter.noise_floor > self.max_raw() {
            eyre::bail!(
                "filter.noise_floor must be <= {} for {}-bit resolution",
                self.max_raw(),
                self.acquisition.resolution_bits
            );
        }

        // Drain
        if self.drain.interval_ms == 0 {
            eyre::bail!("drain.interval_ms must be >= 1");
        }
        if self.drain.interval_ms > 60 * 1000 {
            eyre::bail!("drain.interval_ms is unreasonably large (>60s)");
        }

        // Hardware
        if self.hardware.backend == Backend::Replay && self.hardware.replay.is_none() {
            eyre::bail!("hardware.replay must be set when backend = \"replay\"");
        }
        if self.hardware.backend == Backend::Mcp3008 && self.acquisition.resolution_bits != 10 {
            eyre::bail!("mcp3008 backend requires acquisition.resolution_bits = 10");
        }
        if self.hardware.spi_clock_hz == 0 {
            eyre::bail!("hardware.spi_clock_hz must be > 0");
        }

        // Simulation
        if self.sim.levels.len() != CHANNELS {
            eyre::bail!("sim.levels must list exactly {} channel levels", CHANNELS);
        }
        if let Some(level) = self.sim.levels.iter().find(|&&l| l > self.max_raw()) {
            eyre::bail!(
                "sim.levels entry {} exceeds the {}-bit range",
                level,
                self.acquisition.resolution_bits
            );
        }
        if self.sim.spike_value > self.max_raw() {
            eyre::bail!("sim.spike_value exceeds converter range");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
