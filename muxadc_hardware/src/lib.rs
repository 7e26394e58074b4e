//! Converter backends: a seeded simulation, a CSV trace replayer and, behind the
//! `hardware` feature, an MCP3008 on the Raspberry Pi SPI bus.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp3008;
pub mod util;

use std::time::{Duration, Instant};

use muxadc_traits::{CHANNEL_COUNT, Channel, Conversion, Converter};

use crate::error::HwError;

const POLL_INTERVAL: Duration = Duration::from_micros(20);

/// Shape of the simulated analog inputs.
#[derive(Debug, Clone)]
pub struct SimParams {
    /// Steady level per channel in raw counts.
    pub levels: [u16; CHANNEL_COUNT],
    /// Peak amplitude of uniform jitter around the level.
    pub noise_amp: u16,
    /// Every Nth conversion of a channel reads `spike_value` (0 disables).
    pub spike_every: u32,
    pub spike_value: u16,
    pub seed: u32,
    pub conversion_time: Duration,
    /// Largest code the simulated converter can produce.
    pub max_raw: u16,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            levels: [0, 128, 256, 384, 512, 640, 768, 896],
            noise_amp: 4,
            spike_every: 7,
            spike_value: 1023,
            seed: 1,
            conversion_time: Duration::from_micros(60),
            max_raw: 1023,
        }
    }
}

/// Simulated single-resource multiplexed converter.
pub struct SimulatedAdc {
    params: SimParams,
    armed: Option<(Channel, Instant)>,
    conversions: [u32; CHANNEL_COUNT],
    rng: u32,
    enabled: bool,
}

impl SimulatedAdc {
    pub fn new(params: SimParams) -> Self {
        let rng = params.seed.max(1);
        Self {
            params,
            armed: None,
            conversions: [0; CHANNEL_COUNT],
            rng,
            enabled: true,
        }
    }

    /// A converter whose completion never fires, as if it was never enabled.
    pub fn disabled(params: SimParams) -> Self {
        Self {
            enabled: false,
            ..Self::new(params)
        }
    }

    fn next_jitter(&mut self) -> i32 {
        let amp = i32::from(self.params.noise_amp);
        if amp == 0 {
            return 0;
        }
        // xorshift32
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x % (2 * amp as u32 + 1)) as i32 - amp
    }

    fn sample(&mut self, channel: Channel) -> u16 {
        let n = &mut self.conversions[channel.index()];
        *n = n.wrapping_add(1);
        let count = *n;
        if self.params.spike_every > 0 && count % self.params.spike_every == 0 {
            return self.params.spike_value.min(self.params.max_raw);
        }
        let level = i32::from(self.params.levels[channel.index()]);
        let v = level + self.next_jitter();
        v.clamp(0, i32::from(self.params.max_raw)) as u16
    }
}

impl Converter for SimulatedAdc {
    fn arm(&mut self, channel: Channel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed = Some((channel, Instant::now() + self.params.conversion_time));
        Ok(())
    }

    fn wait_complete(
        &mut self,
        timeout: Duration,
    ) -> Result<Conversion, Box<dyn std::error::Error + Send + Sync>> {
        let (channel, ready_at) = self.armed.ok_or(HwError::NotArmed)?;
        let enabled = self.enabled;
        util::wait_while_busy(
            || !enabled || Instant::now() < ready_at,
            timeout,
            POLL_INTERVAL,
        )?;
        self.armed = None;
        let raw = self.sample(channel);
        tracing::trace!(channel = channel.index(), raw, "simulated conversion");
        Ok(Conversion { channel, raw })
    }
}

/// Plays recorded per-channel readings back in scan order, looping each channel.
pub struct ReplayAdc {
    channels: [Vec<u16>; CHANNEL_COUNT],
    cursors: [usize; CHANNEL_COUNT],
    armed: Option<Channel>,
    conversion_time: Duration,
}

impl ReplayAdc {
    pub fn new(channels: [Vec<u16>; CHANNEL_COUNT], conversion_time: Duration) -> Self {
        Self {
            channels,
            cursors: [0; CHANNEL_COUNT],
            armed: None,
            conversion_time,
        }
    }
}

impl Converter for ReplayAdc {
    fn arm(&mut self, channel: Channel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed = Some(channel);
        Ok(())
    }

    fn wait_complete(
        &mut self,
        timeout: Duration,
    ) -> Result<Conversion, Box<dyn std::error::Error + Send + Sync>> {
        let channel = self.armed.take().ok_or(HwError::NotArmed)?;
        if self.conversion_time > timeout {
            std::thread::sleep(timeout);
            self.armed = Some(channel);
            return Err(Box::new(HwError::Timeout));
        }
        std::thread::sleep(self.conversion_time);

        let data = &self.channels[channel.index()];
        let cursor = &mut self.cursors[channel.index()];
        let raw = if data.is_empty() {
            0
        } else {
            let v = data[*cursor % data.len()];
            *cursor = (*cursor + 1) % data.len();
            v
        };
        Ok(Conversion { channel, raw })
    }
}
