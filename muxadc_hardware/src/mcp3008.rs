use std::time::Duration;

use muxadc_traits::{Channel, Conversion, Converter};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::trace;

use crate::error::{HwError, Result};

/// MCP3008: 8-channel, 10-bit SAR converter on SPI.
///
/// A conversion is a single 3-byte full-duplex transfer, so `arm` only latches the
/// channel and `wait_complete` performs the transfer.
pub struct Mcp3008 {
    spi: Spi,
    armed: Option<Channel>,
}

impl Mcp3008 {
    pub fn new(bus: u8, cs: u8, clock_hz: u32) -> Result<Self> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(HwError::InvalidSelection(format!("bus {other}"))),
        };
        let ss = match cs {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::InvalidSelection(format!("chip select {other}"))),
        };
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0).map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi, armed: None })
    }

    fn read_single_ended(&mut self, channel: Channel) -> Result<u16> {
        // start bit, then SGL=1 + 3-bit channel in the high nibble
        let tx = [0x01, 0x80 | ((channel.index() as u8) << 4), 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let raw = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        trace!(channel = channel.index(), raw, "mcp3008 conversion");
        Ok(raw)
    }
}

impl Converter for Mcp3008 {
    fn arm(&mut self, channel: Channel) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed = Some(channel);
        Ok(())
    }

    fn wait_complete(
        &mut self,
        _timeout: Duration,
    ) -> std::result::Result<Conversion, Box<dyn std::error::Error + Send + Sync>> {
        let channel = self.armed.take().ok_or(HwError::NotArmed)?;
        match self.read_single_ended(channel) {
            Ok(raw) => Ok(Conversion { channel, raw }),
            Err(e) => {
                tracing::error!("MCP3008 read error: {}", e);
                Err(Box::new(e))
            }
        }
    }
}
