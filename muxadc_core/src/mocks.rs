//! Test and helper converters for muxadc_core.
//!
//! `InjectedConverter` stands in for the hardware interrupt: readings pushed through
//! its `EventInjector` complete whichever channel is armed, in order.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel as xch;
use muxadc_traits::{Channel, Conversion, Converter};

use crate::error::AdcError;

/// A converter that accepts `arm` but never completes, like a converter that was
/// never enabled.
pub struct NoopConverter;

impl Converter for NoopConverter {
    fn arm(&mut self, _channel: Channel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn wait_complete(
        &mut self,
        timeout: Duration,
    ) -> Result<Conversion, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(timeout);
        Err(Box::new(AdcError::Timeout))
    }
}

/// Record of every channel armed on an `InjectedConverter`.
#[derive(Debug, Clone, Default)]
pub struct ArmLog(Arc<Mutex<Vec<Channel>>>);

impl ArmLog {
    pub fn channels(&self) -> Vec<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|c| c.index())
            .collect()
    }

    fn push(&self, channel: Channel) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(channel);
    }
}

pub struct InjectedConverter {
    rx: xch::Receiver<u16>,
    armed: Option<Channel>,
    log: ArmLog,
}

/// Producer side of an `InjectedConverter`.
#[derive(Clone)]
pub struct EventInjector {
    tx: xch::Sender<u16>,
}

impl EventInjector {
    /// Complete the next armed conversion with `raw`.
    pub fn complete(&self, raw: u16) {
        if self.tx.send(raw).is_err() {
            tracing::debug!("injected converter dropped; reading discarded");
        }
    }

    pub fn complete_all(&self, raws: impl IntoIterator<Item = u16>) {
        for raw in raws {
            self.complete(raw);
        }
    }
}

/// Build a connected converter/injector pair.
pub fn injected() -> (InjectedConverter, EventInjector) {
    let (tx, rx) = xch::unbounded();
    (
        InjectedConverter {
            rx,
            armed: None,
            log: ArmLog::default(),
        },
        EventInjector { tx },
    )
}

impl InjectedConverter {
    pub fn arm_log(&self) -> ArmLog {
        self.log.clone()
    }
}

impl Converter for InjectedConverter {
    fn arm(&mut self, channel: Channel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed = Some(channel);
        self.log.push(channel);
        Ok(())
    }

    fn wait_complete(
        &mut self,
        timeout: Duration,
    ) -> Result<Conversion, Box<dyn std::error::Error + Send + Sync>> {
        let channel = self
            .armed
            .ok_or_else(|| AdcError::State("no conversion armed".into()))?;
        match self.rx.recv_timeout(timeout) {
            Ok(raw) => {
                self.armed = None;
                Ok(Conversion { channel, raw })
            }
            Err(xch::RecvTimeoutError::Timeout) => Err(Box::new(AdcError::Timeout)),
            Err(xch::RecvTimeoutError::Disconnected) => Err(Box::new(AdcError::Hardware(
                "event injector disconnected".into(),
            ))),
        }
    }
}
