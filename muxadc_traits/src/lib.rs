pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::fmt;
use std::time::Duration;

/// Number of multiplexed analog inputs.
pub const CHANNEL_COUNT: usize = 8;

/// One of the eight fixed analog inputs (0..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel(0),
        Channel(1),
        Channel(2),
        Channel(3),
        Channel(4),
        Channel(5),
        Channel(6),
        Channel(7),
    ];

    /// First channel of every scan cycle.
    pub const FIRST: Channel = Channel(0);

    /// Returns `None` for indices outside 0..=7.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for Channel {
    type Error = usize;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        u8::try_from(index)
            .ok()
            .and_then(Channel::new)
            .ok_or(index)
    }
}

/// Result of one completed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub channel: Channel,
    pub raw: u16,
}

/// A single shared conversion resource that targets one channel at a time.
///
/// `arm` selects the input and starts a conversion; `wait_complete` blocks until that
/// conversion finishes (the "completion notification") or `timeout` expires.
pub trait Converter {
    fn arm(&mut self, channel: Channel) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn wait_complete(
        &mut self,
        timeout: Duration,
    ) -> Result<Conversion, Box<dyn std::error::Error + Send + Sync>>;
}

impl<C: Converter + ?Sized> Converter for Box<C> {
    fn arm(&mut self, channel: Channel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).arm(channel)
    }

    fn wait_complete(
        &mut self,
        timeout: Duration,
    ) -> Result<Conversion, Box<dyn std::error::Error + Send + Sync>> {
        (**self).wait_complete(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_bounds() {
        assert_eq!(Channel::new(7).map(Channel::index), Some(7));
        assert!(Channel::new(8).is_none());
        assert!(Channel::try_from(300usize).is_err());
        assert_eq!(Channel::try_from(3usize), Ok(Channel::ALL[3]));
    }
}
