//! Common time helpers for muxadc_core.

use std::time::Instant;

use muxadc_traits::Clock;

/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Microseconds elapsed on `clock` since `start`, saturating at `u64::MAX`.
#[inline]
pub fn elapsed_us<C: Clock + ?Sized>(clock: &C, start: Instant) -> u64 {
    let us = clock.now().saturating_duration_since(start).as_micros();
    us.min(u128::from(u64::MAX)) as u64
}

/// Threshold after which the drain loop warns that no conversion has completed.
///
/// At least four conversion timeouts, and never shorter than two drain intervals so a
/// single slow drain does not trip it. Always >= 1.
#[inline]
pub fn stall_warn_threshold_ms(conversion_timeout_ms: u64, interval_ms: u64) -> u64 {
    let fast = conversion_timeout_ms.saturating_mul(4);
    let two_intervals = interval_ms.saturating_mul(2);
    fast.max(two_intervals).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use muxadc_traits::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn warn_threshold_uses_larger_bound() {
        assert_eq!(stall_warn_threshold_ms(50, 100), 200);
        assert_eq!(stall_warn_threshold_ms(50, 10), 200);
        assert_eq!(stall_warn_threshold_ms(0, 0), 1);
    }

    #[test]
    fn elapsed_follows_clock() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(3));
        assert_eq!(elapsed_us(&clock, start), 3 * MICROS_PER_MILLI);
    }
}
