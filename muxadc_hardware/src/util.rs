use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait while `busy` reports an in-flight conversion, or until `timeout` expires.
/// Sleeps in small intervals to avoid CPU spinning.
pub fn wait_while_busy(
    mut busy: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while busy() {
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}
