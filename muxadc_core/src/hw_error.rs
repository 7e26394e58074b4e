//! Maps `Box<dyn Error>` from the `Converter` trait boundary to typed `AdcError`.
//!
//! The trait in `muxadc_traits` uses `Box<dyn Error + Send + Sync>` so backends stay
//! independent of this crate; this module converts those errors back, with an optional
//! feature-gated path for `muxadc_hardware::HwError` downcasting.

use crate::error::AdcError;

/// Map a trait-boundary error to a typed `AdcError`.
///
/// Tries known error types first, then falls back to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> AdcError {
    if let Some(adc) = e.downcast_ref::<AdcError>() {
        return adc.clone();
    }

    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<muxadc_hardware::error::HwError>() {
            use muxadc_hardware::error::HwError;
            return match hw {
                HwError::Timeout => AdcError::Timeout,
                HwError::NotArmed => AdcError::State(hw.to_string()),
                other => AdcError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        AdcError::Timeout
    } else {
        AdcError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_typed_errors_through() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(AdcError::Timeout);
        assert_eq!(map_hw_error(&*boxed), AdcError::Timeout);
    }

    #[test]
    fn falls_back_on_message_text() {
        let io = std::io::Error::other("bus timeout on read");
        assert_eq!(map_hw_error(&io), AdcError::Timeout);
        let io = std::io::Error::other("mux stuck");
        assert_eq!(map_hw_error(&io), AdcError::Hardware("mux stuck".into()));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn downcasts_hardware_errors() {
        use muxadc_hardware::error::HwError;
        assert_eq!(map_hw_error(&HwError::Timeout), AdcError::Timeout);
        assert!(matches!(
            map_hw_error(&HwError::Spi("nack".into())),
            AdcError::HardwareFault(_)
        ));
    }
}
