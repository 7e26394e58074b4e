//! Human-readable error descriptions and structured JSON error formatting.

use muxadc_core::error::{AdcError, BuildError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingConverter => {
                "What happened: No converter was provided to the acquisition pipeline.\nLikely causes: The selected backend failed to initialize.\nHow to fix: Check [hardware] backend in the config and the log output above.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the override flags, then rerun."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<AdcError>() {
        return match ae {
            AdcError::Stalled { ms } => format!(
                "What happened: No conversion completed for {ms} ms.\nLikely causes: Converter not enabled, wrong SPI bus/chip select, or no power to the ADC.\nHow to fix: Verify wiring and [hardware] settings; raise acquisition.stall_ms if the converter is slow."
            ),
            AdcError::Timeout => "What happened: Conversion timed out.\nLikely causes: Converter not responding or conversion_timeout_ms set too low.\nHow to fix: Verify wiring and consider increasing acquisition.conversion_timeout_ms.".to_string(),
            AdcError::HardwareFault(msg) | AdcError::Hardware(msg) => format!(
                "What happened: Converter error ({msg}).\nLikely causes: SPI device missing or insufficient permissions.\nHow to fix: Check [hardware] spi_bus/spi_cs and that the process may open the SPI device."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 'channel,raw'.".to_string();
    }

    if lower.contains("open mcp3008") || lower.contains("requires a linux build") {
        return format!(
            "What happened: Failed to open the MCP3008 converter.\nLikely causes: Binary built without the hardware feature, SPI disabled, or wrong bus/chip select.\nHow to fix: Build with --features hardware, enable SPI, and check [hardware]. Original: {msg}"
        );
    }

    if lower.contains("must be")
        || lower.contains("unreasonably large")
        || lower.contains("exceeds")
        || lower.contains("parse config")
    {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: stalls and timeouts get their own, everything else is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<AdcError>() {
        Some(AdcError::Stalled { .. }) => 3,
        Some(AdcError::Timeout) => 4,
        Some(AdcError::Hardware(_) | AdcError::HardwareFault(_)) => 5,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ae) = err.downcast_ref::<AdcError>() {
        return match ae {
            AdcError::Stalled { .. } => "Stalled",
            AdcError::Timeout => "Timeout",
            AdcError::Hardware(_) | AdcError::HardwareFault(_) => "Hardware",
            AdcError::State(_) => "State",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(AdcError::Stalled { ms }) = err.downcast_ref::<AdcError>() {
        return json!({
            "reason": "Stalled",
            "details": { "stalled_ms": ms },
            "message": humanize(err),
        })
        .to_string();
    }
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_maps_to_exit_code_and_json_details() {
        let err = eyre::Report::new(AdcError::Stalled { ms: 1200 });
        assert_eq!(exit_code_for_error(&err), 3);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Stalled");
        assert_eq!(v["details"]["stalled_ms"], 1200);
        assert!(humanize(&err).contains("1200 ms"));
    }

    #[test]
    fn config_messages_are_explained() {
        let err = eyre::eyre!("filter.window must be one of 5, 7, 9, 11");
        let h = humanize(&err);
        assert!(h.starts_with("What happened: Configuration is invalid."));
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn wrapped_errors_keep_their_type() {
        use eyre::WrapErr;
        let err: eyre::Result<()> = Err(eyre::Report::new(BuildError::MissingConverter));
        let err = err.wrap_err("build acquisition pipeline").unwrap_err();
        assert!(humanize(&err).contains("No converter"));
    }
}
