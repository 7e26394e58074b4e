#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validate must reject bad documents without panicking.
    if let Ok(cfg) = muxadc_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A validated config always maps onto the core filter settings
            let filter = muxadc_core::FilterCfg::try_from(&cfg.filter);
            assert!(filter.is_ok());
            assert!(cfg.filter.noise_floor <= cfg.max_raw());
        }
    }
});
