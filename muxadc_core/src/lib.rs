#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Multi-channel acquisition pipeline (hardware-agnostic).
//!
//! All converter access goes through `muxadc_traits::Converter`.
//!
//! ## Architecture
//!
//! - **Scheduler**: completion handler; clamps, stores and arms the next channel
//!   in the fixed 0..=7 route (`scheduler` module)
//! - **Rings**: one fixed-capacity ring per channel, capacity = median window (`ring`)
//! - **Median**: sorted-window sliding median shared by all channels (`median`)
//! - **Drain**: batch filter of all rings after N full scan cycles (`acquisition`)
//! - **Output store**: eight published values readable from any thread (`store`)
//! - **Runner**: drain loop with stall watchdog (`runner`)
//!
//! The completion handler runs either on a dedicated thread (`AcquisitionThread`) or in
//! the caller's thread through `MultiChannelAdc::poll_once`.

pub mod acquisition;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod median;
pub mod mocks;
pub mod ring;
pub mod runner;
pub mod sampler;
pub mod scheduler;
pub mod state;
pub mod status;
pub mod store;
pub mod util;

pub use acquisition::MultiChannelAdc;
pub use builder::MultiChannelAdcBuilder;
pub use config::{DrainCfg, FilterCfg, Timeouts, WindowSize};
pub use error::{AdcError, BuildError, Result};
pub use median::MedianFilter;
pub use ring::RingBuffer;
pub use status::DrainStatus;
pub use store::{OUT_OF_RANGE, OutputStore, UNFILLED};

pub use muxadc_traits::{CHANNEL_COUNT, Channel, Conversion, Converter};

use eyre::WrapErr;

/// Build a pipeline from a validated `muxadc_config::Config`.
pub fn build_adc<C>(converter: C, cfg: &muxadc_config::Config) -> Result<MultiChannelAdc>
where
    C: Converter + Send + 'static,
{
    let filter = FilterCfg::try_from(&cfg.filter)
        .map_err(eyre::Report::new)
        .wrap_err("filter config")?;
    MultiChannelAdc::builder()
        .with_converter(converter)
        .with_filter(filter)
        .with_timeouts(Timeouts::from(&cfg.acquisition))
        .build()
}
