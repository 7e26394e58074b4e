use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdcError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for conversion")]
    Timeout,
    #[error("acquisition stalled: no conversion completed for {ms} ms")]
    Stalled { ms: u64 },
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing converter")]
    MissingConverter,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
