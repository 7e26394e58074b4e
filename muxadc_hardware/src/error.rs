use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("spi error: {0}")]
    Spi(String),
    #[error("conversion timeout")]
    Timeout,
    #[error("no conversion armed")]
    NotArmed,
    #[error("invalid spi selection: {0}")]
    InvalidSelection(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
