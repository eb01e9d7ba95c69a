use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeProfileError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },
}
