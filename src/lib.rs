pub mod config;
pub mod historical;
pub mod logging;
pub mod volume_profile;

pub use config::{AppConfig, ConfigError};
pub use historical::{load_candles, Candle, CandleDataError};
pub use volume_profile::{analyze, VolumeProfileCalculator, VolumeProfileError, VolumeProfileResult};
