//! Logging configuration for the volume profile engine
//!
//! Logs go to stderr so that stdout only carries calculation output.

use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const DEFAULT_LEVEL_FILTER: &str = "info,volume_profile_engine=info";

/// Logging configuration options
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "volume_profile_engine=debug")
    pub level_filter: String,
    /// Emit structured JSON lines instead of human-readable text
    pub json_format: bool,
    /// Whether to include timestamps in text output
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level_filter: DEFAULT_LEVEL_FILTER.to_string(),
            json_format: false,
            timestamps: true,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level_filter`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level_filter))?;

    let layer = if config.json_format {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_level(true)
            .with_target(true)
            .with_timer(ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string()))
            .with_filter(filter)
            .boxed()
    } else if config.timestamps {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_level(true)
            .with_target(true)
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string()))
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_level(true)
            .with_target(true)
            .without_time()
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(
        level_filter = %config.level_filter,
        json_format = config.json_format,
        "Logging initialized"
    );
    Ok(())
}

/// Initialize simple logging for testing or minimal setups
pub fn init_simple_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(DEFAULT_LEVEL_FILTER)
        .try_init()?;
    Ok(())
}

/// Log basic environment information for debugging
pub fn log_system_info() {
    tracing::info!(
        package_version = env!("CARGO_PKG_VERSION"),
        target_arch = std::env::consts::ARCH,
        target_os = std::env::consts::OS,
        worker_threads = rayon::current_num_threads(),
        "Environment information"
    );
}
