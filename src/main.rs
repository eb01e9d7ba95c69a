use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

use volume_profile_engine::config::AppConfig;
use volume_profile_engine::historical::load_candles;
use volume_profile_engine::logging::{init_logging, init_simple_logging, log_system_info};
use volume_profile_engine::volume_profile::{validate_result, VolumeProfileCalculator};

/// Build a volume profile from a candle file and print it as JSON
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Candle file (.csv or .json)
    #[arg(short, long)]
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Symbol used to pick asset overrides from the configuration
    #[arg(short, long)]
    symbol: Option<String>,

    /// Number of price bins, overrides the configuration
    #[arg(short, long)]
    bins: Option<usize>,

    /// Value area fraction in (0, 1], overrides the configuration
    #[arg(long = "value-area")]
    value_area: Option<f64>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AppConfig::from_toml(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => AppConfig::default(),
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("❌ Failed to initialize logging: {}", e);
        if init_simple_logging().is_ok() {
            warn!("Using fallback logging");
        }
    }
    log_system_info();

    if let Err(e) = run(&cli, &config) {
        error!("💥 Volume profile failed: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut resolved = match &cli.symbol {
        Some(symbol) => config.volume_profile.resolve_for_asset(symbol),
        None => config.volume_profile.resolve_global(),
    };
    if let Some(bins) = cli.bins {
        resolved.num_bins = bins;
    }
    if let Some(fraction) = cli.value_area {
        resolved.value_area_fraction = fraction;
    }

    info!(
        input = %cli.input.display(),
        symbol = cli.symbol.as_deref().unwrap_or("-"),
        num_bins = resolved.num_bins,
        value_area_fraction = resolved.value_area_fraction,
        "🔧 Volume profile configuration"
    );

    let calculator = VolumeProfileCalculator::new(resolved)?;
    let candles = load_candles(&cli.input)?;
    let result = calculator.calculate(&candles)?;

    let report = validate_result(&candles, &result);
    for warning in &report.warnings {
        warn!("{}", warning);
    }

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);
    Ok(())
}
