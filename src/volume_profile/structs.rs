use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::VolumeProfileError;

pub const DEFAULT_NUM_BINS: usize = 20;
pub const DEFAULT_VALUE_AREA_FRACTION: f64 = 0.70;
pub const DEFAULT_HVN_THRESHOLD: f64 = 1.5;
pub const DEFAULT_LVN_THRESHOLD: f64 = 0.5;
/// Candle count from which aggregation switches to the rayon fold/reduce pass
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50_000;

/// Asset-specific volume profile configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_bins: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_area_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hvn_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lvn_threshold: Option<f64>,
}

/// Volume profile configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    /// Number of price bins in every profile
    pub num_bins: usize,
    /// Fraction of total volume the value area must enclose, in (0, 1]
    pub value_area_fraction: f64,
    /// Bins above this multiple of the mean bin volume are High Volume Nodes
    pub hvn_threshold: f64,
    /// Bins below this multiple of the mean bin volume are Low Volume Nodes
    pub lvn_threshold: f64,
    pub parallel_threshold: usize,
    pub asset_overrides: HashMap<String, AssetConfig>,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            num_bins: DEFAULT_NUM_BINS,
            value_area_fraction: DEFAULT_VALUE_AREA_FRACTION,
            hvn_threshold: DEFAULT_HVN_THRESHOLD,
            lvn_threshold: DEFAULT_LVN_THRESHOLD,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            asset_overrides: HashMap::new(),
        }
    }
}

impl VolumeProfileConfig {
    /// Resolve configuration for a specific asset, applying overrides if they exist
    pub fn resolve_for_asset(&self, symbol: &str) -> ResolvedAssetConfig {
        let asset_override = self.asset_overrides.get(symbol);

        ResolvedAssetConfig {
            num_bins: asset_override
                .and_then(|c| c.num_bins)
                .unwrap_or(self.num_bins),
            value_area_fraction: asset_override
                .and_then(|c| c.value_area_fraction)
                .unwrap_or(self.value_area_fraction),
            hvn_threshold: asset_override
                .and_then(|c| c.hvn_threshold)
                .unwrap_or(self.hvn_threshold),
            lvn_threshold: asset_override
                .and_then(|c| c.lvn_threshold)
                .unwrap_or(self.lvn_threshold),
            parallel_threshold: self.parallel_threshold,
        }
    }

    /// Configuration without any asset override applied
    pub fn resolve_global(&self) -> ResolvedAssetConfig {
        self.resolve_for_asset("")
    }

    /// Validate the global values and every asset override
    pub fn validate(&self) -> Result<(), VolumeProfileError> {
        self.resolve_global().validate()?;

        for symbol in self.asset_overrides.keys() {
            self.resolve_for_asset(symbol).validate().map_err(|e| match e {
                VolumeProfileError::InvalidConfiguration(msg) => {
                    VolumeProfileError::InvalidConfiguration(format!("Asset {}: {}", symbol, msg))
                }
                other => other,
            })?;
        }

        Ok(())
    }
}

/// Resolved configuration for a specific asset after applying overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedAssetConfig {
    pub num_bins: usize,
    pub value_area_fraction: f64,
    pub hvn_threshold: f64,
    pub lvn_threshold: f64,
    pub parallel_threshold: usize,
}

impl Default for ResolvedAssetConfig {
    fn default() -> Self {
        VolumeProfileConfig::default().resolve_global()
    }
}

impl ResolvedAssetConfig {
    /// Configuration with the given bin count and value area fraction, defaults elsewhere
    pub fn new(num_bins: usize, value_area_fraction: f64) -> Self {
        Self {
            num_bins,
            value_area_fraction,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), VolumeProfileError> {
        validate_num_bins(self.num_bins)?;
        validate_value_area_fraction(self.value_area_fraction)?;

        if !(self.hvn_threshold.is_finite() && self.hvn_threshold > 0.0) {
            return Err(VolumeProfileError::InvalidConfiguration(format!(
                "hvn_threshold must be a positive number, got {}",
                self.hvn_threshold
            )));
        }
        if !(self.lvn_threshold.is_finite() && self.lvn_threshold > 0.0) {
            return Err(VolumeProfileError::InvalidConfiguration(format!(
                "lvn_threshold must be a positive number, got {}",
                self.lvn_threshold
            )));
        }
        if self.lvn_threshold >= self.hvn_threshold {
            return Err(VolumeProfileError::InvalidConfiguration(format!(
                "lvn_threshold ({}) must be below hvn_threshold ({})",
                self.lvn_threshold, self.hvn_threshold
            )));
        }

        Ok(())
    }
}

pub(crate) fn validate_num_bins(num_bins: usize) -> Result<(), VolumeProfileError> {
    if num_bins == 0 {
        return Err(VolumeProfileError::InvalidConfiguration(
            "num_bins must be positive, got 0".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_value_area_fraction(fraction: f64) -> Result<(), VolumeProfileError> {
    // NaN fails both comparisons
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(VolumeProfileError::InvalidConfiguration(format!(
            "value area fraction must be in (0, 1], got {}",
            fraction
        )));
    }
    Ok(())
}

/// One discretized price interval of a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    /// Bin-center price
    pub price_level: f64,
    pub volume: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    #[serde(rename = "isPOC")]
    pub is_poc: bool,
}

impl Bin {
    pub fn empty(price_level: f64) -> Self {
        Self {
            price_level,
            volume: 0.0,
            buy_volume: 0.0,
            sell_volume: 0.0,
            is_poc: false,
        }
    }

    /// Share of `total_volume` traded in this bin, in percent
    pub fn percent_of_total(&self, total_volume: f64) -> f64 {
        if total_volume > 0.0 {
            (self.volume / total_volume) * 100.0
        } else {
            0.0
        }
    }

    /// Buy-side share of this bin's volume in percent; 50 for an empty bin
    pub fn buy_ratio(&self) -> f64 {
        if self.volume > 0.0 {
            (self.buy_volume / self.volume) * 100.0
        } else {
            50.0
        }
    }

    pub fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }
}

/// Bins ordered by ascending price level
pub type Profile = Vec<Bin>;

/// Value area around the point of control
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueArea {
    /// Point of Control price level
    pub poc: f64,
    /// Value Area High
    pub vah: f64,
    /// Value Area Low
    pub val: f64,
    /// Volume enclosed between val and vah
    pub volume: f64,
    /// Enclosed volume as a percentage of total volume
    pub volume_percentage: f64,
}

impl ValueArea {
    /// Whether a bin price level lies inside the value area
    pub fn contains(&self, price: f64) -> bool {
        price >= self.val && price <= self.vah
    }

    pub fn width(&self) -> f64 {
        self.vah - self.val
    }
}

/// Aggregate figures for a finished profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub total_volume: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    /// buy_volume - sell_volume
    pub delta: f64,
    /// Volume weighted average of the bin-center prices
    pub vwap: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub bin_size: f64,
    pub candle_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "HVN")]
    HighVolume,
    #[serde(rename = "LVN")]
    LowVolume,
}

/// A bin standing out from the mean bin volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeNode {
    pub price_level: f64,
    pub volume: f64,
    pub percent_of_total: f64,
    pub kind: NodeKind,
}

/// Everything produced by one profile calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProfileResult {
    pub profile: Profile,
    pub value_area: ValueArea,
    pub summary: ProfileSummary,
    pub nodes: Vec<VolumeNode>,
}

impl VolumeProfileResult {
    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }

    /// The bin marked as point of control
    pub fn poc_bin(&self) -> Option<&Bin> {
        self.profile.iter().find(|bin| bin.is_poc)
    }

    /// Bins whose price level lies inside the value area
    pub fn value_area_bins(&self) -> impl Iterator<Item = &Bin> + '_ {
        self.profile
            .iter()
            .filter(move |bin| self.value_area.contains(bin.price_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VolumeProfileConfig::default();
        assert_eq!(config.num_bins, 20);
        assert_eq!(config.value_area_fraction, 0.70);
        assert!(config.asset_overrides.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_asset_specific_config_resolution() {
        let mut config = VolumeProfileConfig::default();
        config.asset_overrides.insert(
            "BTCUSDT".to_string(),
            AssetConfig {
                num_bins: Some(40),
                value_area_fraction: Some(0.68),
                ..AssetConfig::default()
            },
        );

        let btc = config.resolve_for_asset("BTCUSDT");
        assert_eq!(btc.num_bins, 40);
        assert_eq!(btc.value_area_fraction, 0.68);
        assert_eq!(btc.hvn_threshold, DEFAULT_HVN_THRESHOLD);

        let eth = config.resolve_for_asset("ETHUSDT");
        assert_eq!(eth.num_bins, DEFAULT_NUM_BINS);
        assert_eq!(eth.value_area_fraction, DEFAULT_VALUE_AREA_FRACTION);
    }

    #[test]
    fn test_config_validation() {
        let mut config = VolumeProfileConfig::default();
        config.num_bins = 0;
        assert!(matches!(config.validate(), Err(VolumeProfileError::InvalidConfiguration(_))));

        for fraction in [0.0, -0.1, 1.01, f64::NAN] {
            let config = VolumeProfileConfig {
                value_area_fraction: fraction,
                ..VolumeProfileConfig::default()
            };
            assert!(config.validate().is_err(), "fraction {} should be rejected", fraction);
        }

        let full = VolumeProfileConfig {
            value_area_fraction: 1.0,
            ..VolumeProfileConfig::default()
        };
        assert!(full.validate().is_ok());

        let inverted = VolumeProfileConfig {
            hvn_threshold: 0.4,
            lvn_threshold: 0.5,
            ..VolumeProfileConfig::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_invalid_asset_override_names_symbol() {
        let mut config = VolumeProfileConfig::default();
        config.asset_overrides.insert(
            "SOLUSDT".to_string(),
            AssetConfig {
                num_bins: Some(0),
                ..AssetConfig::default()
            },
        );

        match config.validate() {
            Err(VolumeProfileError::InvalidConfiguration(msg)) => assert!(msg.starts_with("Asset SOLUSDT")),
            other => panic!("expected invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_bin_ratios() {
        let bin = Bin {
            price_level: 100.0,
            volume: 40.0,
            buy_volume: 30.0,
            sell_volume: 10.0,
            is_poc: false,
        };
        assert_eq!(bin.percent_of_total(200.0), 20.0);
        assert_eq!(bin.buy_ratio(), 75.0);
        assert_eq!(bin.delta(), 20.0);

        let empty = Bin::empty(1.0);
        assert_eq!(empty.buy_ratio(), 50.0);
        assert_eq!(empty.percent_of_total(0.0), 0.0);
    }

    #[test]
    fn test_bin_json_field_names() {
        let json = serde_json::to_value(Bin::empty(95.0)).unwrap();
        assert_eq!(json["priceLevel"], 95.0);
        assert_eq!(json["buyVolume"], 0.0);
        assert_eq!(json["sellVolume"], 0.0);
        assert_eq!(json["isPOC"], false);

        let result = serde_json::to_value(VolumeProfileResult::default()).unwrap();
        assert!(result.get("valueArea").is_some());
        assert_eq!(result["valueArea"]["poc"], 0.0);
    }

    #[test]
    fn test_value_area_contains() {
        let va = ValueArea {
            poc: 100.0,
            vah: 105.0,
            val: 95.0,
            volume: 70.0,
            volume_percentage: 70.0,
        };
        assert!(va.contains(95.0));
        assert!(va.contains(105.0));
        assert!(!va.contains(105.5));
        assert_eq!(va.width(), 10.0);
    }
}
