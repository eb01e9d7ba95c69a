use rayon::prelude::*;
use tracing::{debug, info};

use super::bins::BinLayout;
use super::distribution::{classify_candle, distribute_candle, merge_bins};
use super::errors::VolumeProfileError;
use super::nodes::detect_volume_nodes;
use super::structs::{validate_num_bins, Profile, ProfileSummary, ResolvedAssetConfig, VolumeProfileResult};
use super::value_area::{calculate_value_area, locate_poc};
use crate::historical::structs::Candle;

/// Volume profile calculator for one resolved configuration.
///
/// Holds no state between calls: every `calculate` builds a fresh profile.
#[derive(Debug, Clone)]
pub struct VolumeProfileCalculator {
    config: ResolvedAssetConfig,
}

impl VolumeProfileCalculator {
    /// Create a calculator, rejecting invalid configuration up front
    pub fn new(config: ResolvedAssetConfig) -> Result<Self, VolumeProfileError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResolvedAssetConfig {
        &self.config
    }

    /// Profile, value area, summary and volume nodes for a candle series
    pub fn calculate(&self, candles: &[Candle]) -> Result<VolumeProfileResult, VolumeProfileError> {
        let Some((mut profile, layout)) = aggregate(candles, self.config.num_bins, self.config.parallel_threshold)?
        else {
            debug!("No candles supplied, returning empty volume profile");
            return Ok(VolumeProfileResult::default());
        };

        locate_poc(&mut profile);
        let value_area = calculate_value_area(&profile, self.config.value_area_fraction)?;
        let summary = summarize(&profile, &layout, candles.len());
        let nodes = detect_volume_nodes(&profile, self.config.hvn_threshold, self.config.lvn_threshold);

        info!(
            candles = candles.len(),
            bins = profile.len(),
            total_volume = summary.total_volume,
            poc = value_area.poc,
            vah = value_area.vah,
            val = value_area.val,
            "Volume profile calculated"
        );

        Ok(VolumeProfileResult {
            profile,
            value_area,
            summary,
            nodes,
        })
    }
}

/// Profile and value area for `candles` split into `num_bins` bins.
///
/// Empty input gives an empty profile and an all-zero value area. Node
/// thresholds and the parallel threshold take their defaults.
pub fn analyze(
    candles: &[Candle],
    num_bins: usize,
    target_fraction: f64,
) -> Result<VolumeProfileResult, VolumeProfileError> {
    VolumeProfileCalculator::new(ResolvedAssetConfig::new(num_bins, target_fraction))?.calculate(candles)
}

/// Aggregate every candle into `num_bins` bins, ascending by price.
///
/// POC flags are left unset.
pub fn build_profile(candles: &[Candle], num_bins: usize) -> Result<Profile, VolumeProfileError> {
    Ok(aggregate(candles, num_bins, usize::MAX)?
        .map(|(profile, _)| profile)
        .unwrap_or_default())
}

/// Same bins as [`build_profile`], computed as a rayon fold/reduce over candles
pub fn build_profile_parallel(candles: &[Candle], num_bins: usize) -> Result<Profile, VolumeProfileError> {
    Ok(aggregate(candles, num_bins, 0)?
        .map(|(profile, _)| profile)
        .unwrap_or_default())
}

fn aggregate(
    candles: &[Candle],
    num_bins: usize,
    parallel_threshold: usize,
) -> Result<Option<(Profile, BinLayout)>, VolumeProfileError> {
    validate_num_bins(num_bins)?;
    validate_candles(candles)?;

    let Some(layout) = BinLayout::from_candles(candles, num_bins)? else {
        return Ok(None);
    };

    let profile = if candles.len() >= parallel_threshold {
        debug!(candles = candles.len(), "Aggregating volume profile in parallel");
        aggregate_parallel(&layout, candles)
    } else {
        aggregate_sequential(&layout, candles)
    };

    Ok(Some((profile, layout)))
}

fn validate_candles(candles: &[Candle]) -> Result<(), VolumeProfileError> {
    for (index, candle) in candles.iter().enumerate() {
        if let Some(reason) = candle.invalid_reason() {
            return Err(VolumeProfileError::InvalidCandle { index, reason });
        }
    }
    Ok(())
}

fn aggregate_sequential(layout: &BinLayout, candles: &[Candle]) -> Profile {
    candles
        .iter()
        .enumerate()
        .fold(layout.skeleton(), |mut bins, (index, candle)| {
            distribute_candle(layout, candle, classify_candle(candles, index), &mut bins);
            bins
        })
}

fn aggregate_parallel(layout: &BinLayout, candles: &[Candle]) -> Profile {
    let skeleton = layout.skeleton();
    candles
        .par_iter()
        .enumerate()
        .fold(
            || skeleton.clone(),
            |mut bins, (index, candle)| {
                distribute_candle(layout, candle, classify_candle(candles, index), &mut bins);
                bins
            },
        )
        .reduce(
            || skeleton.clone(),
            |mut acc, bins| {
                merge_bins(&mut acc, &bins);
                acc
            },
        )
}

fn summarize(profile: &Profile, layout: &BinLayout, candle_count: usize) -> ProfileSummary {
    let (total_volume, buy_volume, sell_volume, weighted_price) = profile.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(total, buy, sell, weighted), bin| {
            (
                total + bin.volume,
                buy + bin.buy_volume,
                sell + bin.sell_volume,
                weighted + bin.price_level * bin.volume,
            )
        },
    );

    ProfileSummary {
        total_volume,
        buy_volume,
        sell_volume,
        delta: buy_volume - sell_volume,
        vwap: if total_volume > 0.0 { weighted_price / total_volume } else { 0.0 },
        min_price: layout.min_price,
        max_price: layout.max_price,
        bin_size: layout.bin_size,
        candle_count,
    }
}
