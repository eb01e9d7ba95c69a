//! Price range and bin geometry for a candle series.

use tracing::{debug, warn};

use super::errors::VolumeProfileError;
use super::structs::{validate_num_bins, Bin, Profile};
use crate::historical::structs::Candle;

/// Width of the synthetic range built around a flat series, relative to its price
pub const DEGENERATE_RELATIVE_SPAN: f64 = 1e-3;
/// Lower bound on the synthetic range width (flat series at or near zero)
pub const DEGENERATE_MIN_SPAN: f64 = 1e-8;
/// Bins narrower than this many ulps of the price cannot be told apart
const BIN_RESOLUTION_ULPS: f64 = 4.0;

/// Evenly spaced bins tiling `[min_price, max_price]`
///
/// Bin `i` covers `[min_price + i * bin_size, min_price + (i + 1) * bin_size)`.
/// The last bin is closed at the top and ends exactly at `max_price`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    pub min_price: f64,
    pub max_price: f64,
    pub bin_size: f64,
    pub num_bins: usize,
    /// True when the range was synthesized around a single price point
    pub degenerate: bool,
}

/// Lowest low and highest high over the series
pub fn price_range(candles: &[Candle]) -> Option<(f64, f64)> {
    if candles.is_empty() {
        return None;
    }

    let (min_price, max_price) = candles.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), candle| (lo.min(candle.low), hi.max(candle.high)),
    );
    Some((min_price, max_price))
}

impl BinLayout {
    /// Build the layout for a non-empty series
    pub fn from_candles(candles: &[Candle], num_bins: usize) -> Result<Option<Self>, VolumeProfileError> {
        validate_num_bins(num_bins)?;
        match price_range(candles) {
            Some((min_price, max_price)) => Self::from_price_range(min_price, max_price, num_bins).map(Some),
            None => Ok(None),
        }
    }

    /// Split `[min_price, max_price]` into `num_bins` bins.
    ///
    /// A zero-width range, or one too narrow for `num_bins` distinct bins at this
    /// price magnitude, is widened to `max(|price| * 1e-3, 1e-8)` centred on the
    /// midpoint so that bins keep a positive, evenly spaced width.
    pub fn from_price_range(min_price: f64, max_price: f64, num_bins: usize) -> Result<Self, VolumeProfileError> {
        validate_num_bins(num_bins)?;

        let bin_size = (max_price - min_price) / num_bins as f64;
        let resolution = min_price.abs().max(max_price.abs()) * f64::EPSILON * BIN_RESOLUTION_ULPS;
        if max_price > min_price && bin_size > resolution {
            debug!(min_price, max_price, bin_size, num_bins, "Built bin layout");
            return Ok(Self {
                min_price,
                max_price,
                bin_size,
                num_bins,
                degenerate: false,
            });
        }

        let price = min_price + (max_price - min_price) / 2.0;
        let span = (price.abs() * DEGENERATE_RELATIVE_SPAN)
            .max(DEGENERATE_MIN_SPAN)
            .max(2.0 * (max_price - min_price));
        let half = span / 2.0;
        let (synthetic_min, synthetic_max) = (price - half, price + half);
        if max_price > min_price {
            warn!(
                min_price,
                max_price,
                num_bins,
                synthetic_min,
                synthetic_max,
                "Price range too narrow to resolve bins, using a synthetic price range"
            );
        } else {
            warn!(
                price,
                synthetic_min,
                synthetic_max,
                "All candles share one price point, using a synthetic price range"
            );
        }

        Ok(Self {
            min_price: synthetic_min,
            max_price: synthetic_max,
            bin_size: (synthetic_max - synthetic_min) / num_bins as f64,
            num_bins,
            degenerate: true,
        })
    }

    pub fn bin_start(&self, index: usize) -> f64 {
        self.min_price + index as f64 * self.bin_size
    }

    pub fn bin_end(&self, index: usize) -> f64 {
        if index + 1 >= self.num_bins {
            self.max_price
        } else {
            self.bin_start(index + 1)
        }
    }

    /// Bin-center price
    pub fn price_level(&self, index: usize) -> f64 {
        self.bin_start(index) + self.bin_size / 2.0
    }

    /// Whether `price` falls into bin `index` under the half-open rule
    pub fn contains(&self, index: usize, price: f64) -> bool {
        let start = self.bin_start(index);
        let end = self.bin_end(index);
        let is_last = index + 1 == self.num_bins;
        price >= start && (price < end || (is_last && price <= end))
    }

    /// Approximate bin index for a price, clamped into the layout
    pub fn approx_index(&self, price: f64) -> usize {
        let raw = ((price - self.min_price) / self.bin_size).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.num_bins - 1)
        }
    }

    /// Bins with zero volume, ascending by price level
    pub fn skeleton(&self) -> Profile {
        (0..self.num_bins).map(|i| Bin::empty(self.price_level(i))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_range() {
        let candles = vec![
            Candle::new(100.0, 90.0, 95.0, 10.0),
            Candle::new(110.0, 95.0, 105.0, 10.0),
            Candle::new(104.0, 85.0, 90.0, 10.0),
        ];
        assert_eq!(price_range(&candles), Some((85.0, 110.0)));
        assert_eq!(price_range(&[]), None);
    }

    #[test]
    fn test_layout_geometry() {
        let layout = BinLayout::from_price_range(90.0, 100.0, 5).unwrap();
        assert_eq!(layout.bin_size, 2.0);
        assert!(!layout.degenerate);

        let skeleton = layout.skeleton();
        assert_eq!(skeleton.len(), 5);
        let levels: Vec<f64> = skeleton.iter().map(|b| b.price_level).collect();
        assert_eq!(levels, vec![91.0, 93.0, 95.0, 97.0, 99.0]);
        assert!(skeleton.iter().all(|b| b.volume == 0.0 && !b.is_poc));

        assert_eq!(layout.bin_end(4), 100.0);
    }

    #[test]
    fn test_half_open_membership() {
        let layout = BinLayout::from_price_range(90.0, 100.0, 5).unwrap();
        assert!(layout.contains(0, 90.0));
        assert!(!layout.contains(0, 92.0));
        assert!(layout.contains(1, 92.0));
        // Top edge belongs to the last bin
        assert!(layout.contains(4, 100.0));
        assert!(!layout.contains(4, 100.5));
        assert!(!layout.contains(0, 89.9));
    }

    #[test]
    fn test_zero_bins_rejected() {
        assert!(matches!(
            BinLayout::from_price_range(1.0, 2.0, 0),
            Err(VolumeProfileError::InvalidConfiguration(_))
        ));
        assert!(BinLayout::from_candles(&[], 0).is_err());
        assert_eq!(BinLayout::from_candles(&[], 10).unwrap(), None);
    }

    #[test]
    fn test_degenerate_range_is_widened() {
        let layout = BinLayout::from_price_range(50_000.0, 50_000.0, 10).unwrap();
        assert!(layout.degenerate);
        assert!(layout.bin_size > 0.0);
        assert!((layout.max_price - layout.min_price - 50.0).abs() < 1e-9);
        assert!(layout.min_price < 50_000.0 && layout.max_price > 50_000.0);

        let matching: Vec<usize> = (0..10).filter(|&i| layout.contains(i, 50_000.0)).collect();
        assert_eq!(matching.len(), 1);

        let at_zero = BinLayout::from_price_range(0.0, 0.0, 4).unwrap();
        assert!(at_zero.bin_size > 0.0);
        assert_eq!(at_zero.max_price - at_zero.min_price, DEGENERATE_MIN_SPAN);
    }

    #[test]
    fn test_unresolvable_range_falls_back_to_synthetic_range() {
        let layout = BinLayout::from_price_range(1e15, 1e15 + 1.0, 20).unwrap();
        assert!(layout.degenerate);
        assert!(layout.min_price <= 1e15 && layout.max_price >= 1e15 + 1.0);

        let levels: Vec<f64> = layout.skeleton().iter().map(|b| b.price_level).collect();
        assert!(levels.windows(2).all(|pair| pair[1] > pair[0]));

        // Ordinary ranges keep their own bounds
        assert!(!BinLayout::from_price_range(1e15, 1e15 + 1e6, 20).unwrap().degenerate);
    }

    #[test]
    fn test_approx_index_clamps() {
        let layout = BinLayout::from_price_range(0.0, 10.0, 10).unwrap();
        assert_eq!(layout.approx_index(-5.0), 0);
        assert_eq!(layout.approx_index(3.5), 3);
        assert_eq!(layout.approx_index(10.0), 9);
        assert_eq!(layout.approx_index(25.0), 9);
    }
}
