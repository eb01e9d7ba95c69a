//! Spreads each candle's volume over the bins its high-low range traverses.

use super::bins::BinLayout;
use super::structs::Bin;
use crate::historical::structs::Candle;

/// Side a candle's volume is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Classify candle `index` by its close against the previous close.
///
/// The first candle has no predecessor and counts as buy-side; an unchanged
/// close counts as sell-side.
pub fn classify_candle(candles: &[Candle], index: usize) -> TradeSide {
    if index == 0 {
        return TradeSide::Buy;
    }
    if candles[index].close > candles[index - 1].close {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    }
}

/// Call `allocate(bin_index, volume_share)` for every bin receiving part of the candle.
///
/// A ranged candle gives each bin `overlap / range * volume`. A flat candle
/// splits its volume evenly between the bins containing its price.
pub fn for_each_volume_share<F>(layout: &BinLayout, candle: &Candle, mut allocate: F)
where
    F: FnMut(usize, f64),
{
    if candle.volume <= 0.0 {
        return;
    }

    let candle_range = candle.range();
    if candle_range > 0.0 {
        // Float rounding can put a price one bin off its computed index
        let first = layout.approx_index(candle.low).saturating_sub(1);
        let last = (layout.approx_index(candle.high) + 1).min(layout.num_bins - 1);

        for index in first..=last {
            let overlap = candle.high.min(layout.bin_end(index)) - candle.low.max(layout.bin_start(index));
            if overlap > 0.0 {
                allocate(index, (overlap / candle_range) * candle.volume);
            }
        }
        return;
    }

    let price = candle.low;
    let first = layout.approx_index(price).saturating_sub(1);
    let last = (layout.approx_index(price) + 1).min(layout.num_bins - 1);
    let touched = (first..=last).filter(|&i| layout.contains(i, price)).count();
    if touched == 0 {
        return;
    }

    let share = candle.volume / touched as f64;
    for index in (first..=last).filter(|&i| layout.contains(i, price)) {
        allocate(index, share);
    }
}

/// Add one candle's volume into `bins`, attributing it to `side`
pub fn distribute_candle(layout: &BinLayout, candle: &Candle, side: TradeSide, bins: &mut [Bin]) {
    for_each_volume_share(layout, candle, |index, share| {
        let bin = &mut bins[index];
        bin.volume += share;
        match side {
            TradeSide::Buy => bin.buy_volume += share,
            TradeSide::Sell => bin.sell_volume += share,
        }
    });
}

/// Sum the volumes of `other` into `into`, bin by bin
pub fn merge_bins(into: &mut [Bin], other: &[Bin]) {
    for (acc, bin) in into.iter_mut().zip(other) {
        acc.volume += bin.volume;
        acc.buy_volume += bin.buy_volume;
        acc.sell_volume += bin.sell_volume;
    }
}
