//! Point of Control and Value Area expansion over a finished profile.

use tracing::debug;

use super::errors::VolumeProfileError;
use super::structs::{validate_value_area_fraction, Bin, ValueArea};

/// Mark the single point of control and return its index.
///
/// Ties for the maximum volume go to the lowest-priced bin. Any stale POC
/// flags are cleared first. Returns `None` for an empty profile.
pub fn locate_poc(profile: &mut [Bin]) -> Option<usize> {
    let mut poc: Option<(usize, f64)> = None;
    for (index, bin) in profile.iter_mut().enumerate() {
        bin.is_poc = false;
        match poc {
            Some((_, max_volume)) if bin.volume <= max_volume => {}
            _ => poc = Some((index, bin.volume)),
        }
    }

    let (index, _) = poc?;
    profile[index].is_poc = true;
    Some(index)
}

/// Inclusive bin window grown around the point of control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expansion {
    pub poc_index: usize,
    pub low_index: usize,
    pub high_index: usize,
    pub accumulated: f64,
    pub target: f64,
    /// Bin taken by the final expansion step, `None` when the POC alone sufficed
    pub last_added: Option<usize>,
}

/// Grow a contiguous window from `poc_index` until it holds `target_volume`.
///
/// Each step takes the neighbour with the larger volume; on an exact tie the
/// lower neighbour is taken. Stops at the first crossing of the target or when
/// both edges of the profile are reached. Returns `None` when `poc_index` is
/// outside the profile.
pub fn expand_from_poc(profile: &[Bin], poc_index: usize, target_volume: f64) -> Option<Expansion> {
    let last = profile.len().checked_sub(1)?;
    if poc_index > last {
        return None;
    }

    let mut low_index = poc_index;
    let mut high_index = poc_index;
    let mut accumulated = profile[poc_index].volume;
    let mut last_added = None;

    while accumulated < target_volume && (low_index > 0 || high_index < last) {
        let next_low = (low_index > 0).then(|| profile[low_index - 1].volume);
        let next_high = (high_index < last).then(|| profile[high_index + 1].volume);

        let expand_low = match (next_low, next_high) {
            (Some(low), Some(high)) => low >= high,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        if expand_low {
            low_index -= 1;
            accumulated += profile[low_index].volume;
            last_added = Some(low_index);
        } else {
            high_index += 1;
            accumulated += profile[high_index].volume;
            last_added = Some(high_index);
        }
    }

    Some(Expansion {
        poc_index,
        low_index,
        high_index,
        accumulated,
        target: target_volume,
        last_added,
    })
}

/// Compute the value area enclosing `target_fraction` of the profile's volume.
///
/// Uses the bin flagged as POC, or locates the first maximum when none is
/// flagged. An empty profile yields an all-zero value area.
pub fn calculate_value_area(profile: &[Bin], target_fraction: f64) -> Result<ValueArea, VolumeProfileError> {
    validate_value_area_fraction(target_fraction)?;

    let poc_index = match profile.iter().position(|bin| bin.is_poc) {
        Some(index) => index,
        None => match first_max_index(profile) {
            Some(index) => index,
            None => return Ok(ValueArea::default()),
        },
    };

    let total_volume: f64 = profile.iter().map(|bin| bin.volume).sum();
    let Some(expansion) = expand_from_poc(profile, poc_index, total_volume * target_fraction) else {
        return Ok(ValueArea::default());
    };

    debug!(
        poc_index,
        low_index = expansion.low_index,
        high_index = expansion.high_index,
        accumulated = expansion.accumulated,
        target = expansion.target,
        "Expanded value area"
    );

    Ok(ValueArea {
        poc: profile[poc_index].price_level,
        vah: profile[expansion.high_index].price_level,
        val: profile[expansion.low_index].price_level,
        volume: expansion.accumulated,
        volume_percentage: if total_volume > 0.0 {
            (expansion.accumulated / total_volume) * 100.0
        } else {
            0.0
        },
    })
}

fn first_max_index(profile: &[Bin]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, bin) in profile.iter().enumerate() {
        if best.map_or(true, |(_, volume)| bin.volume > volume) {
            best = Some((index, bin.volume));
        }
    }
    best.map(|(index, _)| index)
}
