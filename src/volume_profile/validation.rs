//! Post-hoc checks of a finished volume profile against its invariants.

use tracing::warn;

use super::structs::{Bin, VolumeProfileResult};
use crate::historical::structs::Candle;

/// Relative tolerance for volume conservation
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;
/// Relative tolerance for bin spacing and buy/sell splits
const SPACING_TOLERANCE: f64 = 1e-9;

/// Volume conservation outcome
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeValidationResult {
    pub is_valid: bool,
    pub expected_volume: f64,
    pub actual_volume: f64,
    pub difference: f64,
    pub percentage_error: f64,
    pub details: Vec<String>,
}

impl VolumeValidationResult {
    fn new(expected: f64, actual: f64, tolerance: f64) -> Self {
        let difference = (expected - actual).abs();
        let percentage_error = if expected != 0.0 {
            (difference / expected.abs()) * 100.0
        } else {
            0.0
        };
        let is_valid = difference <= tolerance * expected.abs().max(1.0);

        let mut details = Vec::new();
        if !is_valid {
            if actual < expected {
                details.push(format!("Missing volume: {} ({:.6}%)", expected - actual, percentage_error));
            } else {
                details.push(format!("Excess volume: {} ({:.6}%)", actual - expected, percentage_error));
            }
        }

        Self {
            is_valid,
            expected_volume: expected,
            actual_volume: actual,
            difference,
            percentage_error,
            details,
        }
    }
}

/// Validator for volume conservation between candles and bins
#[derive(Debug, Clone)]
pub struct VolumeConservationValidator;

impl VolumeConservationValidator {
    /// Compare the candles' total volume with the volume held by the bins
    pub fn validate_volume_conservation(candles: &[Candle], profile: &[Bin], tolerance: f64) -> VolumeValidationResult {
        let expected: f64 = candles.iter().map(|c| c.volume).sum();
        let actual: f64 = profile.iter().map(|b| b.volume).sum();
        VolumeValidationResult::new(expected, actual, tolerance)
    }
}

/// Outcome of checking a whole result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ProfileValidationReport {
    fn error(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

/// Check conservation, single POC, ordering, spacing and value area bounds
pub fn validate_result(candles: &[Candle], result: &VolumeProfileResult) -> ProfileValidationReport {
    let mut report = ProfileValidationReport {
        is_valid: true,
        ..Default::default()
    };
    let profile = &result.profile;

    if candles.is_empty() {
        if !profile.is_empty() {
            report.error(format!("empty input produced {} bins", profile.len()));
        }
        return report;
    }

    if profile.is_empty() {
        report.error("non-empty input produced an empty profile".to_string());
        return report;
    }

    let conservation =
        VolumeConservationValidator::validate_volume_conservation(candles, profile, CONSERVATION_TOLERANCE);
    if !conservation.is_valid {
        report.error(format!(
            "volume conservation violated: expected={}, actual={}",
            conservation.expected_volume, conservation.actual_volume
        ));
        report.warnings.extend(conservation.details);
    }

    let poc_count = profile.iter().filter(|b| b.is_poc).count();
    if poc_count != 1 {
        report.error(format!("expected exactly one POC bin, found {}", poc_count));
    }

    let bin_size = result.summary.bin_size;
    for (index, pair) in profile.windows(2).enumerate() {
        let step = pair[1].price_level - pair[0].price_level;
        if step <= 0.0 {
            report.error(format!("price levels not increasing at bin {}", index + 1));
        } else if (step - bin_size).abs() > SPACING_TOLERANCE * bin_size.abs().max(pair[1].price_level.abs()) {
            report.error(format!("bin {} spaced {} instead of {}", index + 1, step, bin_size));
        }
    }

    for (index, bin) in profile.iter().enumerate() {
        let split = bin.buy_volume + bin.sell_volume;
        if (bin.volume - split).abs() > SPACING_TOLERANCE * bin.volume.max(1.0) {
            report.error(format!(
                "bin {} volume {} differs from buy+sell {}",
                index, bin.volume, split
            ));
        }
    }

    let va = &result.value_area;
    if !(va.val <= va.poc && va.poc <= va.vah) {
        report.error(format!("value area out of order: val={} poc={} vah={}", va.val, va.poc, va.vah));
    }
    if let Some(poc) = result.poc_bin() {
        if poc.price_level != va.poc {
            report.error(format!("POC bin at {} but value area reports {}", poc.price_level, va.poc));
        }
    }

    if result.summary.total_volume <= 0.0 {
        report.warnings.push("profile holds no volume".to_string());
    }

    if !report.is_valid {
        warn!(errors = report.errors.len(), "Volume profile failed validation");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume_profile::calculator::analyze;

    fn candles() -> Vec<Candle> {
        vec![
            Candle::new(105.0, 100.0, 104.0, 30.0),
            Candle::new(108.0, 103.0, 107.0, 20.0),
            Candle::new(107.0, 101.0, 102.0, 25.0),
        ]
    }

    #[test]
    fn test_calculated_result_is_valid() {
        let candles = candles();
        let result = analyze(&candles, 12, 0.7).unwrap();
        let report = validate_result(&candles, &result);
        assert!(report.is_valid, "unexpected errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_detects_lost_volume() {
        let candles = candles();
        let mut result = analyze(&candles, 12, 0.7).unwrap();
        result.profile[3].volume += 5.0;
        result.profile[3].buy_volume += 5.0;

        let report = validate_result(&candles, &result);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("conservation")));
        assert!(report.warnings.iter().any(|w| w.starts_with("Excess volume")));
    }

    #[test]
    fn test_detects_multiple_pocs_and_bad_split() {
        let candles = candles();
        let mut result = analyze(&candles, 12, 0.7).unwrap();
        let poc_index = result.profile.iter().position(|b| b.is_poc).unwrap();
        let other = if poc_index == 0 { 1 } else { 0 };
        result.profile[other].is_poc = true;
        result.profile[other].sell_volume += 1.0;

        let report = validate_result(&candles, &result);
        assert!(report.errors.iter().any(|e| e.contains("exactly one POC")));
        assert!(report.errors.iter().any(|e| e.contains("buy+sell")));
    }

    #[test]
    fn test_empty_input_report() {
        let result = analyze(&[], 12, 0.7).unwrap();
        assert!(validate_result(&[], &result).is_valid);
    }

    #[test]
    fn test_conservation_result_details() {
        let candles = vec![Candle::new(2.0, 1.0, 1.5, 10.0)];
        let bins = vec![Bin {
            price_level: 1.5,
            volume: 9.0,
            buy_volume: 9.0,
            sell_volume: 0.0,
            is_poc: true,
        }];
        let result = VolumeConservationValidator::validate_volume_conservation(&candles, &bins, CONSERVATION_TOLERANCE);
        assert!(!result.is_valid);
        assert_eq!(result.difference, 1.0);
        assert!((result.percentage_error - 10.0).abs() < 1e-12);
        assert!(result.details[0].starts_with("Missing volume"));
    }
}
