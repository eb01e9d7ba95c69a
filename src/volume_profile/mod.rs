/// Volume Profile Module
///
/// Turns an ordered candle series into a fixed number of evenly spaced price
/// bins, marks the Point of Control and grows the Value Area around it.
pub mod bins;
pub mod calculator;
pub mod distribution;
pub mod errors;
pub mod nodes;
pub mod structs;
pub mod validation;
pub mod value_area;

pub use bins::BinLayout;
pub use calculator::{analyze, build_profile, build_profile_parallel, VolumeProfileCalculator};
pub use errors::VolumeProfileError;
pub use structs::{
    AssetConfig, Bin, NodeKind, Profile, ProfileSummary, ResolvedAssetConfig, ValueArea,
    VolumeNode, VolumeProfileConfig, VolumeProfileResult,
};
pub use validation::{validate_result, ProfileValidationReport};
pub use value_area::{calculate_value_area, expand_from_poc, locate_poc, Expansion};
