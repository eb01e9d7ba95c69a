use super::structs::{Bin, NodeKind, VolumeNode};

/// High and Low Volume Nodes relative to the mean bin volume, ascending by price.
///
/// The point of control is never reported as a low volume node.
pub fn detect_volume_nodes(profile: &[Bin], hvn_threshold: f64, lvn_threshold: f64) -> Vec<VolumeNode> {
    let total_volume: f64 = profile.iter().map(|bin| bin.volume).sum();
    if profile.is_empty() || total_volume <= 0.0 {
        return Vec::new();
    }

    let mean_volume = total_volume / profile.len() as f64;
    let hvn_cutoff = mean_volume * hvn_threshold;
    let lvn_cutoff = mean_volume * lvn_threshold;

    profile
        .iter()
        .filter_map(|bin| {
            let kind = if bin.volume > hvn_cutoff {
                NodeKind::HighVolume
            } else if bin.volume < lvn_cutoff && !bin.is_poc {
                NodeKind::LowVolume
            } else {
                return None;
            };

            Some(VolumeNode {
                price_level: bin.price_level,
                volume: bin.volume,
                percent_of_total: bin.percent_of_total(total_volume),
                kind,
            })
        })
        .collect()
}
