//! Weighted blending of candidate lists from the three signal sources.

use crate::library_store::Track;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Hard ceiling on the blended list, independent of the requested limit.
pub const MAX_COMBINED_TRACKS: usize = 50;

/// Relative weights for the three candidate sources.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub collaborative: f64,
    pub content: f64,
    pub popular: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        BlendWeights {
            collaborative: 0.6,
            content: 0.3,
            popular: 0.1,
        }
    }
}

impl BlendWeights {
    /// Scale the weights so they sum to 1. Degenerate weights (zero or
    /// negative sum) fall back to the defaults.
    pub fn normalized(&self) -> Self {
        let total = self.collaborative + self.content + self.popular;
        if total <= 0.0 {
            return BlendWeights::default();
        }
        BlendWeights {
            collaborative: self.collaborative / total,
            content: self.content / total,
            popular: self.popular / total,
        }
    }
}

/// Merge the three candidate lists under `weights`.
///
/// Each source contributes `floor(max_tracks * weight)` items from the front
/// of its list, where `max_tracks` caps at [`MAX_COMBINED_TRACKS`]. Sources
/// concatenate in priority order (collaborative, content, popular) and
/// duplicates by internal id keep their first occurrence. Tracks without an
/// internal id are never treated as duplicates of each other.
pub fn combine(
    collaborative: Vec<Track>,
    content: Vec<Track>,
    popular: Vec<Track>,
    weights: &BlendWeights,
) -> Vec<Track> {
    let weights = weights.normalized();

    let total = collaborative.len() + content.len() + popular.len();
    let max_tracks = total.min(MAX_COMBINED_TRACKS);

    let take_collaborative = (max_tracks as f64 * weights.collaborative).floor() as usize;
    let take_content = (max_tracks as f64 * weights.content).floor() as usize;
    let take_popular = (max_tracks as f64 * weights.popular).floor() as usize;

    let mut seen: HashSet<String> = HashSet::new();
    let mut combined = Vec::with_capacity(max_tracks);
    let sources = [
        (collaborative, take_collaborative),
        (content, take_content),
        (popular, take_popular),
    ];
    for (tracks, take) in sources {
        for track in tracks.into_iter().take(take) {
            match &track.id {
                Some(id) => {
                    if seen.insert(id.clone()) {
                        combined.push(track);
                    }
                }
                None => combined.push(track),
            }
        }
    }
    combined
}
