//! Music recommendation engine.
//!
//! Three independent signal generators (collaborative, content-based,
//! popularity) feed a weighted blender; the result is stripped of the user's
//! own history and truncated to the requested size.

mod blend;
mod collaborative;
mod content_based;
mod engine;
mod features;
mod history;
mod popular;

pub use blend::{combine, BlendWeights, MAX_COMBINED_TRACKS};
pub use collaborative::collaborative_recommendations;
pub use content_based::content_based_recommendations;
pub use engine::{RecommendationEngine, DEFAULT_LIMIT};
pub use features::{FeatureVector, FeatureWindow, NEUTRAL_FEATURE_VALUE};
pub use history::filter_out_user_history;
pub use popular::popular_recommendations;

use thiserror::Error;

/// Errors surfaced by the recommendation engine.
///
/// Missing data is never an error; the only hard failure a caller must map
/// is an unknown track id on a similar-tracks request.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
