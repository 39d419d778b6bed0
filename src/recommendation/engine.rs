//! Recommendation orchestration.
//!
//! One engine instance serves the whole application; each call fans out to
//! the three signal generators, blends their candidates, and strips the
//! user's history. A user with no history short-circuits to the popularity
//! path without blending.

use super::blend::{combine, BlendWeights};
use super::collaborative::collaborative_recommendations;
use super::content_based::content_based_recommendations;
use super::features::{FeatureVector, FeatureWindow};
use super::history::filter_out_user_history;
use super::popular::popular_recommendations;
use super::RecommendationError;
use crate::lastfm::SimilaritySource;
use crate::library_store::{LibraryStore, Track};
use std::sync::Arc;
use tracing::{debug, warn};

/// Limit applied when the caller asks for zero recommendations.
pub const DEFAULT_LIMIT: usize = 10;

fn normalize_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit
    }
}

/// The recommendation engine.
pub struct RecommendationEngine {
    library: Arc<dyn LibraryStore>,
    similarity: Arc<dyn SimilaritySource>,
    weights: BlendWeights,
}

impl RecommendationEngine {
    /// Create an engine with the default blend weights.
    pub fn new(library: Arc<dyn LibraryStore>, similarity: Arc<dyn SimilaritySource>) -> Self {
        Self::with_weights(library, similarity, BlendWeights::default())
    }

    /// Create an engine with custom blend weights.
    pub fn with_weights(
        library: Arc<dyn LibraryStore>,
        similarity: Arc<dyn SimilaritySource>,
        weights: BlendWeights,
    ) -> Self {
        RecommendationEngine {
            library,
            similarity,
            weights,
        }
    }

    /// Personalized recommendations for a user, at most `limit` tracks.
    ///
    /// Empty-data conditions never fail: a user with no history gets the
    /// popularity fallback, and a user whose signals all come up dry gets an
    /// empty list. Only the engine's own store queries can surface an error.
    pub async fn get_personalized_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>, RecommendationError> {
        let limit = normalize_limit(limit);

        let history = self.library.interactions_for_user(user_id)?;
        if history.is_empty() {
            debug!("User {user_id} has no history, serving popular tracks");
            let mut popular =
                popular_recommendations(self.library.as_ref(), self.similarity.as_ref(), limit)
                    .await;
            popular.truncate(limit);
            return Ok(popular);
        }

        let (collaborative, content, popular) = tokio::join!(
            collaborative_recommendations(self.library.as_ref(), user_id, limit * 2),
            content_based_recommendations(
                self.library.as_ref(),
                self.similarity.as_ref(),
                user_id,
                limit * 2,
            ),
            popular_recommendations(self.library.as_ref(), self.similarity.as_ref(), limit),
        );
        debug!(
            "Candidates for user {user_id}: {} collaborative, {} content, {} popular",
            collaborative.len(),
            content.len(),
            popular.len()
        );

        let blended = combine(collaborative, content, popular, &self.weights);
        let mut recommendations =
            filter_out_user_history(self.library.as_ref(), blended, user_id)?;
        recommendations.truncate(limit);
        Ok(recommendations)
    }

    /// Tracks similar to a known track, at most `limit` tracks.
    ///
    /// Fails with [`RecommendationError::TrackNotFound`] when `track_id` is
    /// unknown; every later failure degrades to an empty list.
    pub async fn get_similar_tracks(
        &self,
        track_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>, RecommendationError> {
        let limit = normalize_limit(limit);

        let track = self
            .library
            .get_track(track_id)?
            .ok_or_else(|| RecommendationError::TrackNotFound(track_id.to_string()))?;

        match self.similar_tracks_inner(&track, track_id, limit).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("Similar-tracks lookup failed for track {track_id}: {e:#}");
                Ok(vec![])
            }
        }
    }

    async fn similar_tracks_inner(
        &self,
        track: &Track,
        track_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Track>> {
        if let Some(features) = self.library.get_track_features(track_id)? {
            let window = FeatureWindow::around(&FeatureVector::average(&[features]));
            let matches = self.library.tracks_in_feature_window(
                &window,
                &[track_id.to_string()],
                limit,
            )?;
            if !matches.is_empty() {
                return Ok(matches);
            }
        }

        self.similarity
            .similar_tracks(&track.title, &track.artist, limit)
            .await
    }
}
