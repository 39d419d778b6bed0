//! Content-based signal: tracks sonically close to the user's recent likes.

use super::features::{FeatureVector, FeatureWindow};
use crate::lastfm::SimilaritySource;
use crate::library_store::{LibraryStore, Track};
use anyhow::Result;
use tracing::{debug, warn};

/// How many recent likes seed the feature window.
const RECENT_LIKES_WINDOW: usize = 5;

/// Tracks whose audio features fall inside the ±20% window around the
/// average of the user's five most recent likes.
///
/// When none of the recent likes carry audio features the single most recent
/// like seeds an external similar-tracks lookup instead. Failures degrade to
/// an empty list.
pub async fn content_based_recommendations(
    store: &dyn LibraryStore,
    similarity: &dyn SimilaritySource,
    user_id: &str,
    limit: usize,
) -> Vec<Track> {
    match content_based_inner(store, similarity, user_id, limit).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Content-based lookup failed for user {user_id}, contributing nothing: {e:#}");
            vec![]
        }
    }
}

async fn content_based_inner(
    store: &dyn LibraryStore,
    similarity: &dyn SimilaritySource,
    user_id: &str,
    limit: usize,
) -> Result<Vec<Track>> {
    let recent = store.recent_liked_tracks(user_id, RECENT_LIKES_WINDOW)?;
    if recent.is_empty() {
        return Ok(vec![]);
    }

    let liked_features: Vec<_> = recent
        .iter()
        .filter_map(|(_, features)| *features)
        .collect();

    if liked_features.is_empty() {
        // No audio features anywhere in the window; fall back to the external
        // similar-tracks lookup seeded by the most recent like.
        let (seed, _) = &recent[0];
        debug!(
            "No audio features among recent likes of user {user_id}, \
             querying external similar tracks for '{}'",
            seed.title
        );
        return similarity
            .similar_tracks(&seed.title, &seed.artist, limit)
            .await;
    }

    let average = FeatureVector::average(&liked_features);
    let window = FeatureWindow::around(&average);
    let exclude: Vec<String> = recent
        .iter()
        .filter_map(|(track, _)| track.id.clone())
        .collect();

    store.tracks_in_feature_window(&window, &exclude, limit)
}
