//! Popularity signal: the cold-start path and the lowest-weight blend source.

use crate::lastfm::SimilaritySource;
use crate::library_store::{LibraryStore, Track};
use anyhow::Result;
use tracing::warn;

/// Most popular tracks, best effort.
///
/// The internal store is authoritative when it has anything at all; an empty
/// library falls back to the external global chart. Failures on either path
/// degrade to an empty list, never an error.
pub async fn popular_recommendations(
    store: &dyn LibraryStore,
    similarity: &dyn SimilaritySource,
    limit: usize,
) -> Vec<Track> {
    match popular_inner(store, similarity, limit).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Popularity lookup failed, contributing nothing: {e:#}");
            vec![]
        }
    }
}

async fn popular_inner(
    store: &dyn LibraryStore,
    similarity: &dyn SimilaritySource,
    limit: usize,
) -> Result<Vec<Track>> {
    let stored = store.most_popular_tracks(limit)?;
    if !stored.is_empty() {
        return Ok(stored);
    }
    similarity.top_tracks(limit).await
}
