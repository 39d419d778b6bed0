//! Filtering of candidates the user has already interacted with.

use crate::library_store::{LibraryStore, Track};
use anyhow::Result;

/// Drop every candidate the user has any interaction with, preserving input
/// order. Candidates without an internal id cannot be matched against the
/// interaction history and are always retained.
pub fn filter_out_user_history(
    store: &dyn LibraryStore,
    candidates: Vec<Track>,
    user_id: &str,
) -> Result<Vec<Track>> {
    let interacted = store.interacted_track_ids(user_id)?;
    Ok(candidates
        .into_iter()
        .filter(|track| match &track.id {
            Some(id) => !interacted.contains(id),
            None => true,
        })
        .collect())
}
