//! Store trait definitions.
//!
//! The recommendation engine consumes read-only capabilities; the traits here
//! describe exactly the query shapes it needs so the engine stays decoupled
//! from the SQLite implementation.

use super::models::{AudioFeatures, Interaction, Track};
use crate::recommendation::FeatureWindow;
use anyhow::Result;
use std::collections::HashSet;

/// Track retrieval and track-level candidate queries.
pub trait TrackStore: Send + Sync {
    /// Get a track by id.
    /// Returns Ok(None) if the track does not exist.
    fn get_track(&self, track_id: &str) -> Result<Option<Track>>;

    /// Get a track's audio features.
    /// Returns Ok(None) if the track has no features row.
    fn get_track_features(&self, track_id: &str) -> Result<Option<AudioFeatures>>;

    /// Returns up to `limit` tracks ordered by popularity, highest first.
    /// Tracks without a popularity score sort last.
    fn most_popular_tracks(&self, limit: usize) -> Result<Vec<Track>>;

    /// Returns up to `limit` tracks whose energy, danceability and valence
    /// all fall inside `window` (inclusive bounds). Tracks missing any of
    /// those three features never match. `exclude_track_ids` are skipped.
    fn tracks_in_feature_window(
        &self,
        window: &FeatureWindow,
        exclude_track_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Track>>;

    /// Returns up to `limit` tracks that have at least one LIKE from any of
    /// `user_ids` and zero interactions of any type from `exclude_user_id`.
    fn tracks_liked_by_users(
        &self,
        user_ids: &[String],
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>>;
}

/// Interaction listings for a single user.
pub trait InteractionStore: Send + Sync {
    /// All interactions for a user, most recent first.
    fn interactions_for_user(&self, user_id: &str) -> Result<Vec<Interaction>>;

    /// Ids of all tracks the user has a LIKE interaction on.
    fn liked_track_ids(&self, user_id: &str) -> Result<Vec<String>>;

    /// The user's most recent LIKEd tracks with their audio features joined
    /// in, most recent first, bounded by `limit`.
    fn recent_liked_tracks(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<(Track, Option<AudioFeatures>)>>;

    /// Ids of all tracks the user has interacted with, any interaction type.
    fn interacted_track_ids(&self, user_id: &str) -> Result<HashSet<String>>;
}

/// User lookups needed by collaborative filtering.
pub trait UserStore: Send + Sync {
    /// Returns up to `limit` ids of users (excluding `exclude_user_id`) that
    /// have a LIKE interaction on any track in `track_ids`. No ordering is
    /// promised among qualifying users.
    fn users_with_likes_on(
        &self,
        track_ids: &[String],
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<String>>;
}

/// Combined trait for backends that serve the whole engine.
pub trait LibraryStore: TrackStore + InteractionStore + UserStore {}

// Blanket implementation for any type that implements all three stores
impl<T: TrackStore + InteractionStore + UserStore> LibraryStore for T {}
