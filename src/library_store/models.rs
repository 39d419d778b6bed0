//! Library models for SQLite-backed storage.
//!
//! Tracks sourced from the internal library always carry an id; tracks
//! mapped from an external metadata payload carry `None` and are never
//! persisted.

use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of user-track interaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    Like,
    Play,
    Skip,
}

impl InteractionType {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "LIKE" => InteractionType::Like,
            "PLAY" => InteractionType::Play,
            _ => InteractionType::Skip,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "LIKE",
            InteractionType::Play => "PLAY",
            InteractionType::Skip => "SKIP",
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A music track.
///
/// `id` is `None` for tracks synthesized from an external payload; those rows
/// only exist in memory for the duration of a recommendation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub album_art: Option<String>,
    pub duration_secs: Option<u32>,
    pub popularity: Option<f64>,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
}

/// Per-track audio descriptors, conventionally in [0, 1].
///
/// Every field is optional; ingestion may only know a subset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub speechiness: Option<f64>,
}

/// A single user-track interaction row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub track_id: String,
    pub interaction_type: InteractionType,
    /// Unix seconds; interaction listings order by this, descending.
    pub created: i64,
}
