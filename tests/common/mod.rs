//! Shared fixtures for engine integration tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracktaste::lastfm::SimilaritySource;
use tracktaste::library_store::{AudioFeatures, Track};

/// A minimal internal track; insert through the store to get an id.
pub fn track(title: &str) -> Track {
    Track {
        id: None,
        title: title.to_string(),
        artist: "Fixture Artist".to_string(),
        album: None,
        album_art: None,
        duration_secs: Some(180),
        popularity: None,
        external_id: None,
        external_url: None,
    }
}

pub fn popular_track(title: &str, popularity: f64) -> Track {
    Track {
        popularity: Some(popularity),
        ..track(title)
    }
}

/// A track shaped like an external payload mapping: no internal id.
pub fn external_track(title: &str) -> Track {
    Track {
        external_url: Some(format!("https://example.com/{title}")),
        ..track(title)
    }
}

pub fn features(energy: f64, danceability: f64, valence: f64) -> AudioFeatures {
    AudioFeatures {
        energy: Some(energy),
        danceability: Some(danceability),
        valence: Some(valence),
        ..Default::default()
    }
}

/// Canned similarity source; `None` for a call means that call fails.
pub struct StubSimilaritySource {
    top: Option<Vec<Track>>,
    similar: Option<Vec<Track>>,
}

impl StubSimilaritySource {
    pub fn new(top: Option<Vec<Track>>, similar: Option<Vec<Track>>) -> Self {
        StubSimilaritySource { top, similar }
    }

    pub fn failing() -> Self {
        StubSimilaritySource {
            top: None,
            similar: None,
        }
    }
}

#[async_trait]
impl SimilaritySource for StubSimilaritySource {
    async fn top_tracks(&self, limit: usize) -> Result<Vec<Track>> {
        match &self.top {
            Some(tracks) => Ok(tracks.iter().take(limit).cloned().collect()),
            None => bail!("stub similarity source unavailable"),
        }
    }

    async fn similar_tracks(&self, _title: &str, _artist: &str, limit: usize) -> Result<Vec<Track>> {
        match &self.similar {
            Some(tracks) => Ok(tracks.iter().take(limit).cloned().collect()),
            None => bail!("stub similarity source unavailable"),
        }
    }
}
