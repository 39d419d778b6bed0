//! Last.fm API client, used as the external similarity source.
//!
//! Two calls are consumed: the global top-tracks chart (popularity fallback
//! for an empty library) and track.getSimilar (content fallback when no
//! audio features are available). Payload fields are optional across the
//! board; an absent field maps to "not present", never to zero, so that
//! downstream averaging and filtering are not skewed by fabricated values.

use crate::library_store::Track;
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";

/// Default HTTP timeout for Last.fm requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// External source of similar and globally popular tracks.
#[async_trait]
pub trait SimilaritySource: Send + Sync {
    /// Globally most-played tracks.
    async fn top_tracks(&self, limit: usize) -> Result<Vec<Track>>;

    /// Tracks similar to the given title/artist pair.
    async fn similar_tracks(&self, title: &str, artist: &str, limit: usize) -> Result<Vec<Track>>;
}

/// Client for the Last.fm REST API.
pub struct LastFmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LastFmClient {
    /// Create a client against the production Last.fm endpoint.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(api_key, timeout_secs, LASTFM_API_BASE)
    }

    /// Create a client against a custom endpoint (used by tests).
    pub fn with_base_url(api_key: &str, timeout_secs: u64, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(LastFmClient {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Last.fm API failed with status {}", response.status());
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SimilaritySource for LastFmClient {
    async fn top_tracks(&self, limit: usize) -> Result<Vec<Track>> {
        let limit = limit.to_string();
        let body: ChartTopTracksResponse = self
            .request("chart.gettoptracks", &[("limit", limit.as_str())])
            .await?;

        Ok(body
            .tracks
            .and_then(|t| t.track)
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_track)
            .collect())
    }

    async fn similar_tracks(&self, title: &str, artist: &str, limit: usize) -> Result<Vec<Track>> {
        let limit = limit.to_string();
        let body: SimilarTracksResponse = self
            .request(
                "track.getsimilar",
                &[
                    ("track", title),
                    ("artist", artist),
                    ("limit", limit.as_str()),
                    ("autocorrect", "1"),
                ],
            )
            .await?;

        Ok(body
            .similartracks
            .and_then(|t| t.track)
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_track)
            .collect())
    }
}

/// Similarity source used when no Last.fm API key is configured.
///
/// Every call reports unavailability, so the engine degrades along its normal
/// fallback policy instead of needing a special "no external source" path.
pub struct NoopSimilaritySource;

#[async_trait]
impl SimilaritySource for NoopSimilaritySource {
    async fn top_tracks(&self, _limit: usize) -> Result<Vec<Track>> {
        bail!("No similarity source configured")
    }

    async fn similar_tracks(
        &self,
        _title: &str,
        _artist: &str,
        _limit: usize,
    ) -> Result<Vec<Track>> {
        bail!("No similarity source configured")
    }
}

// =============================================================================
// Payload Types
// =============================================================================

#[derive(Deserialize)]
struct ChartTopTracksResponse {
    tracks: Option<TrackListContainer>,
}

#[derive(Deserialize)]
struct SimilarTracksResponse {
    similartracks: Option<TrackListContainer>,
}

#[derive(Deserialize)]
struct TrackListContainer {
    track: Option<Vec<LastFmTrack>>,
}

#[derive(Deserialize)]
struct LastFmTrack {
    name: Option<String>,
    artist: Option<LastFmArtist>,
    duration: Option<String>,
    playcount: Option<String>,
    mbid: Option<String>,
    url: Option<String>,
    image: Option<Vec<LastFmImage>>,
}

/// The artist field is a bare string in some payloads and an object in others.
#[derive(Deserialize)]
#[serde(untagged)]
enum LastFmArtist {
    Name(String),
    Detailed { name: Option<String> },
}

#[derive(Deserialize)]
struct LastFmImage {
    #[serde(rename = "#text")]
    text: Option<String>,
}

/// Map a Last.fm payload into a [`Track`] without an internal id.
///
/// Entries missing a name or artist are dropped. A playcount of zero maps to
/// no popularity rather than a zero score, and a zero duration to no
/// duration.
fn map_track(payload: LastFmTrack) -> Option<Track> {
    let title = payload.name?;
    let artist = match payload.artist? {
        LastFmArtist::Name(name) => name,
        LastFmArtist::Detailed { name } => name?,
    };

    let duration_secs = payload
        .duration
        .as_deref()
        .and_then(|d| d.parse::<u32>().ok())
        .filter(|d| *d > 0);
    let popularity = payload
        .playcount
        .as_deref()
        .and_then(|p| p.parse::<f64>().ok())
        .map(|p| p / 1000.0)
        .filter(|p| *p > 0.0);
    // Last.fm orders image sizes small to large
    let album_art = payload
        .image
        .unwrap_or_default()
        .into_iter()
        .filter_map(|i| i.text)
        .filter(|url| !url.is_empty())
        .last();
    let external_id = payload.mbid.filter(|m| !m.is_empty());

    Some(Track {
        id: None,
        title,
        artist,
        album: None,
        album_art,
        duration_secs,
        popularity,
        external_id,
        external_url: payload.url,
    })
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Canned similarity source for unit tests.
    pub struct StubSimilaritySource {
        top: Option<Vec<Track>>,
        similar: Option<Vec<Track>>,
        last_similar: Mutex<Option<(String, String)>>,
    }

    impl StubSimilaritySource {
        pub fn with_top_tracks(tracks: Vec<Track>) -> Self {
            StubSimilaritySource {
                top: Some(tracks),
                similar: None,
                last_similar: Mutex::new(None),
            }
        }

        pub fn with_similar_tracks(tracks: Vec<Track>) -> Self {
            StubSimilaritySource {
                top: None,
                similar: Some(tracks),
                last_similar: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            StubSimilaritySource {
                top: None,
                similar: None,
                last_similar: Mutex::new(None),
            }
        }

        pub fn last_similar_query(&self) -> Option<(String, String)> {
            self.last_similar.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SimilaritySource for StubSimilaritySource {
        async fn top_tracks(&self, _limit: usize) -> Result<Vec<Track>> {
            match &self.top {
                Some(tracks) => Ok(tracks.clone()),
                None => bail!("stub similarity source unavailable"),
            }
        }

        async fn similar_tracks(
            &self,
            title: &str,
            artist: &str,
            _limit: usize,
        ) -> Result<Vec<Track>> {
            *self.last_similar.lock().unwrap() =
                Some((title.to_string(), artist.to_string()));
            match &self.similar {
                Some(tracks) => Ok(tracks.clone()),
                None => bail!("stub similarity source unavailable"),
            }
        }
    }
}
