//! Audio feature averaging and the similarity window built from it.
//!
//! Averages are per-field over the values that are actually present; a field
//! absent from every input defaults to the neutral midpoint 0.5 so that
//! missing data never drags the window toward zero.

use crate::library_store::AudioFeatures;

/// Midpoint used when a feature is present on none of the averaged tracks.
pub const NEUTRAL_FEATURE_VALUE: f64 = 0.5;

/// Relative half-width of the similarity window (±20%).
const WINDOW_TOLERANCE: f64 = 0.2;

/// A fully-populated feature vector, as produced by averaging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector {
    pub energy: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub speechiness: f64,
}

impl FeatureVector {
    /// Average a set of (possibly sparse) feature rows field by field.
    pub fn average(features: &[AudioFeatures]) -> Self {
        FeatureVector {
            energy: mean_or_neutral(features.iter().map(|f| f.energy)),
            danceability: mean_or_neutral(features.iter().map(|f| f.danceability)),
            acousticness: mean_or_neutral(features.iter().map(|f| f.acousticness)),
            instrumentalness: mean_or_neutral(features.iter().map(|f| f.instrumentalness)),
            liveness: mean_or_neutral(features.iter().map(|f| f.liveness)),
            valence: mean_or_neutral(features.iter().map(|f| f.valence)),
            speechiness: mean_or_neutral(features.iter().map(|f| f.speechiness)),
        }
    }
}

fn mean_or_neutral<I: Iterator<Item = Option<f64>>>(values: I) -> f64 {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        NEUTRAL_FEATURE_VALUE
    } else {
        present.iter().sum::<f64>() / present.len() as f64
    }
}

/// Inclusive per-field bounds for the candidate query.
///
/// Only energy, danceability and valence gate the query; the other four
/// averaged fields are intentionally not part of the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureWindow {
    pub energy: (f64, f64),
    pub danceability: (f64, f64),
    pub valence: (f64, f64),
}

impl FeatureWindow {
    /// Build the ±20% window around an averaged vector.
    pub fn around(vector: &FeatureVector) -> Self {
        FeatureWindow {
            energy: bounds(vector.energy),
            danceability: bounds(vector.danceability),
            valence: bounds(vector.valence),
        }
    }
}

fn bounds(value: f64) -> (f64, f64) {
    (
        value * (1.0 - WINDOW_TOLERANCE),
        value * (1.0 + WINDOW_TOLERANCE),
    )
}
