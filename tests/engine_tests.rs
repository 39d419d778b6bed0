//! End-to-end engine behavior over seeded stores.

mod common;

use common::{external_track, features, popular_track, track, StubSimilaritySource};
use std::collections::HashSet;
use std::sync::Arc;
use tracktaste::library_store::{InteractionType, SqliteLibraryStore};
use tracktaste::recommendation::{BlendWeights, RecommendationEngine, RecommendationError};

fn engine_with(
    store: &SqliteLibraryStore,
    similarity: StubSimilaritySource,
) -> RecommendationEngine {
    RecommendationEngine::new(Arc::new(store.clone()), Arc::new(similarity))
}

fn engine_with_weights(
    store: &SqliteLibraryStore,
    similarity: StubSimilaritySource,
    weights: BlendWeights,
) -> RecommendationEngine {
    RecommendationEngine::with_weights(Arc::new(store.clone()), Arc::new(similarity), weights)
}

// =============================================================================
// Personalized Recommendations
// =============================================================================

#[tokio::test]
async fn cold_start_serves_popular_tracks_truncated() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    for i in 0..15 {
        store
            .insert_track(&popular_track(&format!("p{i}"), 100.0 - i as f64))
            .unwrap();
    }
    let user = store.create_user("fresh").unwrap();

    // The external source failing must not matter on this path
    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&user, 7)
        .await
        .unwrap();

    let titles: Vec<_> = recs.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["p0", "p1", "p2", "p3", "p4", "p5", "p6"]);
}

#[tokio::test]
async fn cold_start_with_empty_library_uses_external_chart() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let user = store.create_user("fresh").unwrap();

    let chart = vec![external_track("chart-1"), external_track("chart-2")];
    let engine = engine_with(&store, StubSimilaritySource::new(Some(chart), None));
    let recs = engine
        .get_personalized_recommendations(&user, 10)
        .await
        .unwrap();

    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|t| t.id.is_none()));
}

#[tokio::test]
async fn cold_start_with_everything_down_returns_empty() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let user = store.create_user("fresh").unwrap();

    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&user, 10)
        .await
        .unwrap();
    assert!(recs.is_empty());
}

#[tokio::test]
async fn zero_limit_normalizes_to_default_of_ten() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    for i in 0..15 {
        store
            .insert_track(&popular_track(&format!("p{i}"), 100.0 - i as f64))
            .unwrap();
    }
    let user = store.create_user("fresh").unwrap();

    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&user, 0)
        .await
        .unwrap();
    assert_eq!(recs.len(), 10);
}

#[tokio::test]
async fn blended_path_orders_collaborative_before_content() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let alice = store.create_user("alice").unwrap();
    let bob = store.create_user("bob").unwrap();

    let shared = store.insert_track(&track("shared")).unwrap();
    let b1 = store.insert_track(&track("bob-pick-1")).unwrap();
    let b2 = store.insert_track(&track("bob-pick-2")).unwrap();
    let close = store.insert_track(&track("close-match")).unwrap();

    // Alice's one like carries features so the content window has a seed
    store
        .upsert_audio_features(&shared, &features(0.5, 0.5, 0.5))
        .unwrap();
    store
        .upsert_audio_features(&close, &features(0.52, 0.48, 0.5))
        .unwrap();

    store
        .record_interaction(&alice, &shared, InteractionType::Like)
        .unwrap();
    for t in [&shared, &b1, &b2] {
        store
            .record_interaction(&bob, t, InteractionType::Like)
            .unwrap();
    }

    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&alice, 10)
        .await
        .unwrap();

    let ids: Vec<_> = recs.iter().filter_map(|t| t.id.as_deref()).collect();
    // Collaborative candidates (bob's picks, unordered between themselves)
    // come first, the content match last. The shared track is in Alice's
    // history and never resurfaces.
    assert_eq!(ids.len(), 3);
    let collaborative: HashSet<_> = ids[..2].iter().copied().collect();
    assert_eq!(collaborative, HashSet::from([b1.as_str(), b2.as_str()]));
    assert_eq!(ids[2], close.as_str());
    assert!(!ids.contains(&shared.as_str()));
}

#[tokio::test]
async fn track_found_by_two_sources_appears_once() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let alice = store.create_user("alice").unwrap();
    let bob = store.create_user("bob").unwrap();

    let shared = store.insert_track(&track("shared")).unwrap();
    let both = store.insert_track(&track("both-sources")).unwrap();

    store
        .upsert_audio_features(&shared, &features(0.5, 0.5, 0.5))
        .unwrap();
    // In the ±20% window around Alice's average AND liked by Bob
    store
        .upsert_audio_features(&both, &features(0.5, 0.5, 0.5))
        .unwrap();

    store
        .record_interaction(&alice, &shared, InteractionType::Like)
        .unwrap();
    store
        .record_interaction(&bob, &shared, InteractionType::Like)
        .unwrap();
    store
        .record_interaction(&bob, &both, InteractionType::Like)
        .unwrap();

    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&alice, 10)
        .await
        .unwrap();

    let occurrences = recs
        .iter()
        .filter(|t| t.id.as_deref() == Some(both.as_str()))
        .count();
    assert_eq!(occurrences, 1);
}

#[tokio::test]
async fn popular_heavy_blend_still_respects_history() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let alice = store.create_user("alice").unwrap();
    let p1 = store.insert_track(&popular_track("hit", 90.0)).unwrap();
    store.insert_track(&popular_track("second", 80.0)).unwrap();
    store.insert_track(&popular_track("third", 70.0)).unwrap();

    store
        .record_interaction(&alice, &p1, InteractionType::Play)
        .unwrap();

    let weights = BlendWeights {
        collaborative: 0.0,
        content: 0.0,
        popular: 1.0,
    };
    let engine = engine_with_weights(&store, StubSimilaritySource::failing(), weights);
    let recs = engine
        .get_personalized_recommendations(&alice, 10)
        .await
        .unwrap();

    let titles: Vec<_> = recs.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["second", "third"]);
}

#[tokio::test]
async fn external_fallback_tracks_survive_blend_and_history_filter() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let alice = store.create_user("alice").unwrap();
    // A featureless like forces the content generator onto the external path
    let liked = store.insert_track(&track("featureless-like")).unwrap();
    store
        .record_interaction(&alice, &liked, InteractionType::Like)
        .unwrap();

    let similar = vec![external_track("ext-1"), external_track("ext-2")];
    let weights = BlendWeights {
        collaborative: 0.0,
        content: 1.0,
        popular: 0.0,
    };
    let engine = engine_with_weights(
        &store,
        StubSimilaritySource::new(None, Some(similar)),
        weights,
    );
    let recs = engine
        .get_personalized_recommendations(&alice, 10)
        .await
        .unwrap();

    let titles: Vec<_> = recs.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["ext-1", "ext-2"]);
}

#[tokio::test]
async fn dried_up_signals_return_empty_list_not_an_error() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let alice = store.create_user("alice").unwrap();
    let liked = store.insert_track(&track("only-like")).unwrap();
    store
        .record_interaction(&alice, &liked, InteractionType::Like)
        .unwrap();

    // No neighbors, no features, external source down
    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&alice, 10)
        .await
        .unwrap();
    assert!(recs.is_empty());
}

// =============================================================================
// Similar Tracks
// =============================================================================

#[tokio::test]
async fn similar_tracks_unknown_id_is_a_hard_failure() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let engine = engine_with(&store, StubSimilaritySource::failing());

    let err = engine.get_similar_tracks("no-such-track", 10).await.unwrap_err();
    match err {
        RecommendationError::TrackNotFound(id) => assert_eq!(id, "no-such-track"),
        other => panic!("Expected TrackNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn similar_tracks_matches_internal_window() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let source = store.insert_track(&track("source")).unwrap();
    let inside = store.insert_track(&track("inside")).unwrap();
    let outside = store.insert_track(&track("outside")).unwrap();
    store
        .upsert_audio_features(&source, &features(0.5, 0.5, 0.5))
        .unwrap();
    store
        .upsert_audio_features(&inside, &features(0.59, 0.5, 0.5))
        .unwrap();
    store
        .upsert_audio_features(&outside, &features(0.61, 0.5, 0.5))
        .unwrap();

    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine.get_similar_tracks(&source, 10).await.unwrap();

    let ids: Vec<_> = recs.iter().filter_map(|t| t.id.as_deref()).collect();
    assert_eq!(ids, vec![inside.as_str()]);
}

#[tokio::test]
async fn similar_tracks_without_features_falls_back_to_external() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let source = store.insert_track(&track("featureless")).unwrap();

    let similar = vec![external_track("ext-similar")];
    let engine = engine_with(&store, StubSimilaritySource::new(None, Some(similar)));
    let recs = engine.get_similar_tracks(&source, 10).await.unwrap();

    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "ext-similar");
    assert!(recs[0].id.is_none());
}

#[tokio::test]
async fn similar_tracks_total_failure_returns_empty() {
    let store = SqliteLibraryStore::in_memory().unwrap();
    let source = store.insert_track(&track("featureless")).unwrap();

    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine.get_similar_tracks(&source, 10).await.unwrap();
    assert!(recs.is_empty());
}

// =============================================================================
// On-Disk Store
// =============================================================================

#[tokio::test]
async fn engine_works_against_a_store_reopened_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let db_path = dir.path().join("library.db");

    {
        let store = SqliteLibraryStore::new(&db_path).unwrap();
        store.insert_track(&popular_track("persisted", 50.0)).unwrap();
        store.create_user("fresh").unwrap();
    }

    let store = SqliteLibraryStore::new(&db_path).unwrap();
    let user_id = {
        // create_user assigned an opaque id; any user with no history works
        store.create_user("another").unwrap()
    };
    let engine = engine_with(&store, StubSimilaritySource::failing());
    let recs = engine
        .get_personalized_recommendations(&user_id, 10)
        .await
        .unwrap();

    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "persisted");
}
