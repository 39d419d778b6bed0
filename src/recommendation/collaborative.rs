//! Collaborative filtering signal: tracks liked by users with overlapping taste.

use crate::library_store::{LibraryStore, Track};
use anyhow::Result;
use tracing::{debug, warn};

/// Upper bound on the similar-user neighborhood.
const SIMILAR_USERS_LIMIT: usize = 10;

/// Tracks liked by up to ten users who share at least one liked track with
/// `user_id`, excluding anything the user has already touched.
///
/// Similarity is binary shared-like overlap; no ranking among similar users
/// is attempted. Failures degrade to an empty list.
pub async fn collaborative_recommendations(
    store: &dyn LibraryStore,
    user_id: &str,
    limit: usize,
) -> Vec<Track> {
    match collaborative_inner(store, user_id, limit) {
        Ok(result) => result,
        Err(e) => {
            warn!("Collaborative filtering failed for user {user_id}, contributing nothing: {e:#}");
            vec![]
        }
    }
}

fn collaborative_inner(
    store: &dyn LibraryStore,
    user_id: &str,
    limit: usize,
) -> Result<Vec<Track>> {
    let liked = store.liked_track_ids(user_id)?;
    if liked.is_empty() {
        return Ok(vec![]);
    }

    let similar_users = store.users_with_likes_on(&liked, user_id, SIMILAR_USERS_LIMIT)?;
    if similar_users.is_empty() {
        debug!("No similar users found for user {user_id}");
        return Ok(vec![]);
    }

    store.tracks_liked_by_users(&similar_users, user_id, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_store::{InteractionType, SqliteLibraryStore, Track};

    fn track(title: &str) -> Track {
        Track {
            id: None,
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: None,
            album_art: None,
            duration_secs: None,
            popularity: None,
            external_id: None,
            external_url: None,
        }
    }

    #[tokio::test]
    async fn test_no_likes_yields_empty() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        let user = store.create_user("lonely").unwrap();

        let result = collaborative_recommendations(&store, &user, 10).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_no_overlapping_users_yields_empty() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        let user = store.create_user("solo").unwrap();
        let other = store.create_user("other").unwrap();
        let mine = store.insert_track(&track("mine")).unwrap();
        let theirs = store.insert_track(&track("theirs")).unwrap();
        store
            .record_interaction(&user, &mine, InteractionType::Like)
            .unwrap();
        store
            .record_interaction(&other, &theirs, InteractionType::Like)
            .unwrap();

        let result = collaborative_recommendations(&store, &user, 10).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_recommends_neighbor_likes_excluding_own_history() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        let alice = store.create_user("alice").unwrap();
        let bob = store.create_user("bob").unwrap();
        let shared = store.insert_track(&track("shared")).unwrap();
        let fresh = store.insert_track(&track("fresh")).unwrap();

        // Alice and Bob both like the shared track; Bob also likes another
        store
            .record_interaction(&alice, &shared, InteractionType::Like)
            .unwrap();
        store
            .record_interaction(&bob, &shared, InteractionType::Like)
            .unwrap();
        store
            .record_interaction(&bob, &fresh, InteractionType::Like)
            .unwrap();

        let result = collaborative_recommendations(&store, &alice, 10).await;
        let ids: Vec<_> = result.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(ids, vec![fresh.as_str()]);
    }
}
