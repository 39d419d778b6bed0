//! SQLite-backed library store implementation.
//!
//! One database file holds users, tracks, audio features and interactions.
//! The recommendation engine only reads through the store traits; the write
//! helpers below exist for the surrounding application and for test fixtures.

use super::models::{AudioFeatures, Interaction, InteractionType, Track};
use super::schema::init_schema;
use super::trait_def::{InteractionStore, TrackStore, UserStore};
use crate::recommendation::FeatureWindow;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

const TRACK_COLUMNS: &str =
    "id, title, artist, album, album_art, duration_secs, popularity, external_id, external_url";

const FEATURE_COLUMNS: &str =
    "energy, danceability, acousticness, instrumentalness, liveness, valence, speechiness";

/// SQLite-backed library store.
#[derive(Clone)]
pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
}

fn track_from_row(row: &rusqlite::Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        album_art: row.get(4)?,
        duration_secs: row.get(5)?,
        popularity: row.get(6)?,
        external_id: row.get(7)?,
        external_url: row.get(8)?,
    })
}

/// Read an `AudioFeatures` from a row, starting at `offset`.
fn features_from_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<AudioFeatures> {
    Ok(AudioFeatures {
        energy: row.get(offset)?,
        danceability: row.get(offset + 1)?,
        acousticness: row.get(offset + 2)?,
        instrumentalness: row.get(offset + 3)?,
        liveness: row.get(offset + 4)?,
        valence: row.get(offset + 5)?,
        speechiness: row.get(offset + 6)?,
    })
}

impl SqliteLibraryStore {
    /// Open (or create) a library database at the given path.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open library database")?;

        init_schema(&conn)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let track_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM track", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened library database: {} tracks", track_count);

        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, mainly for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // =========================================================================
    // Write Helpers (used by the surrounding application and fixtures;
    // the recommendation engine itself never writes)
    // =========================================================================

    /// Create a user and return the assigned id.
    pub fn create_user(&self, handle: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user (id, handle) VALUES (?1, ?2)",
            params![id, handle],
        )?;
        Ok(id)
    }

    /// Insert a track, assigning an id when the track has none.
    /// Returns the stored id.
    pub fn insert_track(&self, track: &Track) -> Result<String> {
        let id = track
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO track ({TRACK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                id,
                track.title,
                track.artist,
                track.album,
                track.album_art,
                track.duration_secs,
                track.popularity,
                track.external_id,
                track.external_url,
            ],
        )?;
        Ok(id)
    }

    /// Insert or replace a track's audio features.
    pub fn upsert_audio_features(&self, track_id: &str, features: &AudioFeatures) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO audio_features (track_id, {FEATURE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                track_id,
                features.energy,
                features.danceability,
                features.acousticness,
                features.instrumentalness,
                features.liveness,
                features.valence,
                features.speechiness,
            ],
        )?;
        Ok(())
    }

    /// Record an interaction with the current timestamp.
    pub fn record_interaction(
        &self,
        user_id: &str,
        track_id: &str,
        interaction_type: InteractionType,
    ) -> Result<()> {
        self.record_interaction_at(user_id, track_id, interaction_type, Utc::now().timestamp())
    }

    /// Record an interaction with an explicit timestamp (backfill imports).
    pub fn record_interaction_at(
        &self,
        user_id: &str,
        track_id: &str,
        interaction_type: InteractionType,
        created: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO interaction (user_id, track_id, interaction_type, created)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, track_id, interaction_type.to_db_str(), created],
        )?;
        Ok(())
    }
}

impl TrackStore for SqliteLibraryStore {
    fn get_track(&self, track_id: &str) -> Result<Option<Track>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            &format!("SELECT {TRACK_COLUMNS} FROM track WHERE id = ?1"),
            params![track_id],
            track_from_row,
        ) {
            Ok(track) => Ok(Some(track)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_track_features(&self, track_id: &str) -> Result<Option<AudioFeatures>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            &format!("SELECT {FEATURE_COLUMNS} FROM audio_features WHERE track_id = ?1"),
            params![track_id],
            |row| features_from_row(row, 0),
        ) {
            Ok(features) => Ok(Some(features)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn most_popular_tracks(&self, limit: usize) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRACK_COLUMNS} FROM track ORDER BY popularity DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], track_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn tracks_in_feature_window(
        &self,
        window: &FeatureWindow,
        exclude_track_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();

        let exclusion = if exclude_track_ids.is_empty() {
            String::new()
        } else {
            let placeholders = exclude_track_ids
                .iter()
                .map(|_| "?")
                .collect::<Vec<_>>()
                .join(",");
            format!("AND t.id NOT IN ({placeholders})")
        };

        let sql = format!(
            "SELECT {cols} FROM track t
             JOIN audio_features f ON f.track_id = t.id
             WHERE f.energy BETWEEN ? AND ?
               AND f.danceability BETWEEN ? AND ?
               AND f.valence BETWEEN ? AND ?
               {exclusion}
             LIMIT ?",
            cols = TRACK_COLUMNS
                .split(", ")
                .map(|c| format!("t.{c}"))
                .collect::<Vec<_>>()
                .join(", "),
        );

        let mut values: Vec<Value> = vec![
            Value::Real(window.energy.0),
            Value::Real(window.energy.1),
            Value::Real(window.danceability.0),
            Value::Real(window.danceability.1),
            Value::Real(window.valence.0),
            Value::Real(window.valence.1),
        ];
        values.extend(exclude_track_ids.iter().map(|id| Value::Text(id.clone())));
        values.push(Value::Integer(limit as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), track_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn tracks_liked_by_users(
        &self,
        user_ids: &[String],
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Track>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn.lock().unwrap();

        let placeholders = user_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT {TRACK_COLUMNS} FROM track
             WHERE EXISTS (
                 SELECT 1 FROM interaction i
                 WHERE i.track_id = track.id
                   AND i.interaction_type = 'LIKE'
                   AND i.user_id IN ({placeholders})
             )
             AND NOT EXISTS (
                 SELECT 1 FROM interaction i
                 WHERE i.track_id = track.id AND i.user_id = ?
             )
             LIMIT ?"
        );

        let mut values: Vec<Value> = user_ids.iter().map(|id| Value::Text(id.clone())).collect();
        values.push(Value::Text(exclude_user_id.to_string()));
        values.push(Value::Integer(limit as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), track_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl InteractionStore for SqliteLibraryStore {
    fn interactions_for_user(&self, user_id: &str) -> Result<Vec<Interaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, track_id, interaction_type, created FROM interaction
             WHERE user_id = ?1
             ORDER BY created DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Interaction {
                user_id: row.get(0)?,
                track_id: row.get(1)?,
                interaction_type: InteractionType::from_db_str(&row.get::<_, String>(2)?),
                created: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn liked_track_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT track_id FROM interaction
             WHERE user_id = ?1 AND interaction_type = 'LIKE'",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn recent_liked_tracks(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<(Track, Option<AudioFeatures>)>> {
        let conn = self.conn.lock().unwrap();
        let track_cols = TRACK_COLUMNS
            .split(", ")
            .map(|c| format!("t.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let feature_cols = FEATURE_COLUMNS
            .split(", ")
            .map(|c| format!("f.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {track_cols}, f.track_id, {feature_cols} FROM interaction i
             JOIN track t ON t.id = i.track_id
             LEFT JOIN audio_features f ON f.track_id = t.id
             WHERE i.user_id = ?1 AND i.interaction_type = 'LIKE'
             ORDER BY i.created DESC, i.id DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            let track = track_from_row(row)?;
            // NULL f.track_id means the LEFT JOIN found no features row
            let features = match row.get::<_, Option<String>>(9)? {
                Some(_) => Some(features_from_row(row, 10)?),
                None => None,
            };
            Ok((track, features))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn interacted_track_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT DISTINCT track_id FROM interaction WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<HashSet<_>>>()?)
    }
}

impl UserStore for SqliteLibraryStore {
    fn users_with_likes_on(
        &self,
        track_ids: &[String],
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        if track_ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn.lock().unwrap();

        let placeholders = track_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT DISTINCT user_id FROM interaction
             WHERE interaction_type = 'LIKE'
               AND user_id != ?
               AND track_id IN ({placeholders})
             LIMIT ?"
        );

        let mut values: Vec<Value> = vec![Value::Text(exclude_user_id.to_string())];
        values.extend(track_ids.iter().map(|id| Value::Text(id.clone())));
        values.push(Value::Integer(limit as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
