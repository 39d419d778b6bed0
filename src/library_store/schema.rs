//! Library database schema.
//!
//! Plain SQL DDL with `PRAGMA user_version` tracking. A brand new database
//! gets the latest schema directly; an existing database at an unknown
//! version is refused rather than silently migrated.

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_TABLES_SQL: &str = "
CREATE TABLE user (
    id TEXT PRIMARY KEY,
    handle TEXT NOT NULL UNIQUE,
    created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int))
);

CREATE TABLE track (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    album TEXT,
    album_art TEXT,
    duration_secs INTEGER,
    popularity REAL,
    external_id TEXT,
    external_url TEXT,
    created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int))
);

CREATE TABLE audio_features (
    track_id TEXT PRIMARY KEY REFERENCES track(id) ON DELETE CASCADE,
    energy REAL,
    danceability REAL,
    acousticness REAL,
    instrumentalness REAL,
    liveness REAL,
    valence REAL,
    speechiness REAL
);

CREATE TABLE interaction (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    track_id TEXT NOT NULL REFERENCES track(id) ON DELETE CASCADE,
    interaction_type TEXT NOT NULL,
    created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int))
);

CREATE INDEX idx_track_popularity ON track(popularity);
CREATE INDEX idx_interaction_user ON interaction(user_id);
CREATE INDEX idx_interaction_track ON interaction(track_id);
CREATE INDEX idx_interaction_user_type ON interaction(user_id, interaction_type);
";

/// Create or verify the library schema on an open connection.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating library db schema at version {}", SCHEMA_VERSION);
        conn.execute_batch(CREATE_TABLES_SQL)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version != SCHEMA_VERSION {
        bail!(
            "Unsupported library db schema version {} (expected {})",
            db_version,
            SCHEMA_VERSION
        );
    }
    Ok(())
}
