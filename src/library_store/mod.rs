//! Library storage: users, tracks, audio features and interactions.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{AudioFeatures, Interaction, InteractionType, Track};
pub use schema::SCHEMA_VERSION;
pub use store::SqliteLibraryStore;
pub use trait_def::{InteractionStore, LibraryStore, TrackStore, UserStore};
