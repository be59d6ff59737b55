//! Durable storage for hands, file offsets and accumulated statistics.

mod error;
mod gateway;
mod schema;
mod sqlite;

pub use error::StoreError;
pub use gateway::{BatchOutcome, FileState, HandStore, OffsetCommit};
pub use schema::{player_stats_table, SCHEMA, SCHEMA_VERSION};
pub use sqlite::{default_database_path, SqliteStore};
