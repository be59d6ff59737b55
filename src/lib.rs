//! Hand Tracker - incremental poker hand-history ingestion and per-player statistics.
//!
//! Data flows from [`watcher::FileTailer`] through [`parser`] into [`hand`]
//! records, is counted by [`stats`] and merged into a [`store::HandStore`].

pub mod config;
pub mod hand;
pub mod parser;
pub mod stats;
pub mod store;
pub mod watcher;
