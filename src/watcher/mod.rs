//! Hand-history directory polling.
//!
//! [`FileTailer`] discovers hand-history files, reads their growth since the
//! committed offset and hands complete hands to a [`HandStore`](crate::store::HandStore).

mod batch;
mod discovery;
mod error;
mod tailer;

pub use batch::{IngestBatch, ReadContext};
pub use discovery::{list_history_files, HistoryFile};
pub use error::WatcherError;
pub use tailer::{FileTailer, TailerOptions, TickReport, DEFAULT_IDLE_FLUSH, DEFAULT_LOOKBACK_WINDOW};
