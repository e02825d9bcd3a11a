//! Core engine for sift: ingest log and test events, deduplicate them
//! into groups by a stable identity checksum, and serve the filtered
//! read side (group lists, counters, facet choices) from SQLite.
//!
//! The write path is [`ingest::Pipeline`]; the read path is the
//! [`filter`] layer feeding [`db::query`]. All state lives in the store
//! database opened by [`db::open_store`].

pub mod checksum;
pub mod config;
pub mod db;
pub mod error;
pub mod facet;
pub mod filter;
pub mod ingest;
pub mod model;
pub mod notify;

pub use checksum::compute_checksum;
pub use config::{StoreConfig, db_path, load_config};
pub use db::open_store;
pub use db::query::{GroupQuery, SortOrder, StatusCounts};
pub use error::{ErrorCode, IngestError, ValidationError};
pub use facet::{FacetKey, FacetValue};
pub use filter::{Filter, FilterSet, Predicate, QueryParams};
pub use ingest::{Ingested, Pipeline};
pub use model::{
    EventAttributes, EventRecord, Group, LogLevel, MessageType, Status, TestResult,
};
pub use notify::{LogNotifier, Notifier, NullNotifier};
