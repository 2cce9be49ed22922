//! Search Index Module
//!
//! Turns parsed GIR trees into fuzzy-searchable indexes and persists them
//! stamped with a format version and the source mtime.
//!
//! ## Architecture
//!
//! ```text
//! Repository ── build_index ──> FuzzyIndexBuilder ──> FuzzyIndex
//!                                                       │
//!                                   IndexStore  <── IndexBlob (bincode)
//!                                       │
//! IndexCache::get ── SingleFlight ──────┴── LRU of Arc<SearchIndex>
//! ```
//!
//! - fuzzy: per-character posting tables and subsequence scoring
//! - indexer: which kinds are searchable and under which keywords
//! - store: `<sha1>.index` blobs, written atomically, rejected when stale
//! - flight: one rebuild per file no matter how many callers ask
//! - cache: in-memory LRU in front of the store

pub mod cache;
pub mod flight;
pub mod fuzzy;
pub mod indexer;
pub mod store;

pub use cache::{IndexCache, SearchIndex, SharedIndex};
pub use flight::SingleFlight;
pub use fuzzy::{FuzzyIndex, FuzzyIndexBuilder, FuzzyMatch, IndexDocument};
pub use indexer::build_index;
pub use store::{IndexBlob, IndexStore, INDEX_VERSION};
