//! Processing Strategy Module
//!
//! A single document is always parsed on one thread. Collections of
//! documents are spread over the Rayon pool:
//! - parse_files: one `Repository` per file
//! - index_files: one loaded or rebuilt index per file

pub mod parallel;

pub use parallel::{index_files, parse_files, CancellationToken};
