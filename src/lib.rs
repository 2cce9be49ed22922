//! RustyGIR - GObject-Introspection repository parsing and search
//!
//! Layers:
//! - core / reader: byte scanner, tokenizer and the pull event stream
//! - gir: typed arena tree of a `.gir` document, serializer and ids
//! - index: fuzzy keyword index, persisted blobs and the loaded-index cache
//! - strategy: parallel parsing and indexing of many files
//! - provider: directory discovery and cross-file search

pub mod config;
pub mod core;
pub mod error;
pub mod gir;
pub mod index;
pub mod provider;
pub mod reader;
pub mod strategy;

pub use config::Config;
pub use error::{ErrorKind, GirError, ParseError, Result};
pub use gir::{generate_id, NodeKind, NodeRef, Parser, Repository};
pub use index::{FuzzyIndex, FuzzyMatch, IndexCache, SearchIndex};
pub use provider::{GirProvider, SearchHit};
pub use strategy::CancellationToken;

/// Parse a GIR document held in memory
///
/// ```
/// let repo = rustygir::parse(br#"<repository><namespace name="GLib" version="2.0"/></repository>"#).unwrap();
/// assert_eq!(repo.namespace().unwrap().name(), Some("GLib"));
/// ```
pub fn parse(input: &[u8]) -> std::result::Result<Repository, ParseError> {
    Parser::new().parse(input)
}
