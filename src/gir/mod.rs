//! Typed GIR trees
//!
//! - kind: closed set of node kinds with their dispatch tables
//! - schema: per-kind attribute tables and the attribute collector
//! - strings: string interning for attribute values
//! - node / repository: node arena and read-only views
//! - parser: event stream to `Repository`
//! - serialize: `Repository` back to GIR XML
//! - ident: stable search identifiers

pub mod ident;
pub mod kind;
pub mod node;
pub mod parser;
pub mod repository;
pub mod schema;
pub mod serialize;
pub mod strings;

pub use ident::generate_id;
pub use kind::{NodeKind, Slot};
pub use node::{Node, NodeId};
pub use parser::Parser;
pub use repository::{NodeRef, Repository, TypeRef};
pub use schema::{collect_attributes, AttrSpec, Presence};
pub use strings::{StringPool, Sym};
