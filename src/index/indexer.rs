//! Repository to fuzzy index
//!
//! Only a fixed set of kinds is searchable. Each searchable node becomes
//! one document keyed by its discriminating keyword; the node's other
//! keywords point at the same document.

use super::fuzzy::{FuzzyIndexBuilder, IndexDocument};
use crate::gir::{NodeKind, NodeRef, Repository};
use tracing::debug;

/// Metadata key holding the namespace name
pub const NAMESPACE_KEY: &str = "namespace";

/// Indexing rule for a kind: discriminating attribute and all keywords
fn rule(kind: NodeKind) -> Option<(&'static str, &'static [&'static str])> {
    match kind {
        NodeKind::Namespace => Some(("name", &["name", "c:identifier-prefixes"])),
        NodeKind::Class | NodeKind::Record => {
            Some(("c:type", &["name", "c:symbol-prefix", "c:type"]))
        }
        NodeKind::Function | NodeKind::Method | NodeKind::Constructor => {
            Some(("c:identifier", &["c:identifier", "name"]))
        }
        _ => None,
    }
}

fn index_node(node: NodeRef<'_>, builder: &mut FuzzyIndexBuilder) -> bool {
    let Some((discriminator, keywords)) = rule(node.kind()) else {
        return false;
    };
    let Some(word) = node.attr(discriminator) else {
        return false;
    };

    let document = IndexDocument {
        id: node.generate_id(),
        word: word.to_string(),
    };
    for keyword in keywords.iter().filter_map(|k| node.attr(k)) {
        builder.insert(keyword, document.clone());
    }
    true
}

/// Walk the tree in pre-order and collect every searchable node
pub fn build_index(repository: &Repository, case_sensitive: bool) -> FuzzyIndexBuilder {
    let mut builder = FuzzyIndexBuilder::new(case_sensitive);
    if let Some(name) = repository.namespace().and_then(|ns| ns.name()) {
        builder.set_metadata_string(NAMESPACE_KEY, name);
    }

    let documents = repository
        .descendants()
        .filter(|&node| index_node(node, &mut builder))
        .count();

    debug!(documents, entries = builder.len(), "built search index");
    builder
}
