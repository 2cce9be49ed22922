//! GIR node representation
//!
//! Uses NodeId (u32) for compact node references into the repository arena.

use super::kind::NodeKind;
use super::strings::Sym;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Id of the `repository` node in every finished tree
pub const ROOT: NodeId = 0;

/// A GIR element in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Owning node (None for the repository)
    pub parent: Option<NodeId>,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Attribute values, one slot per entry of `kind.schema()`
    pub attrs: Box<[Option<Sym>]>,
    /// Character data, doc-family kinds only
    pub text: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, parent: Option<NodeId>, attrs: Box<[Option<Sym>]>) -> Self {
        Node {
            kind,
            parent,
            children: Vec::new(),
            attrs,
            text: kind.is_doc().then(String::new),
        }
    }

    /// Value handle of a schema attribute
    pub fn attr(&self, name: &str) -> Option<Sym> {
        let slot = super::schema::slot_of(self.kind.schema(), name)?;
        self.attrs.get(slot).copied().flatten()
    }

    /// Append character data (doc-family kinds only)
    pub(crate) fn push_text(&mut self, chunk: &str) {
        if let Some(text) = self.text.as_mut() {
            text.push_str(chunk);
        }
    }
}
