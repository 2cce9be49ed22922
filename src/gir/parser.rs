//! GIR parser driver
//!
//! One forward pass over the `SliceReader` event stream. An explicit stack
//! holds one frame per open element: either the node being populated or a
//! marker for an element that is skipped together with its subtree.

use super::kind::NodeKind;
use super::node::{Node, NodeId};
use super::repository::Repository;
use super::schema::collect_attributes;
use super::strings::StringPool;
use crate::core::scanner::is_whitespace;
use crate::error::{GirError, ParseError};
use crate::reader::{SliceReader, StartElement, XmlEvent};
use std::path::Path;
use tracing::{debug, trace};

/// Stateless GIR parser; one instance may serve many documents and threads
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    _private: (),
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    /// Parse a complete document held in memory
    pub fn parse(&self, input: &[u8]) -> Result<Repository, ParseError> {
        let mut reader = SliceReader::new(input);
        let mut builder = TreeBuilder::new(input.len());

        loop {
            let event = reader.next_event()?;
            match event {
                XmlEvent::StartElement(elem) => builder.start(&elem, false)?,
                XmlEvent::EmptyElement(elem) => builder.start(&elem, true)?,
                XmlEvent::EndElement(end) => builder.end(end.name, end.position)?,
                XmlEvent::Text(text) => builder.text(&text, false, reader.position())?,
                XmlEvent::CData(text) => builder.text(&text, true, reader.position())?,
                XmlEvent::Comment(_)
                | XmlEvent::ProcessingInstruction { .. }
                | XmlEvent::XmlDeclaration
                | XmlEvent::DocType => {}
                XmlEvent::EndDocument => break,
            }
        }

        let repository = builder.finish(input.len())?;
        debug!(
            nodes = repository.node_count(),
            strings = repository.strings().len(),
            "parsed GIR document"
        );
        Ok(repository)
    }

    /// Read and parse a `.gir` file
    pub fn parse_file(&self, path: &Path) -> crate::Result<Repository> {
        debug!(path = %path.display(), "parsing");
        let bytes = std::fs::read(path).map_err(|e| GirError::io(path, e))?;
        Ok(self.parse(&bytes)?)
    }
}

/// An open element
struct Frame<'a> {
    name: &'a [u8],
    /// `None` when the element and its subtree are skipped
    node: Option<NodeId>,
}

struct TreeBuilder<'a> {
    nodes: Vec<Node>,
    pool: StringPool,
    stack: Vec<Frame<'a>>,
    root_closed: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(input_len: usize) -> Self {
        TreeBuilder {
            // Typical GIR files hold roughly one element per 80 bytes
            nodes: Vec::with_capacity((input_len / 80).max(16)),
            pool: StringPool::new(),
            stack: Vec::with_capacity(32),
            root_closed: false,
        }
    }

    fn start(&mut self, elem: &StartElement<'a>, empty: bool) -> Result<(), ParseError> {
        let node = match self.stack.last() {
            None => Some(self.start_root(elem)?),
            Some(Frame { node: None, .. }) => None,
            Some(&Frame {
                node: Some(parent), ..
            }) => self.start_child(parent, elem)?,
        };

        if !empty {
            self.stack.push(Frame {
                name: elem.name,
                node,
            });
        } else if node == Some(0) {
            self.root_closed = true;
        }
        Ok(())
    }

    fn start_root(&mut self, elem: &StartElement<'a>) -> Result<NodeId, ParseError> {
        if self.root_closed {
            return Err(ParseError::malformed(
                "Document has more than one root element",
                elem.position,
            ));
        }
        if elem.name != NodeKind::Repository.tag().as_bytes() {
            return Err(ParseError::MissingRepository);
        }
        self.add_node(NodeKind::Repository, None, elem)
    }

    fn start_child(
        &mut self,
        parent: NodeId,
        elem: &StartElement<'a>,
    ) -> Result<Option<NodeId>, ParseError> {
        let parent_kind = self.nodes[parent as usize].kind;
        let kind = match parent_kind.child_kind(elem.name) {
            Some(kind) => kind,
            None => {
                trace!(
                    parent = parent_kind.tag(),
                    element = %String::from_utf8_lossy(elem.name),
                    "skipping element"
                );
                return Ok(None);
            }
        };

        let id = self.add_node(kind, Some(parent), elem)?;

        if let Some(slot) = parent_kind.slot(kind) {
            let nodes = &mut self.nodes;
            let mut children = std::mem::take(&mut nodes[parent as usize].children);
            let before = children.len();
            children.retain(|&c| parent_kind.slot(nodes[c as usize].kind) != Some(slot));
            if children.len() != before {
                trace!(parent = parent_kind.tag(), child = kind.tag(), "replacing child");
            }
            nodes[parent as usize].children = children;
        }
        self.nodes[parent as usize].children.push(id);

        Ok(Some(id))
    }

    fn add_node(
        &mut self,
        kind: NodeKind,
        parent: Option<NodeId>,
        elem: &StartElement<'a>,
    ) -> Result<NodeId, ParseError> {
        let attrs = collect_attributes(kind.tag(), kind.schema(), &elem.attributes, &mut self.pool)?;
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node::new(kind, parent, attrs));
        Ok(id)
    }

    fn end(&mut self, name: &'a [u8], position: usize) -> Result<(), ParseError> {
        let frame = self.stack.pop().ok_or_else(|| {
            ParseError::malformed(
                format!("Unexpected closing tag </{}>", String::from_utf8_lossy(name)),
                position,
            )
        })?;

        if frame.name != name {
            return Err(ParseError::malformed(
                format!(
                    "Tag mismatch: <{}> closed with </{}>",
                    String::from_utf8_lossy(frame.name),
                    String::from_utf8_lossy(name)
                ),
                position,
            ));
        }

        if self.stack.is_empty() {
            self.root_closed = true;
        }
        Ok(())
    }

    fn text(&mut self, text: &[u8], cdata: bool, position: usize) -> Result<(), ParseError> {
        let frame = match self.stack.last() {
            Some(frame) => frame,
            None if !cdata && text.iter().all(|&b| is_whitespace(b)) => return Ok(()),
            None => {
                return Err(ParseError::malformed(
                    "Character data outside the root element",
                    position,
                ))
            }
        };

        if let Some(id) = frame.node {
            let node = &mut self.nodes[id as usize];
            if node.kind.is_doc() {
                node.push_text(&String::from_utf8_lossy(text));
            }
        }
        Ok(())
    }

    fn finish(self, input_len: usize) -> Result<Repository, ParseError> {
        if let Some(open) = self.stack.last() {
            return Err(ParseError::malformed(
                format!("Unclosed element <{}>", String::from_utf8_lossy(open.name)),
                input_len,
            ));
        }
        if self.nodes.is_empty() {
            return Err(ParseError::MissingRepository);
        }
        Ok(Repository::from_parts(self.nodes, self.pool))
    }
}
