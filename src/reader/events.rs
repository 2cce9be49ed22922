//! XML Event Types
//!
//! Event types for pull-parser style processing of GIR documents.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// `<name attrs...>`
    StartElement(StartElement<'a>),
    /// `</name>`
    EndElement(EndElement<'a>),
    /// `<name attrs.../>`
    EmptyElement(StartElement<'a>),
    /// Text content between tags, entities decoded
    Text(Cow<'a, [u8]>),
    CData(Cow<'a, [u8]>),
    Comment(Cow<'a, [u8]>),
    ProcessingInstruction {
        target: &'a [u8],
        data: Option<Cow<'a, [u8]>>,
    },
    XmlDeclaration,
    DocType,
    EndDocument,
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Qualified element name (`glib:signal`, `c:include`)
    pub name: &'a [u8],
    pub attributes: Vec<Attribute<'a>>,
    /// Byte offset of the opening '<'
    pub position: usize,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a [u8], attributes: Vec<Attribute<'a>>, position: usize) -> Self {
        StartElement {
            name,
            attributes,
            position,
        }
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    pub name: &'a [u8],
    pub position: usize,
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a [u8], position: usize) -> Self {
        EndElement { name, position }
    }
}
