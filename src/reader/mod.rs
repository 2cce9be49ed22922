//! XML Reader Module
//!
//! - SliceReader: zero-copy event reader over a byte slice
//! - events: XML event types for pull parsing

pub mod events;
pub mod slice;

pub use events::{EndElement, StartElement, XmlEvent};
pub use slice::SliceReader;
