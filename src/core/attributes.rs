//! Start-tag attribute parsing
//!
//! Splits the raw content of a start tag (after the element name) into
//! `name="value"` pairs. Values must be quoted and are entity-decoded.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use std::borrow::Cow;

/// A parsed XML attribute; `name` keeps its prefix (`c:type`, `glib:nick`)
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    pub name: &'a [u8],
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a [u8], value: Cow<'a, [u8]>) -> Self {
        Attribute { name, value }
    }
}

/// Parse attributes from raw tag content
///
/// On failure returns the message and the offset into `input` where the
/// problem was found.
pub fn parse_attributes(input: &[u8]) -> Result<Vec<Attribute<'_>>, (&'static str, usize)> {
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        let name_start = pos;
        if !is_name_start_char(input[pos]) {
            return Err(("Attribute name must start with letter, underscore, or colon", pos));
        }
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] != b'=' {
            return Err(("Attribute value required", pos));
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(("Attribute value must be quoted", pos)),
        };
        pos += 1;
        let value_start = pos;
        let value_len = match memchr::memchr(quote, &input[value_start..]) {
            Some(len) => len,
            None => return Err(("Attribute value has mismatched quotes", value_start)),
        };
        let raw = &input[value_start..value_start + value_len];
        if memchr::memchr(b'<', raw).is_some() {
            return Err(("Attribute value cannot contain '<'", value_start));
        }
        pos = value_start + value_len + 1;

        if attrs.iter().any(|a| a.name == name) {
            return Err(("Duplicate attribute", name_start));
        }
        attrs.push(Attribute::new(name, decode_text(raw)));

        // Attributes must be separated by whitespace
        if pos < input.len() && !is_whitespace(input[pos]) {
            return Err(("Whitespace required between attributes", pos));
        }
    }

    Ok(attrs)
}
