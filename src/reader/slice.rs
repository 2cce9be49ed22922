//! Zero-Copy Slice Reader
//!
//! Turns tokenizer output into `XmlEvent`s over a byte slice. Element
//! names and undecoded values borrow from the input.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::{parse_attributes, Attribute};
use crate::core::scanner::is_whitespace;
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::error::ParseError;

/// Zero-copy XML reader from a byte slice
pub struct SliceReader<'a> {
    input: &'a [u8],
    tokenizer: Tokenizer<'a>,
}

impl<'a> SliceReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            input,
            tokenizer: Tokenizer::new(input),
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// Next event; `EndDocument` once the input is exhausted
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>, ParseError> {
        let token = self.tokenizer.next_token()?;

        let event = match token.kind {
            TokenKind::Eof => XmlEvent::EndDocument,
            TokenKind::StartTag => XmlEvent::StartElement(self.start_element(&token)?),
            TokenKind::EmptyTag => XmlEvent::EmptyElement(self.start_element(&token)?),
            TokenKind::EndTag => XmlEvent::EndElement(EndElement::new(tag_name(&token), token.span.0)),
            TokenKind::Text => XmlEvent::Text(token.content.unwrap_or_default()),
            TokenKind::CData => XmlEvent::CData(token.content.unwrap_or_default()),
            TokenKind::Comment => XmlEvent::Comment(token.content.unwrap_or_default()),
            TokenKind::ProcessingInstruction => XmlEvent::ProcessingInstruction {
                target: tag_name(&token),
                data: token.content,
            },
            TokenKind::XmlDeclaration => XmlEvent::XmlDeclaration,
            TokenKind::DocType => XmlEvent::DocType,
        };

        Ok(event)
    }

    fn start_element(&self, token: &Token<'a>) -> Result<StartElement<'a>, ParseError> {
        let name = tag_name(token);
        let attributes = self.parse_tag_attributes(token, name.len())?;
        Ok(StartElement::new(name, attributes, token.span.0))
    }

    /// Parse the attributes between the element name and `>` or `/>`
    fn parse_tag_attributes(
        &self,
        token: &Token<'a>,
        name_len: usize,
    ) -> Result<Vec<Attribute<'a>>, ParseError> {
        let (start, end) = token.span;
        let tag_content = &self.input[start..end];

        // Skip '<' and the name
        let attr_start = 1 + name_len;
        let mut attr_end = tag_content.len() - 1;
        if token.kind == TokenKind::EmptyTag {
            attr_end -= 1;
        }

        if attr_start >= attr_end {
            return Ok(Vec::new());
        }

        let attr_content = &tag_content[attr_start..attr_end];
        if !attr_content.first().copied().map_or(true, is_whitespace) {
            return Err(ParseError::malformed(
                "Whitespace required after element name",
                start + attr_start,
            ));
        }

        parse_attributes(attr_content).map_err(|(message, offset)| {
            let position = start + attr_start + offset;
            let (line, col) = self.tokenizer.line_col(position);
            ParseError::malformed(format!("{} (line {}, column {})", message, line, col), position)
        })
    }
}

fn tag_name<'a>(token: &Token<'a>) -> &'a [u8] {
    token.name.unwrap_or_default()
}
