//! XML Tokenizer - pull-style token extraction
//!
//! Produces one token per call:
//! - Element start/end/empty tags
//! - Text content (entities decoded)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE (skipped as an opaque span, internal subsets included)
//!
//! Well-formedness problems are reported as `ParseError::MalformedXml`
//! with the byte offset where they were detected. Tag nesting is checked
//! by the consumer, which owns the element stack.

use super::entities::decode_text;
use super::scanner::{is_whitespace, Scanner};
use crate::error::ParseError;
use std::borrow::Cow;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<element ...>`
    StartTag,
    /// `</element>`
    EndTag,
    /// `<element .../>`
    EmptyTag,
    Text,
    /// `<![CDATA[...]]>`
    CData,
    /// `<!--...-->`
    Comment,
    /// `<?target ...?>`
    ProcessingInstruction,
    /// `<?xml ...?>`
    XmlDeclaration,
    DocType,
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// Element name for tags, target for processing instructions
    pub name: Option<&'a [u8]>,
    /// Decoded text, CDATA, comment or PI body
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// Pull tokenizer over a complete document
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let mut scanner = Scanner::new(input);
        if scanner.starts_with(b"\xEF\xBB\xBF") {
            scanner.advance(3);
        }
        Tokenizer {
            scanner,
            done: false,
        }
    }

    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// 1-based (line, column) of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        self.scanner.line_col(offset)
    }

    /// Next token; `Eof` once the input is exhausted, then `Eof` forever
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        if self.done || self.scanner.is_eof() {
            self.done = true;
            let end = self.scanner.position();
            return Ok(Token::new(TokenKind::Eof, (end, end)));
        }

        match self.scanner.peek() {
            Some(b'<') => self.parse_markup(),
            _ => Ok(self.parse_text()),
        }
    }

    fn error(&self, message: &str, position: usize) -> ParseError {
        let (line, col) = self.scanner.line_col(position);
        ParseError::malformed(format!("{} (line {}, column {})", message, line, col), position)
    }

    fn parse_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1);

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => Err(self.error("Unexpected end of input after '<'", start)),
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid element name", start))?;

        match self.scanner.peek() {
            Some(b) if is_whitespace(b) || b == b'>' || b == b'/' => {}
            _ => return Err(self.error("Invalid character in element name", self.scanner.position())),
        }

        let end = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| self.error("Unterminated start tag", start))?;
        let is_empty = self.scanner.slice(end - 1, end) == b"/";

        self.scanner.set_position(end + 1);
        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, end + 1)).with_name(name))
    }

    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1);

        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid element name in end tag", start))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(self.error(
                "End tag cannot have attributes or other content",
                self.scanner.position(),
            ));
        }
        self.scanner.advance(1);

        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
    }

    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1);

        if self.scanner.starts_with(b"--") {
            self.scanner.advance(2);
            let (content, end) = self.read_until(b"-->", "Unterminated comment", start)?;
            Ok(Token::new(TokenKind::Comment, (start, end)).with_content(Cow::Borrowed(content)))
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.scanner.advance(7);
            let (content, end) = self.read_until(b"]]>", "Unterminated CDATA section", start)?;
            Ok(Token::new(TokenKind::CData, (start, end)).with_content(Cow::Borrowed(content)))
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            Err(self.error("Invalid declaration - expected comment, CDATA, or DOCTYPE", start))
        }
    }

    /// Consume up to and including `terminator`, returning the body and end offset
    fn read_until(
        &mut self,
        terminator: &[u8],
        message: &str,
        start: usize,
    ) -> Result<(&'a [u8], usize), ParseError> {
        let content_start = self.scanner.position();
        let found = self
            .scanner
            .find_sequence(terminator)
            .ok_or_else(|| self.error(message, start))?;
        let content = self.scanner.slice(content_start, found);
        self.scanner.set_position(found + terminator.len());
        Ok((content, self.scanner.position()))
    }

    /// Skip a DOCTYPE declaration, including a bracketed internal subset
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(b) = self.scanner.peek() {
            self.scanner.advance(1);
            match (quote, b) {
                (Some(q), _) if q == b => quote = None,
                (Some(_), _) => {}
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    let end = self.scanner.position();
                    return Ok(Token::new(TokenKind::DocType, (start, end)));
                }
                _ => {}
            }
        }

        Err(self.error("Unterminated DOCTYPE declaration", start))
    }

    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1);

        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error("Invalid processing instruction target", start))?;
        let (content, end) = self.read_until(b"?>", "Unterminated processing instruction", start)?;

        let kind = if name == b"xml" {
            if start != 0 && !self.scanner.slice(0, start).iter().all(|&b| is_whitespace(b) || b >= 0x80) {
                return Err(self.error("XML declaration must be at the start of the document", start));
            }
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };

        Ok(Token::new(kind, (start, end))
            .with_name(name)
            .with_content(Cow::Borrowed(content)))
    }

    fn parse_text(&mut self) -> Token<'a> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + self.scanner.remaining().len());

        let content = self.scanner.slice(start, end);
        self.scanner.set_position(end);

        Token::new(TokenKind::Text, (start, end)).with_content(decode_text(content))
    }
}
