//! XML entity decoding and escaping
//!
//! Decodes the five predefined entities and numeric character references.
//! GIR producers emit nothing else; unknown references are kept verbatim.
//!
//! Uses Cow for zero-copy when no entities are present.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text or attribute content
///
/// Returns Borrowed if no '&' is present, Owned otherwise.
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp;

        let decoded = memchr(b';', &input[pos..]).and_then(|semi| {
            decode_entity(&input[pos + 1..pos + semi]).map(|c| (c, semi))
        });

        match decoded {
            Some((ch, semi)) => {
                let mut buf = [0u8; 4];
                result.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                pos += semi + 1;
            }
            None => {
                result.push(b'&');
                pos += 1;
            }
        }
    }
    result.extend_from_slice(&input[pos..]);

    result
}

/// Decode a single entity body (without '&' and ';')
fn decode_entity(entity: &[u8]) -> Option<char> {
    match entity {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x' | b'X', hex @ ..] => {
            let hex = std::str::from_utf8(hex).ok()?;
            u32::from_str_radix(hex, 16).ok().and_then(checked_char)
        }
        [b'#', dec @ ..] => {
            let dec = std::str::from_utf8(dec).ok()?;
            dec.parse::<u32>().ok().and_then(checked_char)
        }
        _ => None,
    }
}

fn checked_char(codepoint: u32) -> Option<char> {
    if is_valid_xml_char(codepoint) {
        char::from_u32(codepoint)
    } else {
        None
    }
}

/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Escape text for XML output
pub fn encode_text(input: &str) -> Cow<'_, str> {
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\'')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape an attribute value; same rules as text, values are always double-quoted
#[inline]
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    encode_text(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"gtk_widget_show");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"gtk_widget_show");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text(b"&lt;hello&gt; &amp; &quot;world&quot; &apos;");
        assert_eq!(result.as_ref(), b"<hello> & \"world\" '");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#x42;&#X43;").as_ref(), b"ABC");
        assert_eq!(
            std::str::from_utf8(decode_text(b"&#x1F600;").as_ref()).ok(),
            Some("\u{1F600}")
        );
    }

    #[test]
    fn test_unknown_and_invalid_kept() {
        assert_eq!(decode_text(b"&unknown;").as_ref(), b"&unknown;");
        assert_eq!(decode_text(b"&#0;").as_ref(), b"&#0;");
        assert_eq!(decode_text(b"a & b").as_ref(), b"a & b");
    }

    #[test]
    fn test_encode_text() {
        let result = encode_text("<hello> & \"world\"");
        assert_eq!(result.as_ref(), "&lt;hello&gt; &amp; &quot;world&quot;");
        assert!(matches!(encode_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_encode_then_decode() {
        let original = "a < b && c > 'd'";
        let encoded = encode_attribute(original);
        assert_eq!(decode_text(encoded.as_bytes()).as_ref(), original.as_bytes());
    }
}
