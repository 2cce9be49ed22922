//! GIR serialization
//!
//! Writes a subtree back out as indented GIR XML. Attributes come out in
//! schema order, so parsing the output and serializing again is byte
//! identical.

use super::repository::NodeRef;
use crate::core::entities::{encode_attribute, encode_text};

const INDENT: &str = "  ";

pub(crate) fn serialize_node(node: NodeRef<'_>, depth: usize, out: &mut String) {
    push_indent(depth, out);
    let tag = node.tag();
    out.push('<');
    out.push_str(tag);

    for (name, value) in node.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_attribute(value));
        out.push('"');
    }

    if node.kind().is_doc() {
        out.push('>');
        out.push_str(&encode_text(node.text().unwrap_or_default()));
        push_close(tag, out);
    } else if node.has_children() {
        out.push_str(">\n");
        for child in node.children() {
            serialize_node(child, depth + 1, out);
        }
        push_indent(depth, out);
        push_close(tag, out);
    } else {
        out.push_str("/>\n");
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_close(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">\n");
}

#[cfg(test)]
mod tests {
    use crate::gir::Parser;
    use proptest::prelude::*;

    fn round_trip(input: &str) -> (String, String) {
        let parser = Parser::new();
        let first = parser.parse(input.as_bytes()).unwrap().serialize();
        let second = parser.parse(first.as_bytes()).unwrap().serialize();
        (first, second)
    }

    #[test]
    fn test_layout() {
        let input = r#"<repository version="1.2"><namespace version="2.0" name="GLib">
            <function c:identifier="g_getenv" name="getenv">
              <doc xml:space="preserve">Gets an environment variable &amp; more.</doc>
              <return-value transfer-ownership="none" nullable="1"><type name="utf8"/></return-value>
            </function>
            <constant name="EMPTY" value=""/>
          </namespace></repository>"#;
        let out = Parser::new().parse(input.as_bytes()).unwrap().serialize();
        let expected = concat!(
            "<repository version=\"1.2\">\n",
            "  <namespace name=\"GLib\" version=\"2.0\">\n",
            "    <function name=\"getenv\" c:identifier=\"g_getenv\">\n",
            "      <doc xml:space=\"preserve\">Gets an environment variable &amp; more.</doc>\n",
            "      <return-value nullable=\"1\" transfer-ownership=\"none\">\n",
            "        <type name=\"utf8\"/>\n",
            "      </return-value>\n",
            "    </function>\n",
            "    <constant name=\"EMPTY\" value=\"\"/>\n",
            "  </namespace>\n",
            "</repository>\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_doc() {
        let input = r#"<repository><namespace name="G"><doc></doc></namespace></repository>"#;
        let out = Parser::new().parse(input.as_bytes()).unwrap().serialize();
        assert!(out.contains("    <doc></doc>\n"));
    }

    #[test]
    fn test_idempotent_with_escapes() {
        let input = r#"<repository><namespace name="A&quot;B">
            <constant name="LT" value="&lt;&amp;&gt;"><type name="utf8" c:type="gchar*"/></constant>
            <record name="R"><doc>multi
line &lt;doc&gt;</doc><field name="f" bits="3"><array length="2"><type name="gint"/></array></field></record>
          </namespace></repository>"#;
        let (first, second) = round_trip(input);
        assert_eq!(first, second);
        assert!(first.contains("name=\"A&quot;B\""));
        assert!(first.contains("multi\nline &lt;doc&gt;</doc>"));
    }

    fn value() -> impl Strategy<Value = String> {
        prop::string::string_regex("[ -~\u{e9}\u{4e2d}]{0,12}").unwrap()
    }

    proptest! {
        #[test]
        fn prop_serialize_is_idempotent(
            ns in value(),
            class in value(),
            c_type in prop::option::of(value()),
            methods in prop::collection::vec(value(), 0..4),
            doc in value(),
        ) {
            let parser = Parser::new();
            let mut xml = format!(
                "<repository><namespace name=\"{}\"><class name=\"{}\"",
                crate::core::entities::encode_attribute(&ns),
                crate::core::entities::encode_attribute(&class),
            );
            if let Some(c_type) = &c_type {
                xml.push_str(&format!(" c:type=\"{}\"", crate::core::entities::encode_attribute(c_type)));
            }
            xml.push_str(&format!("><doc>{}</doc>", crate::core::entities::encode_text(&doc)));
            for m in &methods {
                xml.push_str(&format!(
                    "<method name=\"{}\"/>",
                    crate::core::entities::encode_attribute(m)
                ));
            }
            xml.push_str("</class></namespace></repository>");

            let repo = parser.parse(xml.as_bytes()).unwrap();
            let first = repo.serialize();
            let second = parser.parse(first.as_bytes()).unwrap().serialize();
            prop_assert_eq!(&first, &second);

            let reparsed = parser.parse(first.as_bytes()).unwrap();
            let class_node = reparsed.namespace().and_then(|n| n.classes().next()).unwrap();
            prop_assert_eq!(class_node.name(), Some(class.as_str()));
            prop_assert_eq!(class_node.doc(), Some(doc.as_str()));
            prop_assert_eq!(class_node.methods().count(), methods.len());
        }
    }
}
