//! Search identifiers
//!
//! Ids look like `gir:namespace[Gtk-4.0]:class[Widget]:method[show]`: one
//! segment per addressable ancestor, outermost first. The namespace
//! version is always part of the id so that two installed versions of a
//! library never collide.

use super::kind::NodeKind;
use super::repository::NodeRef;

const PREFIX: &str = "gir:";

/// Segment label for kinds that appear in ids
fn segment_label(kind: NodeKind) -> Option<&'static str> {
    use NodeKind::*;
    let label = match kind {
        Namespace => "namespace",
        Class => "class",
        Interface => "interface",
        Record => "record",
        Union => "union",
        Enumeration => "enumeration",
        Bitfield => "bitfield",
        Boxed => "boxed",
        Function => "function",
        Method => "method",
        Constructor => "ctor",
        VirtualMethod => "vfunc",
        Signal => "signal",
        Property => "property",
        Callback => "callback",
        _ => return None,
    };
    Some(label)
}

fn push_segment(node: NodeRef<'_>, label: &str, out: &mut String) {
    out.push_str(label);
    out.push('[');
    match node.kind() {
        NodeKind::Namespace => {
            out.push_str(node.name().unwrap_or_default());
            out.push('-');
            out.push_str(node.version().unwrap_or_default());
        }
        _ => out.push_str(node.name().unwrap_or_default()),
    }
    out.push(']');
}

/// Identifier of a node and its addressable ancestors
pub fn generate_id(node: NodeRef<'_>) -> String {
    let mut path: Vec<(NodeRef<'_>, &'static str)> = std::iter::once(node)
        .chain(node.ancestors())
        .filter_map(|n| segment_label(n.kind()).map(|label| (n, label)))
        .collect();
    path.reverse();

    let mut id = String::from(PREFIX);
    for (i, (n, label)) in path.into_iter().enumerate() {
        if i > 0 {
            id.push(':');
        }
        push_segment(n, label, &mut id);
    }
    id
}

#[cfg(test)]
mod tests {
    use crate::gir::{NodeKind, Parser};

    fn doc(version: &str) -> String {
        format!(
            r#"<repository><namespace name="Gtk" version="{}">
                 <class name="Widget" c:type="GtkWidget">
                   <constructor name="new" c:identifier="gtk_widget_new"/>
                   <method name="show" c:identifier="gtk_widget_show"/>
                   <virtual-method name="snapshot"/>
                   <glib:signal name="destroy"/>
                   <property name="visible"/>
                 </class>
                 <glib:boxed glib:name="Gradient"/>
               </namespace></repository>"#,
            version
        )
    }

    #[test]
    fn test_ids() {
        let repo = Parser::new().parse(doc("4.0").as_bytes()).unwrap();
        let ids: Vec<_> = repo.descendants().map(|n| n.generate_id()).collect();

        assert_eq!(ids[0], "gir:");
        assert!(ids.contains(&"gir:namespace[Gtk-4.0]".to_string()));
        for expected in [
            "gir:namespace[Gtk-4.0]:class[Widget]",
            "gir:namespace[Gtk-4.0]:class[Widget]:ctor[new]",
            "gir:namespace[Gtk-4.0]:class[Widget]:method[show]",
            "gir:namespace[Gtk-4.0]:class[Widget]:vfunc[snapshot]",
            "gir:namespace[Gtk-4.0]:class[Widget]:signal[destroy]",
            "gir:namespace[Gtk-4.0]:class[Widget]:property[visible]",
            "gir:namespace[Gtk-4.0]:boxed[Gradient]",
        ] {
            assert!(ids.iter().any(|id| id == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_version_distinguishes_classes() {
        let gtk3 = Parser::new().parse(doc("3.0").as_bytes()).unwrap();
        let gtk4 = Parser::new().parse(doc("4.0").as_bytes()).unwrap();

        let class = |repo: &crate::gir::Repository| {
            repo.namespace()
                .and_then(|ns| ns.classes().next())
                .map(|c| c.generate_id())
                .unwrap()
        };
        assert_eq!(class(&gtk3), "gir:namespace[Gtk-3.0]:class[Widget]");
        assert_ne!(class(&gtk3), class(&gtk4));
    }

    #[test]
    fn test_nodes_without_segment_use_enclosing_path() {
        let input = br#"<repository><namespace name="GLib" version="2.0">
            <function name="getenv"><parameters>
              <parameter name="variable"><type name="utf8"/></parameter>
            </parameters></function>
          </namespace></repository>"#;
        let repo = Parser::new().parse(input).unwrap();
        let ty = repo
            .descendants()
            .find(|n| n.kind() == NodeKind::Type)
            .unwrap();
        assert_eq!(ty.generate_id(), "gir:namespace[GLib-2.0]:function[getenv]");
        assert_eq!(repo.root().generate_id(), "gir:");
    }
}
