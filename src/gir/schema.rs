//! Attribute schemas and the attribute collector
//!
//! Each node kind declares its attributes once, in a static table. The
//! table order is the slot order in `Node::attrs` and the order attributes
//! are written back out by the serializer.

use super::kind::NodeKind;
use super::strings::{StringPool, Sym};
use crate::core::attributes::Attribute;
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// One declared attribute of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpec {
    /// Qualified name, e.g. `c:type`
    pub name: &'static str,
    pub presence: Presence,
}

const fn req(name: &'static str) -> AttrSpec {
    AttrSpec {
        name,
        presence: Presence::Required,
    }
}

const fn opt(name: &'static str) -> AttrSpec {
    AttrSpec {
        name,
        presence: Presence::Optional,
    }
}

// introspectable, deprecated, deprecated-version, version, stability
macro_rules! common {
    () => {
        [
            opt("introspectable"),
            opt("deprecated"),
            opt("deprecated-version"),
            opt("version"),
            opt("stability"),
        ]
    };
}

/// Concatenate fixed-size spec arrays into one static table
macro_rules! table {
    ($($part:expr),+ $(,)?) => {{
        const LEN: usize = 0 $(+ $part.len())+;
        const TABLE: [AttrSpec; LEN] = {
            let mut out = [opt(""); LEN];
            let mut i = 0;
            $(
                let part = $part;
                let mut j = 0;
                while j < part.len() {
                    out[i] = part[j];
                    i += 1;
                    j += 1;
                }
            )+
            out
        };
        &TABLE
    }};
}

const REPOSITORY: &[AttrSpec] = &[
    opt("version"),
    opt("c:identifier-prefixes"),
    opt("c:symbol-prefixes"),
];

const INCLUDE: &[AttrSpec] = &[opt("name"), opt("version")];

const NAME_ONLY: &[AttrSpec] = &[opt("name")];

const NAMESPACE: &[AttrSpec] = &[
    req("name"),
    opt("version"),
    opt("shared-library"),
    opt("c:identifier-prefixes"),
    opt("c:symbol-prefixes"),
    opt("c:prefix"),
];

const ALIAS: &[AttrSpec] = table!([opt("name"), opt("c:type")], common!());

const CLASS: &[AttrSpec] = table!(
    [req("name")],
    common!(),
    [
        opt("glib:type-name"),
        opt("glib:get-type"),
        opt("parent"),
        opt("glib:type-struct"),
        opt("glib:ref-func"),
        opt("glib:unref-func"),
        opt("glib:set-value-func"),
        opt("glib:get-value-func"),
        opt("c:type"),
        opt("c:symbol-prefix"),
        opt("abstract"),
        opt("glib:fundamental"),
    ],
);

const INTERFACE: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("glib:type-name"),
        opt("glib:get-type"),
        opt("c:symbol-prefix"),
        opt("c:type"),
        opt("glib:type-struct"),
    ],
);

const RECORD: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("c:type"),
        opt("disguised"),
        opt("glib:type-name"),
        opt("glib:get-type"),
        opt("c:symbol-prefix"),
        opt("foreign"),
        opt("glib:is-gtype-struct-for"),
    ],
);

const UNION: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("c:type"),
        opt("c:symbol-prefix"),
        opt("glib:get-type"),
        opt("glib:type-name"),
    ],
);

const ENUMERATION: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("c:type"),
        opt("glib:type-name"),
        opt("glib:get-type"),
        opt("glib:error-domain"),
    ],
);

const CALLBACK: &[AttrSpec] = table!(
    [opt("name"), opt("c:type"), opt("throws")],
    common!(),
);

const FUNCTION: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("c:identifier"),
        opt("shadowed-by"),
        opt("shadows"),
        opt("throws"),
        opt("moved-to"),
    ],
);

const VIRTUAL_METHOD: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("c:identifier"),
        opt("shadowed-by"),
        opt("shadows"),
        opt("throws"),
        opt("moved-to"),
        opt("invoker"),
    ],
);

const SIGNAL: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("detailed"),
        opt("when"),
        opt("action"),
        opt("no-hooks"),
        opt("no-recurse"),
    ],
);

const PROPERTY: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [
        opt("writable"),
        opt("readable"),
        opt("construct"),
        opt("construct-only"),
        opt("transfer-ownership"),
    ],
);

const FIELD: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [opt("writable"), opt("readable"), opt("private"), opt("bits")],
);

const CONSTANT: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [opt("value"), opt("c:type"), opt("c:identifier")],
);

const MEMBER: &[AttrSpec] = table!(
    [opt("name")],
    common!(),
    [opt("value"), opt("c:identifier"), opt("glib:nick")],
);

const BOXED: &[AttrSpec] = table!(
    [opt("glib:name")],
    common!(),
    [
        opt("c:symbol-prefix"),
        opt("glib:type-name"),
        opt("glib:get-type"),
    ],
);

const ANNOTATION: &[AttrSpec] = &[opt("key"), opt("value")];

const PARAMETER: &[AttrSpec] = &[
    opt("name"),
    opt("nullable"),
    opt("allow-none"),
    opt("introspectable"),
    opt("closure"),
    opt("destroy"),
    opt("scope"),
    opt("direction"),
    opt("caller-allocates"),
    opt("optional"),
    opt("skip"),
    opt("transfer-ownership"),
];

const INSTANCE_PARAMETER: &[AttrSpec] = &[
    opt("name"),
    opt("nullable"),
    opt("allow-none"),
    opt("direction"),
    opt("caller-allocates"),
    opt("transfer-ownership"),
];

const RETURN_VALUE: &[AttrSpec] = &[
    opt("introspectable"),
    opt("nullable"),
    opt("closure"),
    opt("scope"),
    opt("destroy"),
    opt("skip"),
    opt("allow-none"),
    opt("transfer-ownership"),
];

const TYPE: &[AttrSpec] = &[opt("name"), opt("c:type"), opt("introspectable")];

const ARRAY: &[AttrSpec] = &[
    opt("name"),
    opt("zero-terminated"),
    opt("fixed-size"),
    opt("introspectable"),
    opt("length"),
    opt("c:type"),
];

const DOC: &[AttrSpec] = &[opt("xml:space"), opt("xml:whitespace")];

/// Schema table for a kind
pub fn for_kind(kind: NodeKind) -> &'static [AttrSpec] {
    use NodeKind::*;
    match kind {
        Repository => REPOSITORY,
        Include => INCLUDE,
        CInclude | Package | Implements | Prerequisite => NAME_ONLY,
        Namespace => NAMESPACE,
        Alias => ALIAS,
        Class => CLASS,
        Interface => INTERFACE,
        Record => RECORD,
        Union => UNION,
        Enumeration | Bitfield => ENUMERATION,
        Callback => CALLBACK,
        Function | Method | Constructor => FUNCTION,
        VirtualMethod => VIRTUAL_METHOD,
        Signal => SIGNAL,
        Property => PROPERTY,
        Field => FIELD,
        Constant => CONSTANT,
        Member => MEMBER,
        Annotation => ANNOTATION,
        Boxed => BOXED,
        Parameters | Varargs => &[],
        Parameter => PARAMETER,
        InstanceParameter => INSTANCE_PARAMETER,
        ReturnValue => RETURN_VALUE,
        Type => TYPE,
        Array => ARRAY,
        Doc | DocVersion | DocStability | DocDeprecated => DOC,
    }
}

/// Slot of a named attribute in a schema
pub fn slot_of(specs: &[AttrSpec], name: &str) -> Option<usize> {
    specs.iter().position(|spec| spec.name == name)
}

/// Bind an element's attributes to the slots of its schema
///
/// Attributes outside the schema are ignored. Values are interned into
/// `pool`; absent optional attributes stay `None`.
pub fn collect_attributes(
    element: &'static str,
    specs: &'static [AttrSpec],
    attrs: &[Attribute<'_>],
    pool: &mut StringPool,
) -> Result<Box<[Option<Sym>]>, ParseError> {
    let mut slots = vec![None; specs.len()].into_boxed_slice();

    for (slot, spec) in slots.iter_mut().zip(specs) {
        let found = attrs.iter().find(|a| a.name == spec.name.as_bytes());
        match found {
            Some(attr) => {
                let value = String::from_utf8_lossy(&attr.value);
                *slot = Some(pool.intern_str(&value));
            }
            None if spec.presence == Presence::Required => {
                return Err(ParseError::MissingAttribute {
                    element,
                    attribute: spec.name,
                });
            }
            None => {}
        }
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn attr<'a>(name: &'a str, value: &'a str) -> Attribute<'a> {
        Attribute::new(name.as_bytes(), Cow::Borrowed(value.as_bytes()))
    }

    #[test]
    fn test_common_expansion() {
        let names: Vec<_> = ALIAS.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "name",
                "c:type",
                "introspectable",
                "deprecated",
                "deprecated-version",
                "version",
                "stability"
            ]
        );
        assert_eq!(CLASS.len(), 1 + 5 + 12);
        assert_eq!(VIRTUAL_METHOD.last().map(|s| s.name), Some("invoker"));
    }

    #[test]
    fn test_required_attributes() {
        let required: Vec<_> = NodeKind::ALL
            .iter()
            .filter(|k| k.schema().iter().any(|s| s.presence == Presence::Required))
            .copied()
            .collect();
        assert_eq!(required, [NodeKind::Namespace, NodeKind::Class]);
    }

    #[test]
    fn test_schema_names_unique() {
        for kind in NodeKind::ALL {
            let specs = kind.schema();
            for (i, spec) in specs.iter().enumerate() {
                assert_eq!(slot_of(specs, spec.name), Some(i), "{} in {}", spec.name, kind);
            }
        }
    }

    #[test]
    fn test_collect_in_schema_order() {
        let mut pool = StringPool::new();
        let attrs = [attr("c:type", "GtkWidget"), attr("bogus", "x"), attr("name", "Widget")];
        let slots = collect_attributes("class", CLASS, &attrs, &mut pool).unwrap();

        assert_eq!(slots.len(), CLASS.len());
        assert_eq!(slots[0].map(|s| pool.resolve(s)), Some("Widget"));
        let c_type = slot_of(CLASS, "c:type").unwrap();
        assert_eq!(slots[c_type].map(|s| pool.resolve(s)), Some("GtkWidget"));
        assert_eq!(slots.iter().filter(|s| s.is_some()).count(), 2);
        assert_eq!(pool.get("x"), None);
    }

    #[test]
    fn test_missing_required() {
        let mut pool = StringPool::new();
        let err = collect_attributes("namespace", NAMESPACE, &[attr("version", "1.0")], &mut pool)
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingAttribute {
                element: "namespace",
                attribute: "name"
            }
        );
    }

    #[test]
    fn test_empty_schema() {
        let mut pool = StringPool::new();
        let slots = collect_attributes("parameters", &[], &[attr("x", "y")], &mut pool).unwrap();
        assert!(slots.is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_empty_value_is_present() {
        let mut pool = StringPool::new();
        let slots = collect_attributes("type", TYPE, &[attr("c:type", "")], &mut pool).unwrap();
        assert_eq!(slots[1].map(|s| pool.resolve(s)), Some(""));
        assert_eq!(slots[0], None);
    }
}
