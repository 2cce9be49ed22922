//! GIR node kinds
//!
//! The element vocabulary is closed: every kind knows its tag, its
//! attribute schema, which child tags it accepts and how many of each.

use super::schema::{self, AttrSpec};

/// One of the element kinds a GIR tree is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Repository,
    Include,
    CInclude,
    Package,
    Namespace,
    Alias,
    Class,
    Interface,
    Record,
    Union,
    Enumeration,
    Bitfield,
    Callback,
    Function,
    Method,
    Constructor,
    VirtualMethod,
    Signal,
    Property,
    Field,
    Constant,
    Member,
    Annotation,
    Implements,
    Prerequisite,
    Boxed,
    Parameters,
    Parameter,
    InstanceParameter,
    ReturnValue,
    Type,
    Array,
    Varargs,
    Doc,
    DocVersion,
    DocStability,
    DocDeprecated,
}

/// Children that may appear at most once under a given parent.
/// A later element of the same slot replaces the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Include,
    CInclude,
    Package,
    Namespace,
    Parameters,
    ReturnValue,
    /// Shared by `type`, `array` and `varargs`
    TypeRef,
}

use NodeKind::*;

const DOCS: [NodeKind; 4] = [Doc, DocVersion, DocStability, DocDeprecated];

const REPOSITORY_CHILDREN: &[NodeKind] = &[Include, CInclude, Package, Namespace];

const NAMESPACE_CHILDREN: &[NodeKind] = &[
    Alias, Class, Interface, Record, Union, Enumeration, Bitfield, Callback, Function, Constant,
    Boxed, Annotation, Doc, DocVersion, DocStability, DocDeprecated,
];

const CLASS_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Implements, Constructor, Method,
    Function, VirtualMethod, Field, Property, Signal, Union, Constant, Record, Callback,
];

const INTERFACE_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Prerequisite, Implements, Function,
    Constructor, Method, VirtualMethod, Field, Property, Signal, Callback, Constant,
];

const RECORD_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Field, Function, Union, Method,
    Constructor, Property,
];

const UNION_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Field, Constructor, Method, Function,
    Record,
];

const ENUMERATION_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Member, Function,
];

const CALLABLE_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Parameters, ReturnValue,
];

const PARAMETERS_CHILDREN: &[NodeKind] = &[Parameter, InstanceParameter];

const PARAMETER_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Type, Array, Varargs,
];

const INSTANCE_PARAMETER_CHILDREN: &[NodeKind] = &[Doc, DocVersion, DocStability, DocDeprecated, Type];

const TYPED_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Type, Array,
];

const FIELD_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Callback, Type, Array,
];

const ALIAS_CHILDREN: &[NodeKind] = &[Doc, DocVersion, DocStability, DocDeprecated, Type];

const MEMBER_CHILDREN: &[NodeKind] = &[Doc, DocVersion, DocStability, DocDeprecated, Annotation];

const BOXED_CHILDREN: &[NodeKind] = &[
    Doc, DocVersion, DocStability, DocDeprecated, Annotation, Function,
];

impl NodeKind {
    /// Every kind, in declaration order
    pub const ALL: [NodeKind; 37] = [
        Repository, Include, CInclude, Package, Namespace, Alias, Class, Interface, Record, Union,
        Enumeration, Bitfield, Callback, Function, Method, Constructor, VirtualMethod, Signal,
        Property, Field, Constant, Member, Annotation, Implements, Prerequisite, Boxed, Parameters,
        Parameter, InstanceParameter, ReturnValue, Type, Array, Varargs, Doc, DocVersion,
        DocStability, DocDeprecated,
    ];

    /// Element name as written in GIR documents
    pub fn tag(self) -> &'static str {
        match self {
            Repository => "repository",
            Include => "include",
            CInclude => "c:include",
            Package => "package",
            Namespace => "namespace",
            Alias => "alias",
            Class => "class",
            Interface => "interface",
            Record => "record",
            Union => "union",
            Enumeration => "enumeration",
            Bitfield => "bitfield",
            Callback => "callback",
            Function => "function",
            Method => "method",
            Constructor => "constructor",
            VirtualMethod => "virtual-method",
            Signal => "glib:signal",
            Property => "property",
            Field => "field",
            Constant => "constant",
            Member => "member",
            Annotation => "annotation",
            Implements => "implements",
            Prerequisite => "prerequisite",
            Boxed => "glib:boxed",
            Parameters => "parameters",
            Parameter => "parameter",
            InstanceParameter => "instance-parameter",
            ReturnValue => "return-value",
            Type => "type",
            Array => "array",
            Varargs => "varargs",
            Doc => "doc",
            DocVersion => "doc-version",
            DocStability => "doc-stability",
            DocDeprecated => "doc-deprecated",
        }
    }

    /// Kind for an element name, regardless of where it appears
    pub fn from_tag(tag: &[u8]) -> Option<NodeKind> {
        let kind = match tag {
            b"repository" => Repository,
            b"include" => Include,
            b"c:include" => CInclude,
            b"package" => Package,
            b"namespace" => Namespace,
            b"alias" => Alias,
            b"class" => Class,
            b"interface" => Interface,
            b"record" => Record,
            b"union" => Union,
            b"enumeration" => Enumeration,
            b"bitfield" => Bitfield,
            b"callback" => Callback,
            b"function" => Function,
            b"method" => Method,
            b"constructor" => Constructor,
            b"virtual-method" => VirtualMethod,
            b"glib:signal" => Signal,
            b"property" => Property,
            b"field" => Field,
            b"constant" => Constant,
            b"member" => Member,
            b"annotation" => Annotation,
            b"implements" => Implements,
            b"prerequisite" => Prerequisite,
            b"glib:boxed" => Boxed,
            b"parameters" => Parameters,
            b"parameter" => Parameter,
            b"instance-parameter" => InstanceParameter,
            b"return-value" => ReturnValue,
            b"type" => Type,
            b"array" => Array,
            b"varargs" => Varargs,
            b"doc" => Doc,
            b"doc-version" => DocVersion,
            b"doc-stability" => DocStability,
            b"doc-deprecated" => DocDeprecated,
            _ => return None,
        };
        Some(kind)
    }

    /// Ordered attribute schema; also the serialization order
    pub fn schema(self) -> &'static [AttrSpec] {
        schema::for_kind(self)
    }

    /// Kinds accepted as direct children
    pub fn children(self) -> &'static [NodeKind] {
        match self {
            Repository => REPOSITORY_CHILDREN,
            Namespace => NAMESPACE_CHILDREN,
            Class => CLASS_CHILDREN,
            Interface => INTERFACE_CHILDREN,
            Record => RECORD_CHILDREN,
            Union => UNION_CHILDREN,
            Enumeration | Bitfield => ENUMERATION_CHILDREN,
            Function | Method | Constructor | VirtualMethod | Signal | Callback => CALLABLE_CHILDREN,
            Parameters => PARAMETERS_CHILDREN,
            Parameter => PARAMETER_CHILDREN,
            InstanceParameter => INSTANCE_PARAMETER_CHILDREN,
            ReturnValue | Property | Constant | Type | Array => TYPED_CHILDREN,
            Field => FIELD_CHILDREN,
            Alias => ALIAS_CHILDREN,
            Member => MEMBER_CHILDREN,
            Boxed => BOXED_CHILDREN,
            Include | CInclude | Package | Annotation | Implements | Prerequisite | Varargs
            | Doc | DocVersion | DocStability | DocDeprecated => &[],
        }
    }

    /// Dispatch a child element name; `None` means the element is skipped
    pub fn child_kind(self, tag: &[u8]) -> Option<NodeKind> {
        let kind = NodeKind::from_tag(tag)?;
        self.children().contains(&kind).then_some(kind)
    }

    /// Arity slot of `child` under this kind, if it may appear only once
    pub fn slot(self, child: NodeKind) -> Option<Slot> {
        match (self, child) {
            (Repository, Include) => Some(Slot::Include),
            (Repository, CInclude) => Some(Slot::CInclude),
            (Repository, Package) => Some(Slot::Package),
            (Repository, Namespace) => Some(Slot::Namespace),
            (parent, Parameters) if parent.is_callable() => Some(Slot::Parameters),
            (parent, ReturnValue) if parent.is_callable() => Some(Slot::ReturnValue),
            // nested types under `type` are generic arguments
            (Type, _) => None,
            (
                Parameter | InstanceParameter | ReturnValue | Property | Constant | Field | Alias
                | Array,
                child,
            ) if child.is_type_ref() => Some(Slot::TypeRef),
            _ => None,
        }
    }

    /// Documentation elements carry character data instead of children
    pub fn is_doc(self) -> bool {
        DOCS.contains(&self)
    }

    /// `type`, `array` or `varargs`
    pub fn is_type_ref(self) -> bool {
        matches!(self, Type | Array | Varargs)
    }

    /// Kinds with a parameter list and a return value
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            Function | Method | Constructor | VirtualMethod | Signal | Callback
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
