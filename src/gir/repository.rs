//! Finished GIR trees
//!
//! A `Repository` owns the node arena and the string pool the parse
//! interned into. It is read-only: collaborators walk it through `NodeRef`
//! views, which resolve attributes and filter children by kind.

use super::ident::generate_id;
use super::kind::NodeKind;
use super::node::{Node, NodeId, ROOT};
use super::serialize::serialize_node;
use super::strings::StringPool;

/// Root aggregate of one parsed GIR document
#[derive(Debug)]
pub struct Repository {
    nodes: Vec<Node>,
    pool: StringPool,
}

impl Repository {
    /// `nodes[0]` must be the repository node
    pub(crate) fn from_parts(nodes: Vec<Node>, pool: StringPool) -> Self {
        debug_assert!(nodes.first().map(|n| n.kind) == Some(NodeKind::Repository));
        Repository { nodes, pool }
    }

    /// The `repository` node
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { repo: self, id: ROOT }
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes
            .get(id as usize)
            .map(|_| NodeRef { repo: self, id })
    }

    pub fn namespace(&self) -> Option<NodeRef<'_>> {
        self.root().first_child(NodeKind::Namespace)
    }

    pub fn include(&self) -> Option<NodeRef<'_>> {
        self.root().first_child(NodeKind::Include)
    }

    pub fn c_include(&self) -> Option<NodeRef<'_>> {
        self.root().first_child(NodeKind::CInclude)
    }

    pub fn package(&self) -> Option<NodeRef<'_>> {
        self.root().first_child(NodeKind::Package)
    }

    /// `version` attribute of the repository element
    pub fn version(&self) -> Option<&str> {
        self.root().attr("version")
    }

    /// Pre-order walk over the reachable tree, root included
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            repo: self,
            stack: vec![ROOT],
        }
    }

    /// Number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn strings(&self) -> &StringPool {
        &self.pool
    }

    /// Whole document as GIR XML
    pub fn serialize(&self) -> String {
        self.root().serialize(0)
    }

    fn raw(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }
}

/// Read-only view of one node
#[derive(Clone, Copy)]
pub struct NodeRef<'r> {
    repo: &'r Repository,
    id: NodeId,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.repo, other.repo) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// The single type reference of a parameter, return value, field, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef<'r> {
    Type(NodeRef<'r>),
    Array(NodeRef<'r>),
    Varargs(NodeRef<'r>),
}

impl<'r> TypeRef<'r> {
    fn from_node(node: NodeRef<'r>) -> Option<Self> {
        match node.kind() {
            NodeKind::Type => Some(TypeRef::Type(node)),
            NodeKind::Array => Some(TypeRef::Array(node)),
            NodeKind::Varargs => Some(TypeRef::Varargs(node)),
            _ => None,
        }
    }

    pub fn node(self) -> NodeRef<'r> {
        match self {
            TypeRef::Type(n) | TypeRef::Array(n) | TypeRef::Varargs(n) => n,
        }
    }

    /// Type name; `None` for varargs and anonymous arrays
    pub fn name(self) -> Option<&'r str> {
        match self {
            TypeRef::Varargs(_) => None,
            TypeRef::Type(n) | TypeRef::Array(n) => n.name(),
        }
    }

    pub fn c_type(self) -> Option<&'r str> {
        match self {
            TypeRef::Varargs(_) => None,
            TypeRef::Type(n) | TypeRef::Array(n) => n.attr("c:type"),
        }
    }

    /// Element type of an array, or the first generic argument of a type
    pub fn element(self) -> Option<TypeRef<'r>> {
        match self {
            TypeRef::Varargs(_) => None,
            TypeRef::Type(n) | TypeRef::Array(n) => n.children().find_map(TypeRef::from_node),
        }
    }
}

macro_rules! typed_children {
    ($($(#[$meta:meta])* $method:ident => $kind:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $method(self) -> impl Iterator<Item = NodeRef<'r>> + 'r {
                self.children_of(NodeKind::$kind)
            }
        )+
    };
}

impl<'r> NodeRef<'r> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn kind(self) -> NodeKind {
        self.raw().kind
    }

    pub fn tag(self) -> &'static str {
        self.kind().tag()
    }

    pub fn repository(self) -> &'r Repository {
        self.repo
    }

    pub fn parent(self) -> Option<NodeRef<'r>> {
        self.raw().parent.map(|id| NodeRef { repo: self.repo, id })
    }

    /// Parents up to the repository, nearest first
    pub fn ancestors(self) -> impl Iterator<Item = NodeRef<'r>> + 'r {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// Nearest enclosing namespace
    pub fn namespace(self) -> Option<NodeRef<'r>> {
        self.ancestors().find(|n| n.kind() == NodeKind::Namespace)
    }

    /// Children in document order
    pub fn children(self) -> impl Iterator<Item = NodeRef<'r>> + 'r {
        let repo = self.repo;
        self.raw()
            .children
            .iter()
            .map(move |&id| NodeRef { repo, id })
    }

    /// Children of one kind, in document order
    pub fn children_of(self, kind: NodeKind) -> impl Iterator<Item = NodeRef<'r>> + 'r {
        self.children().filter(move |n| n.kind() == kind)
    }

    pub fn first_child(self, kind: NodeKind) -> Option<NodeRef<'r>> {
        self.children_of(kind).next()
    }

    pub fn has_children(self) -> bool {
        !self.raw().children.is_empty()
    }

    /// Value of a schema attribute by qualified name
    pub fn attr(self, name: &str) -> Option<&'r str> {
        let sym = self.raw().attr(name)?;
        Some(self.repo.pool.resolve(sym))
    }

    /// Present attributes in schema order
    pub fn attrs(self) -> impl Iterator<Item = (&'static str, &'r str)> + 'r {
        let pool = &self.repo.pool;
        self.kind()
            .schema()
            .iter()
            .zip(self.raw().attrs.iter())
            .filter_map(move |(spec, value)| value.map(|sym| (spec.name, pool.resolve(sym))))
    }

    /// `name`, or `glib:name` for boxed types
    pub fn name(self) -> Option<&'r str> {
        match self.kind() {
            NodeKind::Boxed => self.attr("glib:name"),
            _ => self.attr("name"),
        }
    }

    pub fn version(self) -> Option<&'r str> {
        self.attr("version")
    }

    pub fn c_type(self) -> Option<&'r str> {
        self.attr("c:type")
    }

    pub fn c_identifier(self) -> Option<&'r str> {
        self.attr("c:identifier")
    }

    /// Character data of a doc-family node
    pub fn text(self) -> Option<&'r str> {
        self.raw().text.as_deref()
    }

    /// Text of the `doc` child
    pub fn doc(self) -> Option<&'r str> {
        self.first_child(NodeKind::Doc).and_then(|d| d.text())
    }

    typed_children! {
        aliases => Alias,
        classes => Class,
        interfaces => Interface,
        records => Record,
        unions => Union,
        enumerations => Enumeration,
        bitfields => Bitfield,
        callbacks => Callback,
        functions => Function,
        constants => Constant,
        /// `glib:boxed` children
        boxeds => Boxed,
        methods => Method,
        constructors => Constructor,
        virtual_methods => VirtualMethod,
        /// `glib:signal` children
        signals => Signal,
        properties => Property,
        fields => Field,
        members => Member,
        annotations => Annotation,
        implements => Implements,
        prerequisites => Prerequisite,
    }

    /// The `parameters` grouping node of a callable
    pub fn parameter_list(self) -> Option<NodeRef<'r>> {
        self.first_child(NodeKind::Parameters)
    }

    /// Regular parameters, read through the grouping node
    pub fn parameters(self) -> impl Iterator<Item = NodeRef<'r>> + 'r {
        self.parameter_list()
            .into_iter()
            .flat_map(|list| list.children_of(NodeKind::Parameter))
    }

    pub fn instance_parameter(self) -> Option<NodeRef<'r>> {
        self.parameter_list()?
            .first_child(NodeKind::InstanceParameter)
    }

    pub fn return_value(self) -> Option<NodeRef<'r>> {
        self.first_child(NodeKind::ReturnValue)
    }

    /// The type, array or varargs child
    pub fn type_ref(self) -> Option<TypeRef<'r>> {
        self.children().find_map(TypeRef::from_node)
    }

    /// Write this subtree as GIR XML, indented by `depth` levels
    pub fn serialize(self, depth: usize) -> String {
        let mut out = String::new();
        serialize_node(self, depth, &mut out);
        out
    }

    /// Stable search identifier (see `gir::ident`)
    pub fn generate_id(self) -> String {
        generate_id(self)
    }

    fn raw(self) -> &'r Node {
        self.repo.raw(self.id)
    }
}

/// Pre-order iterator over a repository
pub struct Descendants<'r> {
    repo: &'r Repository,
    stack: Vec<NodeId>,
}

impl<'r> Iterator for Descendants<'r> {
    type Item = NodeRef<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.repo.raw(id);
        self.stack.extend(node.children.iter().rev());
        Some(NodeRef {
            repo: self.repo,
            id,
        })
    }
}
