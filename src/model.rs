//! Extracted-node forest produced by the walker and consumed by the renderer.

use std::fmt;

use indexmap::IndexMap;

/// Index of a node inside a [`Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Keyword types that need no further resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Any,
    Undefined,
    Null,
    Void,
    Unknown,
    Never,
    Object,
    Symbol,
    Bigint,
}

/// Keyword text to primitive lookup.
static KEYWORDS: phf::Map<&'static str, Primitive> = phf::phf_map! {
    "string" => Primitive::String,
    "number" => Primitive::Number,
    "boolean" => Primitive::Boolean,
    "any" => Primitive::Any,
    "undefined" => Primitive::Undefined,
    "null" => Primitive::Null,
    "void" => Primitive::Void,
    "unknown" => Primitive::Unknown,
    "never" => Primitive::Never,
    "object" => Primitive::Object,
    "symbol" => Primitive::Symbol,
    "bigint" => Primitive::Bigint,
};

impl Primitive {
    /// Look up a primitive by its keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        KEYWORDS.get(keyword.trim()).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Any => "any",
            Primitive::Undefined => "undefined",
            Primitive::Null => "null",
            Primitive::Void => "void",
            Primitive::Unknown => "unknown",
            Primitive::Never => "never",
            Primitive::Object => "object",
            Primitive::Symbol => "symbol",
            Primitive::Bigint => "bigint",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of an extracted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Interface,
    Namespace,
    Enum,
    /// A single enum value, optionally carrying its initializer text.
    EnumMember,
    Alias,
    Property,
    Array,
    Union,
    /// Anonymous type slot, used for union branches.
    Slot,
    Primitive(Primitive),
    /// Literal type; the node name holds the exact source text.
    Literal,
    /// Reference to a named type, with type arguments in `generics`.
    Reference,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Interface => "interface",
            NodeKind::Namespace => "namespace",
            NodeKind::Enum => "enum",
            NodeKind::EnumMember => "enum-member",
            NodeKind::Alias => "alias",
            NodeKind::Property => "property",
            NodeKind::Array => "array",
            NodeKind::Union => "union",
            NodeKind::Slot => "slot",
            NodeKind::Primitive(p) => p.as_str(),
            NodeKind::Literal => "literal",
            NodeKind::Reference => "reference",
        }
    }

    /// Whether nodes of this kind are top-level definitions.
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            NodeKind::Interface | NodeKind::Enum | NodeKind::Alias | NodeKind::Namespace
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node of the output forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNode {
    pub name: Option<String>,
    pub kind: NodeKind,
    /// Resolved type of a property, alias, array element or union branch.
    pub type_ref: Option<NodeId>,
    /// Ordered children: interface members, enum values, union branches,
    /// namespace definitions.
    pub members: Vec<NodeId>,
    /// Base type names, interfaces only.
    pub bases: Vec<String>,
    /// Type parameters of a declaration or type arguments of a reference.
    pub generics: Vec<String>,
    pub optional: bool,
    pub doc_comment: Option<String>,
    /// Initializer text of an enum member.
    pub literal_value: Option<String>,
}

impl ExtractedNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            type_ref: None,
            members: Vec::new(),
            bases: Vec::new(),
            generics: Vec::new(),
            optional: false,
            doc_comment: None,
            literal_value: None,
        }
    }

    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(kind)
        }
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Whether the root declaration was a namespace or something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Namespace,
    Interface,
}

impl RootKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootKind::Namespace => "namespace",
            RootKind::Interface => "interface",
        }
    }
}

/// The entry point that was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub name: String,
    pub kind: RootKind,
    /// The namespace node for a namespace root. Interface roots are
    /// looked up through the registry.
    pub namespace: Option<NodeId>,
}

/// Arena of extracted nodes plus the name-keyed definition registry.
///
/// Registry order is insertion order, which is the order definitions are
/// rendered in.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<ExtractedNode>,
    registry: IndexMap<String, NodeId>,
    root: Option<Root>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the arena.
    pub fn alloc(&mut self, node: ExtractedNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &ExtractedNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ExtractedNode {
        &mut self.nodes[id.0]
    }

    /// Register a definition under `name`.
    ///
    /// Returns false and leaves the registry untouched if the name is
    /// already taken: the first definition wins.
    pub fn register(&mut self, name: &str, id: NodeId) -> bool {
        debug_assert!(self.node(id).kind.is_definition(), "registering a non-definition");
        if self.registry.contains_key(name) {
            return false;
        }
        self.registry.insert(name.to_string(), id);
        true
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<&ExtractedNode> {
        self.registry.get(name).map(|id| self.node(*id))
    }

    /// Registered definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.registry.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn definition_count(&self) -> usize {
        self.registry.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<&Root> {
        self.root.as_ref()
    }

    pub fn set_root(&mut self, root: Root) {
        self.root = Some(root);
    }

    /// The root namespace node, if the root is a namespace.
    pub fn root_namespace(&self) -> Option<NodeId> {
        self.root.as_ref().and_then(|r| r.namespace)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_keywords() {
        assert_eq!(Primitive::from_keyword("string"), Some(Primitive::String));
        assert_eq!(Primitive::from_keyword(" boolean "), Some(Primitive::Boolean));
        assert_eq!(Primitive::from_keyword("String"), None);
        assert_eq!(Primitive::Undefined.as_str(), "undefined");
    }

    #[test]
    fn test_register_first_definition_wins() {
        let mut forest = Forest::new();
        let first = forest.alloc(ExtractedNode::named(NodeKind::Interface, "A"));
        let second = forest.alloc(ExtractedNode::named(NodeKind::Enum, "A"));

        assert!(forest.register("A", first));
        assert!(!forest.register("A", second));
        assert_eq!(forest.definition_count(), 1);
        assert_eq!(forest.lookup("A").map(|n| n.kind), Some(NodeKind::Interface));
        assert_eq!(forest.node_count(), 2);
    }

    #[test]
    fn test_definitions_keep_insertion_order() {
        let mut forest = Forest::new();
        for name in ["Zeta", "Alpha", "Mid"] {
            let id = forest.alloc(ExtractedNode::named(NodeKind::Alias, name));
            forest.register(name, id);
        }
        let names: Vec<&str> = forest.definitions().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_empty_forest_has_no_root() {
        let forest = Forest::new();
        assert!(forest.is_empty());
        assert!(forest.root_namespace().is_none());
    }
}
