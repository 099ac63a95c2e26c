//! Type graph providers.
//!
//! The walker never parses source text. It asks a [`TypeGraphProvider`] for
//! a tagged [`Syntax`] view of each node, for the declaration a reference
//! resolves to, and for a handful of structural facts (optionality, docs,
//! heritage, type parameters).
//!
//! # Providers
//!
//! - `typescript`: tree-sitter backed provider for `.ts`/`.d.ts` sources
//! - `fake` (tests only): in-memory graph assembled by hand

#[cfg(feature = "tree-sitter")]
pub mod typescript;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

use crate::model::Primitive;

#[cfg(feature = "tree-sitter")]
pub use typescript::{ParsedSource, SourceSet, TypeScriptGraph};

/// Structural view of a syntax node, one variant per handled kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax<N> {
    Namespace { name: String, members: Vec<N> },
    Interface { name: String, members: Vec<N> },
    Enum { name: String, members: Vec<EnumMember> },
    Alias { name: String, value: Option<N> },
    Class { name: String },
    /// Function declaration or signature.
    Function,
    Property { name: String, value: Option<N> },
    /// Method signature inside an interface.
    Method { name: String },
    Primitive(Primitive),
    /// Literal type, carrying its exact source text.
    Literal(String),
    Array { element: N },
    Union { members: Vec<N> },
    /// Named type reference. `type_arguments` holds the argument source
    /// text; `arguments` the argument nodes themselves.
    Reference {
        name: String,
        type_arguments: Vec<String>,
        arguments: Vec<N>,
    },
    FunctionType,
    /// Object literal type. `text` is its exact source; `members` are its
    /// signatures.
    ObjectType { text: String, members: Vec<N> },
    /// Anything else. The walker descends into `children` without
    /// creating nodes of its own.
    Opaque { children: Vec<N> },
}

impl<N> Syntax<N> {
    /// Name of a named declaration.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Syntax::Namespace { name, .. }
            | Syntax::Interface { name, .. }
            | Syntax::Enum { name, .. }
            | Syntax::Alias { name, .. }
            | Syntax::Class { name } => Some(name),
            _ => None,
        }
    }
}

/// A single enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    /// Initializer text, verbatim.
    pub value: Option<String>,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}

/// Classification of the declaration a reference resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Namespace,
    Interface,
    Enum,
    Alias,
    Class,
    FunctionType,
    TypeParameter,
    Other,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Namespace => "namespace",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Alias => "alias",
            DeclarationKind::Class => "class",
            DeclarationKind::FunctionType => "function type",
            DeclarationKind::TypeParameter => "type parameter",
            DeclarationKind::Other => "other",
        }
    }

    /// Declarations that are never expanded and collapse to `any`.
    pub fn is_opaque(&self) -> bool {
        matches!(self, DeclarationKind::Class | DeclarationKind::FunctionType)
    }

    /// Declarations the walker can expand into definitions.
    pub fn is_expandable(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Interface | DeclarationKind::Enum | DeclarationKind::Alias
        )
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source of declaration structure and symbol resolution.
///
/// Implementations own (or borrow) a parsed declaration tree. Node handles
/// are cheap copies; `identity` must be stable for the provider's lifetime.
pub trait TypeGraphProvider {
    type Node: Copy + fmt::Debug;

    /// Stable identity of a node, used for the visited set.
    fn identity(&self, node: Self::Node) -> usize;

    /// Top-level nodes of the source, in source order.
    fn top_level(&self) -> Vec<Self::Node>;

    /// Tagged structural view of a node.
    fn syntax(&self, node: Self::Node) -> Syntax<Self::Node>;

    /// Declaring node of a named type reference.
    fn resolve(&self, reference: Self::Node) -> Option<Self::Node>;

    /// Classify a declaration returned by `resolve`.
    fn declaration_kind(&self, declaration: Self::Node) -> DeclarationKind;

    /// Whether a property or method signature is optional.
    fn is_optional(&self, property: Self::Node) -> bool;

    /// First documentation comment attached to a declaration, cleaned of
    /// comment delimiters.
    fn doc_comment(&self, declaration: Self::Node) -> Option<String>;

    /// Heritage (base type) expressions of an interface, as reference nodes.
    fn heritage(&self, declaration: Self::Node) -> Vec<Self::Node>;

    /// Type parameter names of a declaration.
    fn type_parameters(&self, declaration: Self::Node) -> Vec<String>;
}

/// Strip `/** */` delimiters and leading `*` gutters from a doc comment.
///
/// Returns `None` for comments that are not doc comments or carry no text.
pub fn clean_doc_comment(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let body = raw.strip_prefix("/**")?.strip_suffix("*/")?;

    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty())?;
    let end = lines.iter().rposition(|l| !l.is_empty())?;
    Some(lines[start..=end].join("\n"))
}
