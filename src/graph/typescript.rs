//! TypeScript type graph backed by tree-sitter.
//!
//! A [`SourceSet`] holds the entry file plus every file reachable through
//! relative `import`/`export ... from` statements, so imported names resolve
//! across files. Bare module specifiers (packages) are not followed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use streaming_iterator::StreamingIterator;
use tracing::{debug, trace, warn};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::{clean_doc_comment, DeclarationKind, EnumMember, Syntax, TypeGraphProvider};
use crate::model::Primitive;

const DECLARATION_QUERY: &str = r#"
; Interface declarations
(interface_declaration
  name: (type_identifier) @interface_name
) @interface

; Enum declarations
(enum_declaration
  name: (identifier) @enum_name
) @enum

; Type alias declarations
(type_alias_declaration
  name: (type_identifier) @alias_name
) @alias

; Class declarations
(class_declaration
  name: (type_identifier) @class_name
) @class

(abstract_class_declaration
  name: (type_identifier) @class_name
) @class

; Function declarations and ambient signatures
(function_declaration
  name: (identifier) @function_name
) @function

(function_signature
  name: (identifier) @function_name
) @function

; Namespaces
(internal_module
  name: (identifier) @namespace_name
) @namespace
"#;

/// Tree-sitter query for module specifiers of imports and re-exports.
const IMPORT_QUERY: &str = r#"
; import { x } from './module'
(import_statement
  source: (string) @import_source
) @import

; export { x } from './module'
(export_statement
  source: (string) @reexport_source
) @reexport
"#;

/// Suffixes tried, in order, when a relative specifier names no file.
const IMPORT_SUFFIXES: &[&str] = &[".ts", ".d.ts", "/index.ts", "/index.d.ts"];

/// Statement wrappers whose children are walked in place.
const WRAPPER_KINDS: &[&str] = &[
    "program",
    "export_statement",
    "ambient_declaration",
    "expression_statement",
    "statement_block",
];

/// Wrappers that a doc comment may precede instead of the declaration.
const DOC_WRAPPER_KINDS: &[&str] = &["export_statement", "ambient_declaration", "expression_statement"];

const NAMESPACE_KINDS: &[&str] = &["internal_module", "module"];

fn language() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

/// A parsed TypeScript source and its text.
pub struct ParsedSource {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// Source text, kept for node text extraction.
    pub source: String,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedSource {
    /// Parse TypeScript source.
    ///
    /// Syntax errors do not fail the parse: tree-sitter returns a tree with
    /// ERROR nodes and extraction proceeds over whatever parsed.
    pub fn parse(path: &str, source: String) -> anyhow::Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&language())?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse {}", path))?;

        if tree.root_node().has_error() {
            warn!(path, "source contains syntax errors, extraction may be partial");
        }

        Ok(Self {
            tree,
            source,
            path: path.to_string(),
        })
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// The entry source and the sources it imports.
pub struct SourceSet {
    /// Entry source first, then imports in discovery order.
    files: Vec<ParsedSource>,
}

impl SourceSet {
    /// A set holding only `root`.
    pub fn single(root: ParsedSource) -> Self {
        Self { files: vec![root] }
    }

    /// `root` plus every source reachable through relative imports,
    /// resolved against the importing file's directory.
    ///
    /// Imports that cannot be loaded are skipped with a warning; their names
    /// then resolve to nothing and collapse to `any`.
    pub fn with_imports(root: ParsedSource) -> anyhow::Result<Self> {
        let language = language();
        let query = Query::new(&language, IMPORT_QUERY)?;

        let mut seen = HashSet::new();
        seen.insert(canonical(Path::new(&root.path)));
        let mut files = vec![root];

        let mut next = 0;
        while next < files.len() {
            let dir = Path::new(&files[next].path)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            for specifier in import_specifiers(&query, &files[next]) {
                if !is_relative(&specifier) {
                    trace!(specifier = %specifier, "not following package import");
                    continue;
                }
                let Some(path) = resolve_import(&dir, &specifier) else {
                    warn!(
                        from = %files[next].path,
                        specifier = %specifier,
                        "imported file not found"
                    );
                    continue;
                };
                if !seen.insert(canonical(&path)) {
                    continue;
                }

                let display_path = path.to_string_lossy().to_string();
                match std::fs::read_to_string(&path) {
                    Ok(source) => match ParsedSource::parse(&display_path, source) {
                        Ok(parsed) => {
                            debug!(path = %display_path, "following import");
                            files.push(parsed);
                        }
                        Err(e) => warn!(path = %display_path, error = %e, "skipping unparsable import"),
                    },
                    Err(e) => warn!(path = %display_path, error = %e, "skipping unreadable import"),
                }
            }
            next += 1;
        }

        Ok(Self { files })
    }

    /// The entry source.
    pub fn root(&self) -> &ParsedSource {
        &self.files[0]
    }

    pub fn files(&self) -> &[ParsedSource] {
        &self.files
    }
}

/// Module specifiers of a source, in source order.
fn import_specifiers(query: &Query, parsed: &ParsedSource) -> Vec<String> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, parsed.tree.root_node(), parsed.source.as_bytes());

    let mut sources = Vec::new();
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let name = query.capture_names()[capture.index as usize];
            if matches!(name, "import_source" | "reexport_source") {
                sources.push(capture.node);
            }
        }
    }

    sources.sort_by_key(|n| n.start_byte());
    sources.dedup_by_key(|n| n.id());
    sources
        .into_iter()
        .map(|n| unquote(parsed.node_text(n)).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// File a relative specifier refers to: the path itself, then the path with
/// each of [`IMPORT_SUFFIXES`]. A `.js` specifier also tries its `.ts` twin.
fn resolve_import(dir: &Path, specifier: &str) -> Option<PathBuf> {
    let mut bases = vec![specifier];
    if let Some(stem) = specifier.strip_suffix(".js") {
        bases.push(stem);
    }

    let exact = dir.join(specifier);
    if exact.is_file() {
        return Some(exact);
    }
    bases
        .into_iter()
        .flat_map(|base| {
            IMPORT_SUFFIXES
                .iter()
                .map(move |suffix| dir.join(format!("{}{}", base, suffix)))
        })
        .find(|candidate| candidate.is_file())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Type graph over a set of parsed TypeScript sources.
pub struct TypeScriptGraph<'t> {
    sources: &'t SourceSet,
    /// Declarations by name: entry source first, each file in source order.
    declarations: HashMap<&'t str, Vec<Node<'t>>>,
}

impl<'t> TypeScriptGraph<'t> {
    pub fn new(sources: &'t SourceSet) -> anyhow::Result<Self> {
        let language = language();
        let query = Query::new(&language, DECLARATION_QUERY)?;

        let mut declarations: HashMap<&'t str, Vec<Node<'t>>> = HashMap::new();
        for parsed in sources.files() {
            for (name, mut nodes) in index_declarations(&query, parsed) {
                nodes.sort_by_key(|n| n.start_byte());
                declarations.entry(name).or_default().extend(nodes);
            }
        }
        debug!(
            path = %sources.root().path,
            files = sources.files().len(),
            names = declarations.len(),
            "indexed declarations"
        );

        Ok(Self {
            sources,
            declarations,
        })
    }

    /// The source a node belongs to.
    fn source_of(&self, node: Node<'t>) -> &'t ParsedSource {
        let files = self.sources.files();
        if files.len() == 1 {
            return &files[0];
        }
        let mut root = node;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        files
            .iter()
            .find(|f| f.tree.root_node().id() == root.id())
            .unwrap_or(&files[0])
    }

    fn text(&self, node: Node<'t>) -> &'t str {
        self.source_of(node).node_text(node)
    }

    fn field_text(&self, node: Node<'t>, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| unquote(self.text(n)).to_string())
            .unwrap_or_default()
    }

    /// Named children, skipping comments.
    fn children(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect()
    }

    fn body_children(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("body")
            .map(|body| self.children(body))
            .unwrap_or_default()
    }

    fn enum_members(&self, node: Node<'t>) -> Vec<EnumMember> {
        self.body_children(node)
            .into_iter()
            .filter_map(|member| match member.kind() {
                "enum_assignment" => Some(EnumMember::new(
                    self.field_text(member, "name"),
                    member.child_by_field_name("value").map(|v| self.text(v)),
                )),
                "property_identifier" | "string" | "number" => {
                    Some(EnumMember::new(unquote(self.text(member)), None))
                }
                _ => None,
            })
            .collect()
    }

    /// Flatten the left-nested `union_type` chain into its branches.
    fn union_members(&self, node: Node<'t>, out: &mut Vec<Node<'t>>) {
        for child in self.children(node) {
            if child.kind() == "union_type" {
                self.union_members(child, out);
            } else {
                out.push(child);
            }
        }
    }

    fn generic_syntax(&self, node: Node<'t>) -> Syntax<Node<'t>> {
        let name = self.field_text(node, "name");
        let arguments = node
            .child_by_field_name("type_arguments")
            .map(|args| self.children(args))
            .unwrap_or_default();

        if matches!(name.as_str(), "Array" | "ReadonlyArray") && arguments.len() == 1 {
            return Syntax::Array {
                element: arguments[0],
            };
        }

        Syntax::Reference {
            name,
            type_arguments: arguments.iter().map(|a| self.text(*a).to_string()).collect(),
            arguments,
        }
    }

    /// Simple name a reference node refers to.
    fn reference_name(&self, reference: Node<'t>) -> Option<&'t str> {
        let target = match reference.kind() {
            "generic_type" => reference.child_by_field_name("name")?,
            "type_identifier" | "nested_type_identifier" => reference,
            _ => return None,
        };
        match target.kind() {
            "nested_type_identifier" => target.child_by_field_name("name").map(|n| self.text(n)),
            _ => Some(self.text(target)),
        }
    }

    /// Type parameter of an enclosing declaration named `name`.
    fn find_type_parameter(&self, reference: Node<'t>, name: &str) -> Option<Node<'t>> {
        let mut current = reference.parent();
        while let Some(node) = current {
            if let Some(params) = node.child_by_field_name("type_parameters") {
                let found = self
                    .children(params)
                    .into_iter()
                    .find(|p| p.kind() == "type_parameter" && self.field_text(*p, "name") == name);
                if found.is_some() {
                    return found;
                }
            }
            current = node.parent();
        }
        None
    }

    /// Names of the namespaces enclosing `node`, outermost first.
    fn scope_path(&self, node: Node<'t>) -> Vec<&'t str> {
        let mut path = Vec::new();
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if NAMESPACE_KINDS.contains(&ancestor.kind()) {
                if let Some(name) = ancestor.child_by_field_name("name") {
                    path.push(self.text(name));
                }
            }
            current = ancestor.parent();
        }
        path.reverse();
        path
    }

    /// The node a doc comment would precede: the outermost wrapper of a
    /// declaration.
    fn doc_anchor(&self, mut node: Node<'t>) -> Node<'t> {
        while let Some(parent) = node.parent() {
            if DOC_WRAPPER_KINDS.contains(&parent.kind()) {
                node = parent;
            } else {
                break;
            }
        }
        node
    }
}

impl<'t> TypeGraphProvider for TypeScriptGraph<'t> {
    type Node = Node<'t>;

    fn identity(&self, node: Node<'t>) -> usize {
        node.id()
    }

    fn top_level(&self) -> Vec<Node<'t>> {
        self.children(self.sources.root().tree.root_node())
    }

    fn syntax(&self, node: Node<'t>) -> Syntax<Node<'t>> {
        match node.kind() {
            kind if WRAPPER_KINDS.contains(&kind) => Syntax::Opaque {
                children: self.children(node),
            },
            "internal_module" | "module" => Syntax::Namespace {
                name: self.field_text(node, "name"),
                members: self.body_children(node),
            },
            "interface_declaration" => Syntax::Interface {
                name: self.field_text(node, "name"),
                members: self.body_children(node),
            },
            "enum_declaration" => Syntax::Enum {
                name: self.field_text(node, "name"),
                members: self.enum_members(node),
            },
            "type_alias_declaration" => Syntax::Alias {
                name: self.field_text(node, "name"),
                value: node.child_by_field_name("value"),
            },
            "class_declaration" | "abstract_class_declaration" => Syntax::Class {
                name: self.field_text(node, "name"),
            },
            "function_declaration" | "function_signature" => Syntax::Function,
            "property_signature" => Syntax::Property {
                name: self.field_text(node, "name"),
                value: node
                    .child_by_field_name("type")
                    .and_then(|annotation| annotation.named_child(0)),
            },
            "method_signature" => Syntax::Method {
                name: self.field_text(node, "name"),
            },
            "predefined_type" => {
                let keyword = self.text(node);
                Syntax::Primitive(Primitive::from_keyword(keyword).unwrap_or_else(|| {
                    debug!(keyword, "unknown predefined type");
                    Primitive::Any
                }))
            }
            "literal_type" => match self.text(node).trim() {
                "null" => Syntax::Primitive(Primitive::Null),
                "undefined" => Syntax::Primitive(Primitive::Undefined),
                text => Syntax::Literal(text.to_string()),
            },
            "null" => Syntax::Primitive(Primitive::Null),
            "undefined" => Syntax::Primitive(Primitive::Undefined),
            "array_type" => match node.named_child(0) {
                Some(element) => Syntax::Array { element },
                None => Syntax::Opaque {
                    children: Vec::new(),
                },
            },
            "union_type" => {
                let mut members = Vec::new();
                self.union_members(node, &mut members);
                Syntax::Union { members }
            }
            "type_identifier" | "nested_type_identifier" => Syntax::Reference {
                name: self.text(node).to_string(),
                type_arguments: Vec::new(),
                arguments: Vec::new(),
            },
            "generic_type" => self.generic_syntax(node),
            "function_type" | "constructor_type" => Syntax::FunctionType,
            "object_type" => Syntax::ObjectType {
                text: self.text(node).to_string(),
                members: self.children(node),
            },
            "parenthesized_type" | "readonly_type" | "type_annotation" => Syntax::Opaque {
                children: self.children(node),
            },
            _ => Syntax::Opaque {
                children: Vec::new(),
            },
        }
    }

    fn resolve(&self, reference: Node<'t>) -> Option<Node<'t>> {
        let name = self.reference_name(reference)?;

        if let Some(parameter) = self.find_type_parameter(reference, name) {
            return Some(parameter);
        }

        let candidates = self.declarations.get(name)?;
        let mut scope = self.scope_path(reference);
        loop {
            if let Some(found) = candidates.iter().find(|c| self.scope_path(**c) == scope) {
                return Some(*found);
            }
            if scope.pop().is_none() {
                break;
            }
        }
        candidates.first().copied()
    }

    fn declaration_kind(&self, declaration: Node<'t>) -> DeclarationKind {
        match declaration.kind() {
            "interface_declaration" => DeclarationKind::Interface,
            "enum_declaration" => DeclarationKind::Enum,
            "type_alias_declaration" => {
                let value = declaration.child_by_field_name("value").map(|v| v.kind());
                if matches!(value, Some("function_type" | "constructor_type")) {
                    DeclarationKind::FunctionType
                } else {
                    DeclarationKind::Alias
                }
            }
            "class_declaration" | "abstract_class_declaration" => DeclarationKind::Class,
            "function_declaration" | "function_signature" => DeclarationKind::FunctionType,
            "type_parameter" => DeclarationKind::TypeParameter,
            "internal_module" | "module" => DeclarationKind::Namespace,
            _ => DeclarationKind::Other,
        }
    }

    fn is_optional(&self, property: Node<'t>) -> bool {
        let mut cursor = property.walk();
        let optional = property.children(&mut cursor).any(|c| c.kind() == "?");
        optional
    }

    fn doc_comment(&self, declaration: Node<'t>) -> Option<String> {
        // Walk back over the run of comments directly above the anchor and
        // keep the earliest doc comment.
        let mut doc = None;
        let mut previous = self.doc_anchor(declaration).prev_named_sibling();
        while let Some(comment) = previous.filter(|p| p.kind() == "comment") {
            if let Some(text) = clean_doc_comment(self.text(comment)) {
                doc = Some(text);
            }
            previous = comment.prev_named_sibling();
        }
        doc
    }

    fn heritage(&self, declaration: Node<'t>) -> Vec<Node<'t>> {
        self.children(declaration)
            .into_iter()
            .filter(|c| matches!(c.kind(), "extends_type_clause" | "extends_clause"))
            .flat_map(|clause| self.children(clause))
            .filter(|t| {
                matches!(
                    t.kind(),
                    "type_identifier" | "nested_type_identifier" | "generic_type"
                )
            })
            .collect()
    }

    fn type_parameters(&self, declaration: Node<'t>) -> Vec<String> {
        declaration
            .child_by_field_name("type_parameters")
            .map(|params| {
                self.children(params)
                    .into_iter()
                    .filter(|p| p.kind() == "type_parameter")
                    .map(|p| self.field_text(p, "name"))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Named declarations of one source, keyed by name.
fn index_declarations<'t>(query: &Query, parsed: &'t ParsedSource) -> HashMap<&'t str, Vec<Node<'t>>> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, parsed.tree.root_node(), parsed.source.as_bytes());

    let mut declarations: HashMap<&'t str, Vec<Node<'t>>> = HashMap::new();
    while let Some(m) = matches.next() {
        let mut name = None;
        let mut declaration = None;

        for capture in m.captures {
            let capture_name = query.capture_names()[capture.index as usize];
            if capture_name.ends_with("_name") {
                name = Some(parsed.node_text(capture.node));
            } else {
                declaration = Some(capture.node);
            }
        }

        if let (Some(name), Some(node)) = (name, declaration) {
            if !name.is_empty() {
                declarations.entry(name).or_default().push(node);
            }
        }
    }
    declarations
}

/// Strip one pair of matching quotes from a string literal.
fn unquote(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && matches!(first, b'\'' | b'"' | b'`') {
            return &text[1..text.len() - 1];
        }
    }
    text
}
