//! In-memory type graph for walker and renderer tests.
//!
//! Nodes are plain indices. References resolve lazily by name against the
//! declarations added so far, so cyclic graphs can be built leaves first.

use super::{DeclarationKind, EnumMember, Syntax, TypeGraphProvider};
use crate::model::Primitive;

struct FakeNode {
    syntax: Syntax<usize>,
    kind: DeclarationKind,
    declared: Option<String>,
    optional: bool,
    doc: Option<String>,
    heritage: Vec<usize>,
    type_parameters: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeGraph {
    nodes: Vec<FakeNode>,
    top: Vec<usize>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, syntax: Syntax<usize>, kind: DeclarationKind) -> usize {
        let declared = syntax.declared_name().map(str::to_string);
        self.nodes.push(FakeNode {
            syntax,
            kind,
            declared,
            optional: false,
            doc: None,
            heritage: Vec::new(),
            type_parameters: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn top_level_node(&mut self, node: usize) -> usize {
        self.top.push(node);
        node
    }

    pub fn namespace(&mut self, name: &str, members: Vec<usize>) -> usize {
        self.push(
            Syntax::Namespace {
                name: name.to_string(),
                members,
            },
            DeclarationKind::Namespace,
        )
    }

    pub fn interface(&mut self, name: &str, members: Vec<usize>) -> usize {
        self.push(
            Syntax::Interface {
                name: name.to_string(),
                members,
            },
            DeclarationKind::Interface,
        )
    }

    pub fn enumeration(&mut self, name: &str, members: &[(&str, Option<&str>)]) -> usize {
        let members = members
            .iter()
            .map(|(n, v)| EnumMember::new(*n, *v))
            .collect();
        self.push(
            Syntax::Enum {
                name: name.to_string(),
                members,
            },
            DeclarationKind::Enum,
        )
    }

    pub fn alias(&mut self, name: &str, value: usize) -> usize {
        self.push(
            Syntax::Alias {
                name: name.to_string(),
                value: Some(value),
            },
            DeclarationKind::Alias,
        )
    }

    /// Alias whose value is a function type; declared as a function type.
    pub fn function_alias(&mut self, name: &str) -> usize {
        let value = self.function_type();
        self.push(
            Syntax::Alias {
                name: name.to_string(),
                value: Some(value),
            },
            DeclarationKind::FunctionType,
        )
    }

    pub fn class(&mut self, name: &str) -> usize {
        self.push(
            Syntax::Class {
                name: name.to_string(),
            },
            DeclarationKind::Class,
        )
    }

    pub fn function(&mut self, name: &str) -> usize {
        let id = self.push(Syntax::Function, DeclarationKind::FunctionType);
        self.nodes[id].declared = Some(name.to_string());
        id
    }

    pub fn type_parameter(&mut self, name: &str) -> usize {
        let id = self.push(
            Syntax::Opaque {
                children: Vec::new(),
            },
            DeclarationKind::TypeParameter,
        );
        self.nodes[id].declared = Some(name.to_string());
        id
    }

    pub fn property(&mut self, name: &str, value: usize) -> usize {
        self.push(
            Syntax::Property {
                name: name.to_string(),
                value: Some(value),
            },
            DeclarationKind::Other,
        )
    }

    pub fn untyped_property(&mut self, name: &str) -> usize {
        self.push(
            Syntax::Property {
                name: name.to_string(),
                value: None,
            },
            DeclarationKind::Other,
        )
    }

    pub fn optional_property(&mut self, name: &str, value: usize) -> usize {
        let id = self.property(name, value);
        self.nodes[id].optional = true;
        id
    }

    pub fn method(&mut self, name: &str) -> usize {
        self.push(
            Syntax::Method {
                name: name.to_string(),
            },
            DeclarationKind::Other,
        )
    }

    pub fn primitive(&mut self, primitive: Primitive) -> usize {
        self.push(Syntax::Primitive(primitive), DeclarationKind::Other)
    }

    pub fn literal(&mut self, text: &str) -> usize {
        self.push(Syntax::Literal(text.to_string()), DeclarationKind::Other)
    }

    pub fn array(&mut self, element: usize) -> usize {
        self.push(Syntax::Array { element }, DeclarationKind::Other)
    }

    pub fn union(&mut self, members: Vec<usize>) -> usize {
        self.push(Syntax::Union { members }, DeclarationKind::Other)
    }

    pub fn reference(&mut self, name: &str) -> usize {
        self.push(
            Syntax::Reference {
                name: name.to_string(),
                type_arguments: Vec::new(),
                arguments: Vec::new(),
            },
            DeclarationKind::Other,
        )
    }

    /// Reference with type arguments; each argument is itself a reference
    /// to the named type.
    pub fn generic_reference(&mut self, name: &str, type_arguments: &[&str]) -> usize {
        let arguments = type_arguments.iter().map(|a| self.reference(a)).collect();
        self.push(
            Syntax::Reference {
                name: name.to_string(),
                type_arguments: type_arguments.iter().map(|a| a.to_string()).collect(),
                arguments,
            },
            DeclarationKind::Other,
        )
    }

    pub fn function_type(&mut self) -> usize {
        self.push(Syntax::FunctionType, DeclarationKind::Other)
    }

    pub fn object_type(&mut self, text: &str, members: Vec<usize>) -> usize {
        self.push(
            Syntax::ObjectType {
                text: text.to_string(),
                members,
            },
            DeclarationKind::Other,
        )
    }

    pub fn opaque(&mut self, children: Vec<usize>) -> usize {
        self.push(Syntax::Opaque { children }, DeclarationKind::Other)
    }

    /// Give `interface` one heritage reference per base name.
    pub fn extends(&mut self, interface: usize, bases: &[&str]) {
        let refs: Vec<usize> = bases.iter().map(|b| self.reference(b)).collect();
        self.nodes[interface].heritage.extend(refs);
    }

    /// Give `interface` a heritage reference with type arguments.
    pub fn extends_generic(&mut self, interface: usize, base: &str, arguments: &[&str]) {
        let r = self.generic_reference(base, arguments);
        self.nodes[interface].heritage.push(r);
    }

    pub fn with_doc(&mut self, node: usize, doc: &str) {
        self.nodes[node].doc = Some(doc.to_string());
    }

    pub fn with_type_parameters(&mut self, node: usize, params: &[&str]) {
        self.nodes[node].type_parameters = params.iter().map(|p| p.to_string()).collect();
    }
}

impl TypeGraphProvider for FakeGraph {
    type Node = usize;

    fn identity(&self, node: usize) -> usize {
        node
    }

    fn top_level(&self) -> Vec<usize> {
        self.top.clone()
    }

    fn syntax(&self, node: usize) -> Syntax<usize> {
        self.nodes[node].syntax.clone()
    }

    fn resolve(&self, reference: usize) -> Option<usize> {
        let Syntax::Reference { name, .. } = &self.nodes[reference].syntax else {
            return None;
        };
        self.nodes
            .iter()
            .position(|n| n.declared.as_deref() == Some(name.as_str()))
    }

    fn declaration_kind(&self, declaration: usize) -> DeclarationKind {
        self.nodes[declaration].kind
    }

    fn is_optional(&self, property: usize) -> bool {
        self.nodes[property].optional
    }

    fn doc_comment(&self, declaration: usize) -> Option<String> {
        self.nodes[declaration].doc.clone()
    }

    fn heritage(&self, declaration: usize) -> Vec<usize> {
        self.nodes[declaration].heritage.clone()
    }

    fn type_parameters(&self, declaration: usize) -> Vec<String> {
        self.nodes[declaration].type_parameters.clone()
    }
}
