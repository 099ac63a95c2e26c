//! Root-gated traversal of the declaration graph.
//!
//! The walker ignores everything until it meets a declaration named after
//! the entry point, then collects that declaration and every declaration it
//! reaches through property types, array elements, union branches, type
//! arguments and heritage clauses.
//!
//! All traversal state (registry, visited set, container stack, root latch)
//! lives in one [`Walker`] value owned by a single extraction run.

use std::collections::HashSet;

use tracing::{debug, info, trace, warn};

use super::{ExtractError, ExtractOptions};
use crate::graph::{DeclarationKind, EnumMember, Syntax, TypeGraphProvider};
use crate::model::{ExtractedNode, Forest, NodeId, NodeKind, Primitive, Root, RootKind};

/// Traversal session for one entry point.
pub struct Walker<'a, P: TypeGraphProvider> {
    provider: &'a P,
    entry_point: &'a str,
    options: &'a ExtractOptions,
    forest: Forest,
    /// Nodes currently accepting members and type-slot assignments.
    containers: Vec<NodeId>,
    /// Declarations already walked, by provider identity.
    visited: HashSet<usize>,
    root_found: bool,
}

impl<'a, P: TypeGraphProvider> Walker<'a, P> {
    pub fn new(provider: &'a P, entry_point: &'a str, options: &'a ExtractOptions) -> Self {
        Self {
            provider,
            entry_point,
            options,
            forest: Forest::new(),
            containers: Vec::new(),
            visited: HashSet::new(),
            root_found: false,
        }
    }

    pub fn root_found(&self) -> bool {
        self.root_found
    }

    /// Consume the session and return the collected forest.
    pub fn finish(self) -> Forest {
        debug_assert!(self.containers.is_empty(), "unbalanced container stack");
        self.forest
    }

    /// Feed one node to the walker.
    pub fn visit(&mut self, node: P::Node) -> Result<(), ExtractError> {
        if self.root_found {
            self.walk(node)
        } else {
            self.seek_root(node)
        }
    }

    // =========================================================================
    // Root gate
    // =========================================================================

    fn seek_root(&mut self, node: P::Node) -> Result<(), ExtractError> {
        match self.provider.syntax(node) {
            Syntax::Namespace { name, members } => {
                if name == self.entry_point {
                    self.enter_namespace_root(name, members)
                } else {
                    self.seek_root_in(members)
                }
            }
            Syntax::Interface { ref name, .. }
                if name == self.entry_point && self.options.ignored.is_ignored(name) =>
            {
                warn!(entry_point = %name, "entry point is an ignored interface, skipping");
                Ok(())
            }
            Syntax::Interface { ref name, .. }
            | Syntax::Enum { ref name, .. }
            | Syntax::Alias { ref name, .. }
            | Syntax::Class { ref name }
                if name == self.entry_point =>
            {
                info!(entry_point = %name, "found entry point");
                self.root_found = true;
                self.forest.set_root(Root {
                    name: name.clone(),
                    kind: RootKind::Interface,
                    namespace: None,
                });
                self.walk(node)
            }
            Syntax::Opaque { children } => self.seek_root_in(children),
            _ => Ok(()),
        }
    }

    fn seek_root_in(&mut self, nodes: Vec<P::Node>) -> Result<(), ExtractError> {
        for node in nodes {
            self.seek_root(node)?;
            if self.root_found {
                break;
            }
        }
        Ok(())
    }

    fn enter_namespace_root(
        &mut self,
        name: String,
        members: Vec<P::Node>,
    ) -> Result<(), ExtractError> {
        info!(entry_point = %name, "found entry point namespace");
        self.root_found = true;

        let namespace = self
            .forest
            .alloc(ExtractedNode::named(NodeKind::Namespace, name.clone()));
        self.forest.set_root(Root {
            name,
            kind: RootKind::Namespace,
            namespace: Some(namespace),
        });

        self.containers.push(namespace);
        let result = members.into_iter().try_for_each(|m| self.walk(m));
        self.containers.pop();
        result
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn walk(&mut self, node: P::Node) -> Result<(), ExtractError> {
        match self.provider.syntax(node) {
            Syntax::Namespace { name, members } => {
                trace!(namespace = %name, "flattening nested namespace");
                members.into_iter().try_for_each(|m| self.walk(m))
            }
            Syntax::Interface { name, members } => self.walk_interface(node, name, members),
            Syntax::Enum { name, members } => self.walk_enum(node, name, members),
            Syntax::Alias { name, value } => self.walk_alias(node, name, value),
            Syntax::Class { name } => self.walk_class(node, name),
            Syntax::Function => {
                trace!("skipping function declaration");
                Ok(())
            }
            Syntax::Property { name, value } => self.walk_property(node, name, value),
            Syntax::Method { name } => self.walk_method(node, name),
            Syntax::Primitive(primitive) => self.set_primitive(primitive),
            Syntax::Literal(text) => {
                let literal = self
                    .forest
                    .alloc(ExtractedNode::named(NodeKind::Literal, text));
                self.set_type(literal)
            }
            Syntax::Array { element } => self.walk_array(element),
            Syntax::Union { members } => self.walk_union(members),
            Syntax::Reference {
                name,
                type_arguments,
                arguments,
            } => self.walk_reference(node, name, type_arguments, arguments),
            Syntax::FunctionType => {
                debug!("collapsing function type to any");
                self.set_primitive(Primitive::Any)
            }
            Syntax::ObjectType { .. } => {
                trace!("object type outside an alias, leaving slot empty");
                Ok(())
            }
            Syntax::Opaque { children } => children.into_iter().try_for_each(|c| self.walk(c)),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn walk_interface(
        &mut self,
        node: P::Node,
        name: String,
        members: Vec<P::Node>,
    ) -> Result<(), ExtractError> {
        if self.forest.is_registered(&name) {
            trace!(interface = %name, "already extracted");
            return Ok(());
        }
        if self.options.ignored.is_ignored(&name) {
            debug!(interface = %name, "skipping ignored interface");
            return Ok(());
        }
        if !self.mark_visited(node) {
            return Ok(());
        }

        let heritage: Vec<P::Node> = self
            .provider
            .heritage(node)
            .into_iter()
            .filter(|base| {
                let resolved = self.provider.resolve(*base).is_some();
                if !resolved {
                    debug!(interface = %name, "dropping unresolved base type");
                }
                resolved
            })
            .collect();
        let bases: Vec<String> = heritage
            .iter()
            .filter_map(|h| self.heritage_name(*h))
            .collect();

        let mut interface = ExtractedNode::named(NodeKind::Interface, name.clone());
        interface.bases = bases;
        interface.generics = self.provider.type_parameters(node);
        interface.doc_comment = self.provider.doc_comment(node);

        let id = self.forest.alloc(interface);
        self.forest.register(&name, id);
        self.attach_definition(id);

        self.containers.push(id);
        let result = members.into_iter().try_for_each(|m| self.walk(m));
        self.containers.pop();
        result?;

        for base in heritage {
            let Some(declaration) = self.provider.resolve(base) else {
                continue;
            };
            let kind = self.provider.declaration_kind(declaration);
            if kind.is_expandable() {
                self.walk(declaration)?;
            } else {
                debug!(interface = %name, base_kind = %kind, "not expanding base type");
            }
            if let Syntax::Reference { arguments, .. } = self.provider.syntax(base) {
                self.walk_type_arguments(arguments)?;
            }
        }

        Ok(())
    }

    fn heritage_name(&self, base: P::Node) -> Option<String> {
        match self.provider.syntax(base) {
            Syntax::Reference {
                name,
                type_arguments,
                ..
            } => Some(with_type_arguments(name, &type_arguments)),
            _ => None,
        }
    }

    fn walk_enum(
        &mut self,
        node: P::Node,
        name: String,
        members: Vec<EnumMember>,
    ) -> Result<(), ExtractError> {
        if self.forest.is_registered(&name) || !self.mark_visited(node) {
            trace!(name = %name, "enum already extracted");
            return Ok(());
        }

        let values = members
            .into_iter()
            .map(|m| {
                let mut value = ExtractedNode::named(NodeKind::EnumMember, m.name);
                value.literal_value = m.value;
                self.forest.alloc(value)
            })
            .collect();

        let mut enumeration = ExtractedNode::named(NodeKind::Enum, name.clone());
        enumeration.members = values;
        enumeration.doc_comment = self.provider.doc_comment(node);

        let id = self.forest.alloc(enumeration);
        self.forest.register(&name, id);
        self.attach_definition(id);
        Ok(())
    }

    fn walk_alias(
        &mut self,
        node: P::Node,
        name: String,
        value: Option<P::Node>,
    ) -> Result<(), ExtractError> {
        if self.forest.is_registered(&name) || !self.mark_visited(node) {
            trace!(alias = %name, "already extracted");
            return Ok(());
        }

        let mut alias = ExtractedNode::named(NodeKind::Alias, name.clone());
        alias.generics = self.provider.type_parameters(node);
        alias.doc_comment = self.provider.doc_comment(node);

        let id = self.forest.alloc(alias);
        self.forest.register(&name, id);
        self.attach_definition(id);

        let Some(value) = value else {
            return Ok(());
        };
        match self.provider.syntax(value) {
            Syntax::ObjectType { text, members } => {
                self.with_container(id, |w| w.walk_object_alias(text, members))
            }
            _ => self.with_container(id, |w| w.walk(value)),
        }
    }

    /// Object literal aliases keep their source text. The members are still
    /// walked, into a detached slot, for the declarations they name.
    fn walk_object_alias(&mut self, text: String, members: Vec<P::Node>) -> Result<(), ExtractError> {
        let literal = self
            .forest
            .alloc(ExtractedNode::named(NodeKind::Literal, text));
        self.set_type(literal)?;

        let sink = self.forest.alloc(ExtractedNode::new(NodeKind::Slot));
        self.with_container(sink, |w| members.into_iter().try_for_each(|m| w.walk(m)))
    }

    /// Classes are opaque: they become `type Name = any;` placeholders.
    fn walk_class(&mut self, node: P::Node, name: String) -> Result<(), ExtractError> {
        if self.forest.is_registered(&name) || !self.mark_visited(node) {
            return Ok(());
        }
        debug!(class = %name, "emitting class placeholder");

        let any = self.any_node();
        let mut placeholder = ExtractedNode::named(NodeKind::Alias, name.clone());
        placeholder.type_ref = Some(any);
        placeholder.doc_comment = self.provider.doc_comment(node);

        let id = self.forest.alloc(placeholder);
        self.forest.register(&name, id);
        self.attach_definition(id);
        Ok(())
    }

    // =========================================================================
    // Members and types
    // =========================================================================

    fn walk_property(
        &mut self,
        node: P::Node,
        name: String,
        value: Option<P::Node>,
    ) -> Result<(), ExtractError> {
        let mut property = ExtractedNode::named(NodeKind::Property, name);
        property.optional = self.provider.is_optional(node);
        property.doc_comment = self.provider.doc_comment(node);

        let id = self.forest.alloc(property);
        self.attach(id)?;

        match value {
            Some(value) => self.with_container(id, |w| w.walk(value)),
            None => Ok(()),
        }
    }

    /// Method signatures are function types, so they become `any` properties.
    fn walk_method(&mut self, node: P::Node, name: String) -> Result<(), ExtractError> {
        let any = self.any_node();
        let mut property = ExtractedNode::named(NodeKind::Property, name);
        property.optional = self.provider.is_optional(node);
        property.doc_comment = self.provider.doc_comment(node);
        property.type_ref = Some(any);

        let id = self.forest.alloc(property);
        self.attach(id)
    }

    fn walk_array(&mut self, element: P::Node) -> Result<(), ExtractError> {
        let array = self.forest.alloc(ExtractedNode::new(NodeKind::Array));
        self.set_type(array)?;
        self.with_container(array, |w| w.walk(element))
    }

    fn walk_union(&mut self, members: Vec<P::Node>) -> Result<(), ExtractError> {
        let union = self.forest.alloc(ExtractedNode::new(NodeKind::Union));
        self.set_type(union)?;

        self.with_container(union, |w| {
            for member in members {
                let slot = w.forest.alloc(ExtractedNode::new(NodeKind::Slot));
                w.attach(slot)?;
                w.with_container(slot, |w| w.walk(member))?;
            }
            Ok(())
        })
    }

    fn walk_reference(
        &mut self,
        node: P::Node,
        name: String,
        type_arguments: Vec<String>,
        arguments: Vec<P::Node>,
    ) -> Result<(), ExtractError> {
        let Some(declaration) = self.provider.resolve(node) else {
            debug!(reference = %name, "unresolved reference, collapsing to any");
            return self.set_primitive(Primitive::Any);
        };

        let kind = self.provider.declaration_kind(declaration);
        if kind == DeclarationKind::TypeParameter {
            let parameter = self
                .forest
                .alloc(ExtractedNode::named(NodeKind::Reference, name));
            return self.set_type(parameter);
        }
        if !kind.is_expandable() {
            debug!(reference = %name, kind = %kind, "collapsing reference to any");
            return self.set_primitive(Primitive::Any);
        }

        let resolved_name = self
            .provider
            .syntax(declaration)
            .declared_name()
            .map(str::to_string)
            .unwrap_or(name);
        if kind == DeclarationKind::Interface && self.options.ignored.is_ignored(&resolved_name) {
            debug!(reference = %resolved_name, "ignored interface, collapsing to any");
            return self.set_primitive(Primitive::Any);
        }

        let mut reference = ExtractedNode::named(NodeKind::Reference, resolved_name);
        reference.generics = type_arguments;
        let id = self.forest.alloc(reference);
        self.set_type(id)?;
        self.with_container(id, |w| w.walk(declaration))?;
        self.walk_type_arguments(arguments)
    }

    /// Type arguments are already rendered as text; walk them only to pull
    /// in the declarations they name. Each sink slot is never attached.
    fn walk_type_arguments(&mut self, arguments: Vec<P::Node>) -> Result<(), ExtractError> {
        for argument in arguments {
            let sink = self.forest.alloc(ExtractedNode::new(NodeKind::Slot));
            self.with_container(sink, |w| w.walk(argument))?;
        }
        Ok(())
    }

    // =========================================================================
    // Container stack
    // =========================================================================

    fn current(&self) -> Result<NodeId, ExtractError> {
        self.containers
            .last()
            .copied()
            .ok_or(ExtractError::NoActiveContainer)
    }

    /// Run `f` with `container` pushed, popping it again on every path.
    fn with_container<F>(&mut self, container: NodeId, f: F) -> Result<(), ExtractError>
    where
        F: FnOnce(&mut Self) -> Result<(), ExtractError>,
    {
        self.containers.push(container);
        let result = f(self);
        self.containers.pop();
        result
    }

    /// Append `child` to the current container's members.
    fn attach(&mut self, child: NodeId) -> Result<(), ExtractError> {
        let parent = self.current()?;
        self.forest.node_mut(parent).members.push(child);
        Ok(())
    }

    /// Definitions always live in the registry; under a namespace root they
    /// also become members of the namespace node.
    fn attach_definition(&mut self, definition: NodeId) {
        if let Some(namespace) = self.forest.root_namespace() {
            self.forest.node_mut(namespace).members.push(definition);
        }
    }

    /// Fill the current container's type slot.
    fn set_type(&mut self, type_node: NodeId) -> Result<(), ExtractError> {
        let container = self.current()?;
        let slot = &mut self.forest.node_mut(container).type_ref;
        if slot.is_some() {
            trace!("overwriting type slot");
        }
        *slot = Some(type_node);
        Ok(())
    }

    fn set_primitive(&mut self, primitive: Primitive) -> Result<(), ExtractError> {
        let node = self
            .forest
            .alloc(ExtractedNode::new(NodeKind::Primitive(primitive)));
        self.set_type(node)
    }

    fn any_node(&mut self) -> NodeId {
        self.forest
            .alloc(ExtractedNode::new(NodeKind::Primitive(Primitive::Any)))
    }

    fn mark_visited(&mut self, node: P::Node) -> bool {
        self.visited.insert(self.provider.identity(node))
    }
}

/// Append `<A, B>` to a type name when arguments are present.
pub(crate) fn with_type_arguments(name: String, arguments: &[String]) -> String {
    if arguments.is_empty() {
        name
    } else {
        format!("{}<{}>", name, arguments.join(", "))
    }
}
