//! Declaration-file rendering of an extracted forest.

use once_cell::sync::Lazy;
use regex::Regex;

use super::walker::with_type_arguments;
use crate::model::{ExtractedNode, Forest, NodeId, NodeKind, RootKind};

/// Property and enum member names that can be written unquoted.
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));

/// Options for rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Spaces per indentation level.
    pub indent: usize,
    /// Prefix definitions with `export` and the namespace with
    /// `export declare`.
    pub export: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            export: false,
        }
    }
}

/// Render the forest as declaration text.
///
/// An empty forest renders as an empty string.
pub fn render(forest: &Forest, options: &RenderOptions) -> String {
    let Some(root) = forest.root() else {
        return String::new();
    };

    let nested = root.kind == RootKind::Namespace;
    let renderer = Renderer {
        forest,
        options,
        base_level: usize::from(nested),
    };

    let blocks: Vec<String> = match forest.root_namespace() {
        Some(namespace) => forest
            .node(namespace)
            .members
            .iter()
            .map(|id| renderer.definition(*id))
            .collect(),
        None => forest
            .definitions()
            .map(|(_, id)| renderer.definition(id))
            .collect(),
    };
    let body = blocks.join("\n\n");

    if nested {
        let keyword = if options.export {
            "export declare namespace"
        } else {
            "namespace"
        };
        if body.is_empty() {
            format!("{} {} {{\n}}\n", keyword, root.name)
        } else {
            format!("{} {} {{\n{}\n}}\n", keyword, root.name, body)
        }
    } else if body.is_empty() {
        String::new()
    } else {
        format!("{}\n", body)
    }
}

struct Renderer<'a> {
    forest: &'a Forest,
    options: &'a RenderOptions,
    /// Indentation level of top-level definitions: 1 inside a namespace root.
    base_level: usize,
}

impl Renderer<'_> {
    fn pad(&self, level: usize) -> String {
        " ".repeat(self.options.indent * level)
    }

    fn export_prefix(&self) -> &'static str {
        if self.options.export {
            "export "
        } else {
            ""
        }
    }

    fn definition(&self, id: NodeId) -> String {
        let node = self.forest.node(id);
        let mut out = String::new();
        if let Some(doc) = &node.doc_comment {
            out.push_str(&self.doc_block(doc, self.base_level));
        }
        match node.kind {
            NodeKind::Interface => self.interface(node, &mut out),
            NodeKind::Enum => self.enumeration(node, &mut out),
            NodeKind::Alias => self.alias(node, &mut out),
            _ => {
                out.push_str(&self.pad(self.base_level));
                out.push_str(&format!("// unsupported definition {}", node.kind));
            }
        }
        out
    }

    fn interface(&self, node: &ExtractedNode, out: &mut String) {
        let pad = self.pad(self.base_level);
        let mut header = format!(
            "{}{}interface {}",
            pad,
            self.export_prefix(),
            node.name_or_empty()
        );
        if !node.generics.is_empty() {
            header.push_str(&format!("<{}>", node.generics.join(", ")));
        }
        if !node.bases.is_empty() {
            header.push_str(&format!(" extends {}", node.bases.join(", ")));
        }
        out.push_str(&header);
        out.push_str(" {\n");

        for member in &node.members {
            out.push_str(&self.property(self.forest.node(*member)));
            out.push('\n');
        }
        out.push_str(&pad);
        out.push('}');
    }

    fn property(&self, node: &ExtractedNode) -> String {
        let level = self.base_level + 1;
        let mut out = String::new();
        if let Some(doc) = &node.doc_comment {
            out.push_str(&self.doc_block(doc, level));
        }
        out.push_str(&format!(
            "{}{}{}: {};",
            self.pad(level),
            quote_name(node.name_or_empty()),
            if node.optional { "?" } else { "" },
            self.type_name(node.type_ref)
        ));
        out
    }

    fn enumeration(&self, node: &ExtractedNode, out: &mut String) {
        let pad = self.pad(self.base_level);
        let inner = self.pad(self.base_level + 1);
        out.push_str(&format!(
            "{}{}enum {} {{\n",
            pad,
            self.export_prefix(),
            node.name_or_empty()
        ));
        for id in &node.members {
            let member = self.forest.node(*id);
            let name = quote_name(member.name_or_empty());
            match &member.literal_value {
                Some(value) => out.push_str(&format!("{}{} = {},\n", inner, name, value)),
                None => out.push_str(&format!("{}{},\n", inner, name)),
            }
        }
        out.push_str(&pad);
        out.push('}');
    }

    fn alias(&self, node: &ExtractedNode, out: &mut String) {
        let name = with_type_arguments(node.name_or_empty().to_string(), &node.generics);
        out.push_str(&format!(
            "{}{}type {} = {};",
            self.pad(self.base_level),
            self.export_prefix(),
            name,
            self.type_name(node.type_ref)
        ));
    }

    fn doc_block(&self, doc: &str, level: usize) -> String {
        let pad = self.pad(level);
        let mut out = format!("{}/**\n", pad);
        for line in doc.lines() {
            if line.is_empty() {
                out.push_str(&format!("{} *\n", pad));
            } else {
                out.push_str(&format!("{} * {}\n", pad, line));
            }
        }
        out.push_str(&format!("{} */\n", pad));
        out
    }

    /// Collapse a type slot into a single type expression.
    fn type_name(&self, slot: Option<NodeId>) -> String {
        self.slot_name(slot).unwrap_or_else(|| "any".to_string())
    }

    /// Name of a type slot, or `None` if nothing was resolved into it.
    fn slot_name(&self, slot: Option<NodeId>) -> Option<String> {
        let node = self.forest.node(slot?);
        match node.kind {
            NodeKind::Primitive(primitive) => Some(primitive.as_str().to_string()),
            NodeKind::Literal => node.name.clone(),
            NodeKind::Array => {
                let inner = self.type_name(node.type_ref);
                if self.is_compound_union(node.type_ref) {
                    Some(format!("({})[]", inner))
                } else {
                    Some(format!("{}[]", inner))
                }
            }
            NodeKind::Union => {
                let names: Vec<Option<String>> = node
                    .members
                    .iter()
                    .map(|m| self.slot_name(Some(*m)))
                    .collect();
                if names.iter().all(Option::is_none) {
                    return Some("any".to_string());
                }
                // Unnamed branches render `any`.
                let names: Vec<String> = names
                    .into_iter()
                    .map(|n| n.unwrap_or_else(|| "any".to_string()))
                    .collect();
                Some(names.join(" | "))
            }
            NodeKind::Slot | NodeKind::Property => self.slot_name(node.type_ref),
            NodeKind::Reference
            | NodeKind::Interface
            | NodeKind::Enum
            | NodeKind::Alias
            | NodeKind::Namespace => node
                .name
                .clone()
                .map(|name| with_type_arguments(name, &node.generics)),
            NodeKind::EnumMember => node.name.clone(),
        }
    }

    /// Whether a slot holds a union that renders more than one branch.
    fn is_compound_union(&self, slot: Option<NodeId>) -> bool {
        let Some(id) = slot else {
            return false;
        };
        let node = self.forest.node(id);
        match node.kind {
            NodeKind::Union => {
                node.members.len() > 1
                    && node.members.iter().any(|m| self.slot_name(Some(*m)).is_some())
            }
            NodeKind::Slot => self.is_compound_union(node.type_ref),
            _ => false,
        }
    }
}

/// Single-quote names that are not plain identifiers.
fn quote_name(name: &str) -> String {
    if IDENTIFIER.is_match(name) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, ExtractOptions};
    use crate::graph::fake::FakeGraph;
    use crate::model::Primitive;

    fn render_entry(graph: &FakeGraph, entry: &str) -> String {
        let forest = extract(graph, entry, &ExtractOptions::default()).unwrap();
        render(&forest, &RenderOptions::default())
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("id"), "id");
        assert_eq!(quote_name("snake_case_1"), "snake_case_1");
        assert_eq!(quote_name("content-type"), "'content-type'");
        assert_eq!(quote_name("$ref"), "'$ref'");
        assert_eq!(quote_name("it's"), "'it\\'s'");
    }

    #[test]
    fn test_simple_interface() {
        let mut g = FakeGraph::new();
        let s = g.primitive(Primitive::String);
        let n = g.primitive(Primitive::Number);
        let id = g.property("id", s);
        let count = g.optional_property("count", n);
        let foo = g.interface("Foo", vec![id, count]);
        g.top_level_node(foo);

        assert_eq!(
            render_entry(&g, "Foo"),
            "interface Foo {\n  id: string;\n  count?: number;\n}\n"
        );
    }

    #[test]
    fn test_namespace_enum() {
        let mut g = FakeGraph::new();
        let color = g.enumeration("Color", &[("RED", None), ("GREEN", None)]);
        let ns = g.namespace("NS", vec![color]);
        g.top_level_node(ns);

        assert_eq!(
            render_entry(&g, "NS"),
            "namespace NS {\n  enum Color {\n    RED,\n    GREEN,\n  }\n}\n"
        );
    }

    #[test]
    fn test_enum_values_and_export() {
        let mut g = FakeGraph::new();
        let grade = g.enumeration("EGrade", &[("FAILED", Some("100")), ("PASSED", None)]);
        g.top_level_node(grade);

        let forest = extract(&g, "EGrade", &ExtractOptions::default()).unwrap();
        let options = RenderOptions {
            indent: 4,
            export: true,
        };
        assert_eq!(
            render(&forest, &options),
            "export enum EGrade {\n    FAILED = 100,\n    PASSED,\n}\n"
        );
    }

    #[test]
    fn test_export_namespace_wrapper() {
        let mut g = FakeGraph::new();
        let s = g.primitive(Primitive::String);
        let alias = g.alias("Id", s);
        let ns = g.namespace("Api", vec![alias]);
        g.top_level_node(ns);

        let forest = extract(&g, "Api", &ExtractOptions::default()).unwrap();
        let options = RenderOptions {
            indent: 2,
            export: true,
        };
        assert_eq!(
            render(&forest, &options),
            "export declare namespace Api {\n  export type Id = string;\n}\n"
        );
    }

    #[test]
    fn test_array_reconstruction() {
        let mut g = FakeGraph::new();
        let s = g.primitive(Primitive::String);
        let name = g.property("name", s);
        g.interface("IntClass", vec![name]);

        let r1 = g.reference("IntClass");
        let inner = g.array(r1);
        let nested = g.array(inner);
        let matrix = g.property("matrix", nested);

        let r2 = g.reference("IntClass");
        let n = g.primitive(Primitive::Number);
        let union = g.union(vec![r2, n]);
        let mixed_array = g.array(union);
        let mixed = g.property("mixed", mixed_array);

        let root = g.interface("Root", vec![matrix, mixed]);
        g.top_level_node(root);

        let out = render_entry(&g, "Root");
        assert!(out.contains("  matrix: IntClass[][];\n"), "got:\n{}", out);
        assert!(out.contains("  mixed: (IntClass | number)[];\n"), "got:\n{}", out);
        assert!(out.contains("interface IntClass {\n  name: string;\n}"));
    }

    #[test]
    fn test_unnamed_union_branch_renders_any() {
        let mut g = FakeGraph::new();
        let object = g.opaque(vec![]);
        let null = g.primitive(Primitive::Null);
        let union = g.union(vec![object, null]);
        let x = g.property("x", union);

        let tuple = g.opaque(vec![]);
        let s = g.primitive(Primitive::String);
        let inner = g.union(vec![tuple, s]);
        let list = g.array(inner);
        let y = g.property("y", list);

        let first = g.opaque(vec![]);
        let second = g.opaque(vec![]);
        let empty = g.union(vec![first, second]);
        let z = g.property("z", empty);

        let root = g.interface("R", vec![x, y, z]);
        g.top_level_node(root);

        let out = render_entry(&g, "R");
        assert!(out.contains("  x: any | null;\n"), "got:\n{}", out);
        assert!(out.contains("  y: (any | string)[];\n"), "got:\n{}", out);
        assert!(out.contains("  z: any;\n"), "got:\n{}", out);
    }

    #[test]
    fn test_union_with_literals_and_collapse() {
        let mut g = FakeGraph::new();
        g.class("Logger");
        let male = g.literal("'male'");
        let female = g.literal("'female'");
        let gender = g.union(vec![male, female]);
        let gp = g.property("gender", gender);
        let r = g.reference("Logger");
        let lp = g.property("logger", r);
        let root = g.interface("Root", vec![gp, lp]);
        g.top_level_node(root);

        let out = render_entry(&g, "Root");
        assert!(out.contains("  gender: 'male' | 'female';\n"));
        assert!(out.contains("  logger: any;\n"));
        assert!(!out.contains("Logger"));
    }

    #[test]
    fn test_generics_and_inheritance_header() {
        let mut g = FakeGraph::new();
        let s = g.primitive(Primitive::String);
        let id = g.property("id", s);
        g.interface("IntLabel", vec![id]);

        g.type_parameter("T");
        let t = g.reference("T");
        let tp = g.property("type", t);
        let student = g.interface("IntStudent", vec![tp]);
        g.with_type_parameters(student, &["T"]);
        g.extends(student, &["IntLabel"]);
        g.top_level_node(student);

        assert_eq!(
            render_entry(&g, "IntStudent"),
            "interface IntStudent<T> extends IntLabel {\n  type: T;\n}\n\n\
             interface IntLabel {\n  id: string;\n}\n"
        );
    }

    #[test]
    fn test_generic_reference_arguments() {
        let mut g = FakeGraph::new();
        g.interface("Page", vec![]);
        let r = g.generic_reference("Page", &["string", "number"]);
        let p = g.property("page", r);
        let root = g.interface("Root", vec![p]);
        g.top_level_node(root);

        let out = render_entry(&g, "Root");
        assert!(out.contains("  page: Page<string, number>;\n"));
    }

    #[test]
    fn test_doc_comments_and_quoted_names() {
        let mut g = FakeGraph::new();
        let s = g.primitive(Primitive::String);
        let p = g.property("content-type", s);
        g.with_doc(p, "Header value");
        let untyped = g.untyped_property("extra");
        let root = g.interface("Headers", vec![p, untyped]);
        g.with_doc(root, "Request headers\n\nSee RFC 7231");
        g.top_level_node(root);

        assert_eq!(
            render_entry(&g, "Headers"),
            "/**\n * Request headers\n *\n * See RFC 7231\n */\n\
             interface Headers {\n  /**\n   * Header value\n   */\n  'content-type': string;\n  extra: any;\n}\n"
        );
    }

    #[test]
    fn test_class_placeholder_in_namespace() {
        let mut g = FakeGraph::new();
        let auth = g.class("auth");
        let ns = g.namespace("NS", vec![auth]);
        g.top_level_node(ns);

        assert_eq!(render_entry(&g, "NS"), "namespace NS {\n  type auth = any;\n}\n");
    }

    #[test]
    fn test_empty_forest_renders_nothing() {
        let g = FakeGraph::new();
        assert_eq!(render_entry(&g, "Anything"), "");
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut g = FakeGraph::new();
        let rb = g.reference("B");
        let pb = g.property("b", rb);
        let a = g.interface("A", vec![pb]);
        let ra = g.reference("A");
        let arr = g.array(ra);
        let pa = g.optional_property("a", arr);
        g.interface("B", vec![pa]);
        g.top_level_node(a);

        let first = render_entry(&g, "A");
        let second = render_entry(&g, "A");
        assert_eq!(first, second);
        assert_eq!(
            first,
            "interface A {\n  b: B;\n}\n\ninterface B {\n  a?: A[];\n}\n"
        );
    }
}
