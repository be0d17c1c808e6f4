//! Base detector trait and shared AST helpers
//!
//! Every rule detector implements [`RuleDetector`]: inspect one parsed unit,
//! optionally emit violations. The connascence kind is bound at construction
//! (one detector, one category) rather than exposed through a virtual
//! method, and detectors own their thresholds, copied out of the config
//! when they are built.

use crate::config::AnalysisConfig;
use crate::loader::SourceUnit;
use crate::models::{
    deterministic_violation_id, ConnascenceKind, Locality, Severity, Violation,
};
use crate::scoring;
use anyhow::Result;
use std::collections::BTreeMap;
use tree_sitter::Node;

/// Trait for all connascence/quality rule detectors.
///
/// Detectors are independent: no shared mutable traversal state, each walks
/// the unit once, and the order they run in never changes the merged result.
pub trait RuleDetector: Send + Sync {
    /// Unique identifier for this detector (e.g., "magic-literal").
    fn name(&self) -> &'static str;

    /// The single category this detector reports.
    fn kind(&self) -> ConnascenceKind;

    /// Inspect one unit and return its violations.
    ///
    /// An error return is isolated by the engine: it is logged and counted,
    /// and never suppresses other detectors' findings for the same file.
    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>>;
}

/// Per-run context handed to every detector.
pub struct DetectorContext<'a> {
    pub config: &'a AnalysisConfig,
}

impl<'a> DetectorContext<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Build a violation record with its weight computed once, at creation.
    #[allow(clippy::too_many_arguments)]
    pub fn violation(
        &self,
        unit: &SourceUnit,
        detector: &'static str,
        kind: ConnascenceKind,
        severity: Severity,
        locality: Locality,
        line: u32,
        column: u32,
        message: String,
        recommendation: &str,
        context: BTreeMap<String, serde_json::Value>,
    ) -> Violation {
        let file = unit.path.display().to_string();
        Violation {
            id: deterministic_violation_id(detector, &file, line, column, &message),
            detector: detector.to_string(),
            kind,
            severity,
            locality,
            file_path: unit.path.clone(),
            line,
            column,
            message,
            recommendation: recommendation.to_string(),
            weight: scoring::weight(kind, severity, locality, &self.config.weights),
            context,
        }
    }
}

/// 1-based line and 0-based column of a node.
pub fn position(node: &Node) -> (u32, u32) {
    let p = node.start_position();
    (p.row as u32 + 1, p.column as u32)
}

/// Node text, empty on any encoding surprise.
pub fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Preorder walk over a subtree.
pub fn walk<'a>(node: Node<'a>, f: &mut dyn FnMut(Node<'a>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

/// Preorder walk that does not descend into nested function definitions
/// (other than `node` itself). Used for per-function metrics.
pub fn walk_function_local<'a>(node: Node<'a>, f: &mut dyn FnMut(Node<'a>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "function_definition" {
            continue;
        }
        walk_function_local(child, f);
    }
}

/// Classify how local a violation at `node` is: inside a function it couples
/// within that function, inside a class body it couples within the class,
/// otherwise within the module. Cross-module locality is only assigned by
/// the dependency analyzer.
pub fn locality_for(node: &Node) -> Locality {
    let mut current = *node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "function_definition" => return Locality::SameFunction,
            "class_definition" => return Locality::SameClass,
            _ => {}
        }
        current = parent;
    }
    Locality::SameModule
}

/// Whether `node` sits inside the condition of an `if`/`elif`/`while`, an
/// `assert`, or a conditional expression.
pub fn in_conditional(node: &Node) -> bool {
    let mut current = *node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "if_statement" | "elif_clause" | "while_statement" => {
                if parent
                    .child_by_field_name("condition")
                    .is_some_and(|c| c.id() == current.id())
                {
                    return true;
                }
            }
            "assert_statement" | "conditional_expression" => return true,
            _ => {}
        }
        current = parent;
    }
    false
}

/// Name of a function/class definition node.
pub fn definition_name<'a>(node: &Node, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name("name")
        .map(|n| node_text(&n, source))
}

/// Collect every function definition in the unit, including methods and
/// nested functions.
pub fn all_functions<'a>(root: Node<'a>) -> Vec<Node<'a>> {
    let mut functions = Vec::new();
    walk(root, &mut |node| {
        if node.kind() == "function_definition" {
            functions.push(node);
        }
    });
    functions
}

/// Collect every class definition in the unit.
pub fn all_classes<'a>(root: Node<'a>) -> Vec<Node<'a>> {
    let mut classes = Vec::new();
    walk(root, &mut |node| {
        if node.kind() == "class_definition" {
            classes.push(node);
        }
    });
    classes
}

/// Direct methods of a class body, unwrapping decorators.
pub fn class_methods<'a>(class_node: Node<'a>) -> Vec<Node<'a>> {
    let mut methods = Vec::new();
    let Some(body) = class_node.child_by_field_name("body") else {
        return methods;
    };
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => methods.push(child),
            "decorated_definition" => {
                if let Some(def) = child.child_by_field_name("definition") {
                    if def.kind() == "function_definition" {
                        methods.push(def);
                    }
                }
            }
            _ => {}
        }
    }
    methods
}

/// Whether a node is a `self.<attr>` attribute access; returns the
/// attribute name when it is.
pub fn self_attribute<'a>(node: &Node, source: &'a [u8]) -> Option<&'a str> {
    if node.kind() != "attribute" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() != "identifier" || node_text(&object, source) != "self" {
        return None;
    }
    let attribute = node.child_by_field_name("attribute")?;
    Some(node_text(&attribute, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_source;
    use std::path::PathBuf;

    fn unit(source: &str) -> SourceUnit {
        parse_source(source.to_string(), PathBuf::from("test.py")).expect("should parse")
    }

    #[test]
    fn test_locality_classification() {
        let unit = unit(
            "x = 1\n\nclass C:\n    y = 2\n    def m(self):\n        z = 3\n",
        );
        let src = unit.bytes();
        let mut localities = Vec::new();
        walk(unit.root(), &mut |node| {
            if node.kind() == "integer" {
                localities.push((node_text(&node, src).to_string(), locality_for(&node)));
            }
        });
        assert_eq!(
            localities,
            vec![
                ("1".to_string(), Locality::SameModule),
                ("2".to_string(), Locality::SameClass),
                ("3".to_string(), Locality::SameFunction),
            ]
        );
    }

    #[test]
    fn test_in_conditional_detects_condition_subtree_only() {
        let unit = unit("if x > 10:\n    y = 20\n");
        let src = unit.bytes();
        let mut seen = Vec::new();
        walk(unit.root(), &mut |node| {
            if node.kind() == "integer" {
                seen.push((node_text(&node, src).to_string(), in_conditional(&node)));
            }
        });
        assert_eq!(
            seen,
            vec![("10".to_string(), true), ("20".to_string(), false)]
        );
    }

    #[test]
    fn test_class_methods_unwrap_decorators() {
        let unit = unit(
            "class C:\n    def a(self):\n        pass\n    @property\n    def b(self):\n        return 1\n",
        );
        let classes = all_classes(unit.root());
        assert_eq!(classes.len(), 1);
        let methods = class_methods(classes[0]);
        let names: Vec<_> = methods
            .iter()
            .map(|m| definition_name(m, unit.bytes()).expect("named").to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_self_attribute_extraction() {
        let unit = unit(
            "class C:\n    def m(self):\n        self.count = 1\n        other.count = 2\n",
        );
        let src = unit.bytes();
        let mut attrs = Vec::new();
        walk(unit.root(), &mut |node| {
            if let Some(name) = self_attribute(&node, src) {
                attrs.push(name.to_string());
            }
        });
        assert_eq!(attrs, vec!["count"]);
    }

    #[test]
    fn test_walk_function_local_skips_nested_defs() {
        let unit = unit(
            "def outer():\n    if a:\n        pass\n    def inner():\n        if b:\n            pass\n",
        );
        let functions = all_functions(unit.root());
        let outer = functions[0];
        let mut ifs = 0;
        walk_function_local(outer, &mut |node| {
            if node.kind() == "if_statement" {
                ifs += 1;
            }
        });
        assert_eq!(ifs, 1);
    }
}
