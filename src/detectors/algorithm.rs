//! Duplicate algorithm detector (connascence of algorithm)
//!
//! Two functions whose bodies have the same normalized statement shape
//! implement the same algorithm twice; a change to one silently desyncs
//! the other. The shape is the pre-order sequence of named AST node kinds,
//! so identifier and literal spellings do not matter.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_functions, definition_name, locality_for, position, DetectorContext, RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use rustc_hash::FxHashMap;
use serde_json::json;
use tree_sitter::Node;

/// Pre-order kind sequence of a function body, ignoring leaf spellings.
pub(crate) fn body_shape(function: &Node) -> Option<String> {
    let body = function.child_by_field_name("body")?;
    let mut shape = String::new();
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        shape.push_str(node.kind());
        shape.push(';');
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    Some(shape)
}

fn statement_count(function: &Node) -> usize {
    function
        .child_by_field_name("body")
        .map(|body| body.named_child_count())
        .unwrap_or(0)
}

pub struct AlgorithmDetector {
    min_body_statements: usize,
}

impl AlgorithmDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_body_statements: config.min_body_statements,
        }
    }
}

impl RuleDetector for AlgorithmDetector {
    fn name(&self) -> &'static str {
        "algorithm"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Algorithm
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();

        let mut by_shape: FxHashMap<String, Vec<Node>> = FxHashMap::default();
        for function in all_functions(unit.root()) {
            if statement_count(&function) <= self.min_body_statements {
                continue;
            }
            if let Some(shape) = body_shape(&function) {
                by_shape.entry(shape).or_default().push(function);
            }
        }

        let mut violations = Vec::new();
        for functions in by_shape.values() {
            if functions.len() < 2 {
                continue;
            }
            let names: Vec<&str> = functions
                .iter()
                .map(|f| definition_name(f, source).unwrap_or("<lambda>"))
                .collect();
            for function in functions {
                let name = definition_name(function, source).unwrap_or("<lambda>");
                let (line, column) = position(function);
                violations.push(ctx.violation(
                    unit,
                    self.name(),
                    self.kind(),
                    Severity::Medium,
                    locality_for(function),
                    line,
                    column,
                    format!(
                        "Function '{name}' shares its algorithm shape with {}",
                        names
                            .iter()
                            .filter(|&&n| n != name)
                            .cloned()
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                    "Extract the shared algorithm into a single function",
                    [
                        ("function".to_string(), json!(name)),
                        ("duplicate_count".to_string(), json!(functions.len())),
                    ]
                    .into_iter()
                    .collect(),
                ));
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_source;
    use std::path::PathBuf;

    fn detect(source: &str) -> Vec<Violation> {
        let config = AnalysisConfig::default();
        let ctx = DetectorContext::new(&config);
        let unit =
            parse_source(source.to_string(), PathBuf::from("test.py")).expect("should parse");
        AlgorithmDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect")
    }

    const DUPLICATED: &str = "def total_price(items):\n    acc = 0\n    count = 0\n    for item in items:\n        acc = acc + item\n    return acc\n\ndef total_weight(boxes):\n    result = 0\n    seen = 0\n    for box in boxes:\n        result = result + box\n    return result\n";

    #[test]
    fn test_identical_shapes_flag_every_occurrence() {
        let violations = detect(DUPLICATED);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.kind == ConnascenceKind::Algorithm));
    }

    #[test]
    fn test_short_bodies_ignored() {
        let src = "def a(x):\n    return x\n\ndef b(y):\n    return y\n";
        assert!(detect(src).is_empty());
    }

    #[test]
    fn test_different_shapes_pass() {
        let src = "def a(xs):\n    acc = 0\n    seen = 0\n    for x in xs:\n        acc = acc + x\n    return acc\n\ndef b(xs):\n    if not xs:\n        return 0\n    xs = sorted(xs)\n    top = xs[0]\n    return top\n";
        assert!(detect(src).is_empty(), "got shapes flagged");
    }
}
