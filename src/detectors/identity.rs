//! Identity comparison detector (connascence of identity)
//!
//! `is` / `is not` compares object identity, which is only well-defined
//! for the interned singletons. Comparisons against anything other than
//! None/True/False are flagged.

use crate::config::AnalysisConfig;
use crate::detectors::base::{locality_for, node_text, position, walk, DetectorContext, RuleDetector};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use serde_json::json;
use tree_sitter::Node;

fn is_singleton(node: &Node) -> bool {
    matches!(node.kind(), "none" | "true" | "false")
}

fn identity_operator(comparison: &Node) -> bool {
    let mut cursor = comparison.walk();
    let found = comparison
        .children(&mut cursor)
        .any(|child| matches!(child.kind(), "is" | "is not"));
    found
}

pub struct IdentityDetector;

impl IdentityDetector {
    pub fn new(_config: &AnalysisConfig) -> Self {
        Self
    }
}

impl RuleDetector for IdentityDetector {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Identity
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        walk(unit.root(), &mut |node| {
            if node.kind() != "comparison_operator" || !identity_operator(&node) {
                return;
            }
            let mut cursor = node.walk();
            if node.named_children(&mut cursor).any(|c| is_singleton(&c)) {
                return;
            }
            let (line, column) = position(&node);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                Severity::Medium,
                locality_for(&node),
                line,
                column,
                format!("Identity comparison '{}'", node_text(&node, source)),
                "Use == / != unless comparing against None, True or False",
                [("expression".to_string(), json!(node_text(&node, source)))]
                    .into_iter()
                    .collect(),
            ));
        });

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
        IdentityDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect")
    }

    #[test]
    fn test_is_none_pass() {
        assert!(detect("def f(x):\n    return x is None or x is not None\n").is_empty());
    }

    #[test]
    fn test_is_between_objects_flagged() {
        let violations = detect("def f(a, b):\n    return a is b\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ConnascenceKind::Identity);
        assert_eq!(violations[0].severity, Severity::Medium);
    }

    #[test]
    fn test_is_not_between_objects_flagged() {
        let violations = detect("flag = left is not right\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("left is not right"));
    }

    #[test]
    fn test_equality_ignored() {
        assert!(detect("def f(a, b):\n    return a == b\n").is_empty());
    }

    #[test]
    fn test_is_found_among_chained_operators() {
        // operator scan must survive mixed chains like `a == b is c`
        let violations = detect("def f(a, b, c):\n    return a == b is c\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ConnascenceKind::Identity);
    }
}
