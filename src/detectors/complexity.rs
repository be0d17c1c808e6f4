//! Cyclomatic complexity detector
//!
//! McCabe count generalized over boolean operators: each `and`/`or` node
//! adds a branch, so an N-operand chain contributes N-1. Conditional
//! expressions count as branches like the statement form. Nested functions
//! are measured independently.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_functions, definition_name, locality_for, position, walk_function_local, DetectorContext,
    RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use serde_json::json;
use tree_sitter::Node;

pub(crate) fn cyclomatic_complexity(function: &Node) -> usize {
    let mut complexity = 1usize;
    if let Some(body) = function.child_by_field_name("body") {
        walk_function_local(body, &mut |node| {
            match node.kind() {
                "if_statement" | "elif_clause" | "while_statement" | "for_statement"
                | "except_clause" | "boolean_operator" | "conditional_expression" => {
                    complexity += 1;
                }
                _ => {}
            }
        });
    }
    complexity
}

pub struct ComplexityDetector {
    max_complexity: usize,
}

impl ComplexityDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_complexity: config.max_complexity as usize,
        }
    }
}

impl RuleDetector for ComplexityDetector {
    fn name(&self) -> &'static str {
        "complexity"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Complexity
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        for function in all_functions(unit.root()) {
            let complexity = cyclomatic_complexity(&function);
            if complexity <= self.max_complexity {
                continue;
            }
            let severity = if complexity > self.max_complexity * 2 {
                Severity::High
            } else {
                Severity::Medium
            };
            let name = definition_name(&function, source).unwrap_or("<lambda>");
            let (line, column) = position(&function);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                severity,
                locality_for(&function),
                line,
                column,
                format!(
                    "Function '{name}' has cyclomatic complexity {complexity} (max {})",
                    self.max_complexity
                ),
                "Extract branches into smaller functions or replace with dispatch",
                [
                    ("function".to_string(), json!(name)),
                    ("complexity".to_string(), json!(complexity)),
                ]
                .into_iter()
                .collect(),
            ));
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_source;
    use std::path::PathBuf;

    fn complexity_of(source: &str) -> usize {
        let unit =
            parse_source(source.to_string(), PathBuf::from("test.py")).expect("should parse");
        let function = all_functions(unit.root()).into_iter().next().expect("function");
        cyclomatic_complexity(&function)
    }

    #[test]
    fn test_straight_line_is_one() {
        assert_eq!(complexity_of("def f():\n    x = 1\n    return x\n"), 1);
    }

    #[test]
    fn test_each_branch_adds_one() {
        let src = "def f(x):\n    if x:\n        pass\n    elif x > 1:\n        pass\n    for i in x:\n        pass\n    while x:\n        pass\n";
        assert_eq!(complexity_of(src), 5);
    }

    #[test]
    fn test_bool_chain_adds_n_minus_one() {
        // a and b and c and d: three boolean_operator nodes
        assert_eq!(
            complexity_of("def f(a, b, c, d):\n    return a and b and c and d\n"),
            4
        );
    }

    #[test]
    fn test_ternary_counts_as_branch() {
        assert_eq!(complexity_of("def f(x):\n    return 1 if x else 0\n"), 2);
    }

    #[test]
    fn test_except_counts() {
        let src = "def f():\n    try:\n        pass\n    except ValueError:\n        pass\n    except KeyError:\n        pass\n";
        assert_eq!(complexity_of(src), 3);
    }

    #[test]
    fn test_nested_function_measured_separately() {
        let src = "def outer(x):\n    def inner(y):\n        if y:\n            pass\n    return inner\n";
        assert_eq!(complexity_of(src), 1);
    }

    #[test]
    fn test_threshold_and_escalation() {
        let config = AnalysisConfig::default();
        let ctx = DetectorContext::new(&config);
        let mut branches = String::from("def f(x):\n");
        for i in 0..21 {
            branches.push_str(&format!("    if x == {i}:\n        pass\n"));
        }
        let unit = parse_source(branches, PathBuf::from("test.py")).expect("should parse");
        let violations = ComplexityDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect");
        assert_eq!(violations.len(), 1);
        // 22 > 2 * 10
        assert_eq!(violations[0].severity, Severity::High);
    }
}
