//! Magic literal detector (connascence of meaning)
//!
//! A literal is magic when its meaning lives in the reader's head instead of
//! a named constant: numbers with |value| > 1 and non-trivial strings that
//! are not on the configured allow-list. Literals in conditionals escalate
//! to high severity because a wrong guess there changes control flow.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    in_conditional, locality_for, node_text, position, walk, DetectorContext, RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use serde_json::json;
use tree_sitter::Node;

const RECOMMENDATION: &str = "Replace with a well-named constant or configuration value";

/// A literal value extracted from the AST.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LiteralValue {
    Number(f64),
    Str(String),
}

/// Extract the value of a numeric or string literal node.
///
/// Integers handle underscores and 0x/0o/0b radix prefixes; the sign of an
/// enclosing unary minus is folded in. Returns `None` for non-literal nodes
/// and for exotic literals (complex numbers, concatenated strings).
pub(crate) fn literal_value(node: &Node, source: &[u8]) -> Option<LiteralValue> {
    match node.kind() {
        "integer" => {
            let raw = node_text(node, source).replace('_', "");
            let value = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))
            {
                i64::from_str_radix(hex, 16).ok()?
            } else if let Some(oct) = raw.strip_prefix("0o").or_else(|| raw.strip_prefix("0O")) {
                i64::from_str_radix(oct, 8).ok()?
            } else if let Some(bin) = raw.strip_prefix("0b").or_else(|| raw.strip_prefix("0B")) {
                i64::from_str_radix(bin, 2).ok()?
            } else {
                raw.parse::<i64>().ok()?
            };
            Some(LiteralValue::Number(apply_sign(node, value as f64)))
        }
        "float" => {
            let raw = node_text(node, source).replace('_', "");
            let value = raw.parse::<f64>().ok()?;
            Some(LiteralValue::Number(apply_sign(node, value)))
        }
        "string" => {
            let mut content = String::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == "string_content" {
                    content.push_str(node_text(&child, source));
                }
            }
            Some(LiteralValue::Str(content))
        }
        _ => None,
    }
}

fn apply_sign(node: &Node, value: f64) -> f64 {
    if let Some(parent) = node.parent() {
        if parent.kind() == "unary_operator" {
            if let Some(op) = parent.child(0) {
                if op.kind() == "-" {
                    return -value;
                }
            }
        }
    }
    value
}

/// Source text of a numeric literal, including an enclosing unary minus
/// so messages show the value that was actually checked.
fn rendered_number<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    match node.parent() {
        Some(parent)
            if parent.kind() == "unary_operator"
                && parent.child(0).is_some_and(|op| op.kind() == "-") =>
        {
            node_text(&parent, source)
        }
        _ => node_text(node, source),
    }
}

/// Whether a string node is a bare statement (docstrings and separators).
pub(crate) fn is_bare_string_statement(node: &Node) -> bool {
    node.kind() == "string"
        && node
            .parent()
            .is_some_and(|p| p.kind() == "expression_statement")
}

/// Detects magic numeric and string literals.
pub struct MagicLiteralDetector {
    allowed_numbers: Vec<f64>,
    allowed_strings: Vec<String>,
}

impl MagicLiteralDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            allowed_numbers: config.allowed_numbers.clone(),
            allowed_strings: config.allowed_strings.clone(),
        }
    }

    fn is_magic(&self, value: &LiteralValue) -> bool {
        match value {
            LiteralValue::Number(n) => {
                n.abs() > 1.0 && !self.allowed_numbers.iter().any(|a| a == n)
            }
            LiteralValue::Str(s) => s.len() > 1 && !self.allowed_strings.iter().any(|a| a == s),
        }
    }
}

impl RuleDetector for MagicLiteralDetector {
    fn name(&self) -> &'static str {
        "magic-literal"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Meaning
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        walk(unit.root(), &mut |node| {
            if is_bare_string_statement(&node) {
                return;
            }
            let Some(value) = literal_value(&node, source) else {
                return;
            };
            if !self.is_magic(&value) {
                return;
            }

            let conditional = in_conditional(&node);
            let severity = if conditional {
                Severity::High
            } else {
                Severity::Medium
            };
            let (line, column) = position(&node);

            let (message, literal_json) = match &value {
                LiteralValue::Number(n) => {
                    let rendered = rendered_number(&node, source);
                    (
                        if conditional {
                            format!("Magic number {rendered} in conditional")
                        } else {
                            format!("Magic number {rendered}")
                        },
                        json!(n),
                    )
                }
                LiteralValue::Str(s) => (
                    if conditional {
                        format!("Magic string '{s}' in conditional")
                    } else {
                        format!("Magic string '{s}'")
                    },
                    json!(s),
                ),
            };

            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                severity,
                locality_for(&node),
                line,
                column,
                message,
                RECOMMENDATION,
                [
                    ("literal_value".to_string(), literal_json),
                    ("in_conditional".to_string(), json!(conditional)),
                ]
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
    use crate::models::Locality;
    use std::path::PathBuf;

    fn detect(source: &str) -> Vec<Violation> {
        let config = AnalysisConfig::default();
        let ctx = DetectorContext::new(&config);
        let unit =
            parse_source(source.to_string(), PathBuf::from("test.py")).expect("should parse");
        MagicLiteralDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect")
    }

    #[test]
    fn test_allowed_numbers_pass() {
        let violations = detect("a = 0\nb = 1\nc = -1\n");
        assert!(violations.is_empty(), "got {violations:?}");
    }

    #[test]
    fn test_magic_number_flagged() {
        let violations = detect("timeout = 42\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Medium);
        assert_eq!(violations[0].kind, ConnascenceKind::Meaning);
        assert_eq!(violations[0].locality, Locality::SameModule);
    }

    #[test]
    fn test_conditional_escalates_to_high() {
        let violations = detect("def f(x):\n    if x > 86400:\n        return True\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
        assert_eq!(violations[0].locality, Locality::SameFunction);
    }

    #[test]
    fn test_docstring_ignored() {
        let violations = detect("def f():\n    \"\"\"A docstring long enough to be magic.\"\"\"\n    return 1\n");
        assert!(violations.is_empty(), "got {violations:?}");
    }

    #[test]
    fn test_magic_string_flagged() {
        let violations = detect("name = input(\"enter the secret value\")\n");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("Magic string"));
    }

    #[test]
    fn test_single_char_string_ignored() {
        let violations = detect("sep = ','.join(parts)\n");
        assert!(violations.is_empty(), "got {violations:?}");
    }

    #[test]
    fn test_negative_number_rendered_with_sign() {
        let violations = detect("offset = -42\n");
        assert_eq!(violations.len(), 1);
        assert!(
            violations[0].message.contains("-42"),
            "got {}",
            violations[0].message
        );
        assert_eq!(violations[0].context["literal_value"], serde_json::json!(-42.0));
    }

    #[test]
    fn test_underscored_and_hex_integers() {
        let violations = detect("a = 1_000_000\nb = 0xFF\n");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_allowlist_override() {
        let config = AnalysisConfig {
            allowed_numbers: vec![0.0, 1.0, -1.0, 8080.0],
            ..Default::default()
        };
        let ctx = DetectorContext::new(&config);
        let unit = parse_source("port = 8080\n".to_string(), PathBuf::from("test.py"))
            .expect("should parse");
        let violations = MagicLiteralDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect");
        assert!(violations.is_empty());
    }
}
