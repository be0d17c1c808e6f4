//! Repeated value detector (connascence of value)
//!
//! The same non-trivial literal appearing many times is one value that
//! must change everywhere at once. One violation per literal, placed at
//! its first occurrence.

use crate::config::AnalysisConfig;
use crate::detectors::base::{locality_for, node_text, position, walk, DetectorContext, RuleDetector};
use crate::detectors::magic_literal::{is_bare_string_statement, literal_value, LiteralValue};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use rustc_hash::FxHashMap;
use serde_json::json;
use tree_sitter::Node;

pub struct RepeatedValueDetector {
    max_repeats: usize,
    allowed_numbers: Vec<f64>,
    allowed_strings: Vec<String>,
}

impl RepeatedValueDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_repeats: config.max_value_repeats,
            allowed_numbers: config.allowed_numbers.clone(),
            allowed_strings: config.allowed_strings.clone(),
        }
    }

    fn is_tracked(&self, value: &LiteralValue) -> bool {
        match value {
            LiteralValue::Number(n) => {
                n.abs() > 1.0 && !self.allowed_numbers.iter().any(|a| a == n)
            }
            LiteralValue::Str(s) => s.len() > 1 && !self.allowed_strings.iter().any(|a| a == s),
        }
    }
}

impl RuleDetector for RepeatedValueDetector {
    fn name(&self) -> &'static str {
        "repeated-value"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Value
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();

        // rendered literal -> occurrences in document order
        let mut occurrences: FxHashMap<String, Vec<Node>> = FxHashMap::default();
        walk(unit.root(), &mut |node| {
            if is_bare_string_statement(&node) {
                return;
            }
            let Some(value) = literal_value(&node, source) else {
                return;
            };
            if !self.is_tracked(&value) {
                return;
            }
            occurrences
                .entry(node_text(&node, source).to_string())
                .or_default()
                .push(node);
        });

        let mut violations = Vec::new();
        for (rendered, nodes) in &occurrences {
            if nodes.len() < self.max_repeats {
                continue;
            }
            let first = &nodes[0];
            let (line, column) = position(first);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                Severity::Medium,
                locality_for(first),
                line,
                column,
                format!("Literal {rendered} repeated {} times", nodes.len()),
                "Hoist the repeated value into a single named constant",
                [
                    ("literal".to_string(), json!(rendered)),
                    ("occurrences".to_string(), json!(nodes.len())),
                ]
                .into_iter()
                .collect(),
            ));
        }

        Ok(violations)
    }
}
