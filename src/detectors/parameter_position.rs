//! Positional parameter detector (connascence of position)
//!
//! Every call site of a long positional signature must know the argument
//! order. Counts positional parameters (keyword-only params after a bare
//! `*` are excluded, as are `self`/`cls` and splat parameters) and flags
//! signatures over the configured maximum.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_functions, definition_name, locality_for, node_text, position, DetectorContext,
    RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use serde_json::json;
use tree_sitter::Node;

/// Count parameters a caller can pass positionally.
pub(crate) fn positional_param_count(function: &Node, source: &[u8]) -> usize {
    let Some(params) = function.child_by_field_name("parameters") else {
        return 0;
    };
    let mut count = 0usize;
    let mut keyword_only = false;
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        match child.kind() {
            // bare `*` ends the positional section
            "keyword_separator" | "list_splat_pattern" => keyword_only = true,
            "dictionary_splat_pattern" | "positional_separator" => {}
            "identifier" | "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
                if keyword_only {
                    continue;
                }
                let name = match child.kind() {
                    "identifier" => node_text(&child, source),
                    _ => child
                        .child(0)
                        .filter(|n| n.kind() == "identifier")
                        .map(|n| node_text(&n, source))
                        .unwrap_or(""),
                };
                if name != "self" && name != "cls" {
                    count += 1;
                }
            }
            _ => {}
        }
    }
    count
}

/// Flags functions whose positional parameter count exceeds the limit.
pub struct ParameterPositionDetector {
    max_positional: usize,
}

impl ParameterPositionDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_positional: config.max_positional_params,
        }
    }
}

impl RuleDetector for ParameterPositionDetector {
    fn name(&self) -> &'static str {
        "parameter-position"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Position
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        for function in all_functions(unit.root()) {
            let count = positional_param_count(&function, source);
            if count <= self.max_positional {
                continue;
            }
            let name = definition_name(&function, source).unwrap_or("<lambda>");
            let (line, column) = position(&function);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                Severity::High,
                locality_for(&function),
                line,
                column,
                format!(
                    "Function '{name}' takes {count} positional parameters (max {})",
                    self.max_positional
                ),
                "Group related parameters into a dataclass or use keyword-only arguments",
                [
                    ("function".to_string(), json!(name)),
                    ("positional_params".to_string(), json!(count)),
                ]
                .into_iter()
                .collect(),
            ));
        }

        Ok(violations)
    }
}
