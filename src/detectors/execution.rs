//! Execution order detector (connascence of execution)
//!
//! A module-level name rebound under `global` from several functions makes
//! behavior depend on the order those functions run. Flags each global name
//! written from at least the configured number of distinct functions.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_functions, definition_name, node_text, position, walk_function_local, DetectorContext,
    RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Locality, Severity, Violation};
use anyhow::Result;
use serde_json::json;
use std::collections::BTreeMap;
use tree_sitter::Node;

/// Names a function both declares `global` and assigns.
fn global_writes<'s, 't>(function: &Node<'t>, source: &'s [u8]) -> Vec<(&'s str, Node<'t>)> {
    let Some(body) = function.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut declared: Vec<(&str, Node)> = Vec::new();
    let mut assigned: Vec<&str> = Vec::new();

    walk_function_local(body, &mut |node| match node.kind() {
        "global_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "identifier" {
                    declared.push((node_text(&child, source), node));
                }
            }
        }
        "assignment" | "augmented_assignment" => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    assigned.push(node_text(&left, source));
                }
            }
        }
        _ => {}
    });

    declared
        .into_iter()
        .filter(|(name, _)| assigned.contains(name))
        .collect()
}

pub struct ExecutionDetector {
    max_global_writers: usize,
}

impl ExecutionDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_global_writers: config.max_global_writers,
        }
    }
}

impl RuleDetector for ExecutionDetector {
    fn name(&self) -> &'static str {
        "execution"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Execution
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();

        // global name -> (writer functions, declaration site of first writer)
        let mut writers: BTreeMap<&str, (Vec<&str>, Node)> = BTreeMap::new();
        for function in all_functions(unit.root()) {
            let fn_name = definition_name(&function, source).unwrap_or("<lambda>");
            for (global_name, site) in global_writes(&function, source) {
                writers
                    .entry(global_name)
                    .or_insert_with(|| (Vec::new(), site))
                    .0
                    .push(fn_name);
            }
        }

        let mut violations = Vec::new();
        for (global_name, (functions, site)) in &writers {
            if functions.len() < self.max_global_writers {
                continue;
            }
            let (line, column) = position(site);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                Severity::High,
                Locality::SameModule,
                line,
                column,
                format!(
                    "Global '{global_name}' is written by {} functions: {}",
                    functions.len(),
                    functions.join(", ")
                ),
                "Pass state explicitly or encapsulate it in a class",
                [
                    ("global".to_string(), json!(global_name)),
                    ("writer_count".to_string(), json!(functions.len())),
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

    fn detect(source: &str) -> Vec<Violation> {
        let config = AnalysisConfig::default();
        let ctx = DetectorContext::new(&config);
        let unit =
            parse_source(source.to_string(), PathBuf::from("test.py")).expect("should parse");
        ExecutionDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect")
    }

    fn writers(count: usize) -> String {
        let mut src = String::from("state = None\n");
        for i in 0..count {
            src.push_str(&format!(
                "def step_{i}():\n    global state\n    state = {i}\n"
            ));
        }
        src
    }

    #[test]
    fn test_two_writers_pass() {
        assert!(detect(&writers(2)).is_empty());
    }

    #[test]
    fn test_three_writers_flagged_high() {
        let violations = detect(&writers(3));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
        assert!(violations[0].message.contains("3 functions"));
    }

    #[test]
    fn test_global_read_only_not_counted() {
        let src = "cfg = {}\ndef a():\n    global cfg\n    cfg = {}\ndef b():\n    global cfg\n    cfg = {}\ndef c():\n    global cfg\n    return cfg\n";
        assert!(detect(src).is_empty(), "reader should not count as writer");
    }
}
