//! Timing detector (connascence of timing)
//!
//! A `sleep` call used to wait for something else to finish encodes a
//! timing assumption that breaks under load. Flags bare `sleep(...)` and
//! attribute forms such as `time.sleep(...)` / `asyncio.sleep(...)`.

use crate::config::AnalysisConfig;
use crate::detectors::base::{locality_for, node_text, position, walk, DetectorContext, RuleDetector};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use serde_json::json;
use tree_sitter::Node;

fn is_sleep_call(call: &Node, source: &[u8]) -> bool {
    let Some(function) = call.child_by_field_name("function") else {
        return false;
    };
    match function.kind() {
        "identifier" => node_text(&function, source) == "sleep",
        "attribute" => function
            .child_by_field_name("attribute")
            .is_some_and(|attr| node_text(&attr, source) == "sleep"),
        _ => false,
    }
}

pub struct TimingDetector;

impl TimingDetector {
    pub fn new(_config: &AnalysisConfig) -> Self {
        Self
    }
}

impl RuleDetector for TimingDetector {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Timing
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        walk(unit.root(), &mut |node| {
            if node.kind() != "call" || !is_sleep_call(&node, source) {
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
                format!("Sleep-based synchronization: {}", node_text(&node, source)),
                "Wait on an explicit signal (event, join, poll with backoff) instead",
                [("call".to_string(), json!(node_text(&node, source)))]
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
        TimingDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect")
    }

    #[test]
    fn test_time_sleep_flagged() {
        let violations = detect("import time\n\ndef wait():\n    time.sleep(2)\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ConnascenceKind::Timing);
    }

    #[test]
    fn test_bare_sleep_flagged() {
        let violations = detect("from time import sleep\n\nsleep(1)\n");
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_other_calls_pass() {
        assert!(detect("def f(conn):\n    conn.close()\n").is_empty());
    }
}
