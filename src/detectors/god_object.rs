//! God object detector
//!
//! A class that accumulates too many public methods or instance attributes
//! has too many reasons to change. Method count over the limit is critical;
//! attribute count over the limit is high.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_classes, class_methods, definition_name, position, self_attribute, walk, DetectorContext,
    RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Locality, Severity, Violation};
use anyhow::Result;
use rustc_hash::FxHashSet;
use serde_json::json;

pub struct GodObjectDetector {
    max_methods: usize,
    max_attributes: usize,
}

impl GodObjectDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_methods: config.max_methods,
            max_attributes: config.max_attributes,
        }
    }
}

impl RuleDetector for GodObjectDetector {
    fn name(&self) -> &'static str {
        "god-object"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::GodObject
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        for class in all_classes(unit.root()) {
            let class_name = definition_name(&class, source).unwrap_or("<anonymous>");
            let methods = class_methods(class);

            let public_methods = methods
                .iter()
                .filter(|m| {
                    definition_name(m, source).is_some_and(|n| !n.starts_with('_'))
                })
                .count();

            let mut attributes: FxHashSet<&str> = FxHashSet::default();
            for method in &methods {
                walk(*method, &mut |node| {
                    if matches!(node.kind(), "assignment" | "augmented_assignment") {
                        if let Some(left) = node.child_by_field_name("left") {
                            if let Some(attr) = self_attribute(&left, source) {
                                attributes.insert(attr);
                            }
                        }
                    }
                });
            }

            let (line, column) = position(&class);

            if public_methods > self.max_methods {
                violations.push(ctx.violation(
                    unit,
                    self.name(),
                    self.kind(),
                    Severity::Critical,
                    Locality::SameClass,
                    line,
                    column,
                    format!(
                        "Class '{class_name}' has {public_methods} public methods (max {})",
                        self.max_methods
                    ),
                    "Split this class along its responsibilities",
                    [
                        ("class".to_string(), json!(class_name)),
                        ("method_count".to_string(), json!(public_methods)),
                    ]
                    .into_iter()
                    .collect(),
                ));
            }

            if attributes.len() > self.max_attributes {
                violations.push(ctx.violation(
                    unit,
                    self.name(),
                    self.kind(),
                    Severity::High,
                    Locality::SameClass,
                    line,
                    column,
                    format!(
                        "Class '{class_name}' has {} instance attributes (max {})",
                        attributes.len(),
                        self.max_attributes
                    ),
                    "Extract cohesive groups of attributes into value objects",
                    [
                        ("class".to_string(), json!(class_name)),
                        ("attribute_count".to_string(), json!(attributes.len())),
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
    use std::fmt::Write;
    use std::path::PathBuf;

    fn detect(source: &str) -> Vec<Violation> {
        let config = AnalysisConfig::default();
        let ctx = DetectorContext::new(&config);
        let unit =
            parse_source(source.to_string(), PathBuf::from("test.py")).expect("should parse");
        GodObjectDetector::new(&config)
            .inspect(&unit, &ctx)
            .expect("should inspect")
    }

    fn class_with_methods(count: usize) -> String {
        let mut src = String::from("class Big:\n");
        for i in 0..count {
            writeln!(src, "    def method_{i}(self):\n        pass").unwrap();
        }
        src
    }

    #[test]
    fn test_twenty_methods_pass() {
        assert!(detect(&class_with_methods(20)).is_empty());
    }

    #[test]
    fn test_twenty_one_methods_critical() {
        let violations = detect(&class_with_methods(21));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_private_methods_not_counted() {
        let mut src = class_with_methods(20);
        for i in 0..5 {
            writeln!(src, "    def _helper_{i}(self):\n        pass").unwrap();
        }
        assert!(detect(&src).is_empty());
    }

    #[test]
    fn test_attribute_count_flagged_high() {
        let mut src = String::from("class Holder:\n    def __init__(self):\n");
        for i in 0..16 {
            writeln!(src, "        self.attr_{i} = None").unwrap();
        }
        let violations = detect(&src);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::High);
        assert!(violations[0].message.contains("16 instance attributes"));
    }

    #[test]
    fn test_repeated_assignments_count_once() {
        let src = "class C:\n    def __init__(self):\n        self.x = 1\n        self.x = 2\n";
        assert!(detect(src).is_empty());
    }
}
