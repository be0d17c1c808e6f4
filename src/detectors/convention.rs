//! Naming convention detector (connascence of name)
//!
//! Functions and methods must be snake_case, classes PascalCase. Purely
//! syntactic; no scope resolution.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_classes, all_functions, definition_name, locality_for, position, DetectorContext,
    RuleDetector,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Severity, Violation};
use anyhow::Result;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;

fn snake_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^_*[a-z][a-z0-9_]*$").unwrap())
}

fn pascal_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^_?[A-Z][a-zA-Z0-9]*$").unwrap())
}

pub struct ConventionDetector;

impl ConventionDetector {
    pub fn new(_config: &AnalysisConfig) -> Self {
        Self
    }
}

impl RuleDetector for ConventionDetector {
    fn name(&self) -> &'static str {
        "convention"
    }

    fn kind(&self) -> ConnascenceKind {
        ConnascenceKind::Name
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &DetectorContext) -> Result<Vec<Violation>> {
        let source = unit.bytes();
        let mut violations = Vec::new();

        for function in all_functions(unit.root()) {
            let Some(name) = definition_name(&function, source) else {
                continue;
            };
            if snake_case().is_match(name) {
                continue;
            }
            let (line, column) = position(&function);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                Severity::Low,
                locality_for(&function),
                line,
                column,
                format!("Function '{name}' is not snake_case"),
                "Rename to snake_case",
                [("name".to_string(), json!(name))].into_iter().collect(),
            ));
        }

        for class in all_classes(unit.root()) {
            let Some(name) = definition_name(&class, source) else {
                continue;
            };
            if pascal_case().is_match(name) {
                continue;
            }
            let (line, column) = position(&class);
            violations.push(ctx.violation(
                unit,
                self.name(),
                self.kind(),
                Severity::Low,
                locality_for(&class),
                line,
                column,
                format!("Class '{name}' is not PascalCase"),
                "Rename to PascalCase",
                [("name".to_string(), json!(name))].into_iter().collect(),
            ));
        }

        Ok(violations)
    }
}
