//! Class cohesion metrics (LCOM and TCC)
//!
//! LCOM here is the Henderson-Sellers flavor rewritten as
//! `1 - sum(|attrs(m)|) / (methods * attributes)`: 0.0 when every method
//! touches every attribute, 1.0 when no method touches any. TCC is the
//! fraction of method pairs sharing at least one instance attribute.
//!
//! Classes need at least two public methods and one instance attribute to
//! be measured; anything smaller produces no record at all.

use crate::config::AnalysisConfig;
use crate::detectors::base::{
    all_classes, class_methods, definition_name, position, self_attribute, walk, DetectorContext,
};
use crate::loader::SourceUnit;
use crate::models::{ConnascenceKind, Locality, Severity, Violation};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohesionMetrics {
    pub lcom: f64,
    pub tcc: f64,
    pub method_count: usize,
    pub attribute_count: usize,
}

/// Per-class metrics record, keyed by file, class name and definition line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCohesion {
    pub file_path: PathBuf,
    pub class_name: String,
    pub line: u32,
    pub metrics: CohesionMetrics,
}

/// Instance attributes a method touches (reads or writes through `self`).
fn method_attributes<'a>(method: &Node, source: &'a [u8]) -> BTreeSet<&'a str> {
    let mut attrs = BTreeSet::new();
    if let Some(body) = method.child_by_field_name("body") {
        walk(body, &mut |node| {
            if let Some(attr) = self_attribute(&node, source) {
                attrs.insert(attr);
            }
        });
    }
    attrs
}

/// Compute cohesion metrics and threshold findings for every measurable
/// class in the unit.
pub fn analyze_unit(
    unit: &SourceUnit,
    config: &AnalysisConfig,
    ctx: &DetectorContext,
) -> (Vec<ClassCohesion>, Vec<Violation>) {
    let source = unit.bytes();
    let mut records = Vec::new();
    let mut violations = Vec::new();

    for class in all_classes(unit.root()) {
        let Some(class_name) = definition_name(&class, source) else {
            continue;
        };
        let methods = class_methods(class);

        let public: Vec<&Node> = methods
            .iter()
            .filter(|m| definition_name(m, source).is_some_and(|n| !n.starts_with('_')))
            .collect();

        // attribute universe includes private methods so __init__ counts
        let mut all_attrs: FxHashSet<&str> = FxHashSet::default();
        for method in &methods {
            all_attrs.extend(method_attributes(method, source));
        }

        if public.len() < 2 || all_attrs.is_empty() {
            continue;
        }

        let per_method: Vec<BTreeSet<&str>> = public
            .iter()
            .map(|m| method_attributes(m, source))
            .collect();

        let usage_sum: usize = per_method.iter().map(|attrs| attrs.len()).sum();
        let lcom =
            (1.0 - usage_sum as f64 / (public.len() * all_attrs.len()) as f64).clamp(0.0, 1.0);

        let total_pairs = public.len() * (public.len() - 1) / 2;
        let mut shared_pairs = 0usize;
        for i in 0..per_method.len() {
            for j in (i + 1)..per_method.len() {
                if per_method[i].intersection(&per_method[j]).next().is_some() {
                    shared_pairs += 1;
                }
            }
        }
        let tcc = shared_pairs as f64 / total_pairs as f64;

        let metrics = CohesionMetrics {
            lcom,
            tcc,
            method_count: public.len(),
            attribute_count: all_attrs.len(),
        };
        let (line, column) = position(&class);
        records.push(ClassCohesion {
            file_path: unit.path.clone(),
            class_name: class_name.to_string(),
            line,
            metrics,
        });

        if lcom > config.lcom_threshold {
            violations.push(ctx.violation(
                unit,
                "cohesion",
                ConnascenceKind::LowCohesion,
                Severity::Medium,
                Locality::SameClass,
                line,
                column,
                format!("Class '{class_name}' has LCOM {lcom:.2} (threshold {:.2})", config.lcom_threshold),
                "Split the class so each part's methods share its attributes",
                [
                    ("class".to_string(), json!(class_name)),
                    ("lcom".to_string(), json!(lcom)),
                ]
                .into_iter()
                .collect(),
            ));
        }

        if tcc < config.tcc_threshold && public.len() > 3 {
            violations.push(ctx.violation(
                unit,
                "cohesion",
                ConnascenceKind::LowTcc,
                Severity::Medium,
                Locality::SameClass,
                line,
                column,
                format!("Class '{class_name}' has TCC {tcc:.2} (threshold {:.2})", config.tcc_threshold),
                "Regroup methods around the attributes they actually share",
                [
                    ("class".to_string(), json!(class_name)),
                    ("tcc".to_string(), json!(tcc)),
                ]
                .into_iter()
                .collect(),
            ));
        }
    }

    (records, violations)
}
