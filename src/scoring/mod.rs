//! Violation weight scoring
//!
//! `weight()` is the single scoring function for the whole engine: a pure
//! product of the severity base weight, the coupling-locality multiplier,
//! and the per-kind remediation-cost multiplier. It is deterministic, has no
//! side effects, and is tested independently of any AST traversal.

use crate::config::WeightConfig;
use crate::models::{ConnascenceKind, Locality, Severity};

/// Compute the weight of a violation.
///
/// `weight = base(severity) * locality_multiplier * kind_multiplier`.
/// With a validated [`WeightConfig`] the result is always positive and
/// strictly increases as locality widens, holding kind and severity fixed.
pub fn weight(
    kind: ConnascenceKind,
    severity: Severity,
    locality: Locality,
    weights: &WeightConfig,
) -> f64 {
    let base = match severity {
        Severity::Critical => weights.critical_base,
        Severity::High => weights.high_base,
        Severity::Medium => weights.medium_base,
        Severity::Low => weights.low_base,
    };

    let locality_multiplier = match locality {
        Locality::SameFunction => weights.same_function,
        Locality::SameClass => weights.same_class,
        Locality::SameModule => weights.same_module,
        Locality::CrossModule => weights.cross_module,
    };

    let kind_multiplier = weights
        .kind_multipliers
        .get(kind.as_str())
        .copied()
        .unwrap_or(1.0);

    base * locality_multiplier * kind_multiplier
}
