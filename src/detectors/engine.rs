//! Detector execution over a single unit
//!
//! Runs every registered detector against one parsed file. Detectors are
//! independent, so a failing detector is logged, counted, and skipped; the
//! rest of the set still runs. Ordering of the concatenated output carries
//! no meaning; the aggregator applies a deterministic sort before reporting.

use crate::detectors::base::{DetectorContext, RuleDetector};
use crate::loader::SourceUnit;
use crate::models::Violation;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of running the detector set over one unit.
#[derive(Debug, Default)]
pub struct DetectorRun {
    pub violations: Vec<Violation>,
    /// Detector invocations that errored and were isolated.
    pub failures: usize,
}

/// Run all detectors over one unit, isolating per-detector failures.
pub fn run_detectors(
    unit: &SourceUnit,
    detectors: &[Arc<dyn RuleDetector>],
    ctx: &DetectorContext,
) -> DetectorRun {
    let mut run = DetectorRun::default();

    for detector in detectors {
        match detector.inspect(unit, ctx) {
            Ok(violations) => {
                debug!(
                    detector = detector.name(),
                    file = %unit.path.display(),
                    count = violations.len(),
                    "detector finished"
                );
                run.violations.extend(violations);
            }
            Err(error) => {
                warn!(
                    detector = detector.name(),
                    file = %unit.path.display(),
                    %error,
                    "detector failed; continuing with remaining detectors"
                );
                run.failures += 1;
            }
        }
    }

    run
}
