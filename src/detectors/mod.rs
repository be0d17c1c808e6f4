//! Rule detectors and the framework that runs them.
//!
//! Each detector lives in its own file and implements [`RuleDetector`];
//! [`default_detectors`] builds the full registry from a validated config.

pub mod base;
pub mod engine;

mod algorithm;
mod complexity;
mod convention;
mod execution;
mod god_object;
mod identity;
mod magic_literal;
mod parameter_position;
mod timing;
mod values;

pub use base::{DetectorContext, RuleDetector};
pub use engine::{run_detectors, DetectorRun};

pub use algorithm::AlgorithmDetector;
pub use complexity::ComplexityDetector;
pub use convention::ConventionDetector;
pub use execution::ExecutionDetector;
pub use god_object::GodObjectDetector;
pub use identity::IdentityDetector;
pub use magic_literal::MagicLiteralDetector;
pub use parameter_position::ParameterPositionDetector;
pub use timing::TimingDetector;
pub use values::RepeatedValueDetector;

use crate::config::AnalysisConfig;
use std::sync::Arc;

/// The full detector registry, in the order findings are reported.
pub fn default_detectors(config: &AnalysisConfig) -> Vec<Arc<dyn RuleDetector>> {
    vec![
        Arc::new(MagicLiteralDetector::new(config)),
        Arc::new(ParameterPositionDetector::new(config)),
        Arc::new(GodObjectDetector::new(config)),
        Arc::new(ComplexityDetector::new(config)),
        Arc::new(ConventionDetector::new(config)),
        Arc::new(AlgorithmDetector::new(config)),
        Arc::new(ExecutionDetector::new(config)),
        Arc::new(RepeatedValueDetector::new(config)),
        Arc::new(IdentityDetector::new(config)),
        Arc::new(TimingDetector::new(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_unique_names() {
        let config = AnalysisConfig::default();
        let detectors = default_detectors(&config);
        assert_eq!(detectors.len(), 10);
        let mut names: Vec<&str> = detectors.iter().map(|d| d.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }
}
