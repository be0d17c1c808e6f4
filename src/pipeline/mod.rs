//! Full analysis pipeline
//!
//! Per-file work (parse, detectors, cohesion, import extraction) runs in
//! parallel; the dependency graph is built afterwards from the extracted
//! records so no AST crosses a thread boundary. Violations are sorted at
//! the end, which makes reruns over an unchanged tree byte-identical.

use crate::cohesion::{self, ClassCohesion};
use crate::config::AnalysisConfig;
use crate::detectors::{self, default_detectors, DetectorContext, RuleDetector};
use crate::graph::{analyze_dependencies, extract_module_record, DependencyReport, ModuleRecord};
use crate::loader::{collect_files, load_file};
use crate::models::{Violation, ViolationSummary};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub violations: Vec<Violation>,
    pub summary: ViolationSummary,
    pub cohesion: Vec<ClassCohesion>,
    pub dependency: DependencyReport,
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub detector_failures: usize,
}

struct FileOutcome {
    violations: Vec<Violation>,
    cohesion: Vec<ClassCohesion>,
    module: Option<ModuleRecord>,
    skipped: bool,
    detector_failures: usize,
}

fn analyze_file(
    path: &Path,
    root: &Path,
    config: &AnalysisConfig,
    detectors: &[Arc<dyn RuleDetector>],
) -> FileOutcome {
    let unit = match load_file(path) {
        Ok(unit) => unit,
        Err(err) => {
            debug!(file = %path.display(), error = %err, "skipping file");
            return FileOutcome {
                violations: Vec::new(),
                cohesion: Vec::new(),
                module: None,
                skipped: true,
                detector_failures: 0,
            };
        }
    };

    let ctx = DetectorContext::new(config);
    let run = detectors::run_detectors(&unit, detectors, &ctx);
    let (cohesion_records, mut cohesion_violations) = cohesion::analyze_unit(&unit, config, &ctx);
    let module = extract_module_record(&unit, root);

    let mut violations = run.violations;
    violations.append(&mut cohesion_violations);

    FileOutcome {
        violations,
        cohesion: cohesion_records,
        module: Some(module),
        skipped: false,
        detector_failures: run.failures,
    }
}

/// Run the whole analysis over a file or directory tree.
pub fn analyze(root: &Path, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let files = collect_files(root, config);
    info!(files = files.len(), root = %root.display(), "starting analysis");

    let detectors = default_detectors(config);
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| analyze_file(path, root, config, &detectors))
        .collect();

    let mut violations = Vec::new();
    let mut cohesion = Vec::new();
    let mut modules = Vec::new();
    let mut files_skipped = 0usize;
    let mut detector_failures = 0usize;
    for mut outcome in outcomes {
        violations.append(&mut outcome.violations);
        cohesion.append(&mut outcome.cohesion);
        if let Some(module) = outcome.module {
            modules.push(module);
        }
        if outcome.skipped {
            files_skipped += 1;
        }
        detector_failures += outcome.detector_failures;
    }

    violations.sort_by(|a, b| {
        (&a.file_path, a.line, a.column, a.detector.as_str(), &a.message).cmp(&(
            &b.file_path,
            b.line,
            b.column,
            b.detector.as_str(),
            &b.message,
        ))
    });

    let dependency = analyze_dependencies(&modules, config);
    let summary = ViolationSummary::from_violations(&violations);

    info!(
        violations = violations.len(),
        skipped = files_skipped,
        "analysis complete"
    );

    Ok(AnalysisReport {
        files_analyzed: modules.len(),
        files_skipped,
        detector_failures,
        violations,
        summary,
        cohesion,
        dependency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    #[test]
    fn test_single_file_analysis() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "app.py", "def f(a, b, c, d, e):\n    return 42\n");
        let report = analyze(dir.path(), &AnalysisConfig::default()).expect("analyze");
        assert_eq!(report.files_analyzed, 1);
        assert_eq!(report.files_skipped, 0);
        assert!(report
            .violations
            .iter()
            .any(|v| v.detector == "parameter-position"));
        assert!(report.violations.iter().any(|v| v.detector == "magic-literal"));
    }

    #[test]
    fn test_broken_file_counted_as_skipped() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "ok.py", "x = 1\n");
        write(&dir, "broken.py", "def f(:\n");
        let report = analyze(dir.path(), &AnalysisConfig::default()).expect("analyze");
        assert_eq!(report.files_analyzed, 1);
        assert_eq!(report.files_skipped, 1);
    }

    #[test]
    fn test_rerun_is_identical() {
        let dir = TempDir::new().expect("tempdir");
        write(
            &dir,
            "api_layer/views.py",
            "import data_layer\n\ndef handle(x):\n    if x > 9999:\n        return None\n",
        );
        write(&dir, "data_layer/store.py", "import api_layer\n\nTIMEOUT = 300\n");
        let config = AnalysisConfig::default();
        let first = analyze(dir.path(), &config).expect("first run");
        let second = analyze(dir.path(), &config).expect("second run");
        assert_eq!(
            serde_json::to_string(&first).expect("json"),
            serde_json::to_string(&second).expect("json")
        );
        assert_eq!(first.dependency.cycles.len(), 1);
    }
}
