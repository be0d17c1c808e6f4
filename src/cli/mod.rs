//! CLI definition and the text/JSON renderers.

use crate::config::{load_config, AnalysisConfig};
use crate::models::{Severity, Violation, ViolationSummary};
use crate::pipeline::{self, AnalysisReport};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "connascent.toml";

/// Connascence and design-quality analysis for Python codebases.
#[derive(Parser, Debug)]
#[command(name = "connascent")]
#[command(
    version,
    about = "Detect connascence, god objects, low cohesion and dependency tangles in Python code",
    after_help = "\
Examples:
  connascent .                         Analyze current directory
  connascent src/pkg --format json     JSON output for scripting
  connascent . --min-severity high     Only show high/critical violations
  connascent . --config rules.toml     Use a specific policy file"
)]
pub struct Cli {
    /// Path to a Python file or project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Policy file (default: connascent.toml next to the analyzed path, if present)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Minimum severity to report
    #[arg(long, value_parser = ["critical", "high", "medium", "low"])]
    pub min_severity: Option<String>,
}

fn parse_severity(value: &str) -> Severity {
    match value {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "medium" => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Resolve the effective config: explicit file, conventional file next to
/// the analyzed path, or built-in defaults.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    if let Some(path) = &cli.config {
        return load_config(path).with_context(|| format!("loading {}", path.display()));
    }
    let base = if cli.path.is_file() {
        cli.path.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        cli.path.clone()
    };
    let conventional = base.join(DEFAULT_CONFIG_FILE);
    if conventional.is_file() {
        debug!(config = %conventional.display(), "using conventional policy file");
        return load_config(&conventional)
            .with_context(|| format!("loading {}", conventional.display()));
    }
    Ok(AnalysisConfig::default())
}

/// Drop violations below `min` and recompute the summary, so the counts
/// always describe the list they accompany.
fn filter_by_severity(report: &mut AnalysisReport, min: Severity) {
    report.violations.retain(|v| v.severity >= min);
    report.summary = ViolationSummary::from_violations(&report.violations);
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let mut report = pipeline::analyze(&cli.path, &config)?;

    if let Some(min) = cli.min_severity.as_deref().map(parse_severity) {
        filter_by_severity(&mut report, min);
    }

    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => render_text(&report),
    }

    if report.summary.critical > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn render_violation(v: &Violation) {
    println!(
        "{}:{}:{} [{}] [{}] {} (weight {:.1})",
        v.file_path.display(),
        v.line,
        v.column,
        v.severity,
        v.kind.code(),
        v.message,
        v.weight
    );
    println!("    -> {}", v.recommendation);
}

fn render_text(report: &AnalysisReport) {
    for violation in &report.violations {
        render_violation(violation);
    }

    if !report.dependency.cycles.is_empty() {
        println!();
        println!("Circular dependencies:");
        for cycle in &report.dependency.cycles {
            println!("  {} -> {}", cycle.join(" -> "), cycle[0]);
        }
    }
    for lv in &report.dependency.layer_violations {
        println!(
            "Layer violation: {} (layer {}) imports {} (layer {})",
            lv.source, lv.source_layer, lv.target, lv.target_layer
        );
    }
    for hc in &report.dependency.high_coupling {
        println!(
            "High coupling: module '{}' depends on {} modules",
            hc.module, hc.dependency_count
        );
    }

    println!();
    println!(
        "Analyzed {} files ({} skipped, {} detector failures)",
        report.files_analyzed, report.files_skipped, report.detector_failures
    );
    println!(
        "{} violations: {} critical, {} high, {} medium, {} low",
        report.summary.total,
        report.summary.critical,
        report.summary.high,
        report.summary.medium,
        report.summary.low
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_min_severity_values() {
        let cli = Cli::parse_from(["connascent", ".", "--min-severity", "high"]);
        assert_eq!(cli.min_severity.as_deref(), Some("high"));
        assert_eq!(parse_severity("high"), Severity::High);
    }

    #[test]
    fn test_default_format_is_text() {
        let cli = Cli::parse_from(["connascent", "some/path"]);
        assert_eq!(cli.format, "text");
        assert_eq!(cli.path, PathBuf::from("some/path"));
    }

    #[test]
    fn test_severity_filter_recomputes_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        // mixed severities: low (naming), medium (magic number),
        // high (positional params)
        std::fs::write(
            dir.path().join("mixed.py"),
            "def doThing(a, b, c, d, e):\n    x = 420\n    return x\n",
        )
        .expect("write fixture");

        let mut report =
            pipeline::analyze(dir.path(), &AnalysisConfig::default()).expect("analyze");
        assert!(report.summary.medium > 0);
        assert!(report.summary.low > 0);

        filter_by_severity(&mut report, Severity::High);

        assert_eq!(report.summary.total, report.violations.len());
        assert_eq!(report.summary.medium, 0);
        assert_eq!(report.summary.low, 0);
        assert!(report.violations.iter().all(|v| v.severity >= Severity::High));
        let high = report
            .violations
            .iter()
            .filter(|v| v.severity == Severity::High)
            .count();
        assert_eq!(report.summary.high, high);
    }
}
