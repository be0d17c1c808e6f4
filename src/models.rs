//! Core data models for Connascent
//!
//! These models are shared by every stage of the analysis: the canonical
//! violation record, its severity/kind/locality classification, and the
//! per-run summary.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Generate a deterministic violation ID based on content hash.
///
/// Stable IDs across runs enable suppression lists, deduplication, and the
/// byte-identical reruns the pipeline guarantees. The ID is the first 16 hex
/// characters of a SHA-256 over the detector name, location, and message.
pub fn deterministic_violation_id(
    detector: &str,
    file: &str,
    line: u32,
    column: u32,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(detector.as_bytes());
    hasher.update(b"\n");
    hasher.update(file.as_bytes());
    hasher.update(b"\n");
    hasher.update(line.to_le_bytes());
    hasher.update(column.to_le_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Connascence and design-quality categories.
///
/// The static connascence forms (Name..Algorithm) are listed weakest to
/// strongest, followed by the dynamic forms and the non-connascence quality
/// categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnascenceKind {
    Name,
    Type,
    Meaning,
    Position,
    Algorithm,
    Execution,
    Timing,
    Value,
    Identity,
    GodObject,
    Complexity,
    LowCohesion,
    LowTcc,
}

impl ConnascenceKind {
    /// Short category code (CoM, CoP, ...) used in report headers.
    pub fn code(&self) -> &'static str {
        match self {
            ConnascenceKind::Name => "CoN",
            ConnascenceKind::Type => "CoT",
            ConnascenceKind::Meaning => "CoM",
            ConnascenceKind::Position => "CoP",
            ConnascenceKind::Algorithm => "CoA",
            ConnascenceKind::Execution => "CoE",
            ConnascenceKind::Timing => "CoTi",
            ConnascenceKind::Value => "CoV",
            ConnascenceKind::Identity => "CoI",
            ConnascenceKind::GodObject => "god_object",
            ConnascenceKind::Complexity => "complexity",
            ConnascenceKind::LowCohesion => "low_cohesion",
            ConnascenceKind::LowTcc => "low_tcc",
        }
    }

    /// Key used for per-kind weight multiplier lookup in the config.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnascenceKind::Name => "name",
            ConnascenceKind::Type => "type",
            ConnascenceKind::Meaning => "meaning",
            ConnascenceKind::Position => "position",
            ConnascenceKind::Algorithm => "algorithm",
            ConnascenceKind::Execution => "execution",
            ConnascenceKind::Timing => "timing",
            ConnascenceKind::Value => "value",
            ConnascenceKind::Identity => "identity",
            ConnascenceKind::GodObject => "god_object",
            ConnascenceKind::Complexity => "complexity",
            ConnascenceKind::LowCohesion => "low_cohesion",
            ConnascenceKind::LowTcc => "low_tcc",
        }
    }
}

impl std::fmt::Display for ConnascenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far apart the coupled elements are.
///
/// Coupling that crosses larger scopes is weighted worse, so the ordering
/// here matters: `SameFunction < SameClass < SameModule < CrossModule`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
    SameFunction,
    SameClass,
    #[default]
    SameModule,
    CrossModule,
}

/// A single connascence or design-quality finding.
///
/// Created by a detector and immutable thereafter; `weight` is computed once
/// at creation time from (kind, severity, locality) and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub detector: String,
    pub kind: ConnascenceKind,
    pub severity: Severity,
    pub locality: Locality,
    pub file_path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub recommendation: String,
    pub weight: f64,
    /// Open key-value bag: literal value, parameter count, method count, ...
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Summary of violations by severity and kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub by_kind: BTreeMap<ConnascenceKind, usize>,
}

impl ViolationSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self::default();
        for v in violations {
            match v.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            *summary.by_kind.entry(v.kind).or_insert(0) += 1;
            summary.total += 1;
        }
        summary
    }
}
