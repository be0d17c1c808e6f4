//! Connascent - connascence and design-quality analysis for Python
//!
//! Parses Python source with tree-sitter, runs a set of rule detectors
//! (magic literals, positional coupling, god objects, complexity, naming,
//! duplicated algorithms, global writers, repeated values, identity and
//! timing coupling), measures per-class cohesion (LCOM/TCC), and checks
//! the module dependency graph for cycles, layer inversions and high
//! coupling. Everything rolls up into a single [`pipeline::AnalysisReport`].

pub mod cli;
pub mod cohesion;
pub mod config;
pub mod detectors;
pub mod graph;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod scoring;

pub use config::AnalysisConfig;
pub use models::{ConnascenceKind, Locality, Severity, Violation, ViolationSummary};
pub use pipeline::{analyze, AnalysisReport};
