//! Source loading and parsing
//!
//! Reads a file or directory tree and parses each Python file into a
//! tree-sitter AST. Files that fail to read or parse are skipped silently
//! and surfaced only as aggregate counters; a broken file must never abort
//! the batch.

use crate::config::AnalysisConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// One analyzed file: path, raw text, and parsed AST. Read-only once parsed.
pub struct SourceUnit {
    pub path: PathBuf,
    pub source: String,
    tree: Tree,
}

impl SourceUnit {
    /// Root node of the parsed module.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text as bytes, for `Node::utf8_text`.
    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

/// Parse Python source directly (also the test entry point).
///
/// Returns an error when the source does not parse cleanly; callers treat
/// that as a skip, not a failure.
pub fn parse_source(source: String, path: PathBuf) -> Result<SourceUnit> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .context("Failed to set Python language")?;

    let tree = parser
        .parse(&source, None)
        .context("Failed to parse Python source")?;

    if tree.root_node().has_error() {
        anyhow::bail!("syntax error in {}", path.display());
    }

    Ok(SourceUnit { path, source, tree })
}

/// Read and parse one file.
pub fn load_file(path: &Path) -> Result<SourceUnit> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    parse_source(source, path.to_path_buf())
}

/// Collect the Python files under `root`, sorted for deterministic runs.
///
/// Walks gitignore-aware, skips hidden files, and drops anything under the
/// configured exclusion directories (`__pycache__`, build trees, venvs).
/// A single-file `root` is returned as-is when it is a Python file.
pub fn collect_files(root: &Path, config: &AnalysisConfig) -> Vec<PathBuf> {
    if root.is_file() {
        return if is_python_file(root) {
            vec![root.to_path_buf()]
        } else {
            vec![]
        };
    }

    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_python_file(path))
        .filter(|path| !is_excluded(path, config))
        .collect();

    files.sort();
    debug!("collected {} source files under {}", files.len(), root.display());
    files
}

fn is_python_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyi")
    )
}

fn is_excluded(path: &Path, config: &AnalysisConfig) -> bool {
    path.components().any(|component| {
        let name = component.as_os_str().to_string_lossy();
        config.exclude_dirs.iter().any(|d| d == name.as_ref()) || name.ends_with(".egg-info")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_source() {
        let unit = parse_source(
            "def hello():\n    return 1\n".to_string(),
            PathBuf::from("test.py"),
        )
        .expect("should parse");
        assert_eq!(unit.root().kind(), "module");
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let result = parse_source(
            "def broken(:\n    pass\n".to_string(),
            PathBuf::from("bad.py"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_files_skips_pycache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::write(root.join("ok.py"), "x = 1\n").unwrap();
        std::fs::create_dir(root.join("__pycache__")).unwrap();
        std::fs::write(root.join("__pycache__").join("cached.py"), "x = 1\n").unwrap();
        std::fs::write(root.join("notes.txt"), "not python\n").unwrap();

        let files = collect_files(root, &AnalysisConfig::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("ok.py"));
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("single.py");
        std::fs::write(&file, "x = 1\n").unwrap();

        let files = collect_files(&file, &AnalysisConfig::default());
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_collect_files_is_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::write(root.join("b.py"), "x = 1\n").unwrap();
        std::fs::write(root.join("a.py"), "x = 1\n").unwrap();
        std::fs::write(root.join("c.py"), "x = 1\n").unwrap();

        let files = collect_files(root, &AnalysisConfig::default());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "b.py", "c.py"]);
    }
}
