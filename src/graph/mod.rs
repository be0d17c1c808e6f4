//! Module dependency graph: import extraction, cycle detection, layer
//! checks and coupling counts.
//!
//! A module is the first path segment of a file relative to the analysis
//! root (the file stem for files sitting directly in the root). Import
//! edges are extracted per file during the parallel phase; the graph is
//! assembled and analyzed once afterwards.

use crate::config::AnalysisConfig;
use crate::detectors::base::{definition_name, node_text, position, walk};
use crate::loader::SourceUnit;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import x` / `import x.y`
    Absolute,
    /// `from x import y`
    From,
    /// `from . import y` / `from .x import y`
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub target: String,
    pub kind: ImportKind,
    pub line: u32,
}

/// Per-file import/export extraction, merged per module before analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub module: String,
    pub file: PathBuf,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<String>,
}

/// First segment of a dotted import target.
fn head_segment(dotted: &str) -> &str {
    dotted.split('.').next().unwrap_or(dotted)
}

/// Module name for a file under the analysis root.
pub fn module_name(file: &Path, root: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let mut components = relative.components();
    let first = components.next();
    match (first, components.next()) {
        // file inside a package directory: the directory is the module
        (Some(dir), Some(_)) => dir.as_os_str().to_string_lossy().into_owned(),
        _ => relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Extract imports and top-level definitions from a parsed unit.
pub fn extract_module_record(unit: &SourceUnit, analysis_root: &Path) -> ModuleRecord {
    let source = unit.bytes();
    let own_module = module_name(&unit.path, analysis_root);
    let mut imports = Vec::new();
    let mut exports = Vec::new();

    let root = unit.root();

    // imports count wherever they appear (functions, guarded blocks)
    walk(root, &mut |node| match node.kind() {
        "import_statement" => {
            let mut inner = node.walk();
            for child in node.named_children(&mut inner) {
                let target = match child.kind() {
                    "dotted_name" => node_text(&child, source),
                    "aliased_import" => child
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source))
                        .unwrap_or(""),
                    _ => continue,
                };
                if target.is_empty() {
                    continue;
                }
                let (line, _) = position(&child);
                imports.push(ImportRecord {
                    target: head_segment(target).to_string(),
                    kind: ImportKind::Absolute,
                    line,
                });
            }
        }
        "import_from_statement" => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return;
            };
            let (line, _) = position(&module);
            if module.kind() == "relative_import" {
                // relative imports stay inside the importing package
                imports.push(ImportRecord {
                    target: own_module.clone(),
                    kind: ImportKind::Relative,
                    line,
                });
            } else {
                imports.push(ImportRecord {
                    target: head_segment(node_text(&module, source)).to_string(),
                    kind: ImportKind::From,
                    line,
                });
            }
        }
        _ => {}
    });

    // exports are top-level definitions only
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        match statement.kind() {
            "function_definition" | "class_definition" => {
                if let Some(name) = definition_name(&statement, source) {
                    exports.push(name.to_string());
                }
            }
            "decorated_definition" => {
                if let Some(def) = statement.child_by_field_name("definition") {
                    if let Some(name) = definition_name(&def, source) {
                        exports.push(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    ModuleRecord {
        module: own_module,
        file: unit.path.clone(),
        imports,
        exports,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerViolation {
    pub source: String,
    pub target: String,
    pub source_layer: u8,
    pub target_layer: u8,
    /// Line of the first import statement creating the edge.
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighCoupling {
    pub module: String,
    pub dependency_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Each cycle lists its modules, rotated so the smallest name is first.
    pub cycles: Vec<Vec<String>>,
    pub layer_violations: Vec<LayerViolation>,
    pub high_coupling: Vec<HighCoupling>,
}

/// Rotate a cycle so the lexicographically smallest module comes first.
/// Makes cycles comparable regardless of which DFS root discovered them.
fn normalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if let Some(min_pos) = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
    {
        cycle.rotate_left(min_pos);
    }
    cycle
}

/// Layer ordinal of a module: the rank of the first layer keyword its name
/// contains, if any.
fn layer_of(module: &str, layers: &BTreeMap<String, u8>) -> Option<u8> {
    layers
        .iter()
        .find(|(keyword, _)| module.contains(keyword.as_str()))
        .map(|(_, rank)| *rank)
}

/// Analyze the merged per-module records: cycles, layering, coupling.
pub fn analyze_dependencies(records: &[ModuleRecord], config: &AnalysisConfig) -> DependencyReport {
    // merge per-file records into per-module import sets, in name order
    let mut modules: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for record in records {
        modules.entry(&record.module).or_default();
    }
    let known: FxHashSet<&str> = modules.keys().copied().collect();
    // first line each (source, target) edge appears on, for reporting
    let mut edge_lines: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    for record in records {
        let entry = modules.entry(&record.module).or_default();
        for import in &record.imports {
            if import.kind == ImportKind::Relative {
                continue;
            }
            if import.target != record.module {
                entry.insert(&import.target);
                edge_lines
                    .entry((&record.module, &import.target))
                    .or_insert(import.line);
            }
        }
    }

    // coupling counts every distinct imported module, internal or not
    let mut high_coupling = Vec::new();
    for (module, deps) in &modules {
        if deps.len() > config.max_module_dependencies {
            high_coupling.push(HighCoupling {
                module: (*module).to_string(),
                dependency_count: deps.len(),
            });
        }
    }

    // layer check over classified module pairs
    let mut layer_violations = Vec::new();
    for (module, deps) in &modules {
        let Some(source_layer) = layer_of(module, &config.layers) else {
            continue;
        };
        for dep in deps {
            if !known.contains(dep) {
                continue;
            }
            let Some(target_layer) = layer_of(dep, &config.layers) else {
                continue;
            };
            if source_layer < target_layer {
                layer_violations.push(LayerViolation {
                    source: (*module).to_string(),
                    target: (*dep).to_string(),
                    source_layer,
                    target_layer,
                    line: edge_lines.get(&(*module, *dep)).copied().unwrap_or(0),
                });
            }
        }
    }

    // cycle graph over internal edges only
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index_of: FxHashMap<&str, NodeIndex> = FxHashMap::default();
    for module in modules.keys() {
        index_of.insert(module, graph.add_node(module));
    }
    for (module, deps) in &modules {
        for dep in deps {
            if let Some(&target) = index_of.get(dep) {
                graph.add_edge(index_of[module], target, ());
            }
        }
    }

    let mut seen: FxHashSet<Vec<String>> = FxHashSet::default();
    let mut cycles = Vec::new();
    for cycle in find_cycles(&graph) {
        let normalized = normalize_cycle(cycle);
        if seen.insert(normalized.clone()) {
            cycles.push(normalized);
        }
    }

    DependencyReport {
        cycles,
        layer_violations,
        high_coupling,
    }
}

/// First cycle reachable from each DFS root, found with an explicit stack.
fn find_cycles(graph: &DiGraph<&str, ()>) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();

    'roots: for root in graph.node_indices() {
        let mut visited: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut path: Vec<NodeIndex> = Vec::new();
        // frame: node plus its neighbor list and a cursor into it
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

        visited.insert(root);
        path.push(root);
        stack.push((root, graph.neighbors(root).collect(), 0));

        while let Some((_, neighbors, cursor)) = stack.last_mut() {
            if *cursor >= neighbors.len() {
                stack.pop();
                path.pop();
                continue;
            }
            let next = neighbors[*cursor];
            *cursor += 1;

            if let Some(start) = path.iter().position(|n| *n == next) {
                cycles.push(
                    path[start..]
                        .iter()
                        .map(|n| graph[*n].to_string())
                        .collect(),
                );
                continue 'roots;
            }
            if visited.insert(next) {
                path.push(next);
                stack.push((next, graph.neighbors(next).collect(), 0));
            }
        }
    }

    cycles
}
