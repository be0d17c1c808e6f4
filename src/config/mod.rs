//! Analysis configuration
//!
//! Every detector threshold, allow-list, layer keyword table, and weight
//! multiplier lives in one explicit [`AnalysisConfig`] struct constructed
//! once per run and passed by reference through the whole call chain. The
//! engine never reads configuration files or environment variables itself;
//! the CLI resolves a `connascent.toml` into a validated config and hands
//! it over.
//!
//! # Configuration Format
//!
//! ```toml
//! # connascent.toml
//!
//! max_positional_params = 4
//! max_methods = 20
//! max_complexity = 10
//! allowed_numbers = [0, 1, -1, 100]
//!
//! [layers]
//! infrastructure = 0
//! domain = 1
//! application = 2
//! presentation = 3
//!
//! [weights]
//! critical_base = 5.0
//! cross_module = 2.0
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration validation errors. Fatal at startup: the engine refuses to
/// run with nonsensical thresholds rather than silently misbehaving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("threshold `{0}` must be greater than zero")]
    ZeroThreshold(&'static str),
    #[error("ratio threshold `{name}` must be within (0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },
    #[error("weight multiplier `{name}` must be positive, got {value}")]
    NonPositiveWeight { name: &'static str, value: f64 },
    #[error("locality multipliers must be non-decreasing from same_function to cross_module")]
    LocalityNotMonotonic,
    #[error("layer table entry `{0}` has an empty keyword")]
    EmptyLayerKeyword(String),
    #[error("kind_multipliers table has an entry with an empty key")]
    EmptyWeightKey,
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Severity base weights and coupling multipliers for the scoring function.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub critical_base: f64,
    pub high_base: f64,
    pub medium_base: f64,
    pub low_base: f64,
    pub same_function: f64,
    pub same_class: f64,
    pub same_module: f64,
    pub cross_module: f64,
    /// Per-kind remediation-cost multipliers, keyed by kind name.
    /// Kinds absent from the table multiply by 1.0.
    pub kind_multipliers: BTreeMap<String, f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        let kind_multipliers = [
            ("name", 0.9),
            ("type", 0.8),
            ("meaning", 1.1),
            ("position", 1.3),
            ("algorithm", 1.4),
            ("identity", 1.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            critical_base: 5.0,
            high_base: 3.0,
            medium_base: 2.0,
            low_base: 1.0,
            same_function: 1.0,
            same_class: 1.2,
            same_module: 1.5,
            cross_module: 2.0,
            kind_multipliers,
        }
    }
}

/// Fully resolved analysis policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Positional parameters above this count are a CoP violation.
    pub max_positional_params: usize,
    /// Non-private method count above this is a god object (critical).
    pub max_methods: usize,
    /// Distinct `self.<attr>` writes above this is a god object (high).
    pub max_attributes: usize,
    /// Cyclomatic complexity above this is flagged.
    pub max_complexity: u32,
    /// Function bodies with at most this many statements are ignored by the
    /// algorithm-duplication detector.
    pub min_body_statements: usize,
    /// A global written from this many distinct functions is a CoE violation.
    pub max_global_writers: usize,
    /// A literal repeated this many times in one unit is a CoV violation.
    pub max_value_repeats: usize,
    /// A module importing more than this many distinct modules is flagged.
    pub max_module_dependencies: usize,
    /// LCOM above this emits a LowCohesion finding.
    pub lcom_threshold: f64,
    /// TCC below this (with more than 3 methods) emits a LowTCC finding.
    pub tcc_threshold: f64,
    /// Numeric literals considered non-magic.
    pub allowed_numbers: Vec<f64>,
    /// String literals considered non-magic.
    pub allowed_strings: Vec<String>,
    /// Directory names excluded from file discovery, in addition to
    /// gitignore rules.
    pub exclude_dirs: Vec<String>,
    /// Layer keyword table: path/name segment -> layer ordinal.
    /// A lower-numbered layer importing a higher-numbered one is a
    /// violation.
    pub layers: BTreeMap<String, u8>,
    pub weights: WeightConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let layers = [
            ("infrastructure", 0),
            ("data", 0),
            ("domain", 1),
            ("services", 1),
            ("application", 2),
            ("api", 2),
            ("presentation", 3),
            ("ui", 3),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            max_positional_params: 4,
            max_methods: 20,
            max_attributes: 15,
            max_complexity: 10,
            min_body_statements: 3,
            max_global_writers: 3,
            max_value_repeats: 3,
            max_module_dependencies: 10,
            lcom_threshold: 0.5,
            tcc_threshold: 0.3,
            allowed_numbers: vec![0.0, 1.0, -1.0],
            allowed_strings: vec![String::new()],
            exclude_dirs: vec![
                "__pycache__".to_string(),
                ".git".to_string(),
                "build".to_string(),
                "dist".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                ".tox".to_string(),
                "node_modules".to_string(),
            ],
            layers,
            weights: WeightConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Validate thresholds and weight tables.
    ///
    /// Called before any analysis starts; an error here is the only hard
    /// failure the engine propagates to the caller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_positional_params == 0 {
            return Err(ConfigError::ZeroThreshold("max_positional_params"));
        }
        if self.max_methods == 0 {
            return Err(ConfigError::ZeroThreshold("max_methods"));
        }
        if self.max_attributes == 0 {
            return Err(ConfigError::ZeroThreshold("max_attributes"));
        }
        if self.max_complexity == 0 {
            return Err(ConfigError::ZeroThreshold("max_complexity"));
        }
        if self.max_global_writers == 0 {
            return Err(ConfigError::ZeroThreshold("max_global_writers"));
        }
        if self.max_value_repeats == 0 {
            return Err(ConfigError::ZeroThreshold("max_value_repeats"));
        }
        if self.max_module_dependencies == 0 {
            return Err(ConfigError::ZeroThreshold("max_module_dependencies"));
        }

        for (name, value) in [
            ("lcom_threshold", self.lcom_threshold),
            ("tcc_threshold", self.tcc_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::RatioOutOfRange { name, value });
            }
        }

        let w = &self.weights;
        for (name, value) in [
            ("critical_base", w.critical_base),
            ("high_base", w.high_base),
            ("medium_base", w.medium_base),
            ("low_base", w.low_base),
            ("same_function", w.same_function),
            ("same_class", w.same_class),
            ("same_module", w.same_module),
            ("cross_module", w.cross_module),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveWeight { name, value });
            }
        }
        for (key, value) in &w.kind_multipliers {
            if *value <= 0.0 {
                return Err(ConfigError::NonPositiveWeight {
                    name: "kind_multipliers",
                    value: *value,
                });
            }
            if key.is_empty() {
                return Err(ConfigError::EmptyWeightKey);
            }
        }
        if !(w.same_function <= w.same_class
            && w.same_class <= w.same_module
            && w.same_module <= w.cross_module)
        {
            return Err(ConfigError::LocalityNotMonotonic);
        }

        for keyword in self.layers.keys() {
            if keyword.trim().is_empty() {
                return Err(ConfigError::EmptyLayerKeyword(keyword.clone()));
            }
        }

        Ok(())
    }

    /// Whether a numeric literal is on the allow-list.
    pub fn is_allowed_number(&self, value: f64) -> bool {
        self.allowed_numbers.iter().any(|n| *n == value)
    }

    /// Whether a string literal is on the allow-list.
    pub fn is_allowed_string(&self, value: &str) -> bool {
        self.allowed_strings.iter().any(|s| s == value)
    }
}

/// Load and validate a config file (TOML). Used by the CLI collaborator,
/// never by the engine itself.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: AnalysisConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    config.validate()?;
    debug!("loaded analysis config from {}", path.display());
    Ok(config)
}
