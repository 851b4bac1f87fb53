//! Configuration for the `noisewise` CLI.
//!
//! Supports loading configuration from:
//! 1. A YAML file (`--config PATH`, or `~/.noisewise/config.yaml` if present)
//! 2. Environment variables (with `NOISEWISE_` prefix)
//!
//! Precedence (highest to lowest): command-line flags, environment
//! variables, configuration file, default values.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extrapolation defaults
    #[serde(default)]
    pub zne: ZneConfig,

    /// Layout selection defaults
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Extrapolation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZneConfig {
    /// Fit method: "linear", "quadratic", "exponential"
    #[serde(default = "default_zne_method")]
    pub method: String,

    /// Points in the sampled fit curve
    #[serde(default = "default_curve_samples")]
    pub samples: usize,

    /// Evaluation budget for the exponential fit
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
}

/// Layout selection defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Cap on enumerated embeddings (unbounded if absent)
    #[serde(default)]
    pub max_mappings: Option<usize>,

    /// Rank embeddings by error score
    #[serde(default = "default_true")]
    pub score_layouts: bool,
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_zne_method() -> String {
    "linear".to_string()
}

fn default_curve_samples() -> usize {
    noisewise_zne::DEFAULT_CURVE_SAMPLES
}

fn default_max_evaluations() -> usize {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ZneConfig {
    fn default() -> Self {
        Self {
            method: default_zne_method(),
            samples: default_curve_samples(),
            max_evaluations: default_max_evaluations(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_mappings: None,
            score_layouts: true,
        }
    }
}

impl Config {
    /// Parse configuration from YAML.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(source).context("Invalid configuration YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present, otherwise defaults apply. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let mut config = match file {
            Some(p) => {
                let source = fs::read_to_string(&p)
                    .with_context(|| format!("Failed to read config file: {}", p.display()))?;
                Self::from_yaml_str(&source)
                    .with_context(|| format!("Failed to load config file: {}", p.display()))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Default configuration path (`~/.noisewise/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".noisewise").join("config.yaml"))
    }

    /// Apply `NOISEWISE_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(level) = lookup("NOISEWISE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("NOISEWISE_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(method) = lookup("NOISEWISE_ZNE_METHOD") {
            self.zne.method = method;
        }
        if let Some(max) = lookup("NOISEWISE_MAX_MAPPINGS") {
            let max = max
                .parse()
                .with_context(|| format!("NOISEWISE_MAX_MAPPINGS is not a number: '{max}'"))?;
            self.layout.max_mappings = Some(max);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "Unknown log level: '{other}'. Available: trace, debug, info, warn, error"
            ),
        }
        match self.logging.format.to_lowercase().as_str() {
            "console" | "json" => {}
            other => anyhow::bail!("Unknown log format: '{other}'. Available: console, json"),
        }
        Ok(())
    }
}
