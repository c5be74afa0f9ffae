//! Configuration for the harness and the rewriter
//!
//! Three layers, later ones win:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. CLI flags
//!
//! The resulting structs are built once at start-up and passed explicitly.

mod defaults;

pub use defaults::{
    default_jobs, BuiltinDefaults, DEFAULT_COMPILE_FLAG, DEFAULT_MARKER, DEFAULT_NEEDLE,
    DEFAULT_PATTERN, DEFAULT_SUCCESS_PATTERN, DEFAULT_TIMEOUT_SECONDS, DEFAULT_VERIFIER,
};

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::timeout::TimeoutConfig;

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// `[compile]` table of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompileSection {
    pub jobs: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub pattern: Option<String>,
    pub compile_flag: Option<String>,
}

/// `[rewrite]` table of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewriteSection {
    pub marker: Option<String>,
    pub needle: Option<String>,
    pub verifier: Option<Vec<String>>,
    pub success_pattern: Option<String>,
}

/// Contents of a config file. Both tables are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub compile: CompileSection,

    #[serde(default)]
    pub rewrite: RewriteSection,
}

impl ConfigFile {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

/// Settings for one corpus compilation run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Compiler executable.
    pub tool: PathBuf,

    /// Directory scanned (non-recursively) for samples.
    pub corpus_dir: PathBuf,

    /// Worker threads.
    pub jobs: usize,

    /// Per-sample wall-clock budget.
    pub timeout: TimeoutConfig,

    /// File-name glob.
    pub pattern: String,

    /// Flag placed before the sample path.
    pub compile_flag: String,
}

impl HarnessConfig {
    /// Built-in defaults for the given tool and corpus.
    pub fn new(tool: impl Into<PathBuf>, corpus_dir: impl Into<PathBuf>) -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            tool: tool.into(),
            corpus_dir: corpus_dir.into(),
            jobs: defaults.jobs,
            timeout: TimeoutConfig {
                seconds: defaults.timeout_seconds,
            },
            pattern: defaults.pattern,
            compile_flag: defaults.compile_flag,
        }
    }

    /// Apply the `[compile]` table of a config file.
    pub fn with_file(mut self, file: &ConfigFile) -> Self {
        let section = &file.compile;
        if let Some(jobs) = section.jobs {
            self.jobs = jobs;
        }
        if let Some(seconds) = section.timeout_seconds {
            self.timeout.seconds = seconds;
        }
        if let Some(ref pattern) = section.pattern {
            self.pattern = pattern.clone();
        }
        if let Some(ref flag) = section.compile_flag {
            self.compile_flag = flag.clone();
        }
        self
    }

    /// Apply CLI overrides.
    pub fn with_overrides(mut self, jobs: Option<usize>, timeout_seconds: Option<u64>) -> Self {
        if let Some(jobs) = jobs {
            self.jobs = jobs;
        }
        if let Some(seconds) = timeout_seconds {
            self.timeout.seconds = seconds;
        }
        self
    }

    /// Per-sample budget as a `Duration`.
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.duration()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::ValidationError(
                "jobs must be at least 1".to_string(),
            ));
        }

        self.timeout
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.pattern.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "pattern must not be empty".to_string(),
            ));
        }

        globset::Glob::new(&self.pattern).map_err(|e| {
            ConfigError::ValidationError(format!("invalid pattern '{}': {}", self.pattern, e))
        })?;

        Ok(())
    }
}

/// Settings for one fixture rewrite run.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    /// Directory walked recursively.
    pub root: PathBuf,

    /// Directory name substituted for `needle`.
    pub replacement: String,

    /// Only lines starting with this prefix are rewritten.
    pub marker: String,

    /// Literal substring replaced in directive lines.
    pub needle: String,

    /// Verifier program and leading arguments.
    pub verifier: Vec<String>,

    /// Regex the verifier's stdout must match.
    pub success_pattern: String,
}

impl RewriteConfig {
    /// Built-in defaults for the given root and replacement.
    pub fn new(root: impl Into<PathBuf>, replacement: impl Into<String>) -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            root: root.into(),
            replacement: replacement.into(),
            marker: defaults.marker,
            needle: defaults.needle,
            verifier: defaults.verifier,
            success_pattern: defaults.success_pattern,
        }
    }

    /// Apply the `[rewrite]` table of a config file.
    pub fn with_file(mut self, file: &ConfigFile) -> Self {
        let section = &file.rewrite;
        if let Some(ref marker) = section.marker {
            self.marker = marker.clone();
        }
        if let Some(ref needle) = section.needle {
            self.needle = needle.clone();
        }
        if let Some(ref verifier) = section.verifier {
            self.verifier = verifier.clone();
        }
        if let Some(ref pattern) = section.success_pattern {
            self.success_pattern = pattern.clone();
        }
        self
    }

    /// Replace the verifier with a whitespace-separated command line.
    pub fn with_verifier_command(mut self, command: Option<&str>) -> Self {
        if let Some(command) = command {
            self.verifier = command.split_whitespace().map(|s| s.to_string()).collect();
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "marker must not be empty".to_string(),
            ));
        }

        if self.needle.is_empty() {
            return Err(ConfigError::ValidationError(
                "needle must not be empty".to_string(),
            ));
        }

        if self.verifier.is_empty() {
            return Err(ConfigError::ValidationError(
                "verifier command must not be empty".to_string(),
            ));
        }

        regex_lite::Regex::new(&self.success_pattern).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid success_pattern '{}': {}",
                self.success_pattern, e
            ))
        })?;

        Ok(())
    }
}
