//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for every configuration value. The config file and CLI
//! flags are applied on top of these.

/// Per-sample compile budget in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// File-name pattern for corpus discovery.
pub const DEFAULT_PATTERN: &str = "*.js";

/// Flag passed to the compiler before the sample path.
pub const DEFAULT_COMPILE_FLAG: &str = "--compile";

/// Prefix of the directive lines the rewriter touches.
pub const DEFAULT_MARKER: &str = "d8.file.execute";

/// Substring replaced inside directive lines.
pub const DEFAULT_NEEDLE: &str = "test/mjsunit";

/// Command the rewriter uses to verify a fixture (before `--compile <file>`).
pub const DEFAULT_VERIFIER: &[&str] = &["swift", "run", "-c", "debug", "FuzzILTool"];

/// Verifier stdout must match this for the fixture to count as compiled.
pub const DEFAULT_SUCCESS_PATTERN: &str = r"FuzzIL program written to (.*).fzil";

/// Built-in default configuration values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDefaults {
    /// Worker count (default: half the available cores, at least 1)
    pub jobs: usize,

    /// Per-sample timeout in seconds (default: 10)
    pub timeout_seconds: u64,

    /// Discovery glob (default: "*.js")
    pub pattern: String,

    /// Compile flag (default: "--compile")
    pub compile_flag: String,

    /// Directive prefix (default: "d8.file.execute")
    pub marker: String,

    /// Replaced substring (default: "test/mjsunit")
    pub needle: String,

    /// Verifier command
    pub verifier: Vec<String>,

    /// Verifier success regex
    pub success_pattern: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            pattern: DEFAULT_PATTERN.to_string(),
            compile_flag: DEFAULT_COMPILE_FLAG.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            needle: DEFAULT_NEEDLE.to_string(),
            verifier: DEFAULT_VERIFIER.iter().map(|s| s.to_string()).collect(),
            success_pattern: DEFAULT_SUCCESS_PATTERN.to_string(),
        }
    }
}

/// Half the available processing units, never less than one.
pub fn default_jobs() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.timeout_seconds, 10);
        assert_eq!(defaults.pattern, "*.js");
        assert_eq!(defaults.compile_flag, "--compile");
        assert_eq!(defaults.marker, "d8.file.execute");
        assert_eq!(defaults.needle, "test/mjsunit");
        assert_eq!(
            defaults.verifier,
            vec!["swift", "run", "-c", "debug", "FuzzILTool"]
        );
    }

    #[test]
    fn test_default_jobs_at_least_one() {
        assert!(default_jobs() >= 1);
    }
}
