//! Corpus compile report (human text and compile_report.json)

use chrono::{DateTime, Utc};
use fuzzil_classifier::RuleCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::failure::Outcome;
use crate::harness::TaskResult;

/// Schema version for compile_report.json
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for compile_report.json
pub const REPORT_SCHEMA_ID: &str = "fuzzil-corpus/compile_report@1";

/// Failing samples that share a category message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCategory {
    /// Category key
    pub message: String,

    /// Classifier rule of the first sample in this category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleCode>,

    /// Number of failing samples
    pub count: usize,

    /// First failing sample encountered, in task order
    pub example: PathBuf,
}

/// Aggregated view over all task results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileReport {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When the report was created
    pub created_at: DateTime<Utc>,

    /// Number of samples compiled
    pub total: usize,

    /// Samples whose compiler exited 0
    pub succeeded: usize,

    /// Samples whose compiler exited non-zero
    pub failed: usize,

    /// Samples that hit the per-sample budget
    pub timed_out: usize,

    /// Samples whose compiler could not be run
    pub invocation_errors: usize,

    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,

    /// Failure categories, ascending by count
    pub categories: Vec<FailureCategory>,
}

impl CompileReport {
    /// Fold completed results into a report.
    ///
    /// Single pass over the full result list; every non-success lands in
    /// exactly one category, so `succeeded + sum(counts) == total`.
    pub fn from_results(results: &[TaskResult], duration: Duration) -> Self {
        let mut succeeded = 0;
        let mut failed = 0;
        let mut timed_out = 0;
        let mut invocation_errors = 0;

        let mut categories: Vec<FailureCategory> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for result in results {
            match result.outcome {
                Outcome::Succeeded => {
                    succeeded += 1;
                    continue;
                }
                Outcome::Failed => failed += 1,
                Outcome::TimedOut => timed_out += 1,
                Outcome::InvocationFailed => invocation_errors += 1,
            }

            match index.get(result.message.as_str()) {
                Some(&i) => categories[i].count += 1,
                None => {
                    index.insert(result.message.as_str(), categories.len());
                    categories.push(FailureCategory {
                        message: result.message.clone(),
                        rule: result.rule,
                        count: 1,
                        example: result.path.clone(),
                    });
                }
            }
        }

        categories.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.message.cmp(&b.message)));

        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            schema_id: REPORT_SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            total: results.len(),
            succeeded,
            failed,
            timed_out,
            invocation_errors,
            duration_ms: duration.as_millis() as u64,
            categories,
        }
    }

    /// Look up a category by message
    pub fn category(&self, message: &str) -> Option<&FailureCategory> {
        self.categories.iter().find(|c| c.message == message)
    }

    /// Render the operator-facing summary.
    pub fn to_human(&self) -> String {
        let mut out = String::from("\nFailures:\n");
        for category in &self.categories {
            out.push_str(&format!(
                "{}: {} (e.g. {})\n",
                category.message,
                category.count,
                category.example.display()
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "Compiled {}/{} samples\n",
            self.succeeded, self.total
        ));
        out
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write compile_report.json, creating parent directories
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }

    /// Load a previously written report
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: Outcome, message: &str, path: &str) -> TaskResult {
        TaskResult {
            outcome,
            exit_code: match outcome {
                Outcome::Succeeded => Some(0),
                Outcome::Failed => Some(1),
                _ => None,
            },
            rule: None,
            message: message.to_string(),
            path: PathBuf::from(path),
            elapsed: Duration::ZERO,
        }
    }

    fn sample_results() -> Vec<TaskResult> {
        vec![
            result(Outcome::Succeeded, "", "ok1.js"),
            result(Outcome::Failed, "Syntax Error", "s1.js"),
            result(Outcome::TimedOut, "Timeout", "t1.js"),
            result(Outcome::Failed, "Syntax Error", "s2.js"),
            result(Outcome::Succeeded, "Syntax Error", "ok2.js"),
            result(Outcome::Failed, "Syntax Error", "s3.js"),
            result(Outcome::InvocationFailed, "failed to run tool: denied", "i1.js"),
            result(Outcome::Failed, "Unhandled node Foo", "u1.js"),
            result(Outcome::Failed, "Unhandled node Foo", "u2.js"),
        ]
    }

    #[test]
    fn test_counts_add_up() {
        let results = sample_results();
        let report = CompileReport::from_results(&results, Duration::from_millis(5));
        let sum: usize = report.categories.iter().map(|c| c.count).sum();
        assert_eq!(report.succeeded + sum, report.total);
        assert_eq!(report.total, 9);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 5);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.invocation_errors, 1);
        assert_eq!(report.duration_ms, 5);
    }

    #[test]
    fn test_success_with_failure_message_not_counted() {
        let report = CompileReport::from_results(&sample_results(), Duration::ZERO);
        assert_eq!(report.category("Syntax Error").unwrap().count, 3);
    }

    #[test]
    fn test_categories_sorted_ascending() {
        let report = CompileReport::from_results(&sample_results(), Duration::ZERO);
        let counts: Vec<usize> = report.categories.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![1, 1, 2, 3]);
        assert_eq!(report.categories.last().unwrap().message, "Syntax Error");
    }

    #[test]
    fn test_example_is_first_encountered() {
        let report = CompileReport::from_results(&sample_results(), Duration::ZERO);
        assert_eq!(
            report.category("Syntax Error").unwrap().example,
            PathBuf::from("s1.js")
        );
        assert_eq!(
            report.category("Unhandled node Foo").unwrap().example,
            PathBuf::from("u1.js")
        );
    }

    #[test]
    fn test_human_rendering() {
        let results = vec![
            result(Outcome::Succeeded, "", "a.js"),
            result(Outcome::Succeeded, "", "b.js"),
            result(Outcome::Failed, "Stack overflow during parsing", "c.js"),
        ];
        let report = CompileReport::from_results(&results, Duration::ZERO);
        assert_eq!(
            report.to_human(),
            "\nFailures:\nStack overflow during parsing: 1 (e.g. c.js)\n\nCompiled 2/3 samples\n"
        );
    }

    #[test]
    fn test_empty_report() {
        let report = CompileReport::from_results(&[], Duration::ZERO);
        assert_eq!(report.total, 0);
        assert!(report.categories.is_empty());
        assert!(report.to_human().ends_with("Compiled 0/0 samples\n"));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out/compile_report.json");
        let mut results = sample_results();
        results[1].rule = Some(RuleCode::SyntaxError);

        let report = CompileReport::from_results(&results, Duration::ZERO);
        report.write_to_file(&path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"schema_id\": \"fuzzil-corpus/compile_report@1\""));
        assert!(json.contains("\"rule\": \"SYNTAX_ERROR\""));

        let loaded = CompileReport::from_file(&path).unwrap();
        assert_eq!(loaded.categories, report.categories);
        assert_eq!(loaded.total, report.total);
    }
}
