//! Corpus compilation harness
//!
//! Compiles every sample of a corpus directory with the external tool on a
//! fixed-size worker pool. Tasks are independent: each worker runs one task
//! to completion (or to its timeout) before picking up the next, and results
//! are only aggregated after every worker has finished.
//!
//! A task never fails the run. Timeouts and spawn errors are recorded as
//! failing [`TaskResult`]s like any other compiler failure.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fuzzil_classifier::{classify, RuleCode};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::HarnessConfig;
use crate::corpus;
use crate::invoke::{Completion, Invocation};
use crate::summary::Outcome;

/// Category message for a sample that exceeded its budget.
pub const TIMEOUT_MESSAGE: &str = "Timeout";

/// Errors that stop a run before any sample is compiled.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot read corpus directory {path}: {source}")]
    CorpusUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid sample pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One sample to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub path: PathBuf,
}

impl Task {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Terminal result of one task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub outcome: Outcome,

    /// Compiler exit code. `None` on timeout, spawn failure or death by signal.
    pub exit_code: Option<i32>,

    /// Classifier rule behind `message`. `None` for timeouts and spawn failures.
    pub rule: Option<RuleCode>,

    /// Category key.
    pub message: String,

    pub path: PathBuf,

    pub elapsed: Duration,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    fn timed_out(path: &Path, elapsed: Duration) -> Self {
        Self {
            outcome: Outcome::TimedOut,
            exit_code: None,
            rule: None,
            message: TIMEOUT_MESSAGE.to_string(),
            path: path.to_path_buf(),
            elapsed,
        }
    }

    fn invocation_failed(path: &Path, description: String, elapsed: Duration) -> Self {
        Self {
            outcome: Outcome::InvocationFailed,
            exit_code: None,
            rule: None,
            message: description,
            path: path.to_path_buf(),
            elapsed,
        }
    }
}

/// Receives a callback as each task finishes.
///
/// Called from worker threads, in completion order.
pub trait Progress: Sync {
    fn task_finished(&self, result: &TaskResult);
}

/// Prints one `.` per finished task to stdout, flushed immediately.
#[derive(Debug, Default)]
pub struct DotProgress;

impl Progress for DotProgress {
    fn task_finished(&self, _result: &TaskResult) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(b".");
        let _ = out.flush();
    }
}

/// Discards progress.
#[derive(Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn task_finished(&self, _result: &TaskResult) {}
}

/// Results of a complete run, in task order.
#[derive(Debug)]
pub struct CompileRun {
    pub results: Vec<TaskResult>,
    pub duration: Duration,
}

/// Compile one sample.
pub fn compile_one(config: &HarnessConfig, task: &Task) -> TaskResult {
    let started = Instant::now();
    let invocation = Invocation::compile(&config.tool, &config.compile_flag, &task.path);

    let result = match invocation.run_with_timeout(config.timeout_duration()) {
        Ok(Completion::Exited(captured)) => {
            let classification = classify(&captured.stdout);
            let outcome = if captured.success() {
                Outcome::Succeeded
            } else {
                Outcome::Failed
            };
            if !captured.success() && classification.is_unrecognized() {
                tracing::debug!(path = %task.path.display(), "compiler output matched no rule");
            }
            TaskResult {
                outcome,
                exit_code: captured.code(),
                rule: Some(classification.rule),
                message: classification.message,
                path: task.path.clone(),
                elapsed: captured.elapsed,
            }
        }
        Ok(Completion::TimedOut { elapsed }) => TaskResult::timed_out(&task.path, elapsed),
        Err(e) => TaskResult::invocation_failed(&task.path, e.to_string(), started.elapsed()),
    };

    tracing::debug!(
        path = %result.path.display(),
        outcome = ?result.outcome,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "compiled sample"
    );
    result
}

/// Compile `tasks` on a pool of `config.jobs` threads.
///
/// Returns one result per task, in task order.
pub fn run_tasks(
    config: &HarnessConfig,
    tasks: &[Task],
    progress: &dyn Progress,
) -> Result<Vec<TaskResult>, HarnessError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .thread_name(|i| format!("compile-{}", i))
        .build()?;

    Ok(pool.install(|| {
        tasks
            .par_iter()
            .with_max_len(1)
            .map(|task| {
                let result = compile_one(config, task);
                progress.task_finished(&result);
                result
            })
            .collect()
    }))
}

/// Discover the corpus and compile all of it.
pub fn run(config: &HarnessConfig, progress: &dyn Progress) -> Result<CompileRun, HarnessError> {
    let started = Instant::now();
    let tasks = corpus::discover(&config.corpus_dir, &config.pattern)?;

    tracing::info!(
        corpus = %config.corpus_dir.display(),
        samples = tasks.len(),
        jobs = config.jobs,
        timeout_s = config.timeout.seconds,
        "compiling corpus"
    );

    let results = run_tasks(config, &tasks, progress)?;
    tracing::info!(
        samples = results.len(),
        failed = results.iter().filter(|r| !r.is_success()).count(),
        "corpus compiled"
    );
    Ok(CompileRun {
        results,
        duration: started.elapsed(),
    })
}
