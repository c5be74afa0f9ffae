//! FuzzIL corpus tools
//!
//! Two utilities for maintaining a JavaScript corpus that is fed to the
//! FuzzIL compiler:
//!
//! - the compile harness (`compile`) runs the compiler over every sample of
//!   a corpus directory in parallel and reports which failure categories
//!   occurred and how often;
//! - the fixture rewriter (`auto_gen`) retargets `d8.file.execute` imports
//!   in a fixture tree and checks every fixture still compiles.
//!
//! Failure categorisation lives in the `fuzzil-classifier` crate.

pub mod config;
pub mod corpus;
pub mod harness;
pub mod invoke;
pub mod rewrite;
pub mod summary;
pub mod timeout;

pub use config::{ConfigError, ConfigFile, HarnessConfig, RewriteConfig};
pub use fuzzil_classifier::{classify, explain, Classification, Explanation, RuleCode};
pub use harness::{CompileRun, DotProgress, HarnessError, NoProgress, Progress, Task, TaskResult};
pub use rewrite::{RewriteError, RewriteSummary};
pub use summary::{CompileReport, ExitCode, Outcome};

/// Install the stderr log subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `warn`. Calling this more than
/// once is harmless.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
