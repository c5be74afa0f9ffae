//! Outcomes, exit codes and the aggregated compile report.

mod failure;
mod report;

pub use failure::{ExitCode, Outcome};
pub use report::{CompileReport, FailureCategory, REPORT_SCHEMA_ID, REPORT_SCHEMA_VERSION};
