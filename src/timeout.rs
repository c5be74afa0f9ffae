//! Per-sample timeout enforcement
//!
//! Every compile task gets an independent wall-clock budget. The deadline
//! only reports expiry; killing the child is up to the caller, so a timeout
//! in one task never affects its siblings.

use std::time::{Duration, Instant};

/// Upper bound for a per-sample budget (one day).
pub const MAX_TIMEOUT_SECONDS: u64 = 86_400;

/// Timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum wall-clock time per sample (default: 10)
    pub seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            seconds: crate::config::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl TimeoutConfig {
    /// `seconds` must be in (0, 86400]
    pub fn validate(&self) -> Result<(), TimeoutValidationError> {
        if self.seconds == 0 || self.seconds > MAX_TIMEOUT_SECONDS {
            return Err(TimeoutValidationError::OutOfBounds {
                value: self.seconds,
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

/// Timeout validation errors
#[derive(Debug, thiserror::Error)]
pub enum TimeoutValidationError {
    #[error("timeout_seconds must be in (0, 86400], got {value}")]
    OutOfBounds { value: u64 },
}

/// Timeout check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStatus {
    /// Budget not yet spent
    Ok,
    /// Wall-clock budget exceeded
    Expired,
}

impl TimeoutStatus {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutStatus::Expired)
    }
}

/// Wall-clock deadline for one subprocess.
///
/// `budget: None` never expires; the rewriter waits on its verifier this way.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// Start a deadline that expires after `budget`.
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Start a deadline that never expires.
    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            budget: None,
        }
    }

    pub fn check(&self) -> TimeoutStatus {
        match self.budget {
            Some(budget) if self.start.elapsed() >= budget => TimeoutStatus::Expired,
            _ => TimeoutStatus::Ok,
        }
    }

    /// Time since the deadline started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left before expiry. `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(self.start.elapsed()))
    }
}
