//! Task outcomes and process exit codes

/// How a single compile task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Compiler exited with status 0
    Succeeded,
    /// Compiler exited non-zero or was killed by a signal
    Failed,
    /// Per-sample budget exceeded; the compiler was killed
    TimedOut,
    /// Compiler could not be started or waited on
    InvocationFailed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

/// Process exit codes used by the binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed (for `compile`, regardless of sample failures)
    Success = 0,
    /// Fatal error: bad config, unreadable corpus, or a fixture that did not compile
    Failure = 1,
    /// `compile` called with the wrong number of arguments
    Usage = 255,
}

impl ExitCode {
    /// Get the integer value of the exit code
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Terminate the process with this code.
    pub fn exit(self) -> ! {
        std::process::exit(self.as_i32())
    }
}
