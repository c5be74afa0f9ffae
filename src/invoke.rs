//! Running the external compiler.
//!
//! Spawns one child process, drains stdout and stderr on reader threads so a
//! chatty child cannot stall on a full pipe, and polls for exit against a
//! [`Deadline`]. On expiry the child is killed and reaped.
//!
//! The deadline also covers draining the pipes after the child exits: a
//! background process started by the child can keep them open, and the
//! output is only complete once both pipes close.

use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::timeout::Deadline;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Errors from starting or waiting on a child.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Output of a child that ran to completion.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or `None` if the child was killed by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// How an invocation ended.
#[derive(Debug)]
pub enum Completion {
    Exited(Captured),
    TimedOut { elapsed: Duration },
}

/// A program plus arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// The `tool <flag> path` form the harness runs per sample.
    pub fn compile(tool: impl AsRef<OsStr>, flag: &str, path: impl AsRef<OsStr>) -> Self {
        Self::new(tool).arg(flag).arg(path)
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Run with a wall-clock budget. The child is killed if it overruns.
    pub fn run_with_timeout(&self, budget: Duration) -> Result<Completion, InvokeError> {
        self.run(Deadline::new(budget))
    }

    /// Run to completion with no time limit.
    pub fn run_to_completion(&self) -> Result<Captured, InvokeError> {
        match self.run(Deadline::unbounded())? {
            Completion::Exited(captured) => Ok(captured),
            // An unbounded deadline never expires.
            Completion::TimedOut { .. } => unreachable!("unbounded deadline expired"),
        }
    }

    fn run(&self, deadline: Deadline) -> Result<Completion, InvokeError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let (tx, rx) = mpsc::channel();
        drain(child.stdout.take(), Stream::Stdout, tx.clone());
        drain(child.stderr.take(), Stream::Stderr, tx);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    kill_and_reap(&mut child);
                    return Err(InvokeError::Wait {
                        program: self.program_name(),
                        source,
                    });
                }
            }

            if deadline.check().is_timeout() {
                kill_and_reap(&mut child);
                // Reader threads are left to finish on their own: a grandchild
                // may still hold the pipes open.
                tracing::debug!(program = %self.program_name(), "killed after timeout");
                return Ok(Completion::TimedOut {
                    elapsed: deadline.elapsed(),
                });
            }

            let nap = deadline
                .remaining()
                .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));
            thread::sleep(nap);
        };

        match collect(&rx, &deadline) {
            Some((stdout, stderr)) => Ok(Completion::Exited(Captured {
                status,
                stdout,
                stderr,
                elapsed: deadline.elapsed(),
            })),
            None => {
                tracing::debug!(
                    program = %self.program_name(),
                    "output pipes still open at timeout"
                );
                Ok(Completion::TimedOut {
                    elapsed: deadline.elapsed(),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    let Some(mut pipe) = pipe else {
        let _ = tx.send((stream, Vec::new()));
        return;
    };
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
}

/// Wait for both pipes to close. Returns `None` if the deadline expires first.
fn collect(rx: &Receiver<(Stream, Vec<u8>)>, deadline: &Deadline) -> Option<(String, String)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    for _ in 0..2 {
        let received = match deadline.remaining() {
            Some(left) => match rx.recv_timeout(left) {
                Ok(received) => received,
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(received) => received,
                Err(_) => break,
            },
        };
        match received {
            (Stream::Stdout, bytes) => stdout = bytes,
            (Stream::Stderr, bytes) => stderr = bytes,
        }
    }

    Some((
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
