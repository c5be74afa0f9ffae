//! Fixture rewriter
//!
//! Points the `d8.file.execute` imports of a fixture tree at a different
//! directory, then checks that every fixture still compiles.
//!
//! Two passes over the tree:
//! 1. Rewrite every `.js` file in place. Only lines starting with the marker
//!    are touched; every other byte is copied through unchanged.
//! 2. Run the verifier on each file, one at a time, with no timeout. The
//!    first file whose output lacks the success marker stops the run.
//!
//! The rewrite is destructive and not idempotent across different
//! replacement values.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex_lite::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::RewriteConfig;
use crate::invoke::{InvokeError, Invocation};

/// Errors that abort a rewrite run
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid success pattern: {0}")]
    Pattern(#[from] regex_lite::Error),

    #[error("verifier command is empty")]
    EmptyVerifier,

    #[error(transparent)]
    Invocation(#[from] InvokeError),

    #[error("Failed to compile {}", path.display())]
    UnexpectedOutput { path: PathBuf, stdout: String },
}

/// What a successful run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Files whose content changed
    pub rewritten: Vec<PathBuf>,
    /// Files the verifier accepted, in order
    pub verified: Vec<PathBuf>,
}

/// Rewrite one line. Lines not starting with `marker` come back borrowed.
pub fn rewrite_line<'a>(
    line: &'a str,
    marker: &str,
    needle: &str,
    replacement: &str,
) -> Cow<'a, str> {
    if line.starts_with(marker) && line.contains(needle) {
        Cow::Owned(line.replace(needle, replacement))
    } else {
        Cow::Borrowed(line)
    }
}

/// Rewrite a whole file's content, preserving line terminators.
pub fn rewrite_content<'a>(content: &'a str, config: &RewriteConfig) -> Cow<'a, str> {
    let mut out: Option<String> = None;
    let mut consumed = 0;

    for line in content.split_inclusive('\n') {
        let rewritten = rewrite_line(line, &config.marker, &config.needle, &config.replacement);
        match (&mut out, rewritten) {
            (Some(buf), r) => buf.push_str(&r),
            (None, Cow::Owned(r)) => {
                let mut buf = String::with_capacity(content.len() + 64);
                buf.push_str(&content[..consumed]);
                buf.push_str(&r);
                out = Some(buf);
            }
            (None, Cow::Borrowed(_)) => {}
        }
        consumed += line.len();
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(content),
    }
}

/// Rewrite a file in place. Returns true if the content changed.
///
/// Unchanged files are not written.
pub fn rewrite_file(path: &Path, config: &RewriteConfig) -> Result<bool, RewriteError> {
    let content = fs::read_to_string(path).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match rewrite_content(&content, config) {
        Cow::Borrowed(_) => Ok(false),
        Cow::Owned(new_content) => {
            fs::write(path, new_content).map_err(|source| RewriteError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(true)
        }
    }
}

/// Every `.js` file under `root`, recursively, in a stable order.
pub fn js_files(root: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| RewriteError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.to_string_lossy().ends_with(".js") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Runs the verifier on single fixtures.
#[derive(Debug)]
pub struct Verifier {
    program: String,
    leading_args: Vec<String>,
    success: Regex,
}

impl Verifier {
    pub fn from_config(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let (program, leading_args) = config
            .verifier
            .split_first()
            .ok_or(RewriteError::EmptyVerifier)?;
        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            success: Regex::new(&config.success_pattern)?,
        })
    }

    /// Compile `path` and check the output for the success marker.
    ///
    /// Blocks until the verifier exits. Its exit code is ignored.
    pub fn verify(&self, path: &Path) -> Result<(), RewriteError> {
        let captured = Invocation::new(&self.program)
            .args(&self.leading_args)
            .arg("--compile")
            .arg(path)
            .run_to_completion()?;

        if self.success.is_match(&captured.stdout) {
            Ok(())
        } else {
            Err(RewriteError::UnexpectedOutput {
                path: path.to_path_buf(),
                stdout: captured.stdout,
            })
        }
    }
}

/// Run both passes. `on_verified` is called after each accepted file.
pub fn run(
    config: &RewriteConfig,
    mut on_verified: impl FnMut(&Path),
) -> Result<RewriteSummary, RewriteError> {
    let verifier = Verifier::from_config(config)?;
    let mut summary = RewriteSummary::default();

    for path in js_files(&config.root)? {
        if rewrite_file(&path, config)? {
            tracing::info!(path = %path.display(), "rewrote imports");
            summary.rewritten.push(path);
        }
    }

    for path in js_files(&config.root)? {
        verifier.verify(&path)?;
        on_verified(&path);
        summary.verified.push(path);
    }

    Ok(summary)
}
