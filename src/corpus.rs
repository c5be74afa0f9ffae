//! Corpus discovery.

use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

use crate::harness::{HarnessError, Task};

/// List the samples directly inside `dir` whose file name matches `pattern`.
///
/// Subdirectories are not descended into and hidden files (leading `.`) are
/// skipped. Tasks come back sorted by path so that runs over the same corpus
/// see the same order.
pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<Task>, HarnessError> {
    let matcher = file_name_matcher(pattern)?;

    let entries = fs::read_dir(dir).map_err(|source| HarnessError::CorpusUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| HarnessError::CorpusUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if matcher.is_match(&name) {
            paths.push(path);
        }
    }

    paths.sort();
    tracing::debug!(dir = %dir.display(), count = paths.len(), "discovered samples");
    Ok(paths.into_iter().map(Task::new).collect())
}

fn file_name_matcher(pattern: &str) -> Result<GlobMatcher, HarnessError> {
    Ok(Glob::new(pattern)?.compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_only_matching_files_directly_inside() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.js");
        touch(tmp.path(), "a.js");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "module.mjs");
        fs::create_dir(tmp.path().join("nested")).unwrap();
        touch(&tmp.path().join("nested"), "deep.js");
        fs::create_dir(tmp.path().join("dir.js")).unwrap();

        let tasks = discover(tmp.path(), "*.js").unwrap();
        let names: Vec<_> = tasks
            .iter()
            .map(|t| t.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.js", "b.js"]);
    }

    #[test]
    fn test_hidden_files_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), ".hidden.js");
        touch(tmp.path(), ".js");
        touch(tmp.path(), "visible.js");

        let tasks = discover(tmp.path(), "*.js").unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].path.ends_with("visible.js"));
    }

    #[test]
    fn test_custom_pattern() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.js");
        touch(tmp.path(), "b.mjs");

        let tasks = discover(tmp.path(), "*.mjs").unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].path.ends_with("b.mjs"));
    }

    #[test]
    fn test_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(tmp.path(), "*.js").unwrap().is_empty());
    }

    #[test]
    fn test_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = discover(&tmp.path().join("missing"), "*.js").unwrap_err();
        assert!(matches!(err, HarnessError::CorpusUnreadable { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = discover(tmp.path(), "[").unwrap_err();
        assert!(matches!(err, HarnessError::Pattern(_)));
    }
}
