//! Source file matching and contents model.
//!
//! Files enter the pipeline either from disk (CLI: glob matching under the
//! project root) or pre-constructed by a build-pipeline host driving the
//! library API. Contents are always one of three shapes: empty, fully
//! buffered, or streamed - the analysis step only supports buffered input.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::cache::fnv1a_hash;
use crate::error::{LintStreamError, Result};
use crate::report::FileAnalysis;

/// Contents of a pipeline file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// Zero-length contents; passes through the pipeline untouched
    Empty,

    /// Fully buffered source text
    Buffered(String),

    /// Non-buffered input the task cannot rewind; unsupported
    Streamed,
}

impl FileContents {
    pub fn is_empty(&self) -> bool {
        matches!(self, FileContents::Empty)
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self, FileContents::Streamed)
    }

    /// Buffered source text, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FileContents::Buffered(source) => Some(source),
            _ => None,
        }
    }
}

/// A file flowing through the lint pipeline
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as matched (absolute when loaded from disk)
    pub path: PathBuf,

    /// Root-relative path used in reports and cache entries
    pub relative: String,

    /// File contents
    pub contents: FileContents,

    /// Analysis result attached by the per-file step
    pub analysis: Option<FileAnalysis>,
}

impl SourceFile {
    /// Load a file from disk; zero-length files load as `Empty`
    pub fn load(path: &Path, root: &Path) -> Result<SourceFile> {
        let source = fs::read_to_string(path).map_err(|e| LintStreamError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let contents = if source.is_empty() {
            FileContents::Empty
        } else {
            FileContents::Buffered(source)
        };

        Ok(SourceFile {
            path: path.to_path_buf(),
            relative: relative_to(path, root),
            contents,
            analysis: None,
        })
    }

    /// Construct a buffered in-memory file (library/host use)
    pub fn buffered(relative: impl Into<String>, source: impl Into<String>) -> SourceFile {
        let relative = relative.into();
        let source = source.into();
        let contents = if source.is_empty() {
            FileContents::Empty
        } else {
            FileContents::Buffered(source)
        };

        SourceFile {
            path: PathBuf::from(&relative),
            relative,
            contents,
            analysis: None,
        }
    }

    /// Construct a streamed (non-buffered) file (library/host use)
    pub fn streamed(relative: impl Into<String>) -> SourceFile {
        let relative = relative.into();
        SourceFile {
            path: PathBuf::from(&relative),
            relative,
            contents: FileContents::Streamed,
            analysis: None,
        }
    }

    /// Stable fingerprint of the buffered contents; `None` for empty or
    /// streamed files
    pub fn fingerprint(&self) -> Option<u64> {
        self.contents.as_str().map(fnv1a_hash)
    }
}

/// Root-relative display path for a file
fn relative_to(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

/// Match files under `root` against the glob list, in deterministic order.
///
/// Globs are applied as whitelist overrides on the directory walker, so
/// ignore-file semantics follow the walker's defaults and hidden files are
/// only matched when a pattern explicitly selects them.
pub fn match_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = OverrideBuilder::new(root);
    for pattern in patterns {
        builder
            .add(pattern)
            .map_err(|e| LintStreamError::ConfigError {
                message: format!("Invalid glob pattern {:?}: {}", pattern, e),
            })?;
    }
    let overrides = builder.build().map_err(|e| LintStreamError::ConfigError {
        message: format!("Failed to compile glob patterns: {}", e),
    })?;

    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).overrides(overrides).build() {
        match entry {
            Ok(entry) => {
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                tracing::debug!("Skipping walk entry: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.js");
        fs::write(&path, "").unwrap();

        let file = SourceFile::load(&path, dir.path()).unwrap();
        assert!(file.contents.is_empty());
        assert_eq!(file.relative, "blank.js");
        assert!(file.fingerprint().is_none());
    }

    #[test]
    fn test_load_buffers_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "var x = 1;\n").unwrap();

        let file = SourceFile::load(&path, dir.path()).unwrap();
        assert_eq!(file.contents.as_str(), Some("var x = 1;\n"));
        assert!(file.fingerprint().is_some());
    }

    #[test]
    fn test_fingerprint_tracks_contents() {
        let a = SourceFile::buffered("a.js", "var x = 1;");
        let b = SourceFile::buffered("b.js", "var x = 1;");
        let c = SourceFile::buffered("c.js", "var x = 2;");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_match_files_honors_globs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.js"), "x").unwrap();
        fs::write(dir.path().join("src/util.js"), "x").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "x").unwrap();

        let files = match_files(dir.path(), &["**/*.js".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "js"));
        // Deterministic order
        assert!(files[0] < files[1]);
    }

    #[test]
    fn test_match_files_empty_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.js"), "x").unwrap();

        let files = match_files(dir.path(), &[]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_match_files_bad_glob() {
        let dir = TempDir::new().unwrap();
        let err = match_files(dir.path(), &["{bad".to_string()]).unwrap_err();
        assert!(matches!(err, LintStreamError::ConfigError { .. }));
    }
}
