//! Violation shaping and the shared build log.
//!
//! The analysis step attaches a `FileAnalysis` to each file; files with
//! violations are handed to the configured `Reporter`, which turns them into
//! structured `BuildEntry` records on the shared `BuildLog`. The default
//! reporter maps every violation to a warning or an error depending on the
//! `display_warnings` configuration flag.

use serde::{Deserialize, Serialize};

use crate::config::EffectiveConfig;
use crate::files::SourceFile;

/// A single rule violation found by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule ID/code (e.g. "no-unused-vars")
    pub rule: String,

    /// Human-readable message
    pub message: String,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based)
    pub column: usize,
}

/// Result of analyzing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Number of violations found
    pub violation_count: usize,

    /// The violations
    pub violations: Vec<Violation>,
}

impl FileAnalysis {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            violation_count: violations.len(),
            violations,
        }
    }

    /// Whether the file passed with zero violations
    pub fn clean(&self) -> bool {
        self.violation_count == 0
    }
}

/// Severity of a build-log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSeverity {
    Warning,
    Error,
}

impl BuildSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildSeverity::Warning => "warning",
            BuildSeverity::Error => "error",
        }
    }
}

/// One structured record on the build log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEntry {
    /// Entry severity
    pub severity: BuildSeverity,

    /// Root-relative file path
    pub path: String,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based)
    pub column: usize,

    /// Rule that was violated, or "lintstream" for task-level errors
    pub rule: String,

    /// Human-readable message
    pub message: String,
}

/// The shared build-logging channel.
///
/// Collects structured entries and mirrors each one to `tracing` so the
/// surrounding build host sees them as they happen.
#[derive(Debug, Default)]
pub struct BuildLog {
    entries: Vec<BuildEntry>,
}

impl BuildLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, mirroring it to the tracing subscriber
    pub fn push(&mut self, entry: BuildEntry) {
        match entry.severity {
            BuildSeverity::Warning => tracing::warn!(
                "{}:{}:{} [{}] {}",
                entry.path,
                entry.line,
                entry.column,
                entry.rule,
                entry.message
            ),
            BuildSeverity::Error => tracing::error!(
                "{}:{}:{} [{}] {}",
                entry.path,
                entry.line,
                entry.column,
                entry.rule,
                entry.message
            ),
        }
        self.entries.push(entry);
    }

    /// Append a task-level error for a file (e.g. unsupported streamed
    /// input). Always an error, regardless of `display_warnings`.
    pub fn push_task_error(&mut self, path: &str, message: &str) {
        self.push(BuildEntry {
            severity: BuildSeverity::Error,
            path: path.to_string(),
            line: 1,
            column: 1,
            rule: "lintstream".to_string(),
            message: message.to_string(),
        });
    }

    pub fn entries(&self) -> &[BuildEntry] {
        &self.entries
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == BuildSeverity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == BuildSeverity::Error)
            .count()
    }

    /// Render entries grouped by file
    pub fn render_text(&self) -> String {
        let mut output = String::new();

        let mut current_file = String::new();
        for entry in &self.entries {
            if entry.path != current_file {
                current_file = entry.path.clone();
                output.push_str(&format!("\n[{}]\n", current_file));
            }

            output.push_str(&format!(
                "  {}:{} {} [{}] {}\n",
                entry.line,
                entry.column,
                entry.severity.as_str(),
                entry.rule,
                entry.message
            ));
        }

        output
    }
}

/// Pluggable violation reporter.
///
/// Invoked only for files with at least one violation, with the analysis
/// result, the file, the active configuration, and the shared build log.
pub trait Reporter {
    fn report(
        &mut self,
        analysis: &FileAnalysis,
        file: &SourceFile,
        config: &EffectiveConfig,
        log: &mut BuildLog,
    );
}

/// Default reporter: one build-log entry per violation, severity chosen by
/// the `display_warnings` flag
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(
        &mut self,
        analysis: &FileAnalysis,
        file: &SourceFile,
        config: &EffectiveConfig,
        log: &mut BuildLog,
    ) {
        let severity = if config.display_warnings {
            BuildSeverity::Warning
        } else {
            BuildSeverity::Error
        };

        for violation in &analysis.violations {
            log.push(BuildEntry {
                severity,
                path: file.relative.clone(),
                line: violation.line,
                column: violation.column,
                rule: violation.rule.clone(),
                message: violation.message.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn analysis_with_one() -> FileAnalysis {
        FileAnalysis::from_violations(vec![Violation {
            rule: "no-undef".to_string(),
            message: "'x' is not defined".to_string(),
            line: 3,
            column: 5,
        }])
    }

    #[test]
    fn test_clean_analysis() {
        assert!(FileAnalysis::from_violations(Vec::new()).clean());
        assert!(!analysis_with_one().clean());
    }

    #[test]
    fn test_log_reporter_severity_flag() {
        let file = SourceFile::buffered("src/app.js", "x");
        let mut log = BuildLog::new();

        let as_errors = EffectiveConfig::new(BTreeMap::new(), Vec::new(), false);
        LogReporter.report(&analysis_with_one(), &file, &as_errors, &mut log);
        assert_eq!(log.error_count(), 1);
        assert_eq!(log.warning_count(), 0);

        let as_warnings = EffectiveConfig::new(BTreeMap::new(), Vec::new(), true);
        LogReporter.report(&analysis_with_one(), &file, &as_warnings, &mut log);
        assert_eq!(log.warning_count(), 1);
    }

    #[test]
    fn test_entry_carries_position_and_path() {
        let file = SourceFile::buffered("src/app.js", "x");
        let mut log = BuildLog::new();
        let config = EffectiveConfig::new(BTreeMap::new(), Vec::new(), false);

        LogReporter.report(&analysis_with_one(), &file, &config, &mut log);

        let entry = &log.entries()[0];
        assert_eq!(entry.path, "src/app.js");
        assert_eq!(entry.line, 3);
        assert_eq!(entry.column, 5);
        assert_eq!(entry.rule, "no-undef");
    }

    #[test]
    fn test_task_error_is_always_error() {
        let mut log = BuildLog::new();
        log.push_task_error("pipe.js", "streamed contents are not supported");

        assert_eq!(log.error_count(), 1);
        assert_eq!(log.entries()[0].rule, "lintstream");
    }

    #[test]
    fn test_render_text_groups_by_file() {
        let mut log = BuildLog::new();
        log.push_task_error("a.js", "first");
        log.push_task_error("a.js", "second");
        log.push_task_error("b.js", "third");

        let text = log.render_text();
        assert_eq!(text.matches("[a.js]").count(), 1);
        assert_eq!(text.matches("[b.js]").count(), 1);
    }
}
