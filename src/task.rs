//! The lint pipeline task.
//!
//! Files flow through a sequential per-file step, one at a time: empty files
//! pass through untouched, streamed files are rejected and dropped, buffered
//! files are analyzed by the engine unless a prior clean result for the same
//! content and configuration is already cached. Violations go to the
//! configured reporter; they never abort the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::cache::{AnalysisCache, CacheScope};
use crate::config::{ConfigResolver, EffectiveConfig, TaskConfig};
use crate::engine::AnalysisEngine;
use crate::error::Result;
use crate::files::{match_files, FileContents, SourceFile};
use crate::report::{BuildLog, LogReporter, Reporter};

/// Totals for one task run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskSummary {
    /// Files entering the pipeline
    pub files_matched: usize,

    /// Files actually analyzed by the engine
    pub files_analyzed: usize,

    /// Files skipped because of a cache hit
    pub files_skipped: usize,

    /// Files dropped from the pipeline (streamed input)
    pub files_dropped: usize,

    /// Total violations across all analyzed files
    pub violation_count: usize,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Outcome of a run: totals plus the files forwarded downstream
#[derive(Debug)]
pub struct TaskOutcome {
    pub summary: TaskSummary,
    pub files: Vec<SourceFile>,
}

/// Where the task keeps its cache store
enum CacheMode {
    /// XDG cache base
    Default,
    /// Explicit base directory (build hosts, tests)
    InDir(PathBuf),
    /// No caching; every file is analyzed
    Disabled,
}

/// The build-pipeline lint task
pub struct LintTask {
    name: String,
    root: PathBuf,
    resolver: ConfigResolver,
    engine: Box<dyn AnalysisEngine>,
    reporter: Box<dyn Reporter>,
    cache_mode: CacheMode,
    log: BuildLog,
}

impl LintTask {
    /// Create a task with the default reporter and cache location
    pub fn new(
        name: impl Into<String>,
        root: &Path,
        config: TaskConfig,
        engine: Box<dyn AnalysisEngine>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.to_path_buf(),
            resolver: ConfigResolver::new(config),
            engine,
            reporter: Box::new(LogReporter),
            cache_mode: CacheMode::Default,
            log: BuildLog::new(),
        }
    }

    /// Override the violation reporter
    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Keep the cache store under an explicit base directory
    pub fn with_cache_dir(mut self, base: &Path) -> Self {
        self.cache_mode = CacheMode::InDir(base.to_path_buf());
        self
    }

    /// Disable caching; every file is analyzed on every run
    pub fn without_cache(mut self) -> Self {
        self.cache_mode = CacheMode::Disabled;
        self
    }

    /// The shared build log
    pub fn log(&self) -> &BuildLog {
        &self.log
    }

    /// The merged configuration (resolved lazily, memoized per invocation)
    pub fn effective_config(&self) -> &EffectiveConfig {
        self.resolver.effective()
    }

    /// The cache scope for this task setup
    pub fn cache_scope(&self) -> CacheScope {
        CacheScope::new(
            self.engine.version(),
            self.resolver.effective().canonical_json(),
            &self.name,
            &self.root,
        )
    }

    fn open_cache(&self) -> Option<AnalysisCache> {
        match &self.cache_mode {
            CacheMode::Disabled => None,
            CacheMode::Default => Some(AnalysisCache::open(self.cache_scope())),
            CacheMode::InDir(base) => Some(AnalysisCache::open_in(base, self.cache_scope())),
        }
    }

    /// Match, load, and run every file selected by the configured globs
    pub fn run(&mut self) -> Result<TaskOutcome> {
        let patterns = self.resolver.config().patterns.clone();
        let matched = match_files(&self.root, &patterns)?;

        let mut files = Vec::with_capacity(matched.len());
        for path in &matched {
            files.push(SourceFile::load(path, &self.root)?);
        }

        self.run_files(files)
    }

    /// Run pre-constructed files through the pipeline (build-host use)
    pub fn run_files(&mut self, files: Vec<SourceFile>) -> Result<TaskOutcome> {
        let start = Instant::now();
        let mut summary = TaskSummary {
            files_matched: files.len(),
            ..TaskSummary::default()
        };

        let mut cache = self.open_cache();
        let mut forwarded = Vec::with_capacity(files.len());

        for mut file in files {
            match &file.contents {
                FileContents::Empty => {
                    // Nothing to analyze; pass through untouched
                    forwarded.push(file);
                }
                FileContents::Streamed => {
                    self.log
                        .push_task_error(&file.relative, "streamed contents are not supported");
                    summary.files_dropped += 1;
                    tracing::debug!("Dropped {} (streamed)", file.relative);
                }
                FileContents::Buffered(_) => {
                    if let Some(cache) = &cache {
                        if cache.hit(&file) {
                            summary.files_skipped += 1;
                            tracing::debug!("Cache hit: {}", file.relative);
                            forwarded.push(file);
                            continue;
                        }
                    }

                    let analysis = self.engine.analyze(&file, self.resolver.effective())?;
                    summary.files_analyzed += 1;
                    file.analysis = Some(analysis);

                    if let Some(analysis) = file.analysis.as_ref().filter(|a| !a.clean()) {
                        summary.violation_count += analysis.violation_count;
                        self.reporter.report(
                            analysis,
                            &file,
                            self.resolver.effective(),
                            &mut self.log,
                        );
                    } else if let Some(cache) = &mut cache {
                        cache.record(&file);
                    }

                    forwarded.push(file);
                }
            }
        }

        if let Some(cache) = &cache {
            cache.persist();
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Task {} finished: {} analyzed, {} skipped, {} violations",
            self.name,
            summary.files_analyzed,
            summary.files_skipped,
            summary.violation_count
        );

        Ok(TaskOutcome {
            summary,
            files: forwarded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use crate::report::{FileAnalysis, Violation};
    use tempfile::TempDir;

    /// In-process engine: canned violations per relative path
    struct StubEngine {
        version: String,
        violations: HashMap<String, Vec<Violation>>,
        calls: Rc<Cell<usize>>,
    }

    impl StubEngine {
        fn clean() -> (Self, Rc<Cell<usize>>) {
            Self::with_violations(HashMap::new())
        }

        fn with_violations(
            violations: HashMap<String, Vec<Violation>>,
        ) -> (Self, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            (
                Self {
                    version: "stub 1.0.0".to_string(),
                    violations,
                    calls: Rc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl AnalysisEngine for StubEngine {
        fn version(&self) -> &str {
            &self.version
        }

        fn analyze(&self, file: &SourceFile, _config: &EffectiveConfig) -> Result<FileAnalysis> {
            self.calls.set(self.calls.get() + 1);
            Ok(FileAnalysis::from_violations(
                self.violations.get(&file.relative).cloned().unwrap_or_default(),
            ))
        }
    }

    fn violation() -> Violation {
        Violation {
            rule: "no-undef".to_string(),
            message: "'x' is not defined".to_string(),
            line: 2,
            column: 9,
        }
    }

    fn task(engine: StubEngine) -> LintTask {
        LintTask::new("lint", Path::new("/proj"), TaskConfig::default(), Box::new(engine))
            .without_cache()
    }

    #[test]
    fn test_empty_file_passes_through_unanalyzed() {
        let (engine, calls) = StubEngine::clean();
        let mut task = task(engine);

        let outcome = task
            .run_files(vec![SourceFile::buffered("blank.js", "")])
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].analysis.is_none());
        assert_eq!(calls.get(), 0);
        assert!(task.log().entries().is_empty());
    }

    #[test]
    fn test_streamed_file_is_dropped_with_error() {
        let (engine, calls) = StubEngine::clean();
        let mut task = task(engine);

        let outcome = task
            .run_files(vec![
                SourceFile::streamed("pipe.js"),
                SourceFile::buffered("ok.js", "var x;"),
            ])
            .unwrap();

        // The streamed file is not forwarded downstream
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].relative, "ok.js");
        assert_eq!(outcome.summary.files_dropped, 1);
        assert_eq!(calls.get(), 1);

        assert_eq!(task.log().error_count(), 1);
        assert!(task.log().entries()[0].message.contains("streamed"));
    }

    #[test]
    fn test_violations_reach_the_reporter_and_attach() {
        let mut violations = HashMap::new();
        violations.insert("bad.js".to_string(), vec![violation()]);
        let (engine, _) = StubEngine::with_violations(violations);
        let mut task = task(engine);

        let outcome = task
            .run_files(vec![SourceFile::buffered("bad.js", "x = 1;")])
            .unwrap();

        assert_eq!(outcome.summary.violation_count, 1);
        let analysis = outcome.files[0].analysis.as_ref().unwrap();
        assert_eq!(analysis.violation_count, 1);

        let entry = &task.log().entries()[0];
        assert_eq!(entry.path, "bad.js");
        assert_eq!(entry.rule, "no-undef");
        assert_eq!(entry.line, 2);
    }

    #[test]
    fn test_clean_files_are_cached_and_skipped() {
        let cache_dir = TempDir::new().unwrap();
        let file = || SourceFile::buffered("ok.js", "var x = 1;");

        let (engine, calls) = StubEngine::clean();
        let mut first = LintTask::new(
            "lint",
            Path::new("/proj"),
            TaskConfig::default(),
            Box::new(engine),
        )
        .with_cache_dir(cache_dir.path());
        let outcome = first.run_files(vec![file()]).unwrap();
        assert_eq!(outcome.summary.files_analyzed, 1);
        assert_eq!(calls.get(), 1);

        let (engine, calls) = StubEngine::clean();
        let mut second = LintTask::new(
            "lint",
            Path::new("/proj"),
            TaskConfig::default(),
            Box::new(engine),
        )
        .with_cache_dir(cache_dir.path());
        let outcome = second.run_files(vec![file()]).unwrap();
        assert_eq!(outcome.summary.files_skipped, 1);
        assert_eq!(outcome.summary.files_analyzed, 0);
        assert_eq!(calls.get(), 0);
        // Skipped files are still forwarded downstream
        assert_eq!(outcome.files.len(), 1);
    }

    #[test]
    fn test_dirty_files_are_not_cached() {
        let cache_dir = TempDir::new().unwrap();
        let mut canned = HashMap::new();
        canned.insert("bad.js".to_string(), vec![violation()]);

        for expected_calls in [1, 1] {
            let (engine, calls) = StubEngine::with_violations(canned.clone());
            let mut task = LintTask::new(
                "lint",
                Path::new("/proj"),
                TaskConfig::default(),
                Box::new(engine),
            )
            .with_cache_dir(cache_dir.path());

            let outcome = task
                .run_files(vec![SourceFile::buffered("bad.js", "x = 1;")])
                .unwrap();
            assert_eq!(outcome.summary.files_skipped, 0);
            assert_eq!(calls.get(), expected_calls);
        }
    }

    #[test]
    fn test_config_change_invalidates_cache() {
        let cache_dir = TempDir::new().unwrap();
        let file = || SourceFile::buffered("ok.js", "var x = 1;");

        let (engine, _) = StubEngine::clean();
        let mut first = LintTask::new(
            "lint",
            Path::new("/proj"),
            TaskConfig::default(),
            Box::new(engine),
        )
        .with_cache_dir(cache_dir.path());
        first.run_files(vec![file()]).unwrap();

        // Same file, same content, different rule configuration
        let mut config = TaskConfig::default();
        config.rules.insert(
            "no-undef".to_string(),
            crate::config::RuleSetting::on(),
        );
        let (engine, calls) = StubEngine::clean();
        let mut second = LintTask::new("lint", Path::new("/proj"), config, Box::new(engine))
            .with_cache_dir(cache_dir.path());

        let outcome = second.run_files(vec![file()]).unwrap();
        assert_eq!(outcome.summary.files_skipped, 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_custom_reporter_override() {
        struct CountingReporter {
            seen: Rc<Cell<usize>>,
        }

        impl Reporter for CountingReporter {
            fn report(
                &mut self,
                analysis: &FileAnalysis,
                _file: &SourceFile,
                _config: &EffectiveConfig,
                _log: &mut BuildLog,
            ) {
                self.seen.set(self.seen.get() + analysis.violation_count);
            }
        }

        let seen = Rc::new(Cell::new(0));
        let mut canned = HashMap::new();
        canned.insert("bad.js".to_string(), vec![violation(), violation()]);
        let (engine, _) = StubEngine::with_violations(canned);

        let mut task = LintTask::new(
            "lint",
            Path::new("/proj"),
            TaskConfig::default(),
            Box::new(engine),
        )
        .without_cache()
        .with_reporter(Box::new(CountingReporter {
            seen: Rc::clone(&seen),
        }));

        task.run_files(vec![SourceFile::buffered("bad.js", "x")])
            .unwrap();
        assert_eq!(seen.get(), 2);

        // The default log reporter was replaced; nothing landed on the log
        assert!(task.log().entries().is_empty());
    }
}
