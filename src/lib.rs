//! lintstream: cached static-analysis task for build pipelines.
//!
//! The task resolves an effective rule configuration (built-in preset merged
//! with caller overrides), matches source files by glob pattern under a
//! project root, streams each file through a per-file analysis step backed by
//! an external engine, caches clean results keyed by content and
//! configuration, and reports violations through a shared build log.
//!
//! # Example
//!
//! ```ignore
//! use lintstream::{EngineCommand, ExternalEngine, LintTask, TaskConfig};
//! use std::path::Path;
//!
//! let root = Path::new("/path/to/project");
//!
//! let mut config = TaskConfig::default();
//! config.base = lintstream::BasePreset::Recommended;
//! config.patterns = vec!["src/**/*.js".to_string()];
//!
//! let engine = ExternalEngine::new(EngineCommand::new("eslint", vec![]), root)?;
//! let mut task = LintTask::new("lint", root, config, Box::new(engine));
//!
//! let outcome = task.run()?;
//! println!("{} violations", outcome.summary.violation_count);
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod report;
pub mod task;

// Re-export commonly used types
pub use cache::{cache_base_dir, AnalysisCache, CacheEntry, CacheScope};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::{BasePreset, ConfigResolver, EffectiveConfig, RuleSetting, TaskConfig};
pub use engine::{AnalysisEngine, EngineCommand, ExternalEngine, PositionBase};
pub use error::{LintStreamError, Result};
pub use files::{match_files, FileContents, SourceFile};
pub use report::{
    BuildEntry, BuildLog, BuildSeverity, FileAnalysis, LogReporter, Reporter, Violation,
};
pub use task::{LintTask, TaskOutcome, TaskSummary};
