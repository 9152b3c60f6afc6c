//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cached static-analysis task for build pipelines
#[derive(Parser, Debug)]
#[command(name = "lintstream")]
#[command(about = "Run a cached static-analysis pass over matched source files")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands for lintstream
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the lint task against a project root
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Manage the analysis cache
    Cache(CacheArgs),
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project root (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Task configuration file (JSON); defaults to .lintstream.json under
    /// the root when present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Glob pattern selecting source files (repeatable; overrides config
    /// patterns)
    #[arg(short, long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Directory with additional rule implementations (repeatable)
    #[arg(long = "rulesdir", value_name = "DIR")]
    pub rule_dirs: Vec<PathBuf>,

    /// Base rule set: none, recommended, or strict
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<String>,

    /// Report violations as warnings instead of errors
    #[arg(long)]
    pub warn: bool,

    /// Discard previously accumulated rules before merging
    #[arg(long)]
    pub reset: bool,

    /// Analyze every file, ignoring and not updating the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Analysis engine executable (overrides the config file)
    #[arg(long, value_name = "PROGRAM")]
    pub engine: Option<String>,

    /// Extra argument for the engine (repeatable)
    #[arg(long = "engine-arg", value_name = "ARG")]
    pub engine_args: Vec<String>,

    /// Task name; part of the cache scope
    #[arg(long, default_value = "lint")]
    pub task_name: String,

    /// Exit nonzero when violations are found (for CI)
    #[arg(long)]
    pub deny: bool,
}

/// Arguments for the cache command
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub operation: CacheOperation,
}

/// Cache operations
#[derive(Subcommand, Debug)]
pub enum CacheOperation {
    /// Show cache stores and entry counts
    Status,

    /// Remove all cache stores
    Clear,
}

/// Output format for command results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Machine-readable JSON
    Json,
}
