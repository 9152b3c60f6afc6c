//! Error types and exit codes for lintstream

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for lintstream operations
#[derive(Error, Debug)]
pub enum LintStreamError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed to read config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    #[error("Failed to read {path}: {message}")]
    FileRead { path: PathBuf, message: String },

    #[error("Analysis engine not found: {program}")]
    EngineNotFound { program: String },

    #[error("Analysis engine failed on {path}: {message}")]
    EngineFailure { path: String, message: String },

    #[error("Lint violations found: {count}")]
    ViolationsDenied { count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LintStreamError {
    /// Convert error to appropriate exit code:
    /// - 0: Success
    /// - 1: File read / IO error
    /// - 2: Configuration error
    /// - 3: Engine not found or engine failure
    /// - 4: Violations found while running with --deny
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigError { .. } => ExitCode::from(2),
            Self::ConfigFile { .. } => ExitCode::from(2),
            Self::FileRead { .. } => ExitCode::from(1),
            Self::EngineNotFound { .. } => ExitCode::from(3),
            Self::EngineFailure { .. } => ExitCode::from(3),
            Self::ViolationsDenied { .. } => ExitCode::from(4),
            Self::Io(_) => ExitCode::from(1),
        }
    }
}

/// Result type alias for lintstream operations
pub type Result<T> = std::result::Result<T, LintStreamError>;
