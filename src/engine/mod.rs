//! External analysis engine adapter.
//!
//! The linter itself lives outside this crate: it is a separate process,
//! invoked once per file with the resolved rule configuration and parsed
//! back into `FileAnalysis` values. `AnalysisEngine` is the seam - the
//! pipeline only sees the trait, so build hosts and tests can substitute
//! in-process engines.

mod parse;

pub use parse::{parse_diagnostics, PositionBase};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::EffectiveConfig;
use crate::error::{LintStreamError, Result};
use crate::files::SourceFile;
use crate::report::FileAnalysis;

/// Per-file analysis seam
pub trait AnalysisEngine {
    /// Engine version string; part of the cache fingerprint
    fn version(&self) -> &str;

    /// Analyze one buffered file with the resolved configuration
    fn analyze(&self, file: &SourceFile, config: &EffectiveConfig) -> Result<FileAnalysis>;
}

/// How to invoke the external engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCommand {
    /// The executable to run (e.g. "eslint", "npx")
    pub program: String,

    /// Fixed arguments (e.g. output-format selection)
    #[serde(default)]
    pub args: Vec<String>,

    /// Flag used to pass the serialized rule configuration file
    #[serde(default = "default_config_flag")]
    pub config_flag: String,

    /// Flag used to pass each extra rule directory
    #[serde(default = "default_rules_dir_flag")]
    pub rules_dir_flag: String,

    /// Position convention of the engine's output
    #[serde(default)]
    pub position_base: PositionBase,
}

fn default_config_flag() -> String {
    "--config".to_string()
}

fn default_rules_dir_flag() -> String {
    "--rulesdir".to_string()
}

impl EngineCommand {
    /// Create a new engine command
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            config_flag: default_config_flag(),
            rules_dir_flag: default_rules_dir_flag(),
            position_base: PositionBase::default(),
        }
    }

    /// Set the position convention of the engine's output
    pub fn with_position_base(mut self, base: PositionBase) -> Self {
        self.position_base = base;
        self
    }

    /// Set the flag used for the rule configuration file
    pub fn with_config_flag(mut self, flag: impl Into<String>) -> Self {
        self.config_flag = flag.into();
        self
    }
}

/// Engine adapter that spawns the external process per file
#[derive(Debug)]
pub struct ExternalEngine {
    command: EngineCommand,
    program_path: PathBuf,
    root: PathBuf,
    version: String,
}

impl ExternalEngine {
    /// Resolve the engine binary and probe its version.
    ///
    /// A missing binary is a construction-time error; a failing version
    /// probe falls back to "unknown" (and thus a coarser cache scope).
    pub fn new(command: EngineCommand, root: &Path) -> Result<Self> {
        let program_path =
            which::which(&command.program).map_err(|_| LintStreamError::EngineNotFound {
                program: command.program.clone(),
            })?;

        let version = probe_version(&program_path);
        tracing::debug!(
            "Engine {} resolved to {} ({})",
            command.program,
            program_path.display(),
            version
        );

        Ok(Self {
            command,
            program_path,
            root: root.to_path_buf(),
            version,
        })
    }
}

impl AnalysisEngine for ExternalEngine {
    fn version(&self) -> &str {
        &self.version
    }

    fn analyze(&self, file: &SourceFile, config: &EffectiveConfig) -> Result<FileAnalysis> {
        // Hand the rule table to the engine via a scratch config file
        let config_file = NamedTempFile::new()?;
        let rules_json = serde_json::to_string(&config.rules).map_err(|e| {
            LintStreamError::ConfigError {
                message: format!("Failed to serialize rule configuration: {}", e),
            }
        })?;
        fs::write(config_file.path(), rules_json)?;

        let mut cmd = Command::new(&self.program_path);
        cmd.args(&self.command.args);
        cmd.arg(&self.command.config_flag).arg(config_file.path());
        for dir in &config.rule_dirs {
            cmd.arg(&self.command.rules_dir_flag).arg(dir);
        }
        cmd.arg(&file.path);
        cmd.current_dir(&self.root);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().map_err(|e| LintStreamError::EngineFailure {
            path: file.relative.clone(),
            message: format!("Failed to run {}: {}", self.command.program, e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let violations = parse_diagnostics(&stdout, self.command.position_base);

        // A nonzero exit with parseable diagnostics just means violations
        // were found; nonzero with nothing parseable is an engine failure
        if !output.status.success() && violations.is_empty() && !stderr.trim().is_empty() {
            return Err(LintStreamError::EngineFailure {
                path: file.relative.clone(),
                message: stderr.trim().to_string(),
            });
        }

        Ok(FileAnalysis::from_violations(violations))
    }
}

/// Probe `<program> --version`, trimming the first line of output
fn probe_version(program: &Path) -> String {
    Command::new(program)
        .arg("--version")
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .and_then(|s| s.lines().next().map(|l| l.trim().to_string()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_defaults() {
        let cmd: EngineCommand = serde_json::from_str(r#"{"program": "eslint"}"#).unwrap();
        assert_eq!(cmd.program, "eslint");
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.config_flag, "--config");
        assert_eq!(cmd.rules_dir_flag, "--rulesdir");
        assert_eq!(cmd.position_base, PositionBase::OneBased);
    }

    #[test]
    fn test_command_builder() {
        let cmd = EngineCommand::new("mylint", vec!["--format".to_string(), "json".to_string()])
            .with_position_base(PositionBase::ZeroBased)
            .with_config_flag("--rules");

        assert_eq!(cmd.config_flag, "--rules");
        assert_eq!(cmd.position_base, PositionBase::ZeroBased);
    }

    #[test]
    fn test_missing_binary_is_construction_error() {
        let cmd = EngineCommand::new("definitely-not-a-real-linter-binary", Vec::new());
        let err = ExternalEngine::new(cmd, Path::new(".")).unwrap_err();
        assert!(matches!(err, LintStreamError::EngineNotFound { .. }));
    }
}
