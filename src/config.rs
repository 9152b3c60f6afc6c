//! Rule configuration for the lint task.
//!
//! Configuration flows in three stages:
//! 1. `TaskConfig` - the caller-facing surface (config file and/or CLI flags)
//! 2. merge - base preset rules combined with caller overrides
//! 3. `EffectiveConfig` - the merged result, memoized per task invocation,
//!    with a canonical serialization used for cache fingerprinting

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::engine::EngineCommand;
use crate::error::{LintStreamError, Result};

/// Enabled/disabled state of a single rule, with optional engine parameters.
///
/// Serializes compactly: a bare bool for plain toggles, an object for rules
/// that carry options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    /// Plain on/off toggle, e.g. `"no-undef": true`
    Switch(bool),

    /// Toggle with engine-specific parameters,
    /// e.g. `"max-len": {"enabled": true, "options": {"limit": 100}}`
    Detailed {
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<serde_json::Value>,
    },
}

impl RuleSetting {
    /// Enabled toggle without options
    pub fn on() -> Self {
        RuleSetting::Switch(true)
    }

    /// Disabled toggle
    pub fn off() -> Self {
        RuleSetting::Switch(false)
    }

    /// Enabled toggle carrying engine parameters
    pub fn with_options(options: serde_json::Value) -> Self {
        RuleSetting::Detailed {
            enabled: true,
            options: Some(options),
        }
    }

    /// Whether the rule is enabled
    pub fn is_enabled(&self) -> bool {
        match self {
            RuleSetting::Switch(enabled) => *enabled,
            RuleSetting::Detailed { enabled, .. } => *enabled,
        }
    }

    /// Engine parameters, if any
    pub fn options(&self) -> Option<&serde_json::Value> {
        match self {
            RuleSetting::Switch(_) => None,
            RuleSetting::Detailed { options, .. } => options.as_ref(),
        }
    }
}

/// Built-in base rule set selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasePreset {
    /// No base rules; only caller overrides apply
    #[default]
    None,
    /// The default rule set most projects start from
    Recommended,
    /// Recommended plus stylistic and complexity checks
    Strict,
}

impl BasePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasePreset::None => "none",
            BasePreset::Recommended => "recommended",
            BasePreset::Strict => "strict",
        }
    }

    /// The rule table this preset contributes before overrides are merged
    pub fn rules(&self) -> BTreeMap<String, RuleSetting> {
        match self {
            BasePreset::None => BTreeMap::new(),
            BasePreset::Recommended => recommended_rules(),
            BasePreset::Strict => strict_rules(),
        }
    }
}

impl std::str::FromStr for BasePreset {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(BasePreset::None),
            "recommended" | "default" => Ok(BasePreset::Recommended),
            "strict" => Ok(BasePreset::Strict),
            _ => Err(()),
        }
    }
}

/// The "recommended" base rule set
fn recommended_rules() -> BTreeMap<String, RuleSetting> {
    let mut rules = BTreeMap::new();
    rules.insert("no-undef".to_string(), RuleSetting::on());
    rules.insert("no-unused-vars".to_string(), RuleSetting::on());
    rules.insert("no-dupe-keys".to_string(), RuleSetting::on());
    rules.insert("no-unreachable".to_string(), RuleSetting::on());
    rules.insert("no-empty".to_string(), RuleSetting::on());
    rules.insert("use-isnan".to_string(), RuleSetting::on());
    rules.insert("valid-typeof".to_string(), RuleSetting::on());
    rules.insert("no-fallthrough".to_string(), RuleSetting::on());
    rules
}

/// The "strict" base rule set: recommended plus stylistic checks
fn strict_rules() -> BTreeMap<String, RuleSetting> {
    let mut rules = recommended_rules();
    rules.insert("eqeqeq".to_string(), RuleSetting::on());
    rules.insert("curly".to_string(), RuleSetting::on());
    rules.insert("no-shadow".to_string(), RuleSetting::on());
    rules.insert("no-console".to_string(), RuleSetting::on());
    rules.insert(
        "max-len".to_string(),
        RuleSetting::with_options(serde_json::json!({ "limit": 100 })),
    );
    rules.insert(
        "complexity".to_string(),
        RuleSetting::with_options(serde_json::json!({ "max": 10 })),
    );
    rules
}

/// Caller-facing task configuration.
///
/// Loadable from a JSON config file; CLI flags are merged on top by the
/// binary (flags win).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Which built-in base rule set to merge under the overrides
    pub base: BasePreset,

    /// Caller rule overrides; these win over base entries on the same name
    pub rules: BTreeMap<String, RuleSetting>,

    /// Directories the engine should search for additional rule
    /// implementations
    pub rule_dirs: Vec<PathBuf>,

    /// Glob patterns selecting source files relative to the project root
    pub patterns: Vec<String>,

    /// Report violations as warnings instead of errors
    pub display_warnings: bool,

    /// Discard previously accumulated rules (base preset included) before
    /// merging; the merged result is exactly the overrides
    pub reset: bool,

    /// How to invoke the external analysis engine
    pub engine: Option<EngineCommand>,
}

impl TaskConfig {
    /// Load a task configuration from a JSON file
    pub fn load(path: &Path) -> Result<TaskConfig> {
        let content = fs::read_to_string(path).map_err(|e| LintStreamError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| LintStreamError::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Merge the base preset with the overrides into an effective config.
    ///
    /// With `reset` set, nothing survives from the base preset: the merged
    /// rule table is exactly the overrides.
    pub fn resolve(&self) -> EffectiveConfig {
        let mut rules = if self.reset {
            BTreeMap::new()
        } else {
            self.base.rules()
        };

        for (name, setting) in &self.rules {
            rules.insert(name.clone(), setting.clone());
        }

        EffectiveConfig::new(rules, self.rule_dirs.clone(), self.display_warnings)
    }
}

/// The merged rule configuration for one task invocation
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    /// Final rule table after merging
    pub rules: BTreeMap<String, RuleSetting>,

    /// Extra rule implementation directories for the engine
    pub rule_dirs: Vec<PathBuf>,

    /// Report violations as warnings instead of errors
    pub display_warnings: bool,

    /// Canonical serialization for cache fingerprinting
    #[serde(skip)]
    canonical: String,
}

impl EffectiveConfig {
    pub fn new(
        rules: BTreeMap<String, RuleSetting>,
        rule_dirs: Vec<PathBuf>,
        display_warnings: bool,
    ) -> Self {
        // BTreeMap keys serialize in sorted order, so equal configurations
        // always produce the same canonical string
        let canonical = serde_json::json!({
            "rules": &rules,
            "rule_dirs": &rule_dirs,
        })
        .to_string();

        Self {
            rules,
            rule_dirs,
            display_warnings,
            canonical,
        }
    }

    /// Stable serialization of the analysis-relevant configuration
    pub fn canonical_json(&self) -> &str {
        &self.canonical
    }

    /// Names of the rules that are enabled
    pub fn enabled_rules(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|(_, s)| s.is_enabled())
            .map(|(name, _)| name.as_str())
    }
}

/// Lazily resolves and memoizes the effective configuration.
///
/// The merge runs on first use per task invocation; every later call within
/// that invocation returns the same object.
pub struct ConfigResolver {
    config: TaskConfig,
    resolved: OnceLock<EffectiveConfig>,
}

impl ConfigResolver {
    pub fn new(config: TaskConfig) -> Self {
        Self {
            config,
            resolved: OnceLock::new(),
        }
    }

    /// The raw caller configuration
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// The merged configuration, computed on first call
    pub fn effective(&self) -> &EffectiveConfig {
        self.resolved.get_or_init(|| self.config.resolve())
    }
}
