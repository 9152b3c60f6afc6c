//! Analysis result cache.
//!
//! Clean results persist across invocations so unchanged files are never
//! re-analyzed. Entries live in a JSON store under the XDG cache directory,
//! one store per *scope* - a fingerprint of everything that invalidates
//! prior results (engine version, effective configuration, task name,
//! project root). A configuration or tool-version change lands in a new
//! store; the old one is inert until cleared.
//!
//! Only files that analyzed clean (zero violations) are recorded. A file
//! with violations is re-analyzed on every run until it comes back clean.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::files::SourceFile;

/// Store schema version for future compatibility
pub const CACHE_SCHEMA_VERSION: &str = "1.0";

// FNV-1a constants for 64-bit hash (also used for file fingerprints)
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Compute a stable FNV-1a hash
pub(crate) fn fnv1a_hash(data: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in data.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Fingerprint namespacing all cache entries for one task setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    /// 16-hex-digit scope id
    pub id: String,
}

impl CacheScope {
    /// Derive the scope from everything that invalidates prior results
    pub fn new(
        engine_version: &str,
        canonical_config: &str,
        task_name: &str,
        root: &Path,
    ) -> Self {
        let material = format!(
            "{}\n{}\n{}\n{}",
            engine_version,
            canonical_config,
            task_name,
            root.to_string_lossy()
        );

        Self {
            id: format!("{:016x}", fnv1a_hash(&material)),
        }
    }
}

/// Minimal stored value: enough to skip re-analysis of an unchanged file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Root-relative file path
    pub path: String,

    /// Content fingerprint (16-hex FNV-1a)
    pub fingerprint: String,

    /// When the clean result was recorded
    pub recorded_at: String,
}

/// On-disk shape of one scope's store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheStore {
    schema_version: String,
    generated_at: String,
    scope: String,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheStore {
    fn empty(scope: &CacheScope) -> Self {
        Self {
            schema_version: CACHE_SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            scope: scope.id.clone(),
            entries: BTreeMap::new(),
        }
    }
}

/// The cache for one scope: read once at task start, written once at end
pub struct AnalysisCache {
    scope: CacheScope,
    path: PathBuf,
    store: CacheStore,
    dirty: bool,
}

impl AnalysisCache {
    /// Open the store for a scope under the default cache base
    pub fn open(scope: CacheScope) -> Self {
        Self::open_in(&cache_base_dir(), scope)
    }

    /// Open the store for a scope under an explicit base directory.
    ///
    /// A missing, unreadable, or incompatible store is an empty cache,
    /// never an error.
    pub fn open_in(base: &Path, scope: CacheScope) -> Self {
        let path = base.join(format!("{}.json", scope.id));

        let store = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<CacheStore>(&content).ok())
            .filter(|s| s.schema_version == CACHE_SCHEMA_VERSION && s.scope == scope.id)
            .unwrap_or_else(|| CacheStore::empty(&scope));

        Self {
            scope,
            path,
            store,
            dirty: false,
        }
    }

    pub fn scope(&self) -> &CacheScope {
        &self.scope
    }

    pub fn store_path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.store.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.entries.is_empty()
    }

    /// Whether a prior run already analyzed this exact content clean
    pub fn hit(&self, file: &SourceFile) -> bool {
        let Some(fingerprint) = file.fingerprint() else {
            return false;
        };

        self.store
            .entries
            .get(&file.relative)
            .map(|e| e.fingerprint == format!("{:016x}", fingerprint))
            .unwrap_or(false)
    }

    /// Record a clean result; only called for files with zero violations
    pub fn record(&mut self, file: &SourceFile) {
        let Some(fingerprint) = file.fingerprint() else {
            return;
        };

        self.store.entries.insert(
            file.relative.clone(),
            CacheEntry {
                path: file.relative.clone(),
                fingerprint: format!("{:016x}", fingerprint),
                recorded_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.dirty = true;
    }

    /// Best-effort write-back; failure to write is logged, not fatal
    pub fn persist(&self) {
        if !self.dirty {
            return;
        }

        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(&self.store) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.path, content) {
                    tracing::warn!("Failed to write cache store {}: {}", self.path.display(), e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to serialize cache store: {}", e);
            }
        }
    }

    /// Drop the store for this scope
    pub fn clear(&mut self) -> Result<()> {
        self.store.entries.clear();
        self.dirty = false;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Get the base cache directory (XDG-compliant)
pub fn cache_base_dir() -> PathBuf {
    // Check XDG_CACHE_HOME first
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("lintstream");
    }

    // Fall back to ~/.cache/lintstream
    if let Some(home) = dirs::home_dir() {
        return home.join(".cache").join("lintstream");
    }

    // Last resort: temp directory
    std::env::temp_dir().join("lintstream")
}

/// List all stores under a cache base: (scope id, path, entry count)
pub fn list_stores(base: &Path) -> Vec<(String, PathBuf, usize)> {
    fs::read_dir(base)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let scope = path.file_stem()?.to_str()?.to_string();
                let entries = fs::read_to_string(&path)
                    .ok()
                    .and_then(|content| serde_json::from_str::<CacheStore>(&content).ok())
                    .map(|s| s.entries.len())
                    .unwrap_or(0);
                Some((scope, path, entries))
            } else {
                None
            }
        })
        .collect()
}

/// Remove every store under a cache base; returns how many were removed
pub fn clear_all(base: &Path) -> Result<usize> {
    let mut count = 0;
    for (_, path, _) in list_stores(base) {
        fs::remove_file(&path)?;
        count += 1;
    }
    Ok(count)
}
