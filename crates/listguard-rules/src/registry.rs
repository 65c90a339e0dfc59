//! Rule-set registry: one immutable snapshot, swapped whole on reload.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use listguard_core::{Error, Result};

use crate::builtin;
use crate::types::CategoryRuleSet;

/// Where rule sets come from.
pub trait RuleSource: Send + Sync {
    /// Load raw (unprepared) rule sets.
    fn load(&self) -> Result<Vec<CategoryRuleSet>>;

    /// Human-readable origin, for logs and the API.
    fn describe(&self) -> String;
}

/// The compiled-in categories.
pub struct BuiltinRules;

impl RuleSource for BuiltinRules {
    fn load(&self) -> Result<Vec<CategoryRuleSet>> {
        Ok(builtin::all())
    }

    fn describe(&self) -> String {
        "builtin".into()
    }
}

/// On-disk rules file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesFile {
    /// Start from the built-in categories; entries here replace them by key.
    #[serde(default)]
    pub include_builtin: bool,
    #[serde(default)]
    pub categories: Vec<CategoryRuleSet>,
}

/// Rule sets read from a JSON file on every load.
pub struct JsonFileRules {
    path: PathBuf,
}

impl JsonFileRules {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for JsonFileRules {
    fn load(&self) -> Result<Vec<CategoryRuleSet>> {
        let data = std::fs::read_to_string(&self.path)?;
        let file: RulesFile = serde_json::from_str(&data)?;

        if !file.include_builtin {
            return Ok(file.categories);
        }

        let mut merged = builtin::all();
        for rules in file.categories {
            match merged.iter_mut().find(|r| r.key == rules.key) {
                Some(slot) => *slot = rules,
                None => merged.push(rules),
            }
        }
        Ok(merged)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An immutable, prepared set of categories.
#[derive(Debug, Default)]
pub struct RuleSnapshot {
    pub version: u64,
    pub source: String,
    categories: BTreeMap<String, Arc<CategoryRuleSet>>,
}

impl RuleSnapshot {
    /// Prepare raw rule sets. Fails on the first invalid record or duplicate key.
    pub fn build(version: u64, source: String, raw: Vec<CategoryRuleSet>) -> Result<Self> {
        let mut categories = BTreeMap::new();
        for rules in raw {
            let rules = rules.prepare()?;
            if categories.contains_key(&rules.key) {
                return Err(Error::InvalidRules {
                    category: rules.key,
                    message: "duplicate category key".into(),
                });
            }
            categories.insert(rules.key.clone(), Arc::new(rules));
        }
        Ok(Self {
            version,
            source,
            categories,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Arc<CategoryRuleSet>> {
        self.categories.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CategoryRuleSet>> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Short description of a category for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub key: String,
    pub display_name: String,
    pub enabled: bool,
    pub strict_mode: bool,
    pub grammar_patterns: usize,
    pub accessory_keywords: usize,
    pub soft_accessory_keywords: usize,
    pub exclusion_models: usize,
}

impl From<&CategoryRuleSet> for CategorySummary {
    fn from(rules: &CategoryRuleSet) -> Self {
        Self {
            key: rules.key.clone(),
            display_name: rules.display_name.clone(),
            enabled: rules.enabled,
            strict_mode: rules.strict_mode,
            grammar_patterns: rules.grammar.len(),
            accessory_keywords: rules.accessory_keywords.len(),
            soft_accessory_keywords: rules.soft_accessory_keywords.len(),
            exclusion_models: rules.exclusion_models.len(),
        }
    }
}

/// Process-wide owner of the current rule snapshot.
///
/// Readers take an `Arc` of the snapshot and keep it for as long as they
/// need; a reload never mutates a snapshot someone already holds.
pub struct RuleRegistry {
    source: Box<dyn RuleSource>,
    snapshot: RwLock<Arc<RuleSnapshot>>,
    versions: AtomicU64,
}

impl RuleRegistry {
    /// Load the source once. A broken source at startup is an error.
    pub fn new(source: Box<dyn RuleSource>) -> Result<Self> {
        let snapshot = RuleSnapshot::build(1, source.describe(), source.load()?)?;
        info!(
            "RuleRegistry: {} categories loaded from {}",
            snapshot.len(),
            snapshot.source
        );

        Ok(Self {
            source,
            snapshot: RwLock::new(Arc::new(snapshot)),
            versions: AtomicU64::new(1),
        })
    }

    /// Registry over the built-in categories.
    pub fn builtin() -> Result<Self> {
        Self::new(Box::new(BuiltinRules))
    }

    /// Registry over a rules file, or the built-ins when no path is given.
    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::new(Box::new(JsonFileRules::new(p))),
            None => Self::builtin(),
        }
    }

    /// Current snapshot. Hold it for a whole batch.
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn get_category_config(&self, key: &str) -> Option<Arc<CategoryRuleSet>> {
        self.snapshot.read().get(key).cloned()
    }

    /// False for unknown and disabled categories.
    pub fn is_category_enabled(&self, key: &str) -> bool {
        self.snapshot
            .read()
            .get(key)
            .map(|r| r.enabled)
            .unwrap_or(false)
    }

    pub fn categories(&self) -> Vec<CategorySummary> {
        self.snapshot
            .read()
            .iter()
            .map(|r| CategorySummary::from(r.as_ref()))
            .collect()
    }

    /// Re-read the source and swap the snapshot in one step.
    ///
    /// On any load or validation failure the previous snapshot stays active.
    pub fn reload_from_source(&self) -> Result<Arc<RuleSnapshot>> {
        let version = self.versions.load(Ordering::SeqCst) + 1;
        let built = self
            .source
            .load()
            .and_then(|raw| RuleSnapshot::build(version, self.source.describe(), raw));

        match built {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.versions.store(version, Ordering::SeqCst);
                *self.snapshot.write() = snapshot.clone();
                info!(
                    "RuleRegistry: reloaded {} categories (version {})",
                    snapshot.len(),
                    version
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    "RuleRegistry: reload from {} failed, keeping version {}: {}",
                    self.source.describe(),
                    self.versions.load(Ordering::SeqCst),
                    e
                );
                Err(e)
            }
        }
    }

    pub fn source(&self) -> String {
        self.source.describe()
    }
}
