//! Category rule-set records.
//!
//! A category is pure data: keyword sets, an ordered model grammar, an
//! accessory list, an exclusion set of other models and a handful of flags.
//! The pipeline is one generic function over this record.

use std::collections::BTreeMap;

use listguard_core::text::{normalize, normalize_keyword};
use listguard_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One model-grammar pattern: `prefix? base=\d{min,max} modifier?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarPattern {
    /// Prefix alternatives (`RTX`, `PLAYSTATION`). Empty means bare numeric.
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default = "default_min_digits")]
    pub min_digits: usize,
    #[serde(default = "default_max_digits")]
    pub max_digits: usize,
    /// Canonical modifier names (`TI`, `SUPER`, `PRO`).
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Explicit spellings folded onto a canonical modifier (`TITANIUM` → `TI`).
    #[serde(default)]
    pub modifier_aliases: BTreeMap<String, String>,
    /// The matched prefix is part of the model (`H670`, `X670`), not a
    /// family name in front of it.
    #[serde(default)]
    pub prefix_in_base: bool,
}

fn default_min_digits() -> usize {
    3
}
fn default_max_digits() -> usize {
    5
}

impl GrammarPattern {
    pub fn new(prefixes: &[&str], digits: (usize, usize), modifiers: &[&str]) -> Self {
        Self {
            prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            min_digits: digits.0,
            max_digits: digits.1,
            modifiers: modifiers.iter().map(|s| s.to_string()).collect(),
            modifier_aliases: BTreeMap::new(),
            prefix_in_base: false,
        }
    }

    pub fn keep_prefix(mut self) -> Self {
        self.prefix_in_base = true;
        self
    }

    pub fn alias(mut self, spelling: &str, canonical: &str) -> Self {
        self.modifier_aliases
            .insert(spelling.to_string(), canonical.to_string());
        self
    }
}

/// How glued abbreviations (`PS5PRO`, `5070TI`) are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbbreviationPolicy {
    /// A modifier may follow the base without a separator, and containment
    /// compares space-free forms.
    #[default]
    Lenient,
    /// A glued modifier makes that occurrence unreadable, and containment is
    /// token-bounded.
    Strict,
}

/// Optional Conflict Guard behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPolicy {
    #[serde(default = "enabled")]
    pub stylization_guard: bool,
    #[serde(default = "enabled")]
    pub other_model_guard: bool,
    #[serde(default)]
    pub allow_bundles: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            stylization_guard: true,
            other_model_guard: true,
            allow_bundles: false,
        }
    }
}

/// Price-anomaly parameters for a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnomalyParams {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Fraction below the cohort mean that counts as suspicious (0.3 = 30%).
    pub min_percentage_difference: f64,
    /// Absolute price under which a cheap listing is suspicious.
    pub max_suspicious_price: f64,
    /// Standard deviations below the mean that flag an outlier.
    pub z_score_threshold: f64,
    /// Width of the interquartile fences, in IQRs.
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,
}

fn default_iqr_multiplier() -> f64 {
    1.5
}

impl Default for PriceAnomalyParams {
    fn default() -> Self {
        Self {
            enabled: true,
            min_percentage_difference: 0.3,
            max_suspicious_price: 1000.0,
            z_score_threshold: 2.0,
            iqr_multiplier: default_iqr_multiplier(),
        }
    }
}

/// Title words that explain a low price on their own.
pub const PRICE_EXPLANATIONS: &[&str] = &[
    "б/у", "бу", "запчаст*", "деталь", "детали", "ремонт*", "поломанн*", "сломан*",
    "нерабоч*", "неисправ*", "for parts", "broken", "repair", "spare", "used",
];

fn default_price_explanations() -> Vec<String> {
    PRICE_EXPLANATIONS.iter().map(|s| s.to_string()).collect()
}

/// Complete configuration of one product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRuleSet {
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Prefer adjudication over automatic accept/reject.
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub required_keywords: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub series: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_min_features")]
    pub min_features: usize,
    #[serde(default)]
    pub min_name_length: usize,
    /// Ordered most-specific-first; first matching pattern wins.
    #[serde(default)]
    pub grammar: Vec<GrammarPattern>,
    #[serde(default)]
    pub accessory_keywords: Vec<String>,
    /// Words that often, but not always, mean an accessory. A hit sends the
    /// listing to the adjudicator instead of rejecting it.
    #[serde(default)]
    pub soft_accessory_keywords: Vec<String>,
    /// Other models of the category, as phrases.
    #[serde(default)]
    pub exclusion_models: Vec<String>,
    #[serde(default)]
    pub stylization_indicators: Vec<String>,
    /// Tokens tolerated next to a confirmed model when bundles are allowed.
    #[serde(default)]
    pub bundle_tokens: Vec<String>,
    #[serde(default)]
    pub conflict: ConflictPolicy,
    #[serde(default)]
    pub abbreviation: AbbreviationPolicy,
    #[serde(default)]
    pub price_anomaly: PriceAnomalyParams,
    /// A suspiciously cheap listing naming one of these is not flagged.
    #[serde(default = "default_price_explanations")]
    pub price_explanations: Vec<String>,
}

fn default_min_features() -> usize {
    1
}

impl CategoryRuleSet {
    /// Empty, enabled rule set with defaults.
    pub fn new(key: &str, display_name: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            enabled: true,
            strict_mode: false,
            required_keywords: Vec::new(),
            brands: Vec::new(),
            series: Vec::new(),
            features: Vec::new(),
            min_features: 1,
            min_name_length: 0,
            grammar: Vec::new(),
            accessory_keywords: Vec::new(),
            soft_accessory_keywords: Vec::new(),
            exclusion_models: Vec::new(),
            stylization_indicators: Vec::new(),
            bundle_tokens: Vec::new(),
            conflict: ConflictPolicy::default(),
            abbreviation: AbbreviationPolicy::default(),
            price_anomaly: PriceAnomalyParams::default(),
            price_explanations: default_price_explanations(),
        }
    }

    /// Check the record and bring every keyword into normalized form.
    ///
    /// Registry snapshots only ever hold prepared rule sets.
    pub fn prepare(mut self) -> Result<Self> {
        let key = self.key.trim().to_string();
        if key.is_empty() {
            return Err(Error::Config("rule set without a key".into()));
        }
        let invalid = |message: String| Error::InvalidRules {
            category: key.clone(),
            message,
        };

        for (i, pattern) in self.grammar.iter_mut().enumerate() {
            if pattern.min_digits == 0 || pattern.min_digits > pattern.max_digits {
                return Err(invalid(format!(
                    "grammar pattern {} has digit range {}..={}",
                    i, pattern.min_digits, pattern.max_digits
                )));
            }
            if pattern.prefix_in_base && pattern.prefixes.is_empty() {
                return Err(invalid(format!(
                    "grammar pattern {} keeps a prefix but has none",
                    i
                )));
            }
            pattern.prefixes = normalize_list(&pattern.prefixes, normalize_compact);
            pattern.modifiers = normalize_list(&pattern.modifiers, normalize_compact);
            let mut aliases = BTreeMap::new();
            for (spelling, canonical) in &pattern.modifier_aliases {
                let canonical = normalize_compact(canonical);
                if !pattern.modifiers.contains(&canonical) {
                    return Err(invalid(format!(
                        "alias {:?} points at unknown modifier {:?}",
                        spelling, canonical
                    )));
                }
                aliases.insert(normalize_compact(spelling), canonical);
            }
            pattern.modifier_aliases = aliases;
        }

        let p = &mut self.price_anomaly;
        if !(0.0..1.0).contains(&p.min_percentage_difference)
            || p.max_suspicious_price < 0.0
            || p.z_score_threshold <= 0.0
            || p.iqr_multiplier <= 0.0
        {
            return Err(invalid("price anomaly parameters out of range".into()));
        }

        self.key = key;
        if self.display_name.is_empty() {
            self.display_name = self.key.clone();
        }
        self.required_keywords = normalize_list(&self.required_keywords, normalize_keyword);
        self.brands = normalize_list(&self.brands, normalize_keyword);
        self.series = normalize_list(&self.series, normalize_keyword);
        self.features = normalize_list(&self.features, normalize_keyword);
        self.accessory_keywords = normalize_list(&self.accessory_keywords, normalize_keyword);
        self.soft_accessory_keywords =
            normalize_list(&self.soft_accessory_keywords, normalize_keyword);
        let hard = &self.accessory_keywords;
        self.soft_accessory_keywords.retain(|k| !hard.contains(k));
        self.exclusion_models = normalize_list(&self.exclusion_models, |s| normalize(s));
        self.stylization_indicators =
            normalize_list(&self.stylization_indicators, normalize_keyword);
        self.bundle_tokens = normalize_list(&self.bundle_tokens, normalize_keyword);
        self.price_explanations = normalize_list(&self.price_explanations, normalize_keyword);

        Ok(self)
    }
}

fn normalize_compact(s: &str) -> String {
    normalize(s).replace(' ', "")
}

fn normalize_list(items: &[String], f: impl Fn(&str) -> String) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let norm = f(item);
        if !norm.is_empty() && !out.contains(&norm) {
            out.push(norm);
        }
    }
    out
}
