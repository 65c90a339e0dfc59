//! Escalation configuration: call limits and the adjudicator that answers.
//!
//! Read from `escalation.json`, then overridden by `LISTGUARD_AI_*`
//! variables. The API key may also come from the provider's usual variable
//! (`OPENAI_API_KEY`, ...) and is never serialized.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use listguard_core::config::env_parse;

use crate::types::{AdjudicatorProvider, EscalationStatus};

/// How ambiguous listings are escalated, and to whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EscalationConfig {
    /// Whether ambiguous listings are sent to the adjudicator at all.
    pub enabled: bool,
    pub provider: AdjudicatorProvider,
    /// Provider default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Maximum listings per adjudication call.
    pub max_batch_size: usize,
    /// Deadline for a single adjudication call, in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts per call, first try included.
    pub attempts: u32,
    /// Pause before the second attempt; doubles for each one after.
    pub retry_backoff_ms: u64,
    /// Answers whose reported certainty is below this are discarded.
    pub confidence_threshold: f64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: AdjudicatorProvider::OpenAI,
            model: None,
            api_key: None,
            max_batch_size: 20,
            timeout_ms: 30_000,
            attempts: 2,
            retry_backoff_ms: 500,
            confidence_threshold: 0.7,
        }
    }
}

impl EscalationConfig {
    /// File, then environment overrides, then the provider's key variable.
    pub fn load(path: &Path) -> Self {
        let mut config = Self::read_file(path);
        config.apply_env();
        if config.api_key.is_none() {
            config.api_key = std::env::var(config.provider.key_var())
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        config.clamped()
    }

    /// File contents only. A missing file gives the defaults; a broken one
    /// is logged and also gives the defaults.
    pub fn read_file(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(config) => config.clamped(),
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn apply_env(&mut self) {
        if let Some(enabled) = env_parse("LISTGUARD_ENABLE_AI") {
            self.enabled = enabled;
        }
        if let Some(provider) = env_parse("LISTGUARD_AI_PROVIDER") {
            self.provider = provider;
        }
        if let Ok(model) = std::env::var("LISTGUARD_AI_MODEL") {
            self.model = Some(model).filter(|m| !m.trim().is_empty());
        }
        if let Some(n) = env_parse("LISTGUARD_AI_BATCH") {
            self.max_batch_size = n;
        }
        if let Some(ms) = env_parse("LISTGUARD_AI_TIMEOUT_MS") {
            self.timeout_ms = ms;
        }
        if let Some(n) = env_parse("LISTGUARD_AI_ATTEMPTS") {
            self.attempts = n;
        }
        if let Some(ms) = env_parse("LISTGUARD_AI_BACKOFF_MS") {
            self.retry_backoff_ms = ms;
        }
        if let Some(t) = env_parse("LISTGUARD_AI_MIN_CERTAINTY") {
            self.confidence_threshold = t;
        }
    }

    fn clamped(mut self) -> Self {
        self.max_batch_size = self.max_batch_size.max(1);
        self.attempts = self.attempts.max(1);
        self.confidence_threshold = if self.confidence_threshold.is_finite() {
            self.confidence_threshold.clamp(0.0, 1.0)
        } else {
            Self::default().confidence_threshold
        };
        self
    }

    /// Model name sent to the provider.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Enabled and holding a key.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    /// Public status (the key itself is never exposed).
    pub fn status(&self) -> EscalationStatus {
        EscalationStatus {
            enabled: self.enabled,
            active: self.is_active(),
            provider: self.provider,
            model: self.model().to_string(),
            key_configured: self.api_key.is_some(),
        }
    }
}
