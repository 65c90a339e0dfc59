//! Adjudication request and answer types.

use serde::{Deserialize, Serialize};

/// Provider behind the HTTP adjudicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjudicatorProvider {
    #[default]
    OpenAI,
    Anthropic,
    Groq,
}

impl AdjudicatorProvider {
    /// Model used when the configuration names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Groq => "llama-3.3-70b-versatile",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }
}

impl std::str::FromStr for AdjudicatorProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "groq" => Ok(Self::Groq),
            other => Err(format!("unknown adjudicator provider {:?}", other)),
        }
    }
}

impl std::fmt::Display for AdjudicatorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjudicatorProvider::OpenAI => write!(f, "openai"),
            AdjudicatorProvider::Anthropic => write!(f, "anthropic"),
            AdjudicatorProvider::Groq => write!(f, "groq"),
        }
    }
}

/// One listing sent for adjudication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjudicationItem {
    /// Batch-local id; answers are matched back by it.
    pub id: String,
    pub title: String,
    pub query: String,
    pub category: String,
    pub price: f64,
    pub provisional_confidence: f64,
}

/// One adjudication call: a single (category, query) and its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjudicationRequest {
    pub category: String,
    pub query: String,
    pub items: Vec<AdjudicationItem>,
}

/// Classifier answer for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjudication {
    #[serde(default)]
    pub id: Option<String>,
    pub is_valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
    /// Self-reported certainty in [0, 1], when the classifier gives one.
    #[serde(default)]
    pub certainty: Option<f64>,
}

/// Public view of the escalation setup (no keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationStatus {
    pub enabled: bool,
    /// Enabled and a key is configured, so calls will go out.
    pub active: bool,
    pub provider: AdjudicatorProvider,
    pub model: String,
    pub key_configured: bool,
}
