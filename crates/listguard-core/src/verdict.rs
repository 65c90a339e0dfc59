//! Verdicts, reason codes and the output record.

use serde::{Deserialize, Serialize};

/// Closed set of reasons a verdict can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Accessory,
    /// A word that often means an accessory; provisional, always escalated.
    SoftAccessory,
    StyledLegacyModel,
    OtherModelConflict,
    Containment,
    ModelMatch,
    RulesMatch,
    NoMatch,
    AiAccepted,
    AiRejected,
    EscalationTimeoutFallback,
    MalformedListing,
    CategoryUnconfigured,
    CategoryDisabled,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accessory => "ACCESSORY",
            Self::SoftAccessory => "SOFT_ACCESSORY",
            Self::StyledLegacyModel => "STYLED_LEGACY_MODEL",
            Self::OtherModelConflict => "OTHER_MODEL_CONFLICT",
            Self::Containment => "CONTAINMENT",
            Self::ModelMatch => "MODEL_MATCH",
            Self::RulesMatch => "RULES_MATCH",
            Self::NoMatch => "NO_MATCH",
            Self::AiAccepted => "AI_ACCEPTED",
            Self::AiRejected => "AI_REJECTED",
            Self::EscalationTimeoutFallback => "ESCALATION_TIMEOUT_FALLBACK",
            Self::MalformedListing => "MALFORMED_LISTING",
            Self::CategoryUnconfigured => "CATEGORY_UNCONFIGURED",
            Self::CategoryDisabled => "CATEGORY_DISABLED",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Checks done before the pipeline runs (malformed input, unknown category).
    Intake,
    Accessory,
    Conflict,
    PriceAnomaly,
    Matcher,
    Escalation,
}

/// Outcome of validating one listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_valid: bool,
    pub reason_code: ReasonCode,
    pub confidence: f64,
    pub stage: Stage,
    pub needs_escalation: bool,
}

impl Verdict {
    /// A decisive verdict that ends the pipeline.
    pub fn terminal(is_valid: bool, reason_code: ReasonCode, confidence: f64, stage: Stage) -> Self {
        Self {
            is_valid,
            reason_code,
            confidence: confidence.clamp(0.0, 1.0),
            stage,
            needs_escalation: false,
        }
    }

    /// A provisional verdict that asks for adjudication.
    pub fn escalating(is_valid: bool, reason_code: ReasonCode, confidence: f64, stage: Stage) -> Self {
        Self {
            needs_escalation: true,
            ..Self::terminal(is_valid, reason_code, confidence, stage)
        }
    }

    pub fn reject(reason_code: ReasonCode, confidence: f64, stage: Stage) -> Self {
        Self::terminal(false, reason_code, confidence, stage)
    }

    pub fn is_terminal(&self) -> bool {
        !self.needs_escalation
    }

    /// Same verdict with the escalation mark set.
    pub fn escalated(self) -> Self {
        Self {
            needs_escalation: true,
            ..self
        }
    }
}

/// Output contract: exactly one record per input listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRecord {
    pub listing_ref: String,
    pub is_valid: bool,
    pub reason_code: ReasonCode,
    pub confidence: f64,
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reason: Option<String>,
}

impl VerdictRecord {
    pub fn new(listing_ref: String, verdict: &Verdict, ai_reason: Option<String>) -> Self {
        Self {
            listing_ref,
            is_valid: verdict.is_valid,
            reason_code: verdict.reason_code,
            confidence: verdict.confidence,
            stage: verdict.stage,
            ai_reason,
        }
    }
}
