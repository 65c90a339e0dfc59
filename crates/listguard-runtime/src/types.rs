//! Runtime types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use listguard_core::{ReasonCode, VerdictRecord};

/// Counts over one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub rejected: usize,
    /// Listings sent to (or meant for) the adjudicator.
    pub escalated: usize,
    /// Escalated listings that kept their provisional verdict.
    pub fallbacks: usize,
    /// Rejected before the pipeline ran (malformed, unknown or disabled category).
    pub intake_rejected: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[VerdictRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Default::default()
        };
        for r in records {
            if r.is_valid {
                summary.valid += 1;
            } else {
                summary.rejected += 1;
            }
            match r.reason_code {
                ReasonCode::AiAccepted | ReasonCode::AiRejected => summary.escalated += 1,
                ReasonCode::EscalationTimeoutFallback => {
                    summary.escalated += 1;
                    summary.fallbacks += 1;
                }
                ReasonCode::MalformedListing
                | ReasonCode::CategoryUnconfigured
                | ReasonCode::CategoryDisabled => summary.intake_rejected += 1,
                _ => {}
            }
        }
        summary
    }
}

/// Result of validating one batch: one record per input listing, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: Uuid,
    /// Rule snapshot version the batch was evaluated against.
    pub rules_version: u64,
    pub records: Vec<VerdictRecord>,
    pub summary: BatchSummary,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}
