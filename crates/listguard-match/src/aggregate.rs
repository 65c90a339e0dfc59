//! Verdict aggregation: a short-circuiting state machine over stage outputs.
//!
//! ```text
//! Pending ─ accessory hit ─▶ AccessoryRejected
//!         ─ conflict hit ──▶ ConflictRejected
//!         ─ matcher accept ▶ RuleAccepted
//!         ─ matcher reject ▶ RuleRejected
//!         ─ otherwise ─────▶ Escalate(provisional)
//! ```
//!
//! The first terminal verdict wins. A price anomaly, or an escalating
//! verdict from a stage before the matcher (a soft accessory), turns a later
//! matcher verdict into an escalation instead.

use serde::Serialize;

use listguard_core::{ReasonCode, Stage, Verdict};

/// Final state of the aggregator for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "verdict", rename_all = "camelCase")]
pub enum Resolution {
    AccessoryRejected(Verdict),
    ConflictRejected(Verdict),
    RuleAccepted(Verdict),
    RuleRejected(Verdict),
    /// Needs adjudication; the verdict is the provisional fallback.
    Escalate(Verdict),
}

impl Resolution {
    pub fn verdict(&self) -> Verdict {
        match *self {
            Self::AccessoryRejected(v)
            | Self::ConflictRejected(v)
            | Self::RuleAccepted(v)
            | Self::RuleRejected(v)
            | Self::Escalate(v) => v,
        }
    }

    pub fn needs_escalation(&self) -> bool {
        matches!(self, Self::Escalate(_))
    }
}

/// Collects stage verdicts in pipeline order.
#[derive(Debug, Default)]
pub struct VerdictAggregator {
    resolved: Option<Resolution>,
    provisional: Vec<Verdict>,
    price_anomaly: bool,
    /// An earlier stage asked for adjudication.
    doubtful: bool,
}

impl VerdictAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.resolved.is_none()
    }

    /// Mark the listing's price as anomalous for its cohort.
    pub fn flag_price_anomaly(&mut self) {
        if self.is_pending() {
            self.price_anomaly = true;
        }
    }

    /// Offer a stage verdict. Ignored once resolved.
    pub fn offer(&mut self, verdict: Verdict) {
        if !self.is_pending() {
            return;
        }

        let matcher = verdict.stage == Stage::Matcher;
        let demote = (self.price_anomaly || self.doubtful) && matcher;
        if verdict.needs_escalation || demote {
            if !matcher {
                self.doubtful = true;
            }
            self.provisional.push(verdict.escalated());
            return;
        }

        self.resolved = Some(match (verdict.stage, verdict.is_valid) {
            (Stage::Accessory, _) => Resolution::AccessoryRejected(verdict),
            (Stage::Conflict, _) => Resolution::ConflictRejected(verdict),
            (_, true) => Resolution::RuleAccepted(verdict),
            (_, false) => Resolution::RuleRejected(verdict),
        });
    }

    /// Settle: the terminal verdict if one arrived, else escalate with the
    /// most confident provisional verdict.
    pub fn finish(self) -> Resolution {
        if let Some(resolution) = self.resolved {
            return resolution;
        }

        let provisional = self
            .provisional
            .into_iter()
            .reduce(|best, v| if v.confidence > best.confidence { v } else { best })
            .unwrap_or_else(|| {
                Verdict::escalating(false, ReasonCode::NoMatch, 0.0, Stage::Matcher)
            });
        Resolution::Escalate(provisional)
    }
}
