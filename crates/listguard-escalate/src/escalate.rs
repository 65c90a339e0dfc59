//! Bounded escalation: group, chunk, call with deadline and retries, fall back.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use listguard_core::text::normalize;
use listguard_core::{Error, Listing, ReasonCode, Stage, Verdict};

use crate::client::Adjudicator;
use crate::config::EscalationConfig;
use crate::types::{Adjudication, AdjudicationItem, AdjudicationRequest};

/// A listing whose pipeline verdict asked for adjudication.
#[derive(Debug, Clone)]
pub struct EscalationCandidate {
    /// Position in the batch; doubles as the adjudication item id.
    pub index: usize,
    pub listing: Listing,
    pub provisional: Verdict,
}

/// Final verdict for one candidate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationOutcome {
    pub index: usize,
    pub verdict: Verdict,
    pub ai_reason: Option<String>,
    /// The provisional verdict was kept.
    pub fallback: bool,
}

impl EscalationOutcome {
    fn fallback(candidate: &EscalationCandidate) -> Self {
        let p = candidate.provisional;
        Self {
            index: candidate.index,
            verdict: Verdict::terminal(
                p.is_valid,
                ReasonCode::EscalationTimeoutFallback,
                p.confidence,
                Stage::Escalation,
            ),
            ai_reason: None,
            fallback: true,
        }
    }

    fn answered(candidate: &EscalationCandidate, answer: &Adjudication) -> Self {
        let reason = if answer.is_valid {
            ReasonCode::AiAccepted
        } else {
            ReasonCode::AiRejected
        };
        Self {
            index: candidate.index,
            verdict: Verdict::terminal(
                answer.is_valid,
                reason,
                answer.certainty.unwrap_or(DEFAULT_CERTAINTY),
                Stage::Escalation,
            ),
            ai_reason: answer.reason.clone().filter(|r| !r.trim().is_empty()),
            fallback: false,
        }
    }
}

/// Confidence given to answers that carry no certainty.
const DEFAULT_CERTAINTY: f64 = 0.8;

/// Sends candidates to the adjudicator and turns answers into verdicts.
pub struct Escalator {
    adjudicator: Arc<dyn Adjudicator>,
    settings: EscalationConfig,
}

impl Escalator {
    pub fn new(adjudicator: Arc<dyn Adjudicator>, settings: EscalationConfig) -> Self {
        Self {
            adjudicator,
            settings,
        }
    }

    pub fn settings(&self) -> &EscalationConfig {
        &self.settings
    }

    pub fn adjudicator_name(&self) -> &str {
        self.adjudicator.name()
    }

    /// Whether calls will be made at all.
    pub fn is_active(&self) -> bool {
        self.settings.enabled && self.adjudicator.is_available()
    }

    /// Resolve every candidate. Always returns one outcome per candidate,
    /// in candidate order; failures become fallbacks.
    pub async fn resolve(&self, candidates: Vec<EscalationCandidate>) -> Vec<EscalationOutcome> {
        if candidates.is_empty() {
            return Vec::new();
        }
        if !self.is_active() {
            debug!(
                "Escalation inactive ({}); {} provisional verdicts kept",
                self.adjudicator.name(),
                candidates.len()
            );
            return candidates.iter().map(EscalationOutcome::fallback).collect();
        }

        let chunks = self.plan_chunks(&candidates);
        info!(
            "Escalating {} listings in {} calls via {}",
            candidates.len(),
            chunks.len(),
            self.adjudicator.name()
        );

        let results = join_all(chunks.iter().map(|chunk| self.run_chunk(chunk))).await;

        let mut outcomes: Vec<EscalationOutcome> = results.into_iter().flatten().collect();
        outcomes.sort_by_key(|o| o.index);
        outcomes
    }

    /// Group by (category, normalized query) in first-seen order, then cut
    /// each group to `max_batch_size`.
    fn plan_chunks<'c>(&self, candidates: &'c [EscalationCandidate]) -> Vec<Vec<&'c EscalationCandidate>> {
        let mut groups: Vec<((String, String), Vec<&EscalationCandidate>)> = Vec::new();
        for candidate in candidates {
            let key = (
                candidate.listing.category.clone(),
                normalize(&candidate.listing.query),
            );
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(candidate),
                None => groups.push((key, vec![candidate])),
            }
        }

        let size = self.settings.max_batch_size.max(1);
        groups
            .into_iter()
            .flat_map(|(_, members)| {
                members
                    .chunks(size)
                    .map(|c| c.to_vec())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    async fn run_chunk(&self, chunk: &[&EscalationCandidate]) -> Vec<EscalationOutcome> {
        let Some(first) = chunk.first() else {
            return Vec::new();
        };
        let request = AdjudicationRequest {
            category: first.listing.category.clone(),
            query: first.listing.query.clone(),
            items: chunk
                .iter()
                .map(|c| AdjudicationItem {
                    id: c.index.to_string(),
                    title: c.listing.title.clone(),
                    query: c.listing.query.clone(),
                    category: c.listing.category.clone(),
                    price: c.listing.price.unwrap_or_default(),
                    provisional_confidence: c.provisional.confidence,
                })
                .collect(),
        };

        let answers = match self.call_with_retries(&request).await {
            Some(answers) => answers,
            None => return chunk.iter().map(|c| EscalationOutcome::fallback(c)).collect(),
        };

        chunk
            .iter()
            .enumerate()
            .map(|(pos, candidate)| {
                match align(&answers, &request.items[pos].id, pos) {
                    Some(answer) if self.meets_threshold(answer) => {
                        EscalationOutcome::answered(candidate, answer)
                    }
                    Some(answer) => {
                        debug!(
                            "Discarding answer for #{} (certainty {:?})",
                            candidate.index, answer.certainty
                        );
                        EscalationOutcome::fallback(candidate)
                    }
                    None => EscalationOutcome::fallback(candidate),
                }
            })
            .collect()
    }

    async fn call_with_retries(&self, request: &AdjudicationRequest) -> Option<Vec<Adjudication>> {
        let deadline = Duration::from_millis(self.settings.timeout_ms);
        let attempts = self.settings.attempts.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
            let result = tokio::time::timeout(deadline, self.adjudicator.adjudicate(request))
                .await
                .unwrap_or(Err(Error::EscalationTimeout(self.settings.timeout_ms)));
            match result {
                Ok(answers) => return Some(answers),
                Err(e) => warn!(
                    "Adjudication for {:?}/{:?} failed (attempt {}/{}): {}",
                    request.category, request.query, attempt, attempts, e
                ),
            }
        }
        None
    }

    /// Pause before `attempt` (2 and up): the base delay, doubled per retry.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(2).min(16);
        Duration::from_millis(self.settings.retry_backoff_ms.saturating_mul(factor))
    }

    fn meets_threshold(&self, answer: &Adjudication) -> bool {
        match answer.certainty {
            Some(c) => c.is_finite() && c >= self.settings.confidence_threshold,
            None => true,
        }
    }
}

/// Answer for the item at `pos`: by id first, else the answer at the same
/// position if it carries no id.
fn align<'a>(answers: &'a [Adjudication], id: &str, pos: usize) -> Option<&'a Adjudication> {
    answers
        .iter()
        .find(|a| a.id.as_deref() == Some(id))
        .or_else(|| answers.get(pos).filter(|a| a.id.is_none()))
}
