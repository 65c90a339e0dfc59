//! Batch validator: the two-phase batch around the per-listing pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};
use uuid::Uuid;

use listguard_core::text::normalize;
use listguard_core::{FilterSettings, Listing, ReasonCode, Stage, Verdict, VerdictRecord};
use listguard_escalate::{EscalationCandidate, EscalationOutcome, Escalator};
use listguard_match::{joins_cohort, validate_listing_with, Evaluation, PriceCohort};
use listguard_rules::{CategoryRuleSet, RuleRegistry, RuleSnapshot};

use crate::types::{BatchReport, BatchSummary};

/// Listings sharing (category, normalized query), with their frozen cohort.
struct CohortGroup {
    category: String,
    query: String,
    rules: Arc<CategoryRuleSet>,
    members: Vec<usize>,
    cohort: PriceCohort,
}

impl CohortGroup {
    /// One evaluation per member, in member order.
    fn evaluate(&self, listings: &[Listing], filters: &FilterSettings) -> Vec<Evaluation> {
        self.members
            .iter()
            .map(|&i| validate_listing_with(&listings[i], &self.rules, &self.cohort, filters))
            .collect()
    }
}

/// Where intake put a listing.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Rejected(Verdict),
    /// `slot` is the listing's position among the group's members.
    Grouped { group: usize, slot: usize },
}

/// Validates whole batches against the registry's current snapshot.
pub struct BatchValidator {
    registry: Arc<RuleRegistry>,
    escalator: Escalator,
    filters: FilterSettings,
}

impl BatchValidator {
    pub fn new(registry: Arc<RuleRegistry>, escalator: Escalator) -> Self {
        Self {
            registry,
            escalator,
            filters: FilterSettings::default(),
        }
    }

    /// Replace the stage switches (all on by default).
    pub fn with_filters(mut self, filters: FilterSettings) -> Self {
        self.filters = filters;
        self
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn escalator(&self) -> &Escalator {
        &self.escalator
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    /// Validate a batch. Returns exactly one record per listing, in input order.
    pub async fn validate_batch(&self, listings: Vec<Listing>) -> BatchReport {
        let started = Instant::now();
        let batch_id = Uuid::new_v4();
        let snapshot = self.registry.snapshot();
        let filters = self.filters;

        info!(
            "Batch {}: validating {} listings (rules v{})",
            batch_id,
            listings.len(),
            snapshot.version
        );

        // Phase 1: intake and cohort grouping
        let (placements, groups) = group_listings(&listings, &snapshot, &filters);
        let intake = placements
            .iter()
            .filter(|p| matches!(p, Placement::Rejected(_)))
            .count();
        debug!(
            "Batch {}: {} cohort groups, {} rejected at intake",
            batch_id,
            groups.len(),
            intake
        );

        // Phase 2: evaluate groups in parallel against the frozen cohorts
        let listings = Arc::new(listings);
        let groups: Vec<Arc<CohortGroup>> = groups.into_iter().map(Arc::new).collect();
        let handles: Vec<_> = groups
            .iter()
            .map(|group| {
                let group = group.clone();
                let listings = listings.clone();
                tokio::task::spawn_blocking(move || group.evaluate(&listings, &filters))
            })
            .collect();

        let mut evaluations: Vec<Vec<Evaluation>> = Vec::with_capacity(groups.len());
        let mut candidates = Vec::new();
        for (group, handle) in groups.iter().zip(handles) {
            let evaluated = match handle.await {
                Ok(evaluated) => evaluated,
                Err(e) => {
                    error!(
                        "Batch {}: evaluation task for {}/{:?} failed: {}. Retrying inline.",
                        batch_id, group.category, group.query, e
                    );
                    group.evaluate(&listings, &filters)
                }
            };
            for (&index, evaluation) in group.members.iter().zip(&evaluated) {
                if evaluation.needs_escalation() {
                    candidates.push(EscalationCandidate {
                        index,
                        listing: listings[index].clone(),
                        provisional: evaluation.verdict(),
                    });
                }
            }
            evaluations.push(evaluated);
        }

        // Phase 3: escalation
        let mut escalated: HashMap<usize, EscalationOutcome> = HashMap::new();
        if !candidates.is_empty() {
            info!(
                "Batch {}: {} listings need escalation",
                batch_id,
                candidates.len()
            );
            escalated = self
                .escalator
                .resolve(candidates)
                .await
                .into_iter()
                .map(|outcome| (outcome.index, outcome))
                .collect();
        }

        // Phase 4: records in input order
        let records: Vec<VerdictRecord> = placements
            .iter()
            .enumerate()
            .map(|(i, placement)| {
                let (verdict, ai_reason) = match escalated.remove(&i) {
                    Some(outcome) => (outcome.verdict, outcome.ai_reason),
                    None => match *placement {
                        Placement::Rejected(verdict) => (verdict, None),
                        Placement::Grouped { group, slot } => {
                            (evaluations[group][slot].verdict(), None)
                        }
                    },
                };
                VerdictRecord::new(listings[i].reference(i), &verdict, ai_reason)
            })
            .collect();

        let summary = BatchSummary::from_records(&records);
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Batch {} complete in {}ms: {} valid, {} rejected, {} escalated ({} fallbacks)",
            batch_id,
            duration_ms,
            summary.valid,
            summary.rejected,
            summary.escalated,
            summary.fallbacks
        );

        BatchReport {
            batch_id,
            rules_version: snapshot.version,
            records,
            summary,
            duration_ms,
            completed_at: chrono::Utc::now(),
        }
    }
}

/// Place every listing: intake rejects keep their verdict, the rest join a
/// cohort group in first-seen order.
///
/// A group's cohort holds the prices of members that pass the accessory
/// and conflict stages, so accessories and sibling models do not drag the
/// reference price down.
fn group_listings(
    listings: &[Listing],
    snapshot: &RuleSnapshot,
    filters: &FilterSettings,
) -> (Vec<Placement>, Vec<CohortGroup>) {
    let mut groups: Vec<CohortGroup> = Vec::new();

    let placements: Vec<Placement> = listings
        .iter()
        .enumerate()
        .map(|(i, listing)| {
            if listing.is_malformed() {
                return Placement::Rejected(Verdict::reject(
                    ReasonCode::MalformedListing,
                    1.0,
                    Stage::Intake,
                ));
            }
            let rules = match snapshot.get(&listing.category) {
                Some(rules) if rules.enabled => rules,
                Some(_) => {
                    return Placement::Rejected(Verdict::reject(
                        ReasonCode::CategoryDisabled,
                        1.0,
                        Stage::Intake,
                    ))
                }
                None => {
                    return Placement::Rejected(Verdict::reject(
                        ReasonCode::CategoryUnconfigured,
                        1.0,
                        Stage::Intake,
                    ))
                }
            };

            let query = normalize(&listing.query);
            let existing = groups
                .iter()
                .position(|g| g.category == listing.category && g.query == query);
            let group = match existing {
                Some(group) => group,
                None => {
                    groups.push(CohortGroup {
                        category: listing.category.clone(),
                        query,
                        rules: rules.clone(),
                        members: Vec::new(),
                        cohort: PriceCohort::default(),
                    });
                    groups.len() - 1
                }
            };
            let members = &mut groups[group].members;
            members.push(i);
            Placement::Grouped {
                group,
                slot: members.len() - 1,
            }
        })
        .collect();

    // Freeze every cohort before anything is scored
    for group in &mut groups {
        let rules = &group.rules;
        group.cohort = PriceCohort::new(
            group
                .members
                .iter()
                .map(|&i| &listings[i])
                .filter(|listing| joins_cohort(listing, rules, filters))
                .filter_map(|listing| listing.valid_price()),
        );
    }

    (placements, groups)
}
