//! Per-listing pipeline: accessory → conflict → price anomaly → matcher.

use serde::Serialize;
use tracing::debug;

use listguard_core::text::{contains_phrase, normalize};
use listguard_core::{FilterSettings, Listing, ReasonCode, Stage, Verdict};
use listguard_rules::CategoryRuleSet;

use crate::aggregate::{Resolution, VerdictAggregator};
use crate::context::ListingContext;
use crate::extract::ModelToken;
use crate::price::{PriceCohort, PriceSignal};
use crate::{accessory, conflict, matcher};

/// Everything the pipeline decided about one listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub resolution: Resolution,
    pub price_signal: PriceSignal,
    pub query_model: Option<ModelToken>,
    pub title_model: Option<ModelToken>,
}

impl Evaluation {
    pub fn verdict(&self) -> Verdict {
        self.resolution.verdict()
    }

    pub fn needs_escalation(&self) -> bool {
        self.resolution.needs_escalation()
    }

    fn intake(verdict: Verdict) -> Self {
        Self {
            resolution: Resolution::RuleRejected(verdict),
            price_signal: PriceSignal::NoSignal,
            query_model: None,
            title_model: None,
        }
    }
}

/// Run every stage for one listing against its category and cohort, with
/// every stage switched on.
///
/// Pure: the same listing, rules and cohort always give the same result.
pub fn validate_listing(
    listing: &Listing,
    rules: &CategoryRuleSet,
    cohort: &PriceCohort,
) -> Evaluation {
    validate_listing_with(listing, rules, cohort, &FilterSettings::default())
}

/// [`validate_listing`] under explicit stage switches.
pub fn validate_listing_with(
    listing: &Listing,
    rules: &CategoryRuleSet,
    cohort: &PriceCohort,
    filters: &FilterSettings,
) -> Evaluation {
    let Some(price) = usable_price(listing) else {
        return Evaluation::intake(Verdict::reject(
            ReasonCode::MalformedListing,
            1.0,
            Stage::Intake,
        ));
    };

    let title = normalize(&listing.title);
    let query = normalize(&listing.query);
    let ctx = ListingContext::new(rules, &title, &query);
    let mut agg = VerdictAggregator::new();

    if let Some(v) = accessory::check(&ctx, filters) {
        agg.offer(v);
    }

    if agg.is_pending() {
        if let Some(v) = conflict::check(&ctx) {
            agg.offer(v);
        }
    }

    let price_signal = if agg.is_pending() && filters.enable_price_anomaly_detection {
        cohort
            .assess(price, &rules.price_anomaly)
            .explained(explains_price(&ctx))
    } else {
        PriceSignal::NoSignal
    };
    if price_signal.is_anomalous() {
        agg.flag_price_anomaly();
    }

    if agg.is_pending() {
        agg.offer(matcher::evaluate(&ctx));
    }

    let resolution = agg.finish();
    debug!(
        "{:?} [{}] → {:?}",
        listing.title,
        rules.key,
        resolution.verdict().reason_code
    );

    Evaluation {
        resolution,
        price_signal,
        query_model: ctx.query_model.clone(),
        title_model: ctx.title_model.as_ref().map(|h| h.token.clone()),
    }
}

/// Whether the listing's price belongs in its cohort: the listing is well
/// formed and neither the accessory stage nor the conflict guard claims it.
pub fn joins_cohort(listing: &Listing, rules: &CategoryRuleSet, filters: &FilterSettings) -> bool {
    if usable_price(listing).is_none() {
        return false;
    }
    let title = normalize(&listing.title);
    let query = normalize(&listing.query);
    let ctx = ListingContext::new(rules, &title, &query);
    accessory::check(&ctx, filters).is_none() && conflict::check(&ctx).is_none()
}

fn usable_price(listing: &Listing) -> Option<f64> {
    listing
        .valid_price()
        .filter(|_| !listing.title.trim().is_empty())
}

/// The title names a reason for a low price (used, for parts, broken).
fn explains_price(ctx: &ListingContext<'_>) -> bool {
    ctx.rules
        .price_explanations
        .iter()
        .any(|w| contains_phrase(&ctx.title_tokens, w))
}
