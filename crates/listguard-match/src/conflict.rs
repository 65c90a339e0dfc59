//! Conflict guard: stylized legacy devices and other models of the family.

use listguard_core::text::{contains_phrase, tokens};
use listguard_core::{ReasonCode, Stage, Verdict};
use tracing::debug;

use crate::context::ListingContext;
use crate::extract::{extract_hit, ModelToken};

/// One exclusion entry, read through the category grammar where possible.
#[derive(Debug, Clone)]
pub struct ExclusionEntry<'r> {
    pub phrase: &'r str,
    pub token: Option<ModelToken>,
}

impl<'r> ExclusionEntry<'r> {
    fn read(phrase: &'r str, ctx: &ListingContext<'_>) -> Self {
        let token = extract_hit(&tokens(phrase), &ctx.rules.grammar, ctx.rules.abbreviation)
            .map(|h| h.token);
        Self { phrase, token }
    }

    /// The query does not name this entry.
    fn is_sibling(&self, ctx: &ListingContext<'_>) -> bool {
        match (&self.token, &ctx.query_model) {
            (Some(t), Some(q)) => t != q,
            _ => !contains_phrase(&ctx.query_tokens, self.phrase),
        }
    }

    /// Tokenized entries are looked up among title tokens; the rest by phrase.
    fn in_title(&self, ctx: &ListingContext<'_>) -> bool {
        match &self.token {
            Some(t) => ctx.title_has_model(t),
            None => contains_phrase(&ctx.title_tokens, self.phrase),
        }
    }
}

/// First exclusion entry the title names and the query does not.
pub fn find_sibling<'r>(ctx: &ListingContext<'r>) -> Option<ExclusionEntry<'r>> {
    ctx.rules
        .exclusion_models
        .iter()
        .map(|phrase| ExclusionEntry::read(phrase, ctx))
        .find(|entry| entry.is_sibling(ctx) && entry.in_title(ctx))
}

/// The query belongs to the model family this category tracks.
fn in_family(ctx: &ListingContext<'_>) -> bool {
    ctx.query_model.is_some()
        || ctx
            .rules
            .exclusion_models
            .iter()
            .any(|phrase| contains_phrase(&ctx.query_tokens, phrase))
}

/// Terminal reject when the title names a model the query did not ask for.
pub fn check(ctx: &ListingContext<'_>) -> Option<Verdict> {
    let policy = ctx.rules.conflict;
    if !policy.stylization_guard && !policy.other_model_guard {
        return None;
    }

    let sibling = find_sibling(ctx)?;

    if policy.stylization_guard {
        let styled = ctx
            .rules
            .stylization_indicators
            .iter()
            .find(|s| contains_phrase(&ctx.title_tokens, s));
        if let Some(indicator) = styled {
            debug!(
                "Stylized legacy model {:?} ({:?}) in {:?}",
                sibling.phrase, indicator, ctx.title
            );
            return Some(Verdict::reject(
                ReasonCode::StyledLegacyModel,
                0.95,
                Stage::Conflict,
            ));
        }
    }

    if policy.other_model_guard && in_family(ctx) {
        debug!("Other model {:?} in {:?}", sibling.phrase, ctx.title);
        return Some(Verdict::reject(
            ReasonCode::OtherModelConflict,
            0.9,
            Stage::Conflict,
        ));
    }

    None
}
