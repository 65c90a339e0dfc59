//! Rule-based matcher: containment, model equality, keyword scoring.

use listguard_core::text::contains_phrase;
use listguard_core::{ReasonCode, Stage, Verdict};
use listguard_rules::AbbreviationPolicy;
use serde::Serialize;
use tracing::debug;

use crate::context::ListingContext;

/// What keyword scoring found in a title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleScore {
    pub keyword: bool,
    pub brand: bool,
    pub series: bool,
    pub features: usize,
    pub title_len: usize,
}

impl RuleScore {
    pub fn compute(ctx: &ListingContext<'_>) -> Self {
        let rules = ctx.rules;
        let title = &ctx.title_tokens;

        Self {
            keyword: any_phrase(title, &rules.required_keywords),
            brand: any_phrase(title, &rules.brands),
            series: any_phrase(title, &rules.series),
            features: rules
                .features
                .iter()
                .filter(|f| contains_phrase(&ctx.title_tokens, f))
                .count(),
            title_len: ctx.title.chars().count(),
        }
    }

    /// Series presence counts as one feature.
    pub fn feature_count(&self) -> usize {
        self.features + usize::from(self.series)
    }
}

fn any_phrase(title: &[&str], list: &[String]) -> bool {
    list.iter().any(|k| contains_phrase(title, k))
}

/// The query appears in the title as a whole.
///
/// Under the lenient policy spacing is ignored (`PS5PRO` ⊂ `PS 5 PRO`). A
/// query model token that the title lacks cancels containment, so `5070` is
/// not contained in `RTX 5070 TI`.
pub fn contains_query(ctx: &ListingContext<'_>) -> bool {
    if ctx.query.is_empty() {
        return false;
    }
    let contained = match ctx.rules.abbreviation {
        AbbreviationPolicy::Lenient => ctx.compact_title().contains(&ctx.compact_query()),
        AbbreviationPolicy::Strict => contains_phrase(&ctx.title_tokens, ctx.query),
    };
    if !contained {
        return false;
    }
    match &ctx.query_model {
        Some(q) => ctx.title_has_model(q),
        None => true,
    }
}

/// Matcher verdict. Always produces one; terminal or escalating.
pub fn evaluate(ctx: &ListingContext<'_>) -> Verdict {
    let strict = ctx.rules.strict_mode;

    if contains_query(ctx) {
        return Verdict::terminal(true, ReasonCode::Containment, 1.0, Stage::Matcher);
    }

    if ctx.model_equal() {
        return Verdict::terminal(true, ReasonCode::ModelMatch, 0.9, Stage::Matcher);
    }

    if !ctx.models_differ() {
        let score = RuleScore::compute(ctx);
        debug!("Rule score for {:?}: {:?}", ctx.title, score);

        let named = score.keyword || score.brand;
        if named
            && score.feature_count() >= ctx.rules.min_features
            && score.title_len >= ctx.rules.min_name_length
        {
            let verdict = Verdict::terminal(true, ReasonCode::RulesMatch, 0.6, Stage::Matcher);
            return if strict { verdict.escalated() } else { verdict };
        }
        if named {
            return Verdict::escalating(false, ReasonCode::NoMatch, 0.4, Stage::Matcher);
        }
    }

    let verdict = Verdict::terminal(false, ReasonCode::NoMatch, 0.3, Stage::Matcher);
    if strict {
        verdict.escalated()
    } else {
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listguard_core::text::normalize;
    use listguard_rules::{builtin, CategoryRuleSet};

    fn run(rules: &CategoryRuleSet, title: &str, query: &str) -> Verdict {
        let title = normalize(title);
        let query = normalize(query);
        evaluate(&ListingContext::new(rules, &title, &query))
    }

    fn gpu() -> CategoryRuleSet {
        builtin::videocards().prepare().unwrap()
    }

    #[test]
    fn test_containment() {
        let v = run(&gpu(), "Видеокарта Palit GeForce RTX 5070 12GB", "RTX 5070");
        assert_eq!(v.reason_code, ReasonCode::Containment);
        assert!(v.is_valid);
        assert_eq!(v.confidence, 1.0);
    }

    #[test]
    fn test_containment_guard() {
        // 5070 is a substring of RTX5070TI but the model token is not there
        let v = run(&gpu(), "RTX 5070 Ti", "5070");
        assert_ne!(v.reason_code, ReasonCode::Containment);
        assert!(!v.is_valid);
    }

    #[test]
    fn test_lenient_containment_ignores_spacing() {
        let ps = builtin::playstation().prepare().unwrap();
        let v = run(&ps, "Sony PS 5 Pro 2TB", "PS5 PRO");
        assert_eq!(v.reason_code, ReasonCode::Containment);
    }

    #[test]
    fn test_model_match() {
        let ps = builtin::playstation().prepare().unwrap();
        let v = run(&ps, "Игровая консоль Sony PlayStation 5 Pro 2TB", "ps5 pro");
        assert_eq!(v.reason_code, ReasonCode::ModelMatch);
        assert_eq!(v.confidence, 0.9);
        assert!(v.is_terminal());
    }

    #[test]
    fn test_rules_match() {
        let mut rules = CategoryRuleSet::new("cameras", "Cameras");
        rules.required_keywords = vec!["камера".into()];
        rules.brands = vec!["canon".into()];
        rules.features = vec!["4k".into(), "wifi".into()];
        rules.min_name_length = 10;
        let rules = rules.prepare().unwrap();

        let v = run(&rules, "Камера Canon EOS 4K WiFi", "eos r8");
        assert_eq!(v.reason_code, ReasonCode::RulesMatch);
        assert!(v.is_valid);
        assert!(v.is_terminal());

        let mut strict = rules.clone();
        strict.strict_mode = true;
        let v = run(&strict, "Камера Canon EOS 4K WiFi", "eos r8");
        assert_eq!(v.reason_code, ReasonCode::RulesMatch);
        assert!(v.needs_escalation);
    }

    #[test]
    fn test_keyword_only_escalates() {
        let mut rules = CategoryRuleSet::new("cameras", "Cameras");
        rules.required_keywords = vec!["камера".into()];
        rules.features = vec!["4k".into()];
        let rules = rules.prepare().unwrap();

        let v = run(&rules, "Камера для дома", "eos r8");
        assert_eq!(v.reason_code, ReasonCode::NoMatch);
        assert!(!v.is_valid);
        assert_eq!(v.confidence, 0.4);
        assert!(v.needs_escalation);
    }

    #[test]
    fn test_no_match() {
        let v = run(&gpu(), "Телевизор Samsung QLED", "RTX 5070");
        assert_eq!(v.reason_code, ReasonCode::NoMatch);
        assert_eq!(v.confidence, 0.3);
        assert!(v.is_terminal());

        let ps = builtin::playstation().prepare().unwrap();
        let v = run(&ps, "Телевизор Samsung", "ps5 pro");
        assert!(v.needs_escalation);
    }

    #[test]
    fn test_different_models_skip_scoring() {
        // brand and features present, but the model token contradicts
        let v = run(&gpu(), "Видеокарта MSI GeForce RTX 4070 12GB GDDR6X", "RTX 5070");
        assert_eq!(v.reason_code, ReasonCode::NoMatch);
        assert_eq!(v.confidence, 0.3);
    }
}
