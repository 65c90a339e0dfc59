//! Per-listing derived data shared by every stage.

use listguard_core::text::{compact, tokens};
use listguard_rules::CategoryRuleSet;

use crate::extract::{extract_all, extract_hit, ModelHit, ModelToken};

/// Normalized title and query of one listing, with their model tokens.
///
/// Built once per listing; stages only read it.
pub struct ListingContext<'a> {
    pub rules: &'a CategoryRuleSet,
    pub title: &'a str,
    pub title_tokens: Vec<&'a str>,
    pub query: &'a str,
    pub query_tokens: Vec<&'a str>,
    pub query_model: Option<ModelToken>,
    /// First title token by grammar order.
    pub title_model: Option<ModelHit>,
    /// All non-overlapping title tokens.
    pub title_models: Vec<ModelHit>,
}

impl<'a> ListingContext<'a> {
    /// `title` and `query` must already be normalized.
    pub fn new(rules: &'a CategoryRuleSet, title: &'a str, query: &'a str) -> Self {
        let title_tokens = tokens(title);
        let query_tokens = tokens(query);
        let grammar = &rules.grammar;
        let policy = rules.abbreviation;

        let query_model = extract_hit(&query_tokens, grammar, policy).map(|h| h.token);
        let title_model = extract_hit(&title_tokens, grammar, policy);
        let title_models = extract_all(&title_tokens, grammar, policy);

        Self {
            rules,
            title,
            title_tokens,
            query,
            query_tokens,
            query_model,
            title_model,
            title_models,
        }
    }

    /// Query and title carry the same model token.
    pub fn model_equal(&self) -> bool {
        match (&self.query_model, &self.title_model) {
            (Some(q), Some(t)) => *q == t.token,
            _ => false,
        }
    }

    /// Query and title both carry model tokens, and they differ.
    pub fn models_differ(&self) -> bool {
        match (&self.query_model, &self.title_model) {
            (Some(q), Some(t)) => *q != t.token,
            _ => false,
        }
    }

    /// Any title token equals `token`.
    pub fn title_has_model(&self, token: &ModelToken) -> bool {
        self.title_models.iter().any(|h| h.token == *token)
    }

    /// Span of the title token matching the query's, if any.
    pub fn query_model_in_title(&self) -> Option<&ModelHit> {
        let q = self.query_model.as_ref()?;
        self.title_models.iter().find(|h| h.token == *q)
    }

    pub fn compact_title(&self) -> String {
        compact(self.title)
    }

    pub fn compact_query(&self) -> String {
        compact(self.query)
    }
}
