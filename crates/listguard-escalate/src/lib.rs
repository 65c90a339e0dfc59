//! Escalation of ambiguous listings to an external adjudicator
//! (OpenAI/Anthropic/Groq).
//!
//! Calls are grouped per (category, query), bounded by a deadline and a
//! retry budget, and fall back to the provisional verdict on failure.

pub mod client;
pub mod config;
pub mod escalate;
pub mod http;
pub mod types;

use std::sync::Arc;

pub use client::{Adjudicator, BoxedAdjudication, DisabledAdjudicator};
pub use config::EscalationConfig;
pub use escalate::{EscalationCandidate, EscalationOutcome, Escalator};
pub use http::HttpAdjudicator;
pub use types::*;

/// Create the adjudicator the configuration asks for.
pub fn create_adjudicator(config: &EscalationConfig) -> Arc<dyn Adjudicator> {
    if !config.enabled {
        tracing::info!("Escalation disabled. Ambiguous listings keep provisional verdicts.");
        return Arc::new(DisabledAdjudicator);
    }

    match &config.api_key {
        Some(key) => {
            tracing::info!("Using {} adjudicator (model={})", config.provider, config.model());
            Arc::new(HttpAdjudicator::new(
                config.provider,
                config.model().to_string(),
                key.clone(),
            ))
        }
        None => {
            tracing::warn!(
                "No {} key configured ({}). Falling back to provisional verdicts.",
                config.provider,
                config.provider.key_var()
            );
            Arc::new(DisabledAdjudicator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_without_key() {
        let adj = create_adjudicator(&EscalationConfig::default());
        assert!(!adj.is_available());
        assert_eq!(adj.name(), "disabled");
    }

    #[test]
    fn test_factory_with_key() {
        let mut config = EscalationConfig {
            provider: AdjudicatorProvider::Groq,
            api_key: Some("gsk".into()),
            ..Default::default()
        };
        let adj = create_adjudicator(&config);
        assert!(adj.is_available());
        assert!(adj.name().starts_with("groq:"));

        config.enabled = false;
        assert!(!create_adjudicator(&config).is_available());
    }
}
