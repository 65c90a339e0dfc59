//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use listguard_core::ListguardConfig;
use listguard_escalate::{create_adjudicator, EscalationConfig, Escalator};
use listguard_rules::RuleRegistry;
use listguard_runtime::BatchValidator;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ListguardConfig,
    pub registry: Arc<RuleRegistry>,
    pub validator: BatchValidator,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Load rules and the escalation setup from configuration.
    pub fn new(config: ListguardConfig) -> listguard_core::Result<Self> {
        let registry = Arc::new(RuleRegistry::from_path(config.rules_path.as_deref())?);
        let escalation = EscalationConfig::load(&config.escalation_config_path());
        let escalator = Escalator::new(create_adjudicator(&escalation), escalation);

        Ok(Self::with_parts(config, registry, escalator))
    }

    /// Assemble state from ready parts (tests, embedding).
    pub fn with_parts(
        config: ListguardConfig,
        registry: Arc<RuleRegistry>,
        escalator: Escalator,
    ) -> Self {
        Self {
            validator: BatchValidator::new(registry.clone(), escalator).with_filters(config.filters),
            config,
            registry,
            started_at: Utc::now(),
        }
    }
}
