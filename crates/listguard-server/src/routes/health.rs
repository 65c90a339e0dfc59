//! Health and escalation status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/escalation", get(escalation_status))
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.registry.snapshot();
    let uptime = chrono::Utc::now() - state.started_at;

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": uptime.num_seconds(),
        "rulesVersion": snapshot.version,
        "rulesSource": snapshot.source,
        "categories": snapshot.len(),
        "escalationActive": state.validator.escalator().is_active(),
    }))
}

/// GET /api/escalation: provider setup (no keys), limits and stage switches.
async fn escalation_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let escalator = state.validator.escalator();

    Json(serde_json::json!({
        "adjudicator": escalator.adjudicator_name(),
        "active": escalator.is_active(),
        "status": escalator.settings().status(),
        "settings": escalator.settings(),
        "filters": state.config.filters,
    }))
}
