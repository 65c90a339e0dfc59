//! Rule reload.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/rules/reload", post(reload_rules))
}

/// POST /api/rules/reload: re-read the rule source and swap it in.
///
/// A failed reload leaves the active rules untouched.
async fn reload_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.registry.reload_from_source() {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "version": snapshot.version,
                "source": snapshot.source,
                "categories": snapshot.keys().collect::<Vec<_>>(),
            })),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "version": state.registry.snapshot().version,
            })),
        ),
    }
}
