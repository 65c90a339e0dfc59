//! Category listing and lookup.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use listguard_rules::CategorySummary;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{key}", get(get_category))
}

/// GET /api/categories
async fn list_categories(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.registry.snapshot();
    let categories: Vec<CategorySummary> = snapshot
        .iter()
        .map(|r| CategorySummary::from(r.as_ref()))
        .collect();

    Json(serde_json::json!({
        "version": snapshot.version,
        "source": snapshot.source,
        "categories": categories,
    }))
}

/// GET /api/categories/{key}: the prepared rule set.
async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match state.registry.get_category_config(&key) {
        Some(rules) => (StatusCode::OK, Json(serde_json::json!(rules.as_ref()))),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("Unknown category: {}", key),
                "reasonCode": "CATEGORY_UNCONFIGURED",
            })),
        ),
    }
}
