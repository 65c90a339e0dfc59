//! Batch validation route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use listguard_core::Listing;
use listguard_runtime::BatchReport;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/validate", post(validate))
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub listings: Vec<Listing>,
}

/// POST /api/validate: one verdict record per listing, in input order.
async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Json<BatchReport> {
    Json(state.validator.validate_batch(req.listings).await)
}
