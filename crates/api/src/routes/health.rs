use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Current store revision.
    pub revision: u64,
    /// Number of nodes on the canvas.
    pub node_count: usize,
}

/// GET /health -- returns service status and a canvas summary.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        revision: snapshot.revision,
        node_count: snapshot.nodes.len(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
