pub mod canvas;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /canvas                              snapshot
/// /canvas/nodes                        create
/// /canvas/nodes/{id}                   get, patch, delete
/// /canvas/nodes/{id}/status            status transition (PUT)
/// /canvas/nodes/{id}/angle             angle mode (PUT)
/// /canvas/nodes/{id}/derive            derive image / video / angle (POST)
/// /canvas/links                        link parent -> child (POST)
/// /canvas/selection                    replace selection (PUT)
/// /canvas/menu/select                  apply a context menu selection (POST)
/// /canvas/events                       recent events
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/canvas", canvas::router())
}
