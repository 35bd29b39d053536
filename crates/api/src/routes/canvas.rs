//! Route definitions for the canvas, mounted at `/canvas`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::canvas;
use crate::state::AppState;

/// Canvas routes.
///
/// ```text
/// GET    /                   -> get_canvas
/// POST   /nodes              -> create_node
/// GET    /nodes/{id}         -> get_node
/// PATCH  /nodes/{id}         -> update_node
/// DELETE /nodes/{id}         -> delete_node
/// PUT    /nodes/{id}/status  -> set_status
/// PUT    /nodes/{id}/angle   -> set_angle_mode
/// POST   /nodes/{id}/derive  -> derive_node
/// POST   /links              -> create_link
/// PUT    /selection          -> set_selection
/// POST   /menu/select        -> select_menu_option
/// GET    /events             -> list_events
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(canvas::get_canvas))
        .route("/nodes", post(canvas::create_node))
        .route(
            "/nodes/{id}",
            get(canvas::get_node)
                .patch(canvas::update_node)
                .delete(canvas::delete_node),
        )
        .route("/nodes/{id}/status", put(canvas::set_status))
        .route("/nodes/{id}/angle", put(canvas::set_angle_mode))
        .route("/nodes/{id}/derive", post(canvas::derive_node))
        .route("/links", post(canvas::create_link))
        .route("/selection", put(canvas::set_selection))
        .route("/menu/select", post(canvas::select_menu_option))
        .route("/events", get(canvas::list_events))
}
