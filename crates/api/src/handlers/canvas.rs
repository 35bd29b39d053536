//! Handlers for the canvas: nodes, derivations, links, selection, menu
//! dispatch and the event tail.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use twitcanva_canvas::{NodeEdit, StatusUpdate};
use twitcanva_core::angle::AngleSettings;
use twitcanva_core::canvas::{normalize_title, MAX_NODES_PER_CANVAS};
use twitcanva_core::context_menu::MenuSelection;
use twitcanva_core::error::CoreError;
use twitcanva_core::node::{Node, NodeType};
use twitcanva_core::types::NodeId;
use twitcanva_events::DEFAULT_JOURNAL_CAPACITY;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Events returned by `GET /canvas/events` when no limit is given.
const DEFAULT_EVENT_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub parent_ids: Vec<NodeId>,
    /// Select the new node exclusively (default: `true`).
    #[serde(default = "default_true")]
    pub select: bool,
}

fn default_true() -> bool {
    true
}

/// Partial node update. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub prompt: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AngleModeRequest {
    pub enabled: bool,
    #[serde(default)]
    pub settings: Option<AngleSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeriveKind {
    Image,
    Video,
    Angle,
}

#[derive(Debug, Deserialize)]
pub struct DeriveRequest {
    pub kind: DeriveKind,
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub parent_id: NodeId,
    pub child_id: NodeId,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub parent_id: NodeId,
    pub child_id: NodeId,
    /// `false` when the link already existed.
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub node_ids: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct MenuOutcome {
    /// Node created by the selection, if any.
    pub node_id: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// GET /api/v1/canvas
///
/// The current snapshot: revision, nodes and selection.
pub async fn get_canvas(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot();
    Ok(Json(DataResponse {
        data: (*snapshot).clone(),
    }))
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// POST /api/v1/canvas/nodes
pub async fn create_node(
    State(state): State<AppState>,
    Json(input): Json<CreateNodeRequest>,
) -> AppResult<impl IntoResponse> {
    let mut node = Node::new(
        input.node_type,
        input.x,
        input.y,
        state.config.generation.config.clone(),
    );
    if let Some(prompt) = input.prompt {
        node = node.with_prompt(prompt);
    }
    if let Some(title) = input.title.as_deref() {
        node.title = normalize_title(title)?;
    }
    for parent in input.parent_ids {
        node = node.with_parent(parent);
    }

    let node_id = state.store.add_node(node, input.select)?;
    let node = find_node(&state, &node_id)?;

    tracing::info!(node_id = %node_id, node_type = node.node_type.as_str(), "Node created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: node })))
}

/// GET /api/v1/canvas/nodes/{id}
pub async fn get_node(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
) -> AppResult<impl IntoResponse> {
    let node = find_node(&state, &node_id)?;
    Ok(Json(DataResponse { data: node }))
}

/// PATCH /api/v1/canvas/nodes/{id}
///
/// Move, re-prompt and/or rename a node in a single commit. A missing
/// coordinate keeps its current value; an invalid field rejects the whole
/// update.
pub async fn update_node(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
    Json(input): Json<UpdateNodeRequest>,
) -> AppResult<impl IntoResponse> {
    let edit = NodeEdit {
        x: input.x,
        y: input.y,
        prompt: input.prompt,
        title: input.title,
    };
    if edit.is_empty() {
        return Err(AppError::BadRequest(
            "At least one of x, y, prompt or title is required".to_string(),
        ));
    }

    state.store.edit_node(&node_id, edit)?;

    let node = find_node(&state, &node_id)?;
    tracing::info!(node_id = %node_id, "Node updated");

    Ok(Json(DataResponse { data: node }))
}

/// DELETE /api/v1/canvas/nodes/{id}
pub async fn delete_node(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
) -> AppResult<impl IntoResponse> {
    state.store.remove_node(&node_id)?;
    tracing::info!(node_id = %node_id, "Node deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/canvas/nodes/{id}/status
///
/// Status report from the generation subsystem.
pub async fn set_status(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
    Json(input): Json<StatusUpdate>,
) -> AppResult<impl IntoResponse> {
    state.store.set_status(&node_id, input)?;
    let node = find_node(&state, &node_id)?;
    Ok(Json(DataResponse { data: node }))
}

/// PUT /api/v1/canvas/nodes/{id}/angle
pub async fn set_angle_mode(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
    Json(input): Json<AngleModeRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .store
        .set_angle_mode(&node_id, input.enabled, input.settings)?;
    let node = find_node(&state, &node_id)?;
    Ok(Json(DataResponse { data: node }))
}

/// POST /api/v1/canvas/nodes/{id}/derive
///
/// Derive a linked node from `id`. Responds with the new node.
pub async fn derive_node(
    State(state): State<AppState>,
    Path(source_id): Path<NodeId>,
    Json(input): Json<DeriveRequest>,
) -> AppResult<impl IntoResponse> {
    let derived = match input.kind {
        DeriveKind::Image => state.engine.derive_image_from_image(&source_id),
        DeriveKind::Video => state.engine.derive_video_from_image(&source_id),
        DeriveKind::Angle => state.engine.derive_angle_regeneration(&source_id),
    };

    let Some(node_id) = derived else {
        return Err(derive_rejection(&state, &source_id, input.kind));
    };
    let node = find_node(&state, &node_id)?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: node })))
}

/// Explain why the engine declined to derive from `source_id`.
fn derive_rejection(state: &AppState, source_id: &NodeId, kind: DeriveKind) -> AppError {
    let snapshot = state.store.snapshot();
    match snapshot.node(source_id) {
        None => CoreError::node_not_found(source_id).into(),
        Some(source)
            if kind == DeriveKind::Angle
                && (!source.angle_mode || source.angle_settings.is_none()) =>
        {
            AppError::BadRequest(format!("Node {source_id} is not in angle mode"))
        }
        Some(_) if snapshot.nodes.len() >= MAX_NODES_PER_CANVAS => CoreError::Validation(format!(
            "Canvas already holds the maximum of {MAX_NODES_PER_CANVAS} nodes"
        ))
        .into(),
        Some(_) => {
            AppError::InternalError(format!("Derivation from {source_id} was not committed"))
        }
    }
}

// ---------------------------------------------------------------------------
// Links & selection
// ---------------------------------------------------------------------------

/// POST /api/v1/canvas/links
pub async fn create_link(
    State(state): State<AppState>,
    Json(input): Json<LinkRequest>,
) -> AppResult<impl IntoResponse> {
    let created = state.store.link(&input.parent_id, &input.child_id)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(DataResponse {
            data: LinkResponse {
                parent_id: input.parent_id,
                child_id: input.child_id,
                created,
            },
        }),
    ))
}

/// PUT /api/v1/canvas/selection
pub async fn set_selection(
    State(state): State<AppState>,
    Json(input): Json<SelectionRequest>,
) -> AppResult<impl IntoResponse> {
    state.store.select(input.node_ids)?;
    let selected = state.store.snapshot().selected.clone();
    Ok(Json(DataResponse { data: selected }))
}

// ---------------------------------------------------------------------------
// Context menu
// ---------------------------------------------------------------------------

/// POST /api/v1/canvas/menu/select
///
/// Execute a menu selection made in a remote client.
pub async fn select_menu_option(
    State(state): State<AppState>,
    Json(selection): Json<MenuSelection>,
) -> AppResult<impl IntoResponse> {
    let node_id = state.dispatcher.apply(&selection)?;

    tracing::info!(
        kind = ?selection.menu.kind,
        choice = ?selection.choice,
        node_id = ?node_id.as_ref().map(NodeId::as_str),
        "Menu selection applied",
    );

    Ok(Json(DataResponse {
        data: MenuOutcome { node_id },
    }))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// GET /api/v1/canvas/events?limit=N
///
/// Most recent events, oldest first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .clamp(1, DEFAULT_JOURNAL_CAPACITY);
    let events = state.journal.recent(limit).await;
    Ok(Json(DataResponse { data: events }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_node(state: &AppState, node_id: &NodeId) -> Result<Node, AppError> {
    state
        .store
        .node(node_id)
        .ok_or_else(|| AppError::Core(CoreError::node_not_found(node_id)))
}
