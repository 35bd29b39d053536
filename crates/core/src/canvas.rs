//! Canvas layout constants and validation.
//!
//! Placement of derived nodes is a pure function of the source position so
//! derivation chains lay out left-to-right without overlapping.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Rendered width of a canvas node in canvas units.
pub const NODE_WIDTH: f64 = 340.0;

/// Horizontal gap between a node and the node derived from it.
pub const NODE_GAP: f64 = 100.0;

/// Horizontal distance from a source node to a node derived from it.
pub const DERIVED_NODE_OFFSET: f64 = NODE_WIDTH + NODE_GAP;

/// Offset between the toolbar "add" button's right edge and the menu.
pub const TOOLBAR_MENU_OFFSET: f64 = 10.0;

// ---------------------------------------------------------------------------
// Viewport bounds
// ---------------------------------------------------------------------------

/// Default canvas viewport zoom level.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 4.0;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum number of nodes allowed on a single canvas.
pub const MAX_NODES_PER_CANVAS: usize = 500;

/// Maximum length of a node title after trimming.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum length of a node prompt.
pub const MAX_PROMPT_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Position of a node derived downstream (to the right) of `(x, y)`.
pub fn downstream_position(x: f64, y: f64) -> (f64, f64) {
    (x + DERIVED_NODE_OFFSET, y)
}

/// Position of a node created upstream (to the left) of `(x, y)`.
pub fn upstream_position(x: f64, y: f64) -> (f64, f64) {
    (x - DERIVED_NODE_OFFSET, y)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that adding `additional` nodes keeps the canvas within its limit.
pub fn validate_node_count(current: usize, additional: usize) -> Result<(), CoreError> {
    let count = current + additional;
    if count > MAX_NODES_PER_CANVAS {
        Err(CoreError::Validation(format!(
            "Canvas would have {count} nodes, exceeding the maximum of {MAX_NODES_PER_CANVAS}"
        )))
    } else {
        Ok(())
    }
}

/// Validate that a zoom level is within allowed bounds.
pub fn validate_zoom(zoom: f64) -> Result<(), CoreError> {
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        Err(CoreError::Validation(format!(
            "Zoom {zoom} is outside the allowed range [{MIN_ZOOM}, {MAX_ZOOM}]"
        )))
    } else {
        Ok(())
    }
}

/// Validate that a coordinate pair is finite.
pub fn validate_position(x: f64, y: f64) -> Result<(), CoreError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Position ({x}, {y}) must be finite"
        )))
    }
}

/// Normalise a user-edited title.
///
/// Surrounding whitespace is trimmed; a blank title becomes `None` so the
/// node falls back to its type's default title.
pub fn normalize_title(title: &str) -> Result<Option<String>, CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must not exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// Validate a prompt's length.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.chars().count() > MAX_PROMPT_LENGTH {
        Err(CoreError::Validation(format!(
            "Prompt must not exceed {MAX_PROMPT_LENGTH} characters"
        )))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
