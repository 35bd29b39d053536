//! Single-slot context menu controller.
//!
//! There is exactly one [`ContextMenuState`]; every `open_*` call overwrites
//! it, so opening a menu implicitly replaces whichever menu was showing.
//! The controller only captures raw screen coordinates. Converting them to
//! canvas coordinates is the [`MenuDispatcher`]'s job, using the viewport
//! transform handed over at selection time.

use serde::{Deserialize, Serialize};

use crate::canvas::TOOLBAR_MENU_OFFSET;
use crate::node::NodeType;
use crate::types::NodeId;
use crate::viewport::{Point, ViewportSize, ViewportTransform};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Which set of actions the menu offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuKind {
    #[default]
    Global,
    NodeConnector,
    NodeOptions,
}

/// Which connector handle of a node was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorSide {
    Left,
    Right,
}

/// The one shared context menu slot.
///
/// When `is_open` is false the remaining fields are stale and must not be
/// read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextMenuState {
    pub is_open: bool,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: MenuKind,
    pub source_node_id: Option<NodeId>,
    pub connector_side: Option<ConnectorSide>,
}

// ---------------------------------------------------------------------------
// Gestures
// ---------------------------------------------------------------------------

/// What a pointer event landed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum HitTarget {
    /// The designated canvas background element.
    Background,
    Node(NodeId),
    /// Any other element (panels, toolbars, overlays).
    Other,
}

/// A pointer gesture in screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub target: HitTarget,
}

/// How the caller should treat the originating DOM event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventDisposition {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl EventDisposition {
    /// Leave the event alone.
    pub const PASS: Self = Self {
        prevent_default: false,
        stop_propagation: false,
    };

    /// Suppress the browser menu only.
    pub const PREVENT_DEFAULT: Self = Self {
        prevent_default: true,
        stop_propagation: false,
    };

    /// Suppress the browser menu and keep ancestors from seeing the event.
    pub const CONSUME: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };
}

/// Screen-space bounding box of a toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The action a user picked in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "node_type", rename_all = "snake_case")]
pub enum MenuChoice {
    Create(NodeType),
    Delete,
}

/// Everything a dispatcher needs to carry out a menu choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSelection {
    /// Snapshot of the menu as it was open when the choice was made.
    pub menu: ContextMenuState,
    pub choice: MenuChoice,
    pub viewport: ViewportTransform,
}

impl MenuSelection {
    /// Menu position in screen space.
    pub fn screen_position(&self) -> Point {
        Point::new(self.menu.x, self.menu.y)
    }
}

/// Turns menu selections into graph mutations.
pub trait MenuDispatcher {
    fn dispatch(&self, selection: MenuSelection);
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ContextMenuController {
    state: ContextMenuState,
}

impl ContextMenuController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ContextMenuState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    /// Open the canvas-wide menu at a screen position.
    pub fn open_global_menu(&mut self, screen_x: f64, screen_y: f64) {
        self.state = ContextMenuState {
            is_open: true,
            x: screen_x,
            y: screen_y,
            kind: MenuKind::Global,
            source_node_id: None,
            connector_side: None,
        };
    }

    /// Open the connector menu for `node_id`, centered in the viewport.
    ///
    /// The cursor position is ignored: on a panned or zoomed canvas the
    /// connector may sit near or beyond the viewport edge.
    pub fn open_connector_menu(
        &mut self,
        node_id: NodeId,
        side: ConnectorSide,
        viewport: ViewportSize,
    ) {
        let center = viewport.center();
        self.state = ContextMenuState {
            is_open: true,
            x: center.x,
            y: center.y,
            kind: MenuKind::NodeConnector,
            source_node_id: Some(node_id),
            connector_side: Some(side),
        };
    }

    /// Open the per-node options menu at the cursor.
    ///
    /// The returned disposition consumes the event so the background
    /// handler does not also open the global menu.
    pub fn open_node_options_menu(
        &mut self,
        event: &PointerEvent,
        node_id: NodeId,
    ) -> EventDisposition {
        self.state = ContextMenuState {
            is_open: true,
            x: event.x,
            y: event.y,
            kind: MenuKind::NodeOptions,
            source_node_id: Some(node_id),
            connector_side: None,
        };
        EventDisposition::CONSUME
    }

    /// Open the global menu next to the toolbar "add" button.
    pub fn open_from_toolbar(&mut self, button: ButtonRect) {
        self.open_global_menu(button.left + button.width + TOOLBAR_MENU_OFFSET, button.top);
    }

    /// Double-click: opens the global menu only on the canvas background.
    pub fn handle_double_click(&mut self, event: &PointerEvent) -> EventDisposition {
        if event.target != HitTarget::Background {
            return EventDisposition::PASS;
        }
        self.open_global_menu(event.x, event.y);
        EventDisposition::PASS
    }

    /// Right-click: opens the global menu on the background, suppressing the
    /// browser's own menu.
    pub fn handle_context_menu(&mut self, event: &PointerEvent) -> EventDisposition {
        if event.target != HitTarget::Background {
            return EventDisposition::PASS;
        }
        self.open_global_menu(event.x, event.y);
        EventDisposition::PREVENT_DEFAULT
    }

    pub fn close(&mut self) {
        self.state.is_open = false;
    }

    /// Hand the user's choice to `dispatcher`, then close the menu.
    ///
    /// Returns `false` without dispatching when no menu is open.
    pub fn select_option<D>(
        &mut self,
        choice: MenuChoice,
        viewport: ViewportTransform,
        dispatcher: &D,
    ) -> bool
    where
        D: MenuDispatcher + ?Sized,
    {
        if !self.state.is_open {
            return false;
        }
        dispatcher.dispatch(MenuSelection {
            menu: self.state.clone(),
            choice,
            viewport,
        });
        self.close();
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
