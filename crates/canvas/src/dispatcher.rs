//! Carries out context menu selections against the node store.

use std::sync::Arc;

use twitcanva_core::canvas::{downstream_position, upstream_position, validate_zoom};
use twitcanva_core::context_menu::{
    ConnectorSide, MenuChoice, MenuDispatcher, MenuKind, MenuSelection,
};
use twitcanva_core::error::CoreError;
use twitcanva_core::node::{GenerationConfig, Node, NodeType};
use twitcanva_core::types::NodeId;

use crate::store::NodeStore;

/// [`MenuDispatcher`] backed by a [`NodeStore`].
///
/// - global + create: root node at the menu's canvas position
/// - connector (right) / options + create: linked node to the right
/// - connector (left) + create: new parent to the left
/// - options + delete: remove the node
pub struct CanvasMenuDispatcher {
    store: Arc<NodeStore>,
    config: GenerationConfig,
}

impl CanvasMenuDispatcher {
    pub fn new(store: Arc<NodeStore>, config: GenerationConfig) -> Self {
        Self { store, config }
    }

    /// Apply `selection`, reporting the created node if any.
    ///
    /// `Ok(None)` means the selection had nothing to act on (a delete from
    /// the global menu, or a closed menu) or removed a node.
    pub fn apply(&self, selection: &MenuSelection) -> Result<Option<NodeId>, CoreError> {
        let menu = &selection.menu;
        if !menu.is_open {
            tracing::debug!("Menu selection ignored, menu is closed");
            return Ok(None);
        }

        match (menu.kind, selection.choice) {
            (MenuKind::Global, MenuChoice::Create(node_type)) => {
                validate_zoom(selection.viewport.zoom)?;
                let at = selection.viewport.screen_to_canvas(selection.screen_position());
                let node = Node::new(node_type, at.x, at.y, self.config.clone());
                self.store.add_node(node, true).map(Some)
            }
            (MenuKind::Global, MenuChoice::Delete) => {
                tracing::debug!("Delete selected from global menu, nothing to remove");
                Ok(None)
            }
            (kind, choice) => {
                let source = menu.source_node_id.as_ref().ok_or_else(|| {
                    CoreError::Validation(format!("{kind:?} menu requires a source node"))
                })?;
                match choice {
                    MenuChoice::Delete => self.store.remove_node(source).map(|_| None),
                    MenuChoice::Create(node_type)
                        if kind == MenuKind::NodeConnector
                            && menu.connector_side == Some(ConnectorSide::Left) =>
                    {
                        self.create_upstream(source, node_type).map(Some)
                    }
                    MenuChoice::Create(node_type) => {
                        self.create_downstream(source, node_type).map(Some)
                    }
                }
            }
        }
    }

    fn create_downstream(&self, source: &NodeId, node_type: NodeType) -> Result<NodeId, CoreError> {
        self.store.add_anchored_node(source, |anchor| {
            let (x, y) = downstream_position(anchor.x, anchor.y);
            Node::new(node_type, x, y, self.config.clone()).with_parent(anchor.id.clone())
        })
    }

    fn create_upstream(&self, target: &NodeId, node_type: NodeType) -> Result<NodeId, CoreError> {
        self.store.add_upstream_node(target, |anchor| {
            let (x, y) = upstream_position(anchor.x, anchor.y);
            Node::new(node_type, x, y, self.config.clone())
        })
    }
}

impl MenuDispatcher for CanvasMenuDispatcher {
    fn dispatch(&self, selection: MenuSelection) {
        match self.apply(&selection) {
            Ok(Some(node_id)) => {
                tracing::info!(
                    node_id = %node_id,
                    kind = ?selection.menu.kind,
                    "Node created from menu",
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, kind = ?selection.menu.kind, "Menu selection failed");
            }
        }
    }
}
