//! Node relationship engine.
//!
//! Each derivation looks up a source node, mints a new node placed
//! [`DERIVED_NODE_OFFSET`](twitcanva_core::canvas::DERIVED_NODE_OFFSET) to
//! its right, links it back with `parent_ids = [source]` and commits both in
//! one store update. A missing source (or, for angle regeneration, missing
//! angle settings) is a silent no-op: the UI never offers the action in that
//! state, so callers get `None` and the store is untouched.

use std::sync::Arc;

use twitcanva_core::angle::synthesize_angle_prompt;
use twitcanva_core::canvas::{downstream_position, validate_node_count};
use twitcanva_core::error::CoreError;
use twitcanva_core::node::{or_auto, GenerationConfig, Node, NodeType, ANGLE_IMAGE_MODEL};
use twitcanva_core::types::NodeId;
use twitcanva_events::{event_types, CanvasEvent};

use crate::bridge::{GenerationBridge, GenerationTrigger};
use crate::store::{CanvasSnapshot, Change, NodeStore};

/// Configuration applied to freshly derived nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationDefaults {
    /// Config for image/video derivations. Not copied from the source.
    pub config: GenerationConfig,
    /// Image model forced on angle regeneration.
    pub angle_image_model: String,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            config: GenerationConfig::default(),
            angle_image_model: ANGLE_IMAGE_MODEL.to_string(),
        }
    }
}

pub struct NodeRelationshipEngine {
    store: Arc<NodeStore>,
    bridge: GenerationBridge,
    trigger: Option<Arc<dyn GenerationTrigger>>,
    defaults: GenerationDefaults,
}

impl NodeRelationshipEngine {
    pub fn new(store: Arc<NodeStore>, defaults: GenerationDefaults) -> Self {
        Self {
            bridge: GenerationBridge::new(Arc::clone(&store)),
            store,
            trigger: None,
            defaults,
        }
    }

    /// Set the generation trigger used after angle regeneration.
    pub fn with_trigger(mut self, trigger: Arc<dyn GenerationTrigger>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn store(&self) -> &Arc<NodeStore> {
        &self.store
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    /// Derive an IMAGE node from `source_id` and select it exclusively.
    pub fn derive_image_from_image(&self, source_id: &NodeId) -> Option<NodeId> {
        self.derive_with_defaults(source_id, NodeType::Image, "image_from_image")
    }

    /// Derive a VIDEO node from `source_id` and select it exclusively.
    pub fn derive_video_from_image(&self, source_id: &NodeId) -> Option<NodeId> {
        self.derive_with_defaults(source_id, NodeType::Video, "video_from_image")
    }

    /// Regenerate `source_id` from a new camera angle.
    ///
    /// Builds an IMAGE node whose prompt is synthesized from the source's
    /// angle settings, turns the source's angle mode off and drops its
    /// settings in the same commit, then schedules generation on the new
    /// node. A source not in angle mode yields `None`.
    pub fn derive_angle_regeneration(&self, source_id: &NodeId) -> Option<NodeId> {
        let mut derived = None;

        let committed = self.store.commit(|snapshot| {
            let Some(source) = snapshot.node(source_id) else {
                return Ok(None);
            };
            let Some(settings) = source.angle_settings.filter(|_| source.angle_mode) else {
                return Ok(None);
            };
            validate_node_count(snapshot.nodes.len(), 1)?;

            let config = GenerationConfig {
                model: self.defaults.config.model.clone(),
                image_model: self.defaults.angle_image_model.clone(),
                aspect_ratio: or_auto(&source.config.aspect_ratio),
                resolution: or_auto(&source.config.resolution),
            };
            let (x, y) = downstream_position(source.x, source.y);
            let child = Node::new(NodeType::Image, x, y, config)
                .with_parent(source.id.clone())
                .with_prompt(synthesize_angle_prompt(&settings));

            let mut change = Change::from_snapshot(snapshot)
                .event(derived_event(&child, source_id, "angle_regeneration"))
                .event(
                    CanvasEvent::new(event_types::NODE_UPDATED)
                        .with_node(source_id.clone())
                        .with_payload(serde_json::json!({ "angle_mode": false })),
                );
            for node in change.nodes.iter_mut().filter(|n| &n.id == source_id) {
                node.angle_mode = false;
                node.angle_settings = None;
            }
            derived = Some(child.id.clone());
            change.nodes.push(child);
            Ok(Some(change))
        });

        let (child_id, revision) = self.settle(source_id, committed, derived)?;
        tracing::info!(
            source_id = %source_id,
            node_id = %child_id,
            "Angle regeneration node derived",
        );
        self.bridge
            .schedule_generation(child_id.clone(), revision, self.trigger.clone());
        Some(child_id)
    }

    fn derive_with_defaults(
        &self,
        source_id: &NodeId,
        node_type: NodeType,
        derivation: &'static str,
    ) -> Option<NodeId> {
        let mut derived = None;

        let committed = self.store.commit(|snapshot: &CanvasSnapshot| {
            let Some(source) = snapshot.node(source_id) else {
                return Ok(None);
            };
            validate_node_count(snapshot.nodes.len(), 1)?;

            let (x, y) = downstream_position(source.x, source.y);
            let child = Node::new(node_type, x, y, self.defaults.config.clone())
                .with_parent(source.id.clone());

            let mut change =
                Change::from_snapshot(snapshot).event(derived_event(&child, source_id, derivation));
            change.selected = vec![child.id.clone()];
            derived = Some(child.id.clone());
            change.nodes.push(child);
            Ok(Some(change))
        });

        let (child_id, _) = self.settle(source_id, committed, derived)?;
        tracing::info!(
            source_id = %source_id,
            node_id = %child_id,
            derivation,
            "Node derived",
        );
        Some(child_id)
    }

    /// Reduce a commit outcome to the derived id and its revision.
    fn settle(
        &self,
        source_id: &NodeId,
        committed: Result<Option<u64>, CoreError>,
        derived: Option<NodeId>,
    ) -> Option<(NodeId, u64)> {
        match committed {
            Ok(Some(revision)) => derived.map(|id| (id, revision)),
            Ok(None) => {
                tracing::debug!(source_id = %source_id, "Derivation skipped, source not eligible");
                None
            }
            Err(e) => {
                tracing::warn!(source_id = %source_id, error = %e, "Derivation rejected");
                None
            }
        }
    }
}

fn derived_event(child: &Node, source_id: &NodeId, derivation: &str) -> CanvasEvent {
    CanvasEvent::new(event_types::NODE_DERIVED)
        .with_node(child.id.clone())
        .with_payload(serde_json::json!({
            "source_id": source_id,
            "type": child.node_type.as_str(),
            "derivation": derivation,
        }))
}
