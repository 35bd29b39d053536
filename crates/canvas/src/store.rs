//! The canonical node collection.
//!
//! The store is a `tokio::sync::watch` channel of immutable
//! [`CanvasSnapshot`]s. Every write builds a complete new snapshot inside the
//! channel's write lock, so readers holding an older snapshot never see a
//! half-applied change, and a node and its parent links always appear in the
//! same commit. Subscribers are notified per commit; the revision number is
//! the commit acknowledgement the generation bridge waits on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use twitcanva_core::angle::{validate_angle_settings, AngleSettings};
use twitcanva_core::canvas::{
    normalize_title, validate_node_count, validate_position, validate_prompt,
};
use twitcanva_core::error::CoreError;
use twitcanva_core::graph;
use twitcanva_core::node::{validate_status_transition, Node, NodeStatus, NodeType};
use twitcanva_core::types::NodeId;
use twitcanva_events::{event_types, CanvasEvent, EventBus};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable view of the canvas at one revision.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanvasSnapshot {
    /// Incremented by one on every commit.
    pub revision: u64,
    pub nodes: Vec<Node>,
    /// Currently selected nodes, in selection order.
    pub selected: Vec<NodeId>,
}

impl CanvasSnapshot {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }
}

/// The next snapshot's contents, plus events to publish once committed.
pub(crate) struct Change {
    pub nodes: Vec<Node>,
    pub selected: Vec<NodeId>,
    pub events: Vec<CanvasEvent>,
}

impl Change {
    pub fn from_snapshot(snapshot: &CanvasSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes.clone(),
            selected: snapshot.selected.clone(),
            events: Vec::new(),
        }
    }

    pub fn event(mut self, event: CanvasEvent) -> Self {
        self.events.push(event);
        self
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, CoreError> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| CoreError::node_not_found(id))
    }
}

/// A status transition requested by the generation subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: NodeStatus,
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: NodeStatus) -> Self {
        Self {
            status,
            result_url: None,
            error_message: None,
        }
    }
}

/// A partial edit of a node's position, prompt and title.
///
/// Absent fields keep their current value. A missing coordinate keeps the
/// node's current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeEdit {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub prompt: Option<String>,
    pub title: Option<String>,
}

impl NodeEdit {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.prompt.is_none() && self.title.is_none()
    }
}

// ---------------------------------------------------------------------------
// NodeStore
// ---------------------------------------------------------------------------

/// Shared node store. Designed to be wrapped in `Arc`.
pub struct NodeStore {
    sender: watch::Sender<Arc<CanvasSnapshot>>,
    event_bus: Option<Arc<EventBus>>,
}

impl NodeStore {
    /// Create an empty store that publishes no events.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(CanvasSnapshot::default()));
        Self {
            sender,
            event_bus: None,
        }
    }

    /// Create an empty store publishing a [`CanvasEvent`] per change.
    pub fn with_event_bus(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus: Some(event_bus),
            ..Self::new()
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CanvasSnapshot> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receive every future commit.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CanvasSnapshot>> {
        self.sender.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.sender.borrow().revision
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.sender.borrow().node(id).cloned()
    }

    /// Atomically replace the snapshot with the one built by `build`.
    ///
    /// `build` returns `Ok(None)` to leave the store untouched. On commit the
    /// new revision is returned and the change's events are published,
    /// stamped with that revision.
    pub(crate) fn commit<F>(&self, build: F) -> Result<Option<u64>, CoreError>
    where
        F: FnOnce(&CanvasSnapshot) -> Result<Option<Change>, CoreError>,
    {
        let mut outcome = Ok(None);
        let mut events = Vec::new();

        self.sender.send_if_modified(|current| match build(&**current) {
            Ok(Some(change)) => {
                let revision = current.revision + 1;
                *current = Arc::new(CanvasSnapshot {
                    revision,
                    nodes: change.nodes,
                    selected: change.selected,
                });
                events = change.events;
                outcome = Ok(Some(revision));
                true
            }
            Ok(None) => false,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });

        if let (Ok(Some(revision)), Some(bus)) = (&outcome, &self.event_bus) {
            for event in events {
                bus.publish(event.at_revision(*revision));
            }
        }
        outcome
    }

    /// Commit a change that must happen; a no-op build is an internal error.
    fn commit_required<F>(&self, build: F) -> Result<u64, CoreError>
    where
        F: FnOnce(&CanvasSnapshot) -> Result<Change, CoreError>,
    {
        self.commit(|snapshot| build(snapshot).map(Some))?
            .ok_or_else(|| CoreError::Internal("Store change was not committed".to_string()))
    }

    // -- Node lifecycle -----------------------------------------------------

    /// Append `node`, optionally selecting it exclusively.
    ///
    /// Every parent id must already exist.
    pub fn add_node(&self, node: Node, select: bool) -> Result<NodeId, CoreError> {
        let id = node.id.clone();
        self.commit_required(|snapshot| insert_node(snapshot, node, select))?;

        tracing::debug!(node_id = %id, "Node added");
        Ok(id)
    }

    /// Append the node `build` makes from `anchor` and select it.
    ///
    /// `build` sees the anchor as of the commit, so placement follows the
    /// anchor's latest position.
    pub fn add_anchored_node<F>(&self, anchor: &NodeId, build: F) -> Result<NodeId, CoreError>
    where
        F: FnOnce(&Node) -> Node,
    {
        let mut added = None;

        self.commit_required(|snapshot| {
            let source = snapshot
                .node(anchor)
                .ok_or_else(|| CoreError::node_not_found(anchor))?;
            let node = build(source);
            added = Some(node.id.clone());
            insert_node(snapshot, node, true)
        })?;

        let id = added.ok_or_else(|| CoreError::Internal("Anchored node missing".to_string()))?;
        tracing::debug!(node_id = %id, anchor = %anchor, "Anchored node added");
        Ok(id)
    }

    /// Append the node `build` makes from `downstream` as its new parent,
    /// in one commit.
    ///
    /// The node is placed in `downstream`'s `parent_ids` after any existing
    /// parents and is selected exclusively.
    pub fn add_upstream_node<F>(&self, downstream: &NodeId, build: F) -> Result<NodeId, CoreError>
    where
        F: FnOnce(&Node) -> Node,
    {
        let mut added = None;

        self.commit_required(|snapshot| {
            validate_node_count(snapshot.nodes.len(), 1)?;
            let target = snapshot
                .node(downstream)
                .ok_or_else(|| CoreError::node_not_found(downstream))?;
            let node = build(target);
            validate_position(node.x, node.y)?;
            let id = node.id.clone();

            let mut change = Change::from_snapshot(snapshot)
                .event(
                    CanvasEvent::new(event_types::NODE_CREATED)
                        .with_node(id.clone())
                        .with_payload(serde_json::json!({ "type": node.node_type.as_str() })),
                )
                .event(
                    CanvasEvent::new(event_types::NODE_LINKED)
                        .with_node(downstream.clone())
                        .with_payload(serde_json::json!({ "parent_id": id })),
                );
            change.selected = vec![id.clone()];
            change.nodes.push(node);

            graph::validate_link(&change.nodes, &id, downstream)?;
            change.node_mut(downstream)?.parent_ids.push(id.clone());
            added = Some(id);
            Ok(change)
        })?;

        let id = added.ok_or_else(|| CoreError::Internal("Upstream node missing".to_string()))?;
        tracing::debug!(node_id = %id, downstream = %downstream, "Upstream node added");
        Ok(id)
    }

    /// Remove a node, stripping it from every parent list and the selection.
    pub fn remove_node(&self, id: &NodeId) -> Result<Node, CoreError> {
        let mut removed = None;

        self.commit_required(|snapshot| {
            let mut change = Change::from_snapshot(snapshot);
            let index = change
                .nodes
                .iter()
                .position(|n| &n.id == id)
                .ok_or_else(|| CoreError::node_not_found(id))?;
            let node = change.nodes.remove(index);

            let orphaned = graph::children_of(&change.nodes, id);
            for child in change.nodes.iter_mut() {
                child.parent_ids.retain(|p| p != id);
            }
            change.selected.retain(|s| s != id);

            removed = Some(node);
            Ok(change.event(
                CanvasEvent::new(event_types::NODE_REMOVED)
                    .with_node(id.clone())
                    .with_payload(serde_json::json!({ "unlinked_children": orphaned })),
            ))
        })?;

        tracing::debug!(node_id = %id, "Node removed");
        removed.ok_or_else(|| CoreError::Internal("Removed node missing".to_string()))
    }

    // -- Node edits ---------------------------------------------------------

    /// Replace a node via `edit`, publishing `node.updated` with `payload`.
    fn update_node<F>(
        &self,
        id: &NodeId,
        payload: serde_json::Value,
        edit: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Node) -> Result<(), CoreError>,
    {
        self.commit_required(|snapshot| {
            let mut change = Change::from_snapshot(snapshot);
            edit(change.node_mut(id)?)?;
            Ok(change.event(
                CanvasEvent::new(event_types::NODE_UPDATED)
                    .with_node(id.clone())
                    .with_payload(payload),
            ))
        })?;
        Ok(())
    }

    pub fn move_node(&self, id: &NodeId, x: f64, y: f64) -> Result<(), CoreError> {
        validate_position(x, y)?;
        self.update_node(id, serde_json::json!({ "x": x, "y": y }), |node| {
            node.x = x;
            node.y = y;
            Ok(())
        })
    }

    pub fn update_prompt(&self, id: &NodeId, prompt: &str) -> Result<(), CoreError> {
        validate_prompt(prompt)?;
        self.update_node(id, serde_json::json!({ "prompt": prompt }), |node| {
            node.prompt = prompt.to_string();
            Ok(())
        })
    }

    /// Set a node's title. A blank title reverts to the type's default.
    pub fn rename_node(&self, id: &NodeId, title: &str) -> Result<Option<String>, CoreError> {
        let title = normalize_title(title)?;
        self.update_node(id, serde_json::json!({ "title": title }), |node| {
            node.title = title.clone();
            Ok(())
        })?;
        Ok(title)
    }

    /// Apply every field of `edit` in one commit.
    ///
    /// All fields are validated before anything is written, so a rejected
    /// edit leaves the node and the revision untouched.
    pub fn edit_node(&self, id: &NodeId, edit: NodeEdit) -> Result<(), CoreError> {
        if let Some(prompt) = &edit.prompt {
            validate_prompt(prompt)?;
        }
        let title = edit.title.as_deref().map(normalize_title).transpose()?;

        let mut payload = serde_json::Map::new();
        if let Some(x) = edit.x {
            payload.insert("x".into(), x.into());
        }
        if let Some(y) = edit.y {
            payload.insert("y".into(), y.into());
        }
        if let Some(prompt) = &edit.prompt {
            payload.insert("prompt".into(), prompt.as_str().into());
        }
        if let Some(title) = &title {
            payload.insert("title".into(), serde_json::json!(title));
        }

        self.update_node(id, payload.into(), |node| {
            let (x, y) = (edit.x.unwrap_or(node.x), edit.y.unwrap_or(node.y));
            validate_position(x, y)?;
            node.x = x;
            node.y = y;
            if let Some(prompt) = edit.prompt {
                node.prompt = prompt;
            }
            if let Some(title) = title {
                node.title = title;
            }
            Ok(())
        })
    }

    /// Apply a generation status transition.
    ///
    /// `Success` records `result_url`, `Error` records `error_message`.
    /// Entering `Loading` or `Error` drops the previous run's output, and
    /// entering `Loading` clears the previous failure.
    pub fn set_status(&self, id: &NodeId, update: StatusUpdate) -> Result<(), CoreError> {
        let mut previous = NodeStatus::Idle;

        self.commit_required(|snapshot| {
            let mut change = Change::from_snapshot(snapshot);
            let node = change.node_mut(id)?;
            validate_status_transition(node.status, update.status)?;

            previous = node.status;
            node.status = update.status;
            match update.status {
                NodeStatus::Success => {
                    node.result_url = update.result_url.clone();
                    node.error_message = None;
                }
                NodeStatus::Error => {
                    node.result_url = None;
                    node.error_message = update.error_message.clone();
                }
                NodeStatus::Loading => {
                    node.result_url = None;
                    node.error_message = None;
                }
                NodeStatus::Idle => {
                    node.error_message = None;
                }
            }

            Ok(change.event(
                CanvasEvent::new(event_types::NODE_STATUS_CHANGED)
                    .with_node(id.clone())
                    .with_payload(serde_json::json!({
                        "from": previous.as_str(),
                        "to": update.status.as_str(),
                    })),
            ))
        })?;

        tracing::info!(
            node_id = %id,
            from = previous.as_str(),
            to = update.status.as_str(),
            "Node status changed"
        );
        Ok(())
    }

    /// Enter or leave angle-adjustment mode on an image node.
    ///
    /// Entering keeps existing settings unless new ones are given, starting
    /// from neutral settings otherwise. Leaving clears the settings.
    pub fn set_angle_mode(
        &self,
        id: &NodeId,
        enabled: bool,
        settings: Option<AngleSettings>,
    ) -> Result<(), CoreError> {
        if let Some(settings) = &settings {
            validate_angle_settings(settings)?;
        }

        self.update_node(id, serde_json::json!({ "angle_mode": enabled }), |node| {
            if node.node_type != NodeType::Image {
                return Err(CoreError::Validation(format!(
                    "Angle mode is only available on IMAGE nodes, node {} is {}",
                    node.id,
                    node.node_type.as_str()
                )));
            }
            node.angle_mode = enabled;
            node.angle_settings = if enabled {
                settings.or(node.angle_settings).or(Some(AngleSettings::default()))
            } else {
                None
            };
            Ok(())
        })
    }

    // -- Graph & selection --------------------------------------------------

    /// Make `parent` a parent of `child`, rejecting cycles.
    ///
    /// Returns `false` when the link already existed.
    pub fn link(&self, parent: &NodeId, child: &NodeId) -> Result<bool, CoreError> {
        let committed = self.commit(|snapshot| {
            if !graph::validate_link(&snapshot.nodes, parent, child)? {
                return Ok(None);
            }
            let mut change = Change::from_snapshot(snapshot);
            change.node_mut(child)?.parent_ids.push(parent.clone());
            Ok(Some(change.event(
                CanvasEvent::new(event_types::NODE_LINKED)
                    .with_node(child.clone())
                    .with_payload(serde_json::json!({ "parent_id": parent })),
            )))
        })?;
        Ok(committed.is_some())
    }

    /// Replace the selection. Every id must exist.
    pub fn select(&self, ids: Vec<NodeId>) -> Result<(), CoreError> {
        self.commit_required(|snapshot| {
            if let Some(missing) = ids.iter().find(|id| !snapshot.contains(id)) {
                return Err(CoreError::node_not_found(missing));
            }
            let mut change = Change::from_snapshot(snapshot);
            change.selected = Vec::with_capacity(ids.len());
            for id in ids {
                if !change.selected.contains(&id) {
                    change.selected.push(id);
                }
            }
            let payload = serde_json::json!({ "selected": change.selected });
            Ok(change.event(CanvasEvent::new(event_types::SELECTION_CHANGED).with_payload(payload)))
        })?;
        Ok(())
    }
}

/// Validate `node` against `snapshot` and build the change appending it.
fn insert_node(snapshot: &CanvasSnapshot, node: Node, select: bool) -> Result<Change, CoreError> {
    validate_position(node.x, node.y)?;
    validate_prompt(&node.prompt)?;
    validate_node_count(snapshot.nodes.len(), 1)?;
    if snapshot.contains(&node.id) {
        return Err(CoreError::Conflict(format!("Node {} already exists", node.id)));
    }
    if let Some(missing) = node.parent_ids.iter().find(|p| !snapshot.contains(p)) {
        return Err(CoreError::node_not_found(missing));
    }

    let event = CanvasEvent::new(event_types::NODE_CREATED)
        .with_node(node.id.clone())
        .with_payload(serde_json::json!({
            "type": node.node_type.as_str(),
            "parent_ids": node.parent_ids,
        }));
    let mut change = Change::from_snapshot(snapshot).event(event);
    if select {
        change.selected = vec![node.id.clone()];
    }
    change.nodes.push(node);
    Ok(change)
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use twitcanva_core::node::GenerationConfig;

    use super::*;

    fn image_at(x: f64, y: f64) -> Node {
        Node::new(NodeType::Image, x, y, GenerationConfig::default())
    }

    #[test]
    fn add_node_bumps_revision_and_selects() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), true).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 1);
        assert!(snapshot.contains(&id));
        assert_eq!(snapshot.selected, vec![id]);
    }

    #[test]
    fn add_node_with_unknown_parent_rejected() {
        let store = NodeStore::new();
        let orphan = image_at(0.0, 0.0).with_parent(NodeId::from("ghost"));

        assert_matches!(store.add_node(orphan, false), Err(CoreError::NotFound { .. }));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn old_snapshots_are_unaffected_by_writes() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();
        let before = store.snapshot();

        store.move_node(&id, 50.0, 60.0).unwrap();

        assert_eq!(before.node(&id).unwrap().x, 0.0);
        assert_eq!(store.node(&id).unwrap().x, 50.0);
    }

    #[test]
    fn remove_strips_parent_links_and_selection() {
        let store = NodeStore::new();
        let parent = store.add_node(image_at(0.0, 0.0), true).unwrap();
        let child = store
            .add_node(image_at(440.0, 0.0).with_parent(parent.clone()), false)
            .unwrap();

        let removed = store.remove_node(&parent).unwrap();

        assert_eq!(removed.id, parent);
        let snapshot = store.snapshot();
        assert!(snapshot.node(&child).unwrap().parent_ids.is_empty());
        assert!(snapshot.selected.is_empty());
    }

    #[test]
    fn remove_unknown_node_leaves_store_untouched() {
        let store = NodeStore::new();
        store.add_node(image_at(0.0, 0.0), false).unwrap();

        assert_matches!(
            store.remove_node(&NodeId::from("missing")),
            Err(CoreError::NotFound { .. })
        );
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn link_rejects_cycles_and_ignores_duplicates() {
        let store = NodeStore::new();
        let a = store.add_node(image_at(0.0, 0.0), false).unwrap();
        let b = store
            .add_node(image_at(440.0, 0.0).with_parent(a.clone()), false)
            .unwrap();

        assert!(!store.link(&a, &b).unwrap());
        assert_matches!(store.link(&b, &a), Err(CoreError::Conflict(_)));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn upstream_node_becomes_last_parent() {
        let store = NodeStore::new();
        let root = store.add_node(image_at(0.0, 0.0), false).unwrap();
        let target = store
            .add_node(image_at(440.0, 0.0).with_parent(root.clone()), false)
            .unwrap();

        let upstream = store
            .add_upstream_node(&target, |_| image_at(0.0, 0.0))
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 3);
        assert_eq!(snapshot.node(&target).unwrap().parent_ids, vec![root, upstream.clone()]);
        assert_eq!(snapshot.selected, vec![upstream]);
    }

    #[test]
    fn status_transitions_record_outcome() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();

        assert_matches!(
            store.set_status(&id, StatusUpdate::new(NodeStatus::Success)),
            Err(CoreError::Validation(_))
        );

        store.set_status(&id, StatusUpdate::new(NodeStatus::Loading)).unwrap();
        store
            .set_status(
                &id,
                StatusUpdate {
                    status: NodeStatus::Error,
                    result_url: None,
                    error_message: Some("quota exceeded".into()),
                },
            )
            .unwrap();
        assert_eq!(store.node(&id).unwrap().error_message.as_deref(), Some("quota exceeded"));

        store.set_status(&id, StatusUpdate::new(NodeStatus::Loading)).unwrap();
        store
            .set_status(
                &id,
                StatusUpdate {
                    status: NodeStatus::Success,
                    result_url: Some("https://cdn.example/out.png".into()),
                    error_message: None,
                },
            )
            .unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!(node.status, NodeStatus::Success);
        assert!(node.error_message.is_none());
        assert_eq!(node.result_url.as_deref(), Some("https://cdn.example/out.png"));
    }

    #[test]
    fn angle_mode_only_on_image_nodes() {
        let store = NodeStore::new();
        let video = store
            .add_node(Node::new(NodeType::Video, 0.0, 0.0, GenerationConfig::default()), false)
            .unwrap();

        assert_matches!(
            store.set_angle_mode(&video, true, None),
            Err(CoreError::Validation(msg)) if msg.contains("IMAGE")
        );
    }

    #[test]
    fn angle_mode_validates_and_clears_settings() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();
        let bad = AngleSettings {
            rotation: 200,
            ..AngleSettings::default()
        };
        assert!(store.set_angle_mode(&id, true, Some(bad)).is_err());

        store.set_angle_mode(&id, true, None).unwrap();
        let node = store.node(&id).unwrap();
        assert!(node.angle_mode);
        assert_eq!(node.angle_settings, Some(AngleSettings::default()));

        store.set_angle_mode(&id, false, None).unwrap();
        let node = store.node(&id).unwrap();
        assert!(!node.angle_mode);
        assert!(node.angle_settings.is_none());
    }

    #[test]
    fn rename_blank_reverts_to_default_title() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();

        assert_eq!(store.rename_node(&id, " Portrait ").unwrap().as_deref(), Some("Portrait"));
        assert_eq!(store.node(&id).unwrap().display_title(), "Portrait");

        assert_eq!(store.rename_node(&id, "").unwrap(), None);
        assert_eq!(store.node(&id).unwrap().display_title(), "Image");
    }

    #[test]
    fn select_rejects_unknown_and_dedupes() {
        let store = NodeStore::new();
        let a = store.add_node(image_at(0.0, 0.0), false).unwrap();

        assert!(store.select(vec![NodeId::from("nope")]).is_err());
        store.select(vec![a.clone(), a.clone()]).unwrap();
        assert_eq!(store.snapshot().selected, vec![a]);
    }

    #[test]
    fn edit_applies_all_fields_in_one_commit() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(10.0, 20.0), false).unwrap();

        store
            .edit_node(
                &id,
                NodeEdit {
                    x: Some(300.0),
                    prompt: Some("a lighthouse at dusk".into()),
                    title: Some(" Coast ".into()),
                    ..NodeEdit::default()
                },
            )
            .unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!((node.x, node.y), (300.0, 20.0));
        assert_eq!(node.prompt, "a lighthouse at dusk");
        assert_eq!(node.title.as_deref(), Some("Coast"));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn rejected_edit_writes_nothing() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();

        let long_title = NodeEdit {
            x: Some(999.0),
            prompt: Some("changed".into()),
            title: Some("x".repeat(101)),
            ..NodeEdit::default()
        };
        assert_matches!(store.edit_node(&id, long_title), Err(CoreError::Validation(_)));

        let bad_position = NodeEdit {
            y: Some(f64::NAN),
            prompt: Some("changed".into()),
            ..NodeEdit::default()
        };
        assert_matches!(store.edit_node(&id, bad_position), Err(CoreError::Validation(_)));

        let node = store.node(&id).unwrap();
        assert_eq!((node.x, node.y), (0.0, 0.0));
        assert!(node.prompt.is_empty());
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn failed_or_restarted_run_drops_previous_result() {
        let store = NodeStore::new();
        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();
        store.set_status(&id, StatusUpdate::new(NodeStatus::Loading)).unwrap();
        store
            .set_status(
                &id,
                StatusUpdate {
                    status: NodeStatus::Success,
                    result_url: Some("https://cdn.example/first.png".into()),
                    error_message: None,
                },
            )
            .unwrap();

        store.set_status(&id, StatusUpdate::new(NodeStatus::Loading)).unwrap();
        assert!(store.node(&id).unwrap().result_url.is_none());

        store
            .set_status(
                &id,
                StatusUpdate {
                    status: NodeStatus::Error,
                    result_url: Some("https://cdn.example/stale.png".into()),
                    error_message: Some("timed out".into()),
                },
            )
            .unwrap();

        let node = store.node(&id).unwrap();
        assert_eq!(node.status, NodeStatus::Error);
        assert!(node.result_url.is_none());
        assert_eq!(node.error_message.as_deref(), Some("timed out"));
    }

    #[test]
    fn anchored_node_is_placed_from_committed_anchor() {
        let store = NodeStore::new();
        let anchor = store.add_node(image_at(0.0, 0.0), false).unwrap();
        store.move_node(&anchor, 100.0, 40.0).unwrap();

        let child = store
            .add_anchored_node(&anchor, |source| {
                image_at(source.x + 440.0, source.y).with_parent(source.id.clone())
            })
            .unwrap();

        let snapshot = store.snapshot();
        let child = snapshot.node(&child).unwrap();
        assert_eq!((child.x, child.y), (540.0, 40.0));
        assert_eq!(child.parent_ids, vec![anchor]);
        assert_eq!(snapshot.selected, vec![child.id.clone()]);
    }

    #[test]
    fn anchored_node_requires_anchor() {
        let store = NodeStore::new();
        let mut built = false;

        let result = store.add_anchored_node(&NodeId::from("gone"), |source| {
            built = true;
            image_at(source.x, source.y)
        });

        assert_matches!(result, Err(CoreError::NotFound { .. }));
        assert!(!built);
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn commits_publish_events_with_revision() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let store = NodeStore::with_event_bus(Arc::clone(&bus));

        let id = store.add_node(image_at(0.0, 0.0), false).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, event_types::NODE_CREATED);
        assert_eq!(event.node_id, Some(id));
        assert_eq!(event.revision, 1);
    }
}
