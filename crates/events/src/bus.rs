//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`CanvasEvent`]s. It is
//! shared via `Arc<EventBus>` between the node store and any listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use twitcanva_core::types::NodeId;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Dot-separated names of the events the canvas publishes.
pub mod event_types {
    pub const NODE_CREATED: &str = "node.created";
    pub const NODE_DERIVED: &str = "node.derived";
    pub const NODE_UPDATED: &str = "node.updated";
    pub const NODE_STATUS_CHANGED: &str = "node.status_changed";
    pub const NODE_REMOVED: &str = "node.removed";
    pub const NODE_LINKED: &str = "node.linked";
    pub const SELECTION_CHANGED: &str = "selection.changed";
}

// ---------------------------------------------------------------------------
// CanvasEvent
// ---------------------------------------------------------------------------

/// A change committed to the canvas.
///
/// Constructed via [`CanvasEvent::new`] and enriched with
/// [`with_node`](CanvasEvent::with_node) and
/// [`with_payload`](CanvasEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasEvent {
    /// Dot-separated event name, e.g. `"node.derived"`.
    pub event_type: String,

    /// Node the event is about, if any.
    pub node_id: Option<NodeId>,

    /// Store revision the change was committed at.
    pub revision: u64,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl CanvasEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            node_id: None,
            revision: 0,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the node the event concerns.
    pub fn with_node(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Stamp the store revision. Set by the store at commit time.
    pub fn at_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use twitcanva_events::bus::{CanvasEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(CanvasEvent::new("node.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<CanvasEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: CanvasEvent) {
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<CanvasEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
