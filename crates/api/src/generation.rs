//! Hand-off point to the external generation subsystem.

use std::sync::Arc;

use async_trait::async_trait;
use twitcanva_canvas::{GenerationTrigger, NodeStore, StatusUpdate};
use twitcanva_core::node::NodeStatus;
use twitcanva_core::types::NodeId;

/// [`GenerationTrigger`] that marks the node LOADING.
///
/// Moving the node into LOADING is what the generation workers react to;
/// they report back through the status endpoint.
pub struct MarkLoadingTrigger {
    store: Arc<NodeStore>,
}

impl MarkLoadingTrigger {
    pub fn new(store: Arc<NodeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GenerationTrigger for MarkLoadingTrigger {
    async fn trigger(&self, node_id: NodeId) {
        match self
            .store
            .set_status(&node_id, StatusUpdate::new(NodeStatus::Loading))
        {
            Ok(()) => tracing::info!(node_id = %node_id, "Generation requested"),
            Err(e) => {
                tracing::warn!(node_id = %node_id, error = %e, "Could not request generation");
            }
        }
    }
}
