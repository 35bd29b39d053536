//! Deferred generation triggering.
//!
//! A newly derived node must be visible to the generation subsystem before
//! generation is requested for it. Instead of waiting a fixed number of
//! scheduler turns, [`GenerationBridge`] waits until the store reports the
//! revision that added the node, re-checks that the node is still present,
//! and only then calls the trigger, exactly once, on its own task.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use twitcanva_core::types::NodeId;

use crate::store::NodeStore;

/// Entry point of the external generation subsystem.
#[async_trait]
pub trait GenerationTrigger: Send + Sync {
    /// Request generation for a node that is present in the store.
    async fn trigger(&self, node_id: NodeId);
}

#[derive(Clone)]
pub struct GenerationBridge {
    store: Arc<NodeStore>,
}

impl GenerationBridge {
    pub fn new(store: Arc<NodeStore>) -> Self {
        Self { store }
    }

    /// Invoke `trigger` for `node_id` once revision `committed_revision` is
    /// visible to store readers.
    ///
    /// Without a trigger this is a silent no-op and returns `None`. The
    /// returned task resolves to whether the trigger ran; it is skipped if the
    /// node was removed before the commit was observed, or if the store goes
    /// away first.
    pub fn schedule_generation(
        &self,
        node_id: NodeId,
        committed_revision: u64,
        trigger: Option<Arc<dyn GenerationTrigger>>,
    ) -> Option<JoinHandle<bool>> {
        let trigger = trigger?;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    node_id = %node_id,
                    error = %e,
                    "No runtime, generation not scheduled",
                );
                return None;
            }
        };

        let mut commits = self.store.subscribe();
        Some(runtime.spawn(async move {
            let present = match commits
                .wait_for(|snapshot| snapshot.revision >= committed_revision)
                .await
            {
                Ok(snapshot) => snapshot.contains(&node_id),
                Err(_) => {
                    tracing::warn!(node_id = %node_id, "Store closed before commit was observed");
                    return false;
                }
            };

            if !present {
                tracing::debug!(node_id = %node_id, "Node removed before generation, skipping");
                return false;
            }

            tracing::debug!(
                node_id = %node_id,
                revision = committed_revision,
                "Triggering generation",
            );
            trigger.trigger(node_id).await;
            true
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use twitcanva_core::node::{GenerationConfig, Node, NodeType};

    use super::*;

    /// Records each invocation together with whether the node was in the
    /// store at that moment.
    struct Recorder {
        store: Arc<NodeStore>,
        calls: Mutex<Vec<(NodeId, bool)>>,
    }

    #[async_trait]
    impl GenerationTrigger for Recorder {
        async fn trigger(&self, node_id: NodeId) {
            let present = self.store.snapshot().contains(&node_id);
            self.calls.lock().unwrap().push((node_id, present));
        }
    }

    fn setup() -> (Arc<NodeStore>, Arc<Recorder>, GenerationBridge) {
        let store = Arc::new(NodeStore::new());
        let recorder = Arc::new(Recorder {
            store: Arc::clone(&store),
            calls: Mutex::new(Vec::new()),
        });
        let bridge = GenerationBridge::new(Arc::clone(&store));
        (store, recorder, bridge)
    }

    fn image() -> Node {
        Node::new(NodeType::Image, 0.0, 0.0, GenerationConfig::default())
    }

    #[tokio::test]
    async fn missing_trigger_is_silent_noop() {
        let (store, _, bridge) = setup();
        let id = store.add_node(image(), false).unwrap();

        assert!(bridge.schedule_generation(id, store.revision(), None).is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn trigger_deferred_until_task_runs() {
        let (store, recorder, bridge) = setup();
        let id = store.add_node(image(), false).unwrap();

        let handle = bridge
            .schedule_generation(id.clone(), store.revision(), Some(recorder.clone()))
            .unwrap();

        // Nothing runs inside the scheduling call itself.
        assert!(recorder.calls.lock().unwrap().is_empty());

        assert!(handle.await.unwrap());
        assert_eq!(*recorder.calls.lock().unwrap(), vec![(id, true)]);
    }

    #[tokio::test]
    async fn waits_for_a_later_revision() {
        let (store, recorder, bridge) = setup();
        let id = store.add_node(image(), false).unwrap();

        let handle = bridge
            .schedule_generation(id.clone(), store.revision() + 1, Some(recorder.clone()))
            .unwrap();
        tokio::task::yield_now().await;
        assert!(recorder.calls.lock().unwrap().is_empty());

        store.move_node(&id, 10.0, 10.0).unwrap();

        assert!(handle.await.unwrap());
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn removed_node_is_not_triggered() {
        let (store, recorder, bridge) = setup();
        let id = store.add_node(image(), false).unwrap();

        let handle = bridge
            .schedule_generation(id.clone(), store.revision(), Some(recorder.clone()))
            .unwrap();
        store.remove_node(&id).unwrap();

        assert!(!handle.await.unwrap());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }
}
