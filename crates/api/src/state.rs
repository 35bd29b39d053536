use std::sync::Arc;

use tokio::task::JoinHandle;
use twitcanva_canvas::{CanvasMenuDispatcher, NodeRelationshipEngine, NodeStore};
use twitcanva_events::{EventBus, EventJournal, DEFAULT_JOURNAL_CAPACITY};

use crate::config::ServerConfig;
use crate::generation::MarkLoadingTrigger;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The canvas node store.
    pub store: Arc<NodeStore>,
    /// Derivation engine, wired to the generation hand-off.
    pub engine: Arc<NodeRelationshipEngine>,
    /// Executes context menu selections submitted by clients.
    pub dispatcher: Arc<CanvasMenuDispatcher>,
    /// Event bus every store commit publishes to.
    pub event_bus: Arc<EventBus>,
    /// Recent events, fed from the bus by [`AppState::spawn_journal`].
    pub journal: Arc<EventJournal>,
}

impl AppState {
    /// Wire up a fresh, empty canvas.
    pub fn new(config: ServerConfig) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let store = Arc::new(NodeStore::with_event_bus(Arc::clone(&event_bus)));
        let engine = NodeRelationshipEngine::new(Arc::clone(&store), config.generation.clone())
            .with_trigger(Arc::new(MarkLoadingTrigger::new(Arc::clone(&store))));
        let dispatcher =
            CanvasMenuDispatcher::new(Arc::clone(&store), config.generation.config.clone());

        Self {
            config: Arc::new(config),
            store,
            engine: Arc::new(engine),
            dispatcher: Arc::new(dispatcher),
            event_bus,
            journal: Arc::new(EventJournal::new(DEFAULT_JOURNAL_CAPACITY)),
        }
    }

    /// Subscribe the journal to the bus and run it in the background.
    ///
    /// The subscription is taken before returning, so every event published
    /// afterwards is recorded.
    pub fn spawn_journal(&self) -> JoinHandle<()> {
        let receiver = self.event_bus.subscribe();
        let journal = Arc::clone(&self.journal);
        tokio::spawn(async move { journal.run(receiver).await })
    }
}
