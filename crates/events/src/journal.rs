//! Bounded in-memory event journal.
//!
//! [`EventJournal`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and keeps the newest [`DEFAULT_JOURNAL_CAPACITY`] events so clients can
//! inspect recent canvas activity. It runs as a long-lived background task
//! and shuts down when the bus is dropped.

use std::collections::VecDeque;

use tokio::sync::{broadcast, RwLock};

use crate::bus::CanvasEvent;

/// Number of events retained by default.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

pub struct EventJournal {
    entries: RwLock<VecDeque<CanvasEvent>>,
    capacity: usize,
}

impl EventJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Run the journal loop.
    ///
    /// Records every event received on `receiver`. The loop exits when the
    /// channel is closed (i.e. the bus is dropped).
    pub async fn run(&self, mut receiver: broadcast::Receiver<CanvasEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::debug!(
                        event_type = %event.event_type,
                        revision = event.revision,
                        "Canvas event journaled"
                    );
                    self.record(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event journal lagged, some events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, journal shutting down");
                    break;
                }
            }
        }
    }

    /// Append an event, evicting the oldest once full.
    pub async fn record(&self, event: CanvasEvent) {
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(event);
    }

    /// The newest `limit` events, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<CanvasEvent> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}
