//! TwitCanva canvas event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`CanvasEvent`]: the envelope published for every committed canvas
//!   change.
//! - [`EventJournal`]: background service keeping a bounded tail of recent
//!   events for inspection.

pub mod bus;
pub mod journal;

pub use bus::{event_types, CanvasEvent, EventBus};
pub use journal::{EventJournal, DEFAULT_JOURNAL_CAPACITY};
