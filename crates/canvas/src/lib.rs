//! TwitCanva canvas runtime.
//!
//! Wires the domain model from `twitcanva_core` to shared mutable state:
//!
//! - [`NodeStore`]: snapshot-replacing node store with commit notifications.
//! - [`NodeRelationshipEngine`]: derives linked downstream nodes.
//! - [`GenerationBridge`]: invokes a generation trigger once a node's
//!   commit is visible.
//! - [`CanvasMenuDispatcher`]: carries out context menu selections.

pub mod bridge;
pub mod dispatcher;
pub mod engine;
pub mod store;

pub use bridge::{GenerationBridge, GenerationTrigger};
pub use dispatcher::CanvasMenuDispatcher;
pub use engine::{GenerationDefaults, NodeRelationshipEngine};
pub use store::{CanvasSnapshot, NodeEdit, NodeStore, StatusUpdate};
