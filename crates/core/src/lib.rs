//! TwitCanva canvas domain model.
//!
//! This crate has no I/O and no async runtime dependency so it can be
//! shared by the store, the HTTP layer and any future tooling:
//!
//! - [`node`]: canvas nodes, their type, status and generation config.
//! - [`angle`]: camera-angle settings and the angle prompt synthesizer.
//! - [`canvas`]: layout constants and canvas-level validation.
//! - [`context_menu`]: the single-slot context menu controller.
//! - [`viewport`]: screen/canvas coordinate conversion.
//! - [`graph`]: reachability and cycle checks over parent links.

pub mod angle;
pub mod canvas;
pub mod context_menu;
pub mod error;
pub mod graph;
pub mod node;
pub mod types;
pub mod viewport;
