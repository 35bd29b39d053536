//! Canvas nodes: type, lifecycle status and generation configuration.

use serde::{Deserialize, Serialize};

use crate::angle::AngleSettings;
use crate::error::CoreError;
use crate::types::{NodeId, Timestamp};

// ---------------------------------------------------------------------------
// Generation defaults
// ---------------------------------------------------------------------------

/// Default video generation model.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1";

/// Default image generation model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// High-quality image model forced on angle regeneration.
pub const ANGLE_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Sentinel letting the generation backend choose aspect ratio / resolution.
pub const AUTO: &str = "Auto";

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// What a node generates. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Text,
    Image,
    Video,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Text => "TEXT",
            NodeType::Image => "IMAGE",
            NodeType::Video => "VIDEO",
        }
    }

    /// Title shown when the user has not named the node.
    pub fn default_title(self) -> &'static str {
        match self {
            NodeType::Text => "Text",
            NodeType::Image => "Image",
            NodeType::Video => "Video",
        }
    }
}

// ---------------------------------------------------------------------------
// NodeStatus
// ---------------------------------------------------------------------------

/// Generation lifecycle of a node.
///
/// Nodes start `Idle`; the external generation subsystem drives every
/// other transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Idle => "IDLE",
            NodeStatus::Loading => "LOADING",
            NodeStatus::Success => "SUCCESS",
            NodeStatus::Error => "ERROR",
        }
    }

    /// Whether `self -> next` is an allowed transition.
    ///
    /// - `Idle -> Loading`
    /// - `Loading -> Success | Error | Idle` (finish, fail, cancel)
    /// - `Success | Error -> Loading` (regenerate)
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Loading, Success)
                | (Loading, Error)
                | (Loading, Idle)
                | (Success, Loading)
                | (Error, Loading)
        )
    }
}

/// Validate a status transition.
pub fn validate_status_transition(from: NodeStatus, to: NodeStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid status transition {} -> {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Per-node generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Video model.
    pub model: String,
    pub image_model: String,
    pub aspect_ratio: String,
    pub resolution: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_VIDEO_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            aspect_ratio: AUTO.to_string(),
            resolution: AUTO.to_string(),
        }
    }
}

/// Return `value`, or [`AUTO`] when it is blank.
pub fn or_auto(value: &str) -> String {
    if value.trim().is_empty() {
        AUTO.to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single canvas entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// User-edited title; `None` displays the type's default title.
    pub title: Option<String>,
    pub x: f64,
    pub y: f64,
    pub prompt: String,
    pub status: NodeStatus,
    #[serde(flatten)]
    pub config: GenerationConfig,
    /// Ordered set of nodes this node derives from. Empty for roots.
    pub parent_ids: Vec<NodeId>,
    /// True while an image node is in angle-adjustment mode.
    pub angle_mode: bool,
    pub angle_settings: Option<AngleSettings>,
    /// Output reference written on `Success`.
    pub result_url: Option<String>,
    /// Failure description written on `Error`.
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

impl Node {
    /// Create a root node with a fresh id, empty prompt and default config.
    pub fn new(node_type: NodeType, x: f64, y: f64, config: GenerationConfig) -> Self {
        Self {
            id: NodeId::generate(),
            node_type,
            title: None,
            x,
            y,
            prompt: String::new(),
            status: NodeStatus::Idle,
            config,
            parent_ids: Vec::new(),
            angle_mode: false,
            angle_settings: None,
            result_url: None,
            error_message: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Attach a parent link.
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        if !self.parent_ids.contains(&parent) {
            self.parent_ids.push(parent);
        }
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.node_type.default_title())
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
