//! Camera-angle settings and angle-regeneration prompt synthesis.
//!
//! An image node in angle-adjustment mode carries [`AngleSettings`]; when
//! the user regenerates, [`synthesize_angle_prompt`] turns the settings into
//! a natural-language instruction for the image model. The output is a
//! total, deterministic function of the settings: directive order and the
//! scale thresholds (`> 50` vs `> 0`) are fixed.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Camera adjustment relative to the source image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AngleSettings {
    /// Orbit around the subject in degrees; positive is clockwise.
    #[validate(range(min = -180, max = 180))]
    pub rotation: i32,

    /// Camera elevation in degrees; positive raises the camera.
    #[validate(range(min = -90, max = 90))]
    pub tilt: i32,

    /// Zoom-in amount as a percentage.
    #[validate(range(min = 0, max = 100))]
    pub scale: u32,

    /// Request a wide-angle lens look.
    #[serde(default)]
    pub wide_angle: bool,
}

/// Validate angle settings against their documented ranges.
pub fn validate_angle_settings(settings: &AngleSettings) -> Result<(), CoreError> {
    settings
        .validate()
        .map_err(|e| CoreError::Validation(format!("Invalid angle settings: {e}")))
}

// ---------------------------------------------------------------------------
// Prompt synthesis
// ---------------------------------------------------------------------------

const PREAMBLE: &str = "Generate this exact same image from a different camera angle. \
Keep the same subject, scene, lighting, clothing, and background; only the camera position changes.";

const ORIENTATION: &str =
    "Do not rotate or flip the output image; keep the image orientation upright.";

const CLOSER_TIGHT: &str = "Move the camera closer, tighter frame on the subject.";

const CLOSER_SLIGHT: &str = "Move the camera slightly closer to the subject.";

const WIDE_ANGLE: &str = "Use a wide-angle lens with noticeable barrel distortion.";

/// Scale above which the framing directive becomes "closer, tighter frame".
pub const TIGHT_FRAME_THRESHOLD: u32 = 50;

/// Build the angle-regeneration prompt for `settings`.
pub fn synthesize_angle_prompt(settings: &AngleSettings) -> String {
    let mut parts: Vec<String> = vec![PREAMBLE.to_string()];

    if settings.rotation != 0 {
        let degrees = settings.rotation.unsigned_abs();
        if settings.rotation > 0 {
            parts.push(format!(
                "Move the camera {degrees} degrees to the right side of the subject (clockwise orbit)."
            ));
        } else {
            parts.push(format!(
                "Move the camera {degrees} degrees to the left side of the subject (counter-clockwise orbit)."
            ));
        }
    }

    if settings.tilt != 0 {
        let degrees = settings.tilt.unsigned_abs();
        if settings.tilt > 0 {
            parts.push(format!(
                "Raise the camera {degrees} degrees, looking down at the subject."
            ));
        } else {
            parts.push(format!(
                "Lower the camera {degrees} degrees, looking up at the subject."
            ));
        }
    }

    if settings.scale > TIGHT_FRAME_THRESHOLD {
        parts.push(CLOSER_TIGHT.to_string());
    } else if settings.scale > 0 {
        parts.push(CLOSER_SLIGHT.to_string());
    }

    if settings.wide_angle {
        parts.push(WIDE_ANGLE.to_string());
    }

    parts.push(ORIENTATION.to_string());
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
