//! Editor behavior settings.

use crate::board::ColorRef;
use serde::{Deserialize, Serialize};

/// How erasing is grouped in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EraserGranularity {
    /// Everything erased during one press-drag-release is one undo step.
    #[default]
    PerGesture,
    /// Every erased element is its own undo step.
    PerElement,
}

/// Editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    /// Whether orientation changes caused by the viewport (not the user)
    /// are recorded as undoable history steps.
    pub auto_orientation_commits: bool,
    pub eraser_granularity: EraserGranularity,
    /// Hit tolerance in normalized board units.
    pub hit_tolerance: f64,
    /// Stroke width for new drawings.
    pub default_stroke_width: f64,
    /// Color for new drawings.
    pub default_color: ColorRef,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            auto_orientation_commits: true,
            eraser_granularity: EraserGranularity::PerGesture,
            hit_tolerance: 0.03,
            default_stroke_width: 3.0,
            default_color: ColorRef::theme("ink"),
        }
    }
}
