//! Placed, movable board items.

use super::ColorRef;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for board items.
pub type ItemId = Uuid;

/// Kind of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Player,
    Ball,
    Cone,
    Goal,
    Text,
    Shape,
}

impl ItemKind {
    /// Whether the item is drawn rotated (and therefore follows orientation changes).
    pub fn is_rotatable(self) -> bool {
        matches!(self, ItemKind::Shape)
    }

    /// Default footprint radius in normalized board units, before `scale`.
    pub fn base_radius(self) -> f64 {
        match self {
            ItemKind::Player => 0.022,
            ItemKind::Ball => 0.012,
            ItemKind::Cone => 0.014,
            ItemKind::Goal => 0.04,
            ItemKind::Text => 0.03,
            ItemKind::Shape => 0.035,
        }
    }
}

/// Subtype for `shape` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    #[default]
    Square,
    Triangle,
    Mannequin,
    Ladder,
    Hurdle,
}

/// Kind-specific item data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jersey_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeKind>,
}

impl ItemPayload {
    pub fn player(color: ColorRef, jersey_number: Option<u32>, avatar: Option<String>) -> Self {
        Self {
            color: Some(color),
            jersey_number,
            avatar,
            ..Self::default()
        }
    }

    pub fn shape(shape: ShapeKind, color: ColorRef) -> Self {
        Self {
            color: Some(color),
            shape: Some(shape),
            ..Self::default()
        }
    }

    pub fn text(label: impl Into<String>, color: ColorRef) -> Self {
        Self {
            label: Some(label.into()),
            color: Some(color),
            ..Self::default()
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn is_default_scale(scale: &f64) -> bool {
    *scale == 1.0
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// A placed element on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardItem {
    pub id: ItemId,
    pub kind: ItemKind,
    /// External referent (player id) or a type tag for generic objects.
    pub element_ref: String,
    /// Normalized position.
    pub position: Point,
    #[serde(default)]
    pub payload: ItemPayload,
    #[serde(default = "default_scale", skip_serializing_if = "is_default_scale")]
    pub scale: f64,
    /// Degrees, only meaningful for `shape` items.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    /// Overlay items are left out of raster snapshots.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude_from_snapshot: bool,
}

impl BoardItem {
    /// Create a new item with a fresh id.
    pub fn new(kind: ItemKind, element_ref: impl Into<String>, position: Point, payload: ItemPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            element_ref: element_ref.into(),
            position,
            payload,
            scale: 1.0,
            rotation: 0.0,
            exclude_from_snapshot: false,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Footprint radius in normalized units.
    pub fn radius(&self) -> f64 {
        self.kind.base_radius() * self.scale
    }

    /// Check if a normalized point hits this item.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.position.distance(point) <= self.radius() + tolerance
    }

    pub fn is_player(&self) -> bool {
        self.kind == ItemKind::Player
    }
}
