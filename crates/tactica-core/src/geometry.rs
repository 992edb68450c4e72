//! Orientation transforms and surface coordinate conversion.
//!
//! The board is drawn either horizontally (goals left and right) or
//! vertically (goals top and bottom). Both layouts share the same normalized
//! `[0,1]×[0,1]` space; switching layout rotates every point by a quarter
//! turn about the board center. This module is the only place where
//! orientation-dependent coordinate math happens.

use crate::board::{BoardError, BoardItem, BoardResult, BoardState, Drawing, clamp_normalized};
use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Board layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Canonical storage orientation.
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The orientation geometry is persisted in.
    pub const CANONICAL: Orientation = Orientation::Horizontal;

    pub fn toggled(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Width / height of the rendered pitch.
    pub fn aspect_ratio(self) -> f64 {
        match self {
            Orientation::Horizontal => 3.0 / 2.0,
            Orientation::Vertical => 2.0 / 3.0,
        }
    }

    /// Affine map from this orientation into the other one.
    ///
    /// Horizontal → vertical is `(x, y) ↦ (1 - y, x)`, vertical → horizontal
    /// is `(x, y) ↦ (y, 1 - x)`.
    pub fn affine_from(self) -> Affine {
        match self {
            Orientation::Horizontal => Affine::new([0.0, 1.0, -1.0, 0.0, 1.0, 0.0]),
            Orientation::Vertical => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, 1.0]),
        }
    }

    /// Rotation delta in degrees applied when leaving this orientation.
    fn rotation_delta(self) -> f64 {
        match self {
            Orientation::Horizontal => 90.0,
            Orientation::Vertical => 270.0,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => f.write_str("horizontal"),
            Orientation::Vertical => f.write_str("vertical"),
        }
    }
}

/// Map a point out of `from` into the other orientation.
pub fn transform_point(p: Point, from: Orientation) -> Point {
    clamp_normalized(from.affine_from() * p)
}

/// Map a rotation (degrees) out of `from` into the other orientation.
pub fn transform_rotation(deg: f64, from: Orientation) -> f64 {
    (deg + from.rotation_delta()).rem_euclid(360.0)
}

fn transform_item(item: &BoardItem, from: Orientation) -> BoardItem {
    let mut item = item.clone();
    item.position = transform_point(item.position, from);
    if item.kind.is_rotatable() {
        item.rotation = transform_rotation(item.rotation, from);
    }
    item
}

fn transform_drawing(drawing: &Drawing, from: Orientation) -> Drawing {
    let mut drawing = drawing.clone();
    for p in &mut drawing.points {
        *p = transform_point(*p, from);
    }
    drawing
}

/// Map a whole board out of `from` into the other orientation.
pub fn transform_state(state: &BoardState, from: Orientation) -> BoardState {
    BoardState {
        items: state.items.iter().map(|i| transform_item(i, from)).collect(),
        drawings: state.drawings.iter().map(|d| transform_drawing(d, from)).collect(),
    }
}

/// Re-express a board drawn in `from` in the `to` orientation.
pub fn reorient(state: &BoardState, from: Orientation, to: Orientation) -> BoardState {
    if from == to {
        state.clone()
    } else {
        transform_state(state, from)
    }
}

/// Express a live board in the canonical storage orientation.
pub fn to_canonical(state: &BoardState, live: Orientation) -> BoardState {
    reorient(state, live, Orientation::CANONICAL)
}

/// Express a stored (canonical) board in the live orientation.
pub fn from_canonical(state: &BoardState, live: Orientation) -> BoardState {
    reorient(state, Orientation::CANONICAL, live)
}

/// Convert a pixel position on the rendered surface to a normalized point.
///
/// Positions outside the surface are clamped onto its edge.
pub fn pixel_to_normalized(pixel: Point, surface: Size) -> BoardResult<Point> {
    if !(surface.width > 0.0 && surface.height > 0.0) {
        return Err(BoardError::EmptySurface);
    }
    Ok(clamp_normalized(Point::new(
        pixel.x / surface.width,
        pixel.y / surface.height,
    )))
}

/// Convert a normalized point to a pixel position on a surface.
pub fn normalized_to_pixel(point: Point, surface: Size) -> Point {
    Point::new(point.x * surface.width, point.y * surface.height)
}
