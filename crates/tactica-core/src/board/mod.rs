//! Board data model: placed items, drawn annotations and the state that groups them.

mod color;
mod drawing;
mod item;

pub use color::{ColorParseError, ColorRef, Rgba};
pub use drawing::{Drawing, DrawingId, DrawingKind, point_to_polyline_dist, point_to_segment_dist};
pub use item::{BoardItem, ItemId, ItemKind, ItemPayload, ShapeKind};

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for board mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("player {0} is already on the board")]
    DuplicatePlayer(String),
    #[error("duplicate item id {0}")]
    DuplicateId(Uuid),
    #[error("point ({x}, {y}) is outside the board")]
    OutOfBounds { x: f64, y: f64 },
    #[error("no element with id {0}")]
    UnknownElement(Uuid),
    #[error("nothing is armed for placement")]
    NothingArmed,
    #[error("board surface has no size")]
    EmptySurface,
    #[error("{kind:?} drawing {id} has the wrong number of points")]
    MalformedDrawing { id: DrawingId, kind: DrawingKind },
}

/// Result type for board mutations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Whether a point lies in the unit square and is finite.
pub fn is_normalized(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite() && (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)
}

/// Clamp a point into the unit square.
pub fn clamp_normalized(p: Point) -> Point {
    Point::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0))
}

/// The versioned unit of the board: placed items and drawn annotations.
///
/// States are never mutated once committed to history. Every `with_*` /
/// `without_*` method returns a new state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub items: Vec<BoardItem>,
    pub drawings: Vec<Drawing>,
}

impl BoardState {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.drawings.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&BoardItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn drawing(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    /// Whether a player with the given referent is already placed.
    pub fn has_player(&self, element_ref: &str) -> bool {
        self.items
            .iter()
            .any(|i| i.is_player() && i.element_ref == element_ref)
    }

    /// Topmost item under a point.
    pub fn item_at(&self, point: Point, tolerance: f64) -> Option<&BoardItem> {
        self.items.iter().rev().find(|i| i.hit_test(point, tolerance))
    }

    /// Topmost drawing under a point.
    pub fn drawing_at(&self, point: Point, tolerance: f64) -> Option<&Drawing> {
        self.drawings.iter().rev().find(|d| d.hit_test(point, tolerance))
    }

    /// Check the state invariants: every point normalized, item ids unique,
    /// each player placed at most once, drawings shaped for their kind.
    pub fn validate(&self) -> BoardResult<()> {
        let mut seen = HashSet::new();
        let mut players = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(BoardError::DuplicateId(item.id));
            }
            if item.is_player() && !players.insert(item.element_ref.as_str()) {
                return Err(BoardError::DuplicatePlayer(item.element_ref.clone()));
            }
            check_point(item.position)?;
        }
        for drawing in &self.drawings {
            check_drawing(drawing)?;
        }
        Ok(())
    }

    /// Add an item, rejecting duplicate players and ids.
    pub fn with_item(&self, item: BoardItem) -> BoardResult<Self> {
        check_point(item.position)?;
        if item.is_player() && self.has_player(&item.element_ref) {
            return Err(BoardError::DuplicatePlayer(item.element_ref));
        }
        if self.item(item.id).is_some() {
            return Err(BoardError::DuplicateId(item.id));
        }
        let mut next = self.clone();
        next.items.push(item);
        Ok(next)
    }

    /// Add a drawing.
    pub fn with_drawing(&self, drawing: Drawing) -> BoardResult<Self> {
        check_drawing(&drawing)?;
        let mut next = self.clone();
        next.drawings.push(drawing);
        Ok(next)
    }

    /// Move an item to a new (clamped) position.
    pub fn with_item_moved(&self, id: ItemId, position: Point) -> BoardResult<Self> {
        let mut next = self.clone();
        let item = next
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(BoardError::UnknownElement(id))?;
        item.position = clamp_normalized(position);
        Ok(next)
    }

    /// Remove the given items and drawings. Unknown ids are ignored.
    pub fn without(&self, items: &[ItemId], drawings: &[DrawingId]) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|i| !items.contains(&i.id))
                .cloned()
                .collect(),
            drawings: self
                .drawings
                .iter()
                .filter(|d| !drawings.contains(&d.id))
                .cloned()
                .collect(),
        }
    }

    pub fn without_item(&self, id: ItemId) -> Self {
        self.without(&[id], &[])
    }

    pub fn without_drawing(&self, id: DrawingId) -> Self {
        self.without(&[], &[id])
    }

    /// Producer for "clear board".
    pub fn cleared(&self) -> Self {
        Self::new()
    }

    /// Every point in the state, items first.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.items
            .iter()
            .map(|i| i.position)
            .chain(self.drawings.iter().flat_map(|d| d.points.iter().copied()))
    }
}

fn check_point(p: Point) -> BoardResult<()> {
    if is_normalized(p) {
        Ok(())
    } else {
        Err(BoardError::OutOfBounds { x: p.x, y: p.y })
    }
}

fn check_drawing(drawing: &Drawing) -> BoardResult<()> {
    if !drawing.has_valid_shape() {
        return Err(BoardError::MalformedDrawing {
            id: drawing.id,
            kind: drawing.kind,
        });
    }
    drawing.points.iter().try_for_each(|&p| check_point(p))
}

/// Geometry as it comes back from storage: raw elements, decoded one by one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBoard {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub drawings: Vec<serde_json::Value>,
}

impl RawBoard {
    /// Encode a state element by element.
    pub fn encode(state: &BoardState) -> Result<Self, serde_json::Error> {
        Ok(Self {
            items: state
                .items
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()?,
            drawings: state
                .drawings
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Decode into a state, skipping elements that fail to parse, carry
    /// points outside the board, repeat an item id or have a drawing shape
    /// that does not match their kind.
    ///
    /// Returns the state and the number of skipped elements.
    pub fn decode_lenient(&self) -> (BoardState, usize) {
        let mut state = BoardState::new();
        let mut skipped = 0;
        let mut seen = HashSet::new();

        for raw in &self.items {
            match serde_json::from_value::<BoardItem>(raw.clone()) {
                Ok(item) if is_normalized(item.position) && seen.insert(item.id) => {
                    state.items.push(item)
                }
                Ok(item) => {
                    log::warn!("Skipping malformed item {}", item.id);
                    skipped += 1;
                }
                Err(e) => {
                    log::warn!("Skipping undecodable item: {}", e);
                    skipped += 1;
                }
            }
        }

        for raw in &self.drawings {
            match serde_json::from_value::<Drawing>(raw.clone()) {
                Ok(d) if d.has_valid_shape() && d.points.iter().all(|&p| is_normalized(p)) => {
                    state.drawings.push(d)
                }
                Ok(d) => {
                    log::warn!("Skipping malformed drawing {}", d.id);
                    skipped += 1;
                }
                Err(e) => {
                    log::warn!("Skipping undecodable drawing: {}", e);
                    skipped += 1;
                }
            }
        }

        (state, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(element_ref: &str, x: f64, y: f64) -> BoardItem {
        BoardItem::new(
            ItemKind::Player,
            element_ref,
            Point::new(x, y),
            ItemPayload::player(ColorRef::theme("home"), Some(9), None),
        )
    }

    #[test]
    fn test_with_item_rejects_duplicate_player() {
        let s = BoardState::new().with_item(player("p1", 0.2, 0.2)).unwrap();
        let err = s.with_item(player("p1", 0.4, 0.4)).unwrap_err();
        assert_eq!(err, BoardError::DuplicatePlayer("p1".into()));
        assert_eq!(s.items.len(), 1);
    }

    #[test]
    fn test_duplicate_objects_are_allowed() {
        let cone = || BoardItem::new(ItemKind::Cone, "cone", Point::new(0.3, 0.3), ItemPayload::default());
        let s = BoardState::new().with_item(cone()).unwrap().with_item(cone()).unwrap();
        assert_eq!(s.items.len(), 2);
    }

    #[test]
    fn test_with_item_rejects_out_of_bounds() {
        let err = BoardState::new().with_item(player("p1", 1.2, 0.2)).unwrap_err();
        assert!(matches!(err, BoardError::OutOfBounds { .. }));
    }

    #[test]
    fn test_move_clamps_and_leaves_original() {
        let s = BoardState::new().with_item(player("p1", 0.2, 0.2)).unwrap();
        let id = s.items[0].id;
        let moved = s.with_item_moved(id, Point::new(1.5, -0.5)).unwrap();
        assert_eq!(moved.items[0].position, Point::new(1.0, 0.0));
        assert_eq!(s.items[0].position, Point::new(0.2, 0.2));
    }

    #[test]
    fn test_structural_equality() {
        let s = BoardState::new().with_item(player("p1", 0.2, 0.2)).unwrap();
        let id = s.items[0].id;
        let there = s.with_item_moved(id, Point::new(0.5, 0.5)).unwrap();
        let back = there.with_item_moved(id, Point::new(0.2, 0.2)).unwrap();
        assert_ne!(s, there);
        assert_eq!(s, back);
    }

    #[test]
    fn test_validate_detects_duplicate_ids() {
        let p = player("p1", 0.2, 0.2);
        let s = BoardState {
            items: vec![p.clone(), p],
            drawings: vec![],
        };
        assert!(matches!(s.validate(), Err(BoardError::DuplicateId(_))));
    }

    #[test]
    fn test_decode_lenient_skips_corrupt_elements() {
        let good = BoardState::new().with_item(player("p1", 0.2, 0.2)).unwrap();
        let mut raw = RawBoard::encode(&good).unwrap();
        raw.items.push(serde_json::json!({ "id": "nope" }));
        let mut bad_point = serde_json::to_value(player("p2", 0.5, 0.5)).unwrap();
        bad_point["position"] = serde_json::json!({ "x": 3.0, "y": 0.5 });
        raw.items.push(bad_point);
        raw.drawings.push(serde_json::json!({ "kind": "squiggle" }));

        let (state, skipped) = raw.decode_lenient();
        assert_eq!(state, good);
        assert_eq!(skipped, 3);
    }

    #[test]
    fn test_with_drawing_rejects_wrong_point_count() {
        let one_point = Drawing::new(DrawingKind::Line, Point::new(0.1, 0.1), ColorRef::default(), 2.0);
        assert!(matches!(
            BoardState::new().with_drawing(one_point),
            Err(BoardError::MalformedDrawing { kind: DrawingKind::Line, .. })
        ));

        let curve = Drawing::new(DrawingKind::CurvedArrow, Point::new(0.1, 0.1), ColorRef::default(), 2.0)
            .with_points(vec![Point::new(0.1, 0.1), Point::new(0.5, 0.5)]);
        assert!(BoardState::new().with_drawing(curve).is_err());
    }

    #[test]
    fn test_decode_lenient_skips_misshapen_drawings() {
        let line = Drawing::new(DrawingKind::Line, Point::new(0.1, 0.1), ColorRef::default(), 2.0)
            .with_points(vec![Point::new(0.1, 0.1), Point::new(0.6, 0.6)]);
        let good = BoardState::new().with_drawing(line).unwrap();
        let mut raw = RawBoard::encode(&good).unwrap();

        let mut short_line = raw.drawings[0].clone();
        short_line["id"] = serde_json::json!(Uuid::new_v4());
        short_line["points"] = serde_json::json!([{ "x": 0.1, "y": 0.1 }]);
        let mut empty_curve = raw.drawings[0].clone();
        empty_curve["id"] = serde_json::json!(Uuid::new_v4());
        empty_curve["kind"] = serde_json::json!("curved-arrow");
        empty_curve["points"] = serde_json::json!([]);
        raw.drawings.push(short_line);
        raw.drawings.push(empty_curve);

        let (state, skipped) = raw.decode_lenient();
        assert_eq!(state, good);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_item_at_prefers_topmost() {
        let a = player("a", 0.5, 0.5);
        let b = player("b", 0.5, 0.5);
        let b_id = b.id;
        let s = BoardState::new().with_item(a).unwrap().with_item(b).unwrap();
        assert_eq!(s.item_at(Point::new(0.5, 0.5), 0.0).map(|i| i.id), Some(b_id));
        assert!(s.item_at(Point::new(0.9, 0.9), 0.0).is_none());
    }
}
