//! Tool system: interprets pointer input according to the active tool.

use crate::board::{
    BoardState, ColorRef, Drawing, DrawingId, DrawingKind, ItemId, clamp_normalized,
    point_to_segment_dist,
};
use crate::config::{BoardConfig, EraserGranularity};
use crate::store::BoardStore;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Minimum spacing between freehand samples, in normalized units.
const FREEHAND_MIN_STEP: f64 = 0.002;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Move,
    Pencil,
    Line,
    DashedLine,
    Arrow,
    CurvedArrow,
    Rectangle,
    Circle,
    ShadedArea,
    Text,
    Eraser,
}

impl ToolKind {
    /// Drawing kind produced by this tool, if it draws.
    pub fn drawing_kind(self) -> Option<DrawingKind> {
        match self {
            ToolKind::Pencil => Some(DrawingKind::Pencil),
            ToolKind::Line => Some(DrawingKind::Line),
            ToolKind::DashedLine => Some(DrawingKind::DashedLine),
            ToolKind::Arrow => Some(DrawingKind::Arrow),
            ToolKind::CurvedArrow => Some(DrawingKind::CurvedArrow),
            ToolKind::Rectangle => Some(DrawingKind::Rectangle),
            ToolKind::Circle => Some(DrawingKind::Circle),
            ToolKind::ShadedArea => Some(DrawingKind::ShadedArea),
            ToolKind::Text => Some(DrawingKind::Text),
            ToolKind::Select | ToolKind::Move | ToolKind::Eraser => None,
        }
    }

    /// Whether pointer drags move items.
    pub fn drags_items(self) -> bool {
        matches!(self, ToolKind::Select | ToolKind::Move)
    }
}

/// The gesture in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolState {
    /// Waiting for a pointer press.
    #[default]
    Idle,
    /// A drawing is being shaped; committed on release.
    Drawing {
        drawing: Drawing,
        /// Every sampled pointer position (used for curved tools).
        samples: Vec<Point>,
    },
    /// An item is being dragged; the preview position is uncommitted.
    Dragging {
        item: ItemId,
        grab: Vec2,
        preview: Point,
    },
    /// An eraser gesture. Per-gesture mode collects the hit ids for one
    /// commit on release; per-element mode commits each hit immediately.
    Erasing {
        items: Vec<ItemId>,
        drawings: Vec<DrawingId>,
        /// A per-element removal was already committed in this gesture.
        committed: bool,
    },
}

/// Manages the current tool and its gesture.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current gesture.
    pub state: ToolState,
    /// Item highlighted by the select tool.
    selected: Option<ItemId>,
    /// Color applied to new drawings.
    pub stroke_color: ColorRef,
    /// Stroke width applied to new drawings.
    pub stroke_width: f64,
    /// Content for the next text annotation.
    pub text: String,
    tolerance: f64,
    eraser: EraserGranularity,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(&BoardConfig::default())
    }
}

impl ToolManager {
    /// Create a tool manager with the given settings.
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            current_tool: ToolKind::default(),
            state: ToolState::Idle,
            selected: None,
            stroke_color: config.default_color.clone(),
            stroke_width: config.default_stroke_width,
            text: String::new(),
            tolerance: config.hit_tolerance,
            eraser: config.eraser_granularity,
        }
    }

    /// Set the current tool, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.cancel();
        if !tool.drags_items() {
            self.selected = None;
        }
        self.current_tool = tool;
    }

    /// Abandon the current gesture without committing.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ToolState::Idle)
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    /// Forget a selection that no longer exists on the board.
    pub fn sync_selection(&mut self, board: &BoardState) {
        if self.selected.is_some_and(|id| board.item(id).is_none()) {
            self.selected = None;
        }
    }

    /// Pointer pressed at a normalized point.
    pub fn pointer_down(&mut self, store: &mut BoardStore, point: Point) {
        let point = clamp_normalized(point);
        match self.current_tool {
            ToolKind::Select | ToolKind::Move => {
                match store.current().item_at(point, self.tolerance) {
                    Some(item) => {
                        if self.current_tool == ToolKind::Select {
                            self.selected = Some(item.id);
                        }
                        self.state = ToolState::Dragging {
                            item: item.id,
                            grab: point - item.position,
                            preview: item.position,
                        };
                    }
                    None => {
                        self.selected = None;
                        self.state = ToolState::Idle;
                    }
                }
            }
            ToolKind::Eraser => {
                self.state = ToolState::Erasing {
                    items: Vec::new(),
                    drawings: Vec::new(),
                    committed: false,
                };
                self.erase_at(store, point);
            }
            tool => {
                let Some(kind) = tool.drawing_kind() else { return };
                let mut drawing = Drawing::new(kind, point, self.stroke_color.clone(), self.stroke_width);
                if kind == DrawingKind::Text {
                    drawing.text = Some(self.text.clone());
                }
                self.state = ToolState::Drawing {
                    drawing,
                    samples: Vec::new(),
                };
            }
        }
    }

    /// Pointer moved while pressed.
    pub fn pointer_move(&mut self, store: &mut BoardStore, point: Point) {
        let point = clamp_normalized(point);
        if matches!(self.state, ToolState::Erasing { .. }) {
            self.erase_at(store, point);
            return;
        }
        match &mut self.state {
            ToolState::Idle | ToolState::Erasing { .. } => {}
            ToolState::Drawing { drawing, samples } => {
                samples.push(point);
                shape_drawing(drawing, samples, point);
            }
            ToolState::Dragging { grab, preview, .. } => {
                *preview = clamp_normalized(point - *grab);
            }
        }
    }

    /// Pointer released. Returns true if the board changed.
    ///
    /// A drawing that never saw a move keeps only its press point, so a
    /// line released without dragging is discarded.
    pub fn pointer_up(&mut self, store: &mut BoardStore, point: Point) -> bool {
        let unmoved = matches!(&self.state, ToolState::Drawing { samples, .. } if samples.is_empty());
        if !unmoved {
            self.pointer_move(store, point);
        }
        match std::mem::take(&mut self.state) {
            ToolState::Idle => false,
            ToolState::Drawing { drawing, .. } => {
                if !drawing.is_complete() {
                    log::debug!("Discarding incomplete {:?}", drawing.kind);
                    return false;
                }
                if drawing.kind == DrawingKind::Text
                    && drawing.text.as_deref().is_none_or(|t| t.trim().is_empty())
                {
                    log::debug!("Discarding empty text annotation");
                    return false;
                }
                match store.try_commit(|s| s.with_drawing(drawing)) {
                    Ok(changed) => changed,
                    Err(e) => {
                        log::warn!("Drawing rejected: {}", e);
                        false
                    }
                }
            }
            ToolState::Dragging { item, preview, .. } => {
                match store.try_commit(|s| s.with_item_moved(item, preview)) {
                    Ok(changed) => changed,
                    Err(e) => {
                        log::warn!("Move rejected: {}", e);
                        false
                    }
                }
            }
            ToolState::Erasing {
                items,
                drawings,
                committed,
            } => {
                if items.is_empty() && drawings.is_empty() {
                    return committed;
                }
                log::debug!("Erasing {} items and {} drawings", items.len(), drawings.len());
                store.commit(|s| s.without(&items, &drawings)) || committed
            }
        }
    }

    fn erase_at(&mut self, store: &mut BoardStore, point: Point) {
        let ToolState::Erasing {
            items,
            drawings,
            committed,
        } = &mut self.state
        else {
            return;
        };
        let visible = store.current().without(items, drawings);
        let hit_item = visible.item_at(point, self.tolerance).map(|i| i.id);
        let hit_drawing = if hit_item.is_none() {
            visible.drawing_at(point, self.tolerance).map(|d| d.id)
        } else {
            None
        };

        match self.eraser {
            EraserGranularity::PerGesture => {
                items.extend(hit_item);
                drawings.extend(hit_drawing);
            }
            EraserGranularity::PerElement => {
                if let Some(id) = hit_item {
                    *committed |= store.commit(|s| s.without_item(id));
                } else if let Some(id) = hit_drawing {
                    *committed |= store.commit(|s| s.without_drawing(id));
                }
            }
        }
        if hit_item.is_some_and(|id| self.selected == Some(id)) {
            self.selected = None;
        }
    }

    /// The board as it should be displayed, including the gesture in progress.
    pub fn preview<'a>(&self, board: &'a BoardState) -> Cow<'a, BoardState> {
        match &self.state {
            ToolState::Idle => Cow::Borrowed(board),
            ToolState::Drawing { drawing, .. } => {
                let mut view = board.clone();
                view.drawings.push(drawing.clone());
                Cow::Owned(view)
            }
            ToolState::Dragging { item, preview, .. } => match board.with_item_moved(*item, *preview) {
                Ok(view) => Cow::Owned(view),
                Err(_) => Cow::Borrowed(board),
            },
            ToolState::Erasing { items, drawings, .. } => Cow::Owned(board.without(items, drawings)),
        }
    }
}

/// Update a drawing's points for a new pointer position.
fn shape_drawing(drawing: &mut Drawing, samples: &[Point], point: Point) {
    let start = drawing.points[0];
    match drawing.kind {
        kind if kind.is_two_point() => {
            drawing.points.truncate(1);
            drawing.points.push(point);
        }
        kind if kind.is_freehand() => {
            let last = drawing.points.last().copied().unwrap_or(start);
            if last.distance(point) > FREEHAND_MIN_STEP {
                drawing.points.push(point);
            }
        }
        DrawingKind::CurvedArrow => {
            // The curve passes through the sample farthest from the chord.
            let apex = samples
                .iter()
                .copied()
                .max_by(|a, b| {
                    point_to_segment_dist(*a, start, point)
                        .total_cmp(&point_to_segment_dist(*b, start, point))
                })
                .filter(|apex| point_to_segment_dist(*apex, start, point) > FREEHAND_MIN_STEP)
                .unwrap_or_else(|| start.midpoint(point));
            let control = clamp_normalized(Point::new(
                2.0 * apex.x - (start.x + point.x) / 2.0,
                2.0 * apex.y - (start.y + point.y) / 2.0,
            ));
            drawing.points = vec![start, control, point];
        }
        DrawingKind::Text => {
            // Text stays anchored where it was placed.
        }
        _ => {}
    }
}
