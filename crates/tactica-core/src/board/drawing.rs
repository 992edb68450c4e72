//! Freehand and parametric annotations.

use super::ColorRef;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for drawings.
pub type DrawingId = Uuid;

/// Kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawingKind {
    Pencil,
    Line,
    DashedLine,
    Arrow,
    CurvedArrow,
    Rectangle,
    Circle,
    ShadedArea,
    Text,
}

impl DrawingKind {
    /// Minimum number of points for a drawing of this kind to be kept.
    pub fn min_points(self) -> usize {
        match self {
            DrawingKind::Text => 1,
            DrawingKind::CurvedArrow | DrawingKind::ShadedArea => 3,
            _ => 2,
        }
    }

    /// Kinds defined by exactly two corner/end points.
    pub fn is_two_point(self) -> bool {
        matches!(
            self,
            DrawingKind::Line
                | DrawingKind::DashedLine
                | DrawingKind::Arrow
                | DrawingKind::Rectangle
                | DrawingKind::Circle
        )
    }

    /// Kinds that accumulate every sampled pointer position.
    pub fn is_freehand(self) -> bool {
        matches!(self, DrawingKind::Pencil | DrawingKind::ShadedArea)
    }

    pub fn is_dashed(self) -> bool {
        matches!(self, DrawingKind::DashedLine)
    }

    /// Whether `count` points fit this kind's point layout.
    pub fn accepts_point_count(self, count: usize) -> bool {
        match self {
            DrawingKind::Text => count == 1,
            DrawingKind::CurvedArrow => count == 3,
            kind if kind.is_two_point() => count == 2,
            kind => count >= kind.min_points(),
        }
    }
}

/// A drawn annotation.
///
/// Point layout per kind:
/// - line family: `[start, end]`
/// - `curved-arrow`: `[start, control, end]`
/// - `rectangle`/`circle`: two opposite corners of the bounding box
/// - `pencil`/`shaded-area`: every sampled point
/// - `text`: anchor point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: DrawingId,
    pub kind: DrawingKind,
    pub points: Vec<Point>,
    pub color: ColorRef,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Drawing {
    pub fn new(kind: DrawingKind, start: Point, color: ColorRef, stroke_width: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            points: vec![start],
            color,
            stroke_width,
            text: None,
        }
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Whether the drawing has enough distinct points to be committed.
    pub fn is_complete(&self) -> bool {
        let min = self.kind.min_points();
        if self.points.len() < min {
            return false;
        }
        min < 2 || self.points.iter().any(|p| *p != self.points[0])
    }

    /// Whether the point list matches the layout of the drawing's kind.
    pub fn has_valid_shape(&self) -> bool {
        self.kind.accepts_point_count(self.points.len())
    }

    /// Bounding box of the points.
    pub fn bounds(&self) -> Option<Rect> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .fold(Rect::from_points(first, first), |r, &p| r.union_pt(p)),
        )
    }

    /// Check if a normalized point hits the drawing.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self.kind {
            DrawingKind::Text => self
                .points
                .first()
                .is_some_and(|anchor| anchor.distance(point) <= tolerance * 2.0),
            DrawingKind::Rectangle => self.bounds().is_some_and(|r| {
                let outline = [
                    Point::new(r.x0, r.y0),
                    Point::new(r.x1, r.y0),
                    Point::new(r.x1, r.y1),
                    Point::new(r.x0, r.y1),
                    Point::new(r.x0, r.y0),
                ];
                point_to_polyline_dist(point, &outline) <= tolerance
            }),
            DrawingKind::Circle => self.bounds().is_some_and(|r| {
                // Normalized distance from the ellipse outline.
                let (rx, ry) = (r.width() / 2.0, r.height() / 2.0);
                if rx < f64::EPSILON || ry < f64::EPSILON {
                    return r.center().distance(point) <= tolerance;
                }
                let c = r.center();
                let d = (((point.x - c.x) / rx).powi(2) + ((point.y - c.y) / ry).powi(2)).sqrt();
                (d - 1.0).abs() * rx.min(ry) <= tolerance
            }),
            DrawingKind::ShadedArea => {
                point_in_polygon(point, &self.points)
                    || point_to_polyline_dist(point, &self.points) <= tolerance
            }
            _ => point_to_polyline_dist(point, &self.points) <= tolerance,
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => single.distance(point),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd point-in-polygon test.
fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(a: (f64, f64), b: (f64, f64)) -> Drawing {
        Drawing::new(DrawingKind::Line, Point::new(a.0, a.1), ColorRef::default(), 2.0)
            .with_points(vec![Point::new(a.0, a.1), Point::new(b.0, b.1)])
    }

    #[test]
    fn test_min_points() {
        let mut d = Drawing::new(DrawingKind::Line, Point::new(0.1, 0.1), ColorRef::default(), 2.0);
        assert!(!d.is_complete());
        d.points.push(Point::new(0.2, 0.2));
        assert!(d.is_complete());

        let t = Drawing::new(DrawingKind::Text, Point::new(0.1, 0.1), ColorRef::default(), 2.0);
        assert!(t.is_complete());

        let dot = Drawing::new(DrawingKind::Circle, Point::new(0.1, 0.1), ColorRef::default(), 2.0)
            .with_points(vec![Point::new(0.1, 0.1), Point::new(0.1, 0.1)]);
        assert!(!dot.is_complete());
    }

    #[test]
    fn test_point_count_per_kind() {
        assert!(DrawingKind::Line.accepts_point_count(2));
        assert!(!DrawingKind::Line.accepts_point_count(1));
        assert!(!DrawingKind::Rectangle.accepts_point_count(3));
        assert!(DrawingKind::CurvedArrow.accepts_point_count(3));
        assert!(!DrawingKind::CurvedArrow.accepts_point_count(0));
        assert!(!DrawingKind::CurvedArrow.accepts_point_count(4));
        assert!(DrawingKind::Pencil.accepts_point_count(40));
        assert!(!DrawingKind::ShadedArea.accepts_point_count(2));
        assert!(DrawingKind::Text.accepts_point_count(1));
        assert!(!DrawingKind::Text.accepts_point_count(2));
    }

    #[test]
    fn test_line_hit_test() {
        let d = line((0.1, 0.1), (0.9, 0.1));
        assert!(d.hit_test(Point::new(0.5, 0.11), 0.02));
        assert!(!d.hit_test(Point::new(0.5, 0.2), 0.02));
    }

    #[test]
    fn test_rectangle_hits_outline_only() {
        let d = Drawing::new(DrawingKind::Rectangle, Point::new(0.2, 0.2), ColorRef::default(), 2.0)
            .with_points(vec![Point::new(0.2, 0.2), Point::new(0.6, 0.6)]);
        assert!(d.hit_test(Point::new(0.2, 0.4), 0.01));
        assert!(!d.hit_test(Point::new(0.4, 0.4), 0.01));
    }

    #[test]
    fn test_shaded_area_hits_inside() {
        let d = Drawing::new(DrawingKind::ShadedArea, Point::new(0.2, 0.2), ColorRef::default(), 2.0)
            .with_points(vec![
                Point::new(0.2, 0.2),
                Point::new(0.6, 0.2),
                Point::new(0.6, 0.6),
                Point::new(0.2, 0.6),
            ]);
        assert!(d.hit_test(Point::new(0.4, 0.4), 0.01));
        assert!(!d.hit_test(Point::new(0.8, 0.8), 0.01));
    }

    #[test]
    fn test_circle_hits_outline() {
        let d = Drawing::new(DrawingKind::Circle, Point::new(0.2, 0.2), ColorRef::default(), 2.0)
            .with_points(vec![Point::new(0.2, 0.2), Point::new(0.6, 0.6)]);
        assert!(d.hit_test(Point::new(0.6, 0.4), 0.01));
        assert!(!d.hit_test(Point::new(0.4, 0.4), 0.01));
    }
}
