//! CPU rasterization of a board to RGBA pixels and PNG.

use crate::theme::{Theme, has_theme_refs};
use std::borrow::Cow;
use crate::{ExportError, ExportResult};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use tactica_core::board::{BoardItem, BoardState, ColorRef, Drawing, DrawingKind, ItemKind, Rgba, ShapeKind};
use tactica_core::geometry::{Orientation, transform_point};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

/// Raster export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Resolution multiplier, 1 to 4.
    pub scale: u32,
    /// Length of the long side at scale 1, in pixels.
    pub base_width: u32,
    /// Draw pitch markings behind the board.
    pub pitch_markings: bool,
    /// Margin around the pitch at scale 1, in pixels.
    pub padding: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            base_width: 900,
            pitch_markings: true,
            padding: 16.0,
        }
    }
}

impl ExportConfig {
    fn scale(&self) -> f64 {
        self.scale.clamp(1, 4) as f64
    }
}

/// Result of rasterization: straight (not premultiplied) RGBA pixels.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl RasterImage {
    /// Straight RGBA of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba.get(i..i + 4).and_then(|p| p.try_into().ok())
    }

    /// Encode to PNG bytes.
    pub fn encode_png(&self) -> ExportResult<Vec<u8>> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| ExportError::Encode(format!("PNG header: {}", e)))?;
            writer
                .write_image_data(&self.rgba)
                .map_err(|e| ExportError::Encode(format!("PNG data: {}", e)))?;
        }
        Ok(png_data)
    }
}

/// Output size in pixels: 3:2 landscape for horizontal, 2:3 portrait for
/// vertical, long side `base_width * scale`.
pub fn image_size(orientation: Orientation, config: &ExportConfig) -> (u32, u32) {
    let long = (config.base_width.max(1) as f64 * config.scale()).round();
    let short = (long / Orientation::Horizontal.aspect_ratio()).round();
    match orientation {
        Orientation::Horizontal => (long as u32, short as u32),
        Orientation::Vertical => (short as u32, long as u32),
    }
}

/// Rasterize `board`, drawn in `orientation`, resolving colors with `theme`.
///
/// Items flagged `exclude_from_snapshot` are left out.
pub fn rasterize(
    board: &BoardState,
    orientation: Orientation,
    theme: &Theme,
    config: &ExportConfig,
) -> ExportResult<RasterImage> {
    if board.is_empty() {
        return Err(ExportError::EmptyBoard);
    }
    let (width, height) = image_size(orientation, config);
    let pixmap = Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Surface(format!("cannot allocate {}x{} pixmap", width, height)))?;

    let scale = config.scale();
    let inset = config.padding.max(0.0) * scale;
    let pitch = Rect::new(inset, inset, width as f64 - inset, height as f64 - inset);
    if pitch.width() <= 0.0 || pitch.height() <= 0.0 {
        return Err(ExportError::Surface("padding leaves no room for the board".into()));
    }

    let resolved = if has_theme_refs(board) {
        Cow::Owned(theme.resolve_board(board))
    } else {
        Cow::Borrowed(board)
    };
    let mut canvas = Canvas {
        pixmap,
        pitch,
        scale,
        orientation,
        theme,
    };

    canvas.background(config.pitch_markings);
    for drawing in &resolved.drawings {
        canvas.drawing(drawing);
    }
    for item in resolved.items.iter().filter(|i| !i.exclude_from_snapshot) {
        canvas.item(item);
    }

    log::info!(
        "Rasterized {} items and {} drawings at {}x{}",
        resolved.items.len(),
        resolved.drawings.len(),
        width,
        height
    );
    Ok(canvas.finish())
}

/// Rasterize and encode to PNG in one step.
pub fn export_png(
    board: &BoardState,
    orientation: Orientation,
    theme: &Theme,
    config: &ExportConfig,
) -> ExportResult<Vec<u8>> {
    rasterize(board, orientation, theme, config)?.encode_png()
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn with_alpha(color: Rgba, factor: f64) -> Rgba {
    Rgba::new(color.r, color.g, color.b, (color.a as f64 * factor).round() as u8)
}

/// Drawing state for one export.
struct Canvas<'a> {
    pixmap: Pixmap,
    /// Pixel rectangle the normalized board maps onto.
    pitch: Rect,
    scale: f64,
    orientation: Orientation,
    theme: &'a Theme,
}

impl Canvas<'_> {
    fn to_px(&self, p: Point) -> Point {
        Point::new(
            self.pitch.x0 + p.x * self.pitch.width(),
            self.pitch.y0 + p.y * self.pitch.height(),
        )
    }

    /// Pixel length of a normalized radius.
    fn radius_px(&self, r: f64) -> f32 {
        (r * self.pitch.width().min(self.pitch.height())) as f32
    }

    fn color(&self, color: Option<&ColorRef>, default: &str) -> Rgba {
        match color {
            Some(c) => self.theme.resolve(c),
            None => self.theme.resolve(&ColorRef::theme(default)),
        }
    }

    fn stroke(&self, width: f64) -> Stroke {
        Stroke {
            width: (width * self.scale) as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        }
    }

    fn fill(&mut self, path: &Path, color: Rgba, transform: Transform) {
        self.pixmap
            .fill_path(path, &paint(color), FillRule::Winding, transform, None);
    }

    fn outline(&mut self, path: &Path, color: Rgba, stroke: &Stroke, transform: Transform) {
        self.pixmap.stroke_path(path, &paint(color), stroke, transform, None);
    }

    fn polyline(&self, points: &[Point], close: bool) -> Option<Path> {
        let (first, rest) = points.split_first()?;
        let mut pb = PathBuilder::new();
        let p = self.to_px(*first);
        pb.move_to(p.x as f32, p.y as f32);
        for point in rest {
            let p = self.to_px(*point);
            pb.line_to(p.x as f32, p.y as f32);
        }
        if close {
            pb.close();
        }
        pb.finish()
    }

    fn background(&mut self, markings: bool) {
        let grass = self.theme.resolve(&ColorRef::theme("pitch"));
        let [r, g, b, _] = Color::from(grass).components;
        let surround = Rgba::from(Color::new([r * 0.85, g * 0.85, b * 0.85, 1.0]));
        self.pixmap.fill(skia_color(surround));

        if let Some(rect) = tiny_skia::Rect::from_ltrb(
            self.pitch.x0 as f32,
            self.pitch.y0 as f32,
            self.pitch.x1 as f32,
            self.pitch.y1 as f32,
        ) {
            self.fill(&PathBuilder::from_rect(rect), grass, Transform::identity());
        }
        if markings {
            self.pitch_markings();
        }
    }

    /// Field markings, laid out for a horizontal pitch and turned with the board.
    fn pitch_markings(&mut self) {
        let color = self.theme.resolve(&ColorRef::theme("pitch-lines"));
        let stroke = self.stroke(1.5);
        let lines: [&[(f64, f64)]; 7] = [
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)],
            &[(0.5, 0.0), (0.5, 1.0)],
            &[(0.0, 0.2), (0.16, 0.2), (0.16, 0.8), (0.0, 0.8)],
            &[(1.0, 0.2), (0.84, 0.2), (0.84, 0.8), (1.0, 0.8)],
            &[(0.0, 0.37), (0.055, 0.37), (0.055, 0.63), (0.0, 0.63)],
            &[(1.0, 0.37), (0.945, 0.37), (0.945, 0.63), (1.0, 0.63)],
            &[(0.5, 0.5), (0.5, 0.5)],
        ];
        for line in lines {
            let points: Vec<Point> = line
                .iter()
                .map(|&(x, y)| self.oriented(Point::new(x, y)))
                .collect();
            if let Some(path) = self.polyline(&points, false) {
                self.outline(&path, color, &stroke, Transform::identity());
            }
        }

        let center = self.to_px(Point::new(0.5, 0.5));
        if let Some(circle) = PathBuilder::from_circle(center.x as f32, center.y as f32, self.radius_px(0.135)) {
            self.outline(&circle, color, &stroke, Transform::identity());
        }
    }

    /// Map a canonical (horizontal) point into the export orientation.
    fn oriented(&self, p: Point) -> Point {
        match self.orientation {
            Orientation::Horizontal => p,
            Orientation::Vertical => transform_point(p, Orientation::Horizontal),
        }
    }

    fn drawing(&mut self, drawing: &Drawing) {
        let color = self.theme.resolve(&drawing.color);
        let mut stroke = self.stroke(drawing.stroke_width);
        let points = &drawing.points;

        match drawing.kind {
            DrawingKind::Pencil | DrawingKind::Line => {
                if let Some(path) = self.polyline(points, false) {
                    self.outline(&path, color, &stroke, Transform::identity());
                }
            }
            DrawingKind::DashedLine => {
                let w = stroke.width;
                stroke.dash = StrokeDash::new(vec![w * 3.0, w * 2.5], 0.0);
                if let Some(path) = self.polyline(points, false) {
                    self.outline(&path, color, &stroke, Transform::identity());
                }
            }
            DrawingKind::Arrow => {
                if let Some(path) = self.polyline(points, false) {
                    self.outline(&path, color, &stroke, Transform::identity());
                }
                if let [.., from, to] = points.as_slice() {
                    let (from, to) = (self.to_px(*from), self.to_px(*to));
                    self.arrow_head(from, to, color, &stroke);
                }
            }
            DrawingKind::CurvedArrow => {
                if let [start, control, end] = points.as_slice() {
                    let (s, c, e) = (self.to_px(*start), self.to_px(*control), self.to_px(*end));
                    let mut pb = PathBuilder::new();
                    pb.move_to(s.x as f32, s.y as f32);
                    pb.quad_to(c.x as f32, c.y as f32, e.x as f32, e.y as f32);
                    if let Some(path) = pb.finish() {
                        self.outline(&path, color, &stroke, Transform::identity());
                    }
                    self.arrow_head(c, e, color, &stroke);
                }
            }
            DrawingKind::Rectangle | DrawingKind::Circle => {
                let Some(bounds) = drawing.bounds() else {
                    return;
                };
                let (a, b) = (self.to_px(bounds.origin()), self.to_px(Point::new(bounds.x1, bounds.y1)));
                let Some(rect) = tiny_skia::Rect::from_ltrb(a.x as f32, a.y as f32, b.x as f32, b.y as f32) else {
                    return;
                };
                let path = if drawing.kind == DrawingKind::Rectangle {
                    Some(PathBuilder::from_rect(rect))
                } else {
                    PathBuilder::from_oval(rect)
                };
                if let Some(path) = path {
                    self.outline(&path, color, &stroke, Transform::identity());
                }
            }
            DrawingKind::ShadedArea => {
                if let Some(path) = self.polyline(points, true) {
                    self.fill(&path, with_alpha(color, 0.35), Transform::identity());
                    self.outline(&path, color, &stroke, Transform::identity());
                }
            }
            DrawingKind::Text => {
                // No font stack: a text annotation exports as an underline
                // sized to its content.
                let Some(anchor) = points.first() else {
                    return;
                };
                let chars = drawing.text.as_deref().map_or(0, |t| t.chars().count()) as f64;
                let a = self.to_px(*anchor);
                let b = Point::new(a.x + chars * 7.0 * self.scale, a.y);
                let mut pb = PathBuilder::new();
                pb.move_to(a.x as f32, a.y as f32);
                pb.line_to(b.x as f32, b.y as f32);
                if let Some(path) = pb.finish() {
                    self.outline(&path, color, &stroke, Transform::identity());
                }
            }
        }
    }

    fn arrow_head(&mut self, from: Point, tip: Point, color: Rgba, stroke: &Stroke) {
        let dir = tip - from;
        if dir.hypot() < f64::EPSILON {
            return;
        }
        let dir = dir.normalize();
        let len = (stroke.width as f64 * 4.0).max(8.0 * self.scale);
        let normal = Vec2::new(-dir.y, dir.x);
        let base = tip - dir * len;
        let left = base + normal * (len * 0.5);
        let right = base - normal * (len * 0.5);

        let mut pb = PathBuilder::new();
        pb.move_to(tip.x as f32, tip.y as f32);
        pb.line_to(left.x as f32, left.y as f32);
        pb.line_to(right.x as f32, right.y as f32);
        pb.close();
        if let Some(path) = pb.finish() {
            self.fill(&path, color, Transform::identity());
        }
    }

    fn item(&mut self, item: &BoardItem) {
        let c = self.to_px(item.position);
        let (cx, cy) = (c.x as f32, c.y as f32);
        let r = self.radius_px(item.radius());
        let rim = self.stroke(1.5);
        let payload_color = item.payload.color.as_ref();

        match item.kind {
            ItemKind::Player => {
                let fill = self.color(payload_color, "home");
                if let Some(circle) = PathBuilder::from_circle(cx, cy, r) {
                    self.fill(&circle, fill, Transform::identity());
                    self.outline(&circle, Rgba::WHITE, &rim, Transform::identity());
                }
            }
            ItemKind::Ball => {
                let fill = self.color(payload_color, "ball");
                if let Some(circle) = PathBuilder::from_circle(cx, cy, r) {
                    self.fill(&circle, fill, Transform::identity());
                    self.outline(&circle, Rgba::BLACK, &rim, Transform::identity());
                }
            }
            ItemKind::Cone => {
                let fill = self.color(payload_color, "cone");
                if let Some(path) = triangle(cx, cy, r) {
                    self.fill(&path, fill, Transform::identity());
                }
            }
            ItemKind::Goal => {
                let color = self.color(payload_color, "pitch-lines");
                let frame = self.stroke(3.0);
                if let Some(rect) = tiny_skia::Rect::from_xywh(cx - r, cy - r * 0.5, r * 2.0, r) {
                    self.outline(&PathBuilder::from_rect(rect), color, &frame, Transform::identity());
                }
            }
            ItemKind::Text => {
                let color = self.color(payload_color, "ink");
                let chars = item.payload.label.as_deref().map_or(1, |l| l.chars().count().max(1)) as f32;
                let half = (chars * 3.5 * self.scale as f32).max(r);
                let underline = self.stroke(2.0);
                let mut pb = PathBuilder::new();
                pb.move_to(cx - half, cy);
                pb.line_to(cx + half, cy);
                if let Some(path) = pb.finish() {
                    self.outline(&path, color, &underline, Transform::identity());
                }
            }
            ItemKind::Shape => {
                let color = self.color(payload_color, "accent");
                let transform = Transform::from_rotate_at(item.rotation as f32, cx, cy);
                self.shape(item.payload.shape.unwrap_or_default(), cx, cy, r, color, transform);
            }
        }
    }

    fn shape(&mut self, kind: ShapeKind, cx: f32, cy: f32, r: f32, color: Rgba, transform: Transform) {
        let line = self.stroke(2.0);
        match kind {
            ShapeKind::Square => {
                if let Some(rect) = tiny_skia::Rect::from_xywh(cx - r, cy - r, r * 2.0, r * 2.0) {
                    self.fill(&PathBuilder::from_rect(rect), with_alpha(color, 0.6), transform);
                    self.outline(&PathBuilder::from_rect(rect), color, &line, transform);
                }
            }
            ShapeKind::Triangle => {
                if let Some(path) = triangle(cx, cy, r) {
                    self.fill(&path, with_alpha(color, 0.6), transform);
                    self.outline(&path, color, &line, transform);
                }
            }
            ShapeKind::Mannequin => {
                let mut pb = PathBuilder::new();
                pb.push_circle(cx, cy - r * 0.7, r * 0.3);
                if let Some(body) = tiny_skia::Rect::from_xywh(cx - r * 0.3, cy - r * 0.35, r * 0.6, r * 1.35) {
                    pb.push_rect(body);
                }
                if let Some(path) = pb.finish() {
                    self.fill(&path, color, transform);
                }
            }
            ShapeKind::Ladder => {
                let mut pb = PathBuilder::new();
                let (x0, x1) = (cx - r * 0.4, cx + r * 0.4);
                let (y0, y1) = (cy - r * 1.5, cy + r * 1.5);
                pb.move_to(x0, y0);
                pb.line_to(x0, y1);
                pb.move_to(x1, y0);
                pb.line_to(x1, y1);
                for i in 0..=5 {
                    let y = y0 + (y1 - y0) * i as f32 / 5.0;
                    pb.move_to(x0, y);
                    pb.line_to(x1, y);
                }
                if let Some(path) = pb.finish() {
                    self.outline(&path, color, &line, transform);
                }
            }
            ShapeKind::Hurdle => {
                let bar = self.stroke(3.0);
                let mut pb = PathBuilder::new();
                pb.move_to(cx - r, cy + r * 0.4);
                pb.line_to(cx - r, cy - r * 0.4);
                pb.line_to(cx + r, cy - r * 0.4);
                pb.line_to(cx + r, cy + r * 0.4);
                if let Some(path) = pb.finish() {
                    self.outline(&path, color, &bar, transform);
                }
            }
        }
    }

    fn finish(self) -> RasterImage {
        let width = self.pixmap.width();
        let height = self.pixmap.height();
        let rgba = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RasterImage { rgba, width, height }
    }
}

fn triangle(cx: f32, cy: f32, r: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy - r);
    pb.line_to(cx + r * 0.87, cy + r * 0.5);
    pb.line_to(cx - r * 0.87, cy + r * 0.5);
    pb.close();
    pb.finish()
}

fn skia_color(color: Rgba) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}
