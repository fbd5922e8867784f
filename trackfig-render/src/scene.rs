//! Resolution-independent drawing surface.
//!
//! Primitives are collected in pixel coordinates (origin top-left) and
//! serialized by `svg::write`. Clip groups nest.

use crate::color::{Color, BLACK};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dash {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl Dash {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "dashed" | "--" => Dash::Dashed,
            "dotted" | ":" => Dash::Dotted,
            "dashdot" | "-." => Dash::DashDot,
            _ => Dash::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub dash: Dash,
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self { fill: None, stroke: None, stroke_width: 1.0, dash: Dash::Solid, opacity: 1.0 }
    }
}

impl Style {
    pub fn fill(color: Color) -> Self {
        Self { fill: Some(color), ..Self::default() }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self { stroke: Some(color), stroke_width: width, ..Self::default() }
    }

    pub fn filled_outline(fill: Color, stroke: Color, width: f64) -> Self {
        Self { fill: Some(fill), stroke: Some(stroke), stroke_width: width, ..Self::default() }
    }

    pub fn with_dash(mut self, dash: Dash) -> Self {
        self.dash = dash;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub anchor: Anchor,
    pub baseline: Baseline,
    /// Degrees, counter-clockwise.
    pub rotate: f64,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f64) -> Self {
        Self { size, color: BLACK, anchor: Anchor::Start, baseline: Baseline::Middle, rotate: 0.0, bold: false }
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn rotate(mut self, degrees: f64) -> Self {
        self.rotate = degrees;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    /// Elliptical arc to `(x, y)` with radii `rx`, `ry`.
    ArcTo { rx: f64, ry: f64, large: bool, sweep: bool, x: f64, y: f64 },
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Polyline(Vec<(f64, f64)>),
    Polygon(Vec<(f64, f64)>),
    Circle { cx: f64, cy: f64, r: f64 },
    Path(Vec<PathCmd>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Shape(Shape, Style),
    Text { x: f64, y: f64, text: String, style: TextStyle },
    Clip { rect: Rect, items: Vec<Item> },
}

/// Figure-sized collection of drawing items.
#[derive(Debug, Clone)]
pub struct Scene {
    pub width_cm: f64,
    pub height_cm: f64,
    pub dpi: f64,
    root: Vec<Item>,
    open: Vec<(Rect, Vec<Item>)>,
}

impl Scene {
    pub fn new(width_cm: f64, height_cm: f64, dpi: f64) -> Self {
        Self { width_cm, height_cm, dpi, root: Vec::new(), open: Vec::new() }
    }

    pub fn cm_to_px(&self, cm: f64) -> f64 {
        cm / 2.54 * self.dpi
    }

    /// Points (1/72 inch) to pixels.
    pub fn pt(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }

    pub fn width_px(&self) -> f64 {
        self.cm_to_px(self.width_cm)
    }

    pub fn height_px(&self) -> f64 {
        self.cm_to_px(self.height_cm)
    }

    fn push(&mut self, item: Item) {
        match self.open.last_mut() {
            Some((_, items)) => items.push(item),
            None => self.root.push(item),
        }
    }

    pub fn shape(&mut self, shape: Shape, style: Style) {
        self.push(Item::Shape(shape, style));
    }

    pub fn rect(&mut self, rect: Rect, style: Style) {
        self.shape(Shape::Rect(rect), style);
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: Style) {
        self.shape(Shape::Line { x1, y1, x2, y2 }, style);
    }

    pub fn polyline(&mut self, points: Vec<(f64, f64)>, style: Style) {
        if points.len() > 1 {
            self.shape(Shape::Polyline(points), style);
        }
    }

    pub fn polygon(&mut self, points: Vec<(f64, f64)>, style: Style) {
        if points.len() > 2 {
            self.shape(Shape::Polygon(points), style);
        }
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: Style) {
        self.shape(Shape::Circle { cx, cy, r }, style);
    }

    pub fn path(&mut self, commands: Vec<PathCmd>, style: Style) {
        if !commands.is_empty() {
            self.shape(Shape::Path(commands), style);
        }
    }

    pub fn text(&mut self, x: f64, y: f64, text: impl Into<String>, style: TextStyle) {
        let text = text.into();
        if !text.is_empty() {
            self.push(Item::Text { x, y, text, style });
        }
    }

    /// Following items are clipped to `rect` until the matching `end_clip`.
    pub fn begin_clip(&mut self, rect: Rect) {
        self.open.push((rect, Vec::new()));
    }

    pub fn end_clip(&mut self) {
        if let Some((rect, items)) = self.open.pop() {
            self.push(Item::Clip { rect, items });
        }
    }

    /// Top-level items; open clip groups are closed first.
    pub fn items(&mut self) -> &[Item] {
        while !self.open.is_empty() {
            self.end_clip();
        }
        &self.root
    }

    /// Approximate rendered width of `text` at `size` px.
    pub fn text_width(text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * 0.6
    }
}
