//! Data-to-pixel transforms and the per-panel drawing axis.

use crate::scene::{PathCmd, Rect, Scene, Style, TextStyle};

/// Genomic coordinate to horizontal pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XScale {
    pub start: f64,
    pub end: f64,
    pub px0: f64,
    pub px1: f64,
    /// `start` maps to the right edge.
    pub decreasing: bool,
}

impl XScale {
    pub fn new(start: f64, end: f64, px0: f64, px1: f64, decreasing: bool) -> Self {
        Self { start, end, px0, px1, decreasing }
    }

    pub fn to_px(&self, bp: f64) -> f64 {
        let span = self.end - self.start;
        let t = if span != 0.0 { (bp - self.start) / span } else { 0.0 };
        let t = if self.decreasing { 1.0 - t } else { t };
        self.px0 + t * (self.px1 - self.px0)
    }

    /// Pixel width of `bp` bases.
    pub fn length_px(&self, bp: f64) -> f64 {
        let span = self.end - self.start;
        if span == 0.0 {
            0.0
        } else {
            bp.abs() / span * (self.px1 - self.px0).abs()
        }
    }

    /// Bases covered by one pixel.
    pub fn bp_per_px(&self) -> f64 {
        (self.end - self.start) / (self.px1 - self.px0).abs().max(1e-9)
    }
}

/// Data value to vertical pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YScale {
    pub min: f64,
    pub max: f64,
    pub py_top: f64,
    pub py_bottom: f64,
    /// `min` maps to the top.
    pub inverted: bool,
}

impl YScale {
    pub fn new(min: f64, max: f64, py_top: f64, py_bottom: f64, inverted: bool) -> Self {
        Self { min, max, py_top, py_bottom, inverted }
    }

    pub fn to_px(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        let t = if span != 0.0 && span.is_finite() { (v - self.min) / span } else { 0.0 };
        if self.inverted {
            self.py_top + t * (self.py_bottom - self.py_top)
        } else {
            self.py_bottom - t * (self.py_bottom - self.py_top)
        }
    }

    pub fn height_px(&self) -> f64 {
        self.py_bottom - self.py_top
    }
}

/// One panel: the pixel rectangle, its two scales and the scene to draw on.
pub struct Axis<'a> {
    pub scene: &'a mut Scene,
    pub rect: Rect,
    pub x: XScale,
    pub y: YScale,
}

impl<'a> Axis<'a> {
    pub fn new(scene: &'a mut Scene, rect: Rect, x: XScale, y: YScale) -> Self {
        Self { scene, rect, x, y }
    }

    pub fn px(&self, bp: f64) -> f64 {
        self.x.to_px(bp)
    }

    pub fn py(&self, v: f64) -> f64 {
        self.y.to_px(v)
    }

    /// Points to pixels at the figure resolution.
    pub fn pt(&self, points: f64) -> f64 {
        self.scene.pt(points)
    }

    /// Rectangle spanning `[x0, x1] x [y0, y1]` in data coordinates.
    pub fn rect(&mut self, x0: f64, x1: f64, y0: f64, y1: f64, style: Style) {
        let (a, b) = (self.px(x0), self.px(x1));
        let (c, d) = (self.py(y0), self.py(y1));
        let rect = Rect::new(a.min(b), c.min(d), (a - b).abs(), (c - d).abs());
        self.scene.rect(rect, style);
    }

    pub fn hline(&mut self, y: f64, style: Style) {
        let py = self.py(y);
        self.scene.line(self.rect.x, py, self.rect.right(), py, style);
    }

    pub fn vline(&mut self, x: f64, style: Style) {
        let px = self.px(x);
        self.scene.line(px, self.rect.y, px, self.rect.bottom(), style);
    }

    pub fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, style: Style) {
        let (a, b, c, d) = (self.px(x0), self.py(y0), self.px(x1), self.py(y1));
        self.scene.line(a, b, c, d, style);
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: Style) {
        let pts = points.iter().map(|&(x, y)| (self.px(x), self.py(y))).collect();
        self.scene.polyline(pts, style);
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: Style) {
        let pts = points.iter().map(|&(x, y)| (self.px(x), self.py(y))).collect();
        self.scene.polygon(pts, style);
    }

    /// Path in data coordinates; arc radii are taken as pixels.
    pub fn path(&mut self, commands: &[PathCmd], style: Style) {
        let cmds = commands
            .iter()
            .map(|cmd| match *cmd {
                PathCmd::MoveTo(x, y) => PathCmd::MoveTo(self.px(x), self.py(y)),
                PathCmd::LineTo(x, y) => PathCmd::LineTo(self.px(x), self.py(y)),
                PathCmd::ArcTo { rx, ry, large, sweep, x, y } => {
                    PathCmd::ArcTo { rx, ry, large, sweep, x: self.px(x), y: self.py(y) }
                }
                PathCmd::Close => PathCmd::Close,
            })
            .collect();
        self.scene.path(cmds, style);
    }

    pub fn circle(&mut self, x: f64, y: f64, r_px: f64, style: Style) {
        let (cx, cy) = (self.px(x), self.py(y));
        self.scene.circle(cx, cy, r_px, style);
    }

    pub fn text(&mut self, x: f64, y: f64, text: &str, style: TextStyle) {
        let (px, py) = (self.px(x), self.py(y));
        self.scene.text(px, py, text, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Item;

    #[test]
    fn test_xscale_directions() {
        let x = XScale::new(1000.0, 2000.0, 0.0, 100.0, false);
        assert_eq!(x.to_px(1000.0), 0.0);
        assert_eq!(x.to_px(1500.0), 50.0);
        assert_eq!(x.length_px(100.0), 10.0);

        let rev = XScale::new(1000.0, 2000.0, 0.0, 100.0, true);
        assert_eq!(rev.to_px(1000.0), 100.0);
        assert_eq!(rev.to_px(2000.0), 0.0);
        assert_eq!(rev.length_px(100.0), 10.0);
    }

    #[test]
    fn test_yscale_inversion() {
        let y = YScale::new(0.0, 10.0, 0.0, 100.0, false);
        assert_eq!(y.to_px(0.0), 100.0);
        assert_eq!(y.to_px(10.0), 0.0);

        let inv = YScale::new(0.0, 10.0, 0.0, 100.0, true);
        assert_eq!(inv.to_px(0.0), 0.0);
        assert_eq!(inv.to_px(10.0), 100.0);

        let flat = YScale::new(5.0, 5.0, 0.0, 100.0, false);
        assert_eq!(flat.to_px(5.0), 100.0);
    }

    #[test]
    fn test_axis_rect_normalized() {
        let mut scene = Scene::new(10.0, 10.0, 72.0);
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let x = XScale::new(0.0, 100.0, 0.0, 100.0, true);
        let y = YScale::new(0.0, 1.0, 0.0, 100.0, false);
        let mut axis = Axis::new(&mut scene, rect, x, y);
        axis.rect(10.0, 20.0, 0.0, 0.5, Style::default());

        match &scene.items()[0] {
            Item::Shape(crate::scene::Shape::Rect(r), _) => {
                assert_eq!((r.x, r.y, r.width, r.height), (80.0, 50.0, 10.0, 50.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
