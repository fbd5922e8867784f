//! SVG serialization of a `Scene`.
//!
//! Output is a pure function of the scene: numbers are printed with two
//! decimals and clip-path ids are assigned in document order.

use std::fmt::Write as _;

use crate::scene::{Anchor, Baseline, Dash, Item, PathCmd, Scene, Shape, Style, TextStyle};

const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Serialize `scene` to an SVG document.
pub fn write(scene: &mut Scene) -> String {
    let width_px = scene.width_px();
    let height_px = scene.height_px();
    let width_cm = scene.width_cm;
    let height_cm = scene.height_cm;

    let mut builder = SvgBuilder::default();
    builder.elements.push(format!(
        r#"<rect width="{}" height="{}" fill="white"/>"#,
        num(width_px),
        num(height_px)
    ));
    for item in scene.items() {
        builder.item(item, 1);
    }

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}cm" height="{}cm" viewBox="0 0 {} {}" font-family="{}">"#,
        num(width_cm),
        num(height_cm),
        num(width_px),
        num(height_px),
        FONT_FAMILY
    );
    if !builder.defs.is_empty() {
        out.push_str("  <defs>\n");
        for def in &builder.defs {
            let _ = writeln!(out, "    {}", def);
        }
        out.push_str("  </defs>\n");
    }
    for element in &builder.elements {
        out.push_str(element);
        out.push('\n');
    }
    out.push_str("</svg>\n");
    out
}

#[derive(Default)]
struct SvgBuilder {
    defs: Vec<String>,
    elements: Vec<String>,
    next_clip: usize,
}

impl SvgBuilder {
    fn item(&mut self, item: &Item, depth: usize) {
        let indent = "  ".repeat(depth);
        match item {
            Item::Shape(shape, style) => {
                let element = shape_element(shape, style);
                self.elements.push(format!("{}{}", indent, element));
            }
            Item::Text { x, y, text, style } => {
                self.elements.push(format!("{}{}", indent, text_element(*x, *y, text, style)));
            }
            Item::Clip { rect, items } => {
                let id = format!("clip{}", self.next_clip);
                self.next_clip += 1;
                self.defs.push(format!(
                    r#"<clipPath id="{}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
                    id,
                    num(rect.x),
                    num(rect.y),
                    num(rect.width),
                    num(rect.height)
                ));
                self.elements.push(format!(r#"{}<g clip-path="url(#{})">"#, indent, id));
                for child in items {
                    self.item(child, depth + 1);
                }
                self.elements.push(format!("{}</g>", indent));
            }
        }
    }
}

fn shape_element(shape: &Shape, style: &Style) -> String {
    let attrs = style_attrs(style);
    match shape {
        Shape::Rect(r) => format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}"{}/>"#,
            num(r.x),
            num(r.y),
            num(r.width.max(0.0)),
            num(r.height.max(0.0)),
            attrs
        ),
        Shape::Line { x1, y1, x2, y2 } => format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
            num(*x1),
            num(*y1),
            num(*x2),
            num(*y2),
            attrs
        ),
        Shape::Polyline(points) => format!(r#"<polyline points="{}"{}/>"#, points_attr(points), attrs),
        Shape::Polygon(points) => format!(r#"<polygon points="{}"{}/>"#, points_attr(points), attrs),
        Shape::Circle { cx, cy, r } => {
            format!(r#"<circle cx="{}" cy="{}" r="{}"{}/>"#, num(*cx), num(*cy), num(*r), attrs)
        }
        Shape::Path(commands) => format!(r#"<path d="{}"{}/>"#, path_data(commands), attrs),
    }
}

fn style_attrs(style: &Style) -> String {
    let mut attrs = String::new();
    match style.fill {
        Some(c) => {
            let _ = write!(attrs, r#" fill="{}""#, c.to_hex());
            if c.a < 1.0 {
                let _ = write!(attrs, r#" fill-opacity="{}""#, num(c.a));
            }
        }
        None => attrs.push_str(r#" fill="none""#),
    }
    if let Some(c) = style.stroke {
        let _ = write!(attrs, r#" stroke="{}" stroke-width="{}""#, c.to_hex(), num(style.stroke_width));
        if c.a < 1.0 {
            let _ = write!(attrs, r#" stroke-opacity="{}""#, num(c.a));
        }
        let w = style.stroke_width.max(0.5);
        let dash = match style.dash {
            Dash::Solid => None,
            Dash::Dashed => Some(format!("{},{}", num(w * 3.7), num(w * 1.6))),
            Dash::Dotted => Some(format!("{},{}", num(w), num(w * 1.65))),
            Dash::DashDot => Some(format!("{},{},{},{}", num(w * 6.4), num(w * 1.6), num(w), num(w * 1.6))),
        };
        if let Some(dash) = dash {
            let _ = write!(attrs, r#" stroke-dasharray="{}""#, dash);
        }
    }
    if style.opacity < 1.0 {
        let _ = write!(attrs, r#" opacity="{}""#, num(style.opacity));
    }
    attrs
}

fn text_element(x: f64, y: f64, text: &str, style: &TextStyle) -> String {
    let anchor = match style.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    };
    let baseline = match style.baseline {
        Baseline::Top => "hanging",
        Baseline::Middle => "central",
        Baseline::Bottom => "alphabetic",
    };
    let mut attrs = format!(
        r#" x="{}" y="{}" font-size="{}" text-anchor="{}" dominant-baseline="{}" fill="{}""#,
        num(x),
        num(y),
        num(style.size),
        anchor,
        baseline,
        style.color.to_hex()
    );
    if style.bold {
        attrs.push_str(r#" font-weight="bold""#);
    }
    if style.rotate != 0.0 {
        let _ = write!(attrs, r#" transform="rotate({} {} {})""#, num(-style.rotate), num(x), num(y));
    }
    format!("<text{}>{}</text>", attrs, escape(text))
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn path_data(commands: &[PathCmd]) -> String {
    let parts: Vec<String> = commands
        .iter()
        .map(|cmd| match *cmd {
            PathCmd::MoveTo(x, y) => format!("M{} {}", num(x), num(y)),
            PathCmd::LineTo(x, y) => format!("L{} {}", num(x), num(y)),
            PathCmd::ArcTo { rx, ry, large, sweep, x, y } => format!(
                "A{} {} 0 {} {} {} {}",
                num(rx),
                num(ry),
                large as u8,
                sweep as u8,
                num(x),
                num(y)
            ),
            PathCmd::Close => "Z".to_string(),
        })
        .collect();
    parts.join(" ")
}

/// Two decimals, trailing zeros removed.
pub fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};
    use crate::scene::Rect;

    #[test]
    fn test_num_format() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(1.256), "1.26");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(10.50), "10.5");
        assert_eq!(num(f64::NAN), "0");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_document_shape() {
        let mut scene = Scene::new(2.54, 2.54, 72.0);
        scene.begin_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        scene.rect(Rect::new(1.0, 2.0, 3.0, 4.0), Style::filled_outline(WHITE, BLACK, 0.5).with_dash(Dash::Dashed));
        scene.end_clip();
        scene.text(5.0, 5.0, "chr1 <x>", TextStyle::new(12.0).anchor(Anchor::Middle).rotate(90.0));

        let svg = write(&mut scene);
        assert!(svg.contains(r#"width="2.54cm""#));
        assert!(svg.contains(r#"viewBox="0 0 72 72""#));
        assert!(svg.contains(r#"<clipPath id="clip0">"#));
        assert!(svg.contains(r#"<g clip-path="url(#clip0)">"#));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("chr1 &lt;x&gt;"));
        assert!(svg.contains("rotate(-90 5 5)"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_path_data() {
        let d = path_data(&[
            PathCmd::MoveTo(0.0, 10.0),
            PathCmd::ArcTo { rx: 5.0, ry: 8.0, large: false, sweep: true, x: 10.0, y: 10.0 },
            PathCmd::Close,
        ]);
        assert_eq!(d, "M0 10 A5 8 0 0 1 10 10 Z");
    }
}
