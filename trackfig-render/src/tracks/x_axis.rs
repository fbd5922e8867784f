//! Genomic coordinate axis.

use trackfig_core::TrackProperties;

use super::{Decoration, Track, TrackContext};
use crate::axis::Axis;
use crate::color::BLACK;
use crate::error::RenderResult;
use crate::scene::{Anchor, Baseline, Scene, Style, TextStyle};
use crate::ticks::{format_position, ticks};

pub struct XAxisTrack {
    props: TrackProperties,
    font_pt: f64,
    chrom: String,
}

impl XAxisTrack {
    pub fn new(props: TrackProperties) -> Self {
        Self { props, font_pt: 0.0, chrom: String::new() }
    }

    fn top(&self) -> bool {
        self.props.str("where") == "top"
    }
}

impl Track for XAxisTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        self.font_pt = self.props.opt_f64("fontsize").unwrap_or(ctx.font_size);
        self.chrom = ctx.region.chrom.clone();
        Ok(())
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let font = axis.pt(self.font_pt);
        let tick_len = font * 0.4;
        let line_width = axis.pt(0.75);
        let rect = axis.rect;
        // The axis line sits on the edge facing the data; labels go outward.
        let (line_y, dir, baseline) = if self.top() {
            (rect.bottom() - line_width, -1.0, Baseline::Bottom)
        } else {
            (rect.y + line_width, 1.0, Baseline::Top)
        };

        let (start, end) = (axis.x.start, axis.x.end);
        let label_px = Scene::text_width(&format_position(end, (end - start) / 4.0), font) * 1.5;
        let desired = ((rect.width / label_px.max(1.0)).floor() as usize).clamp(2, 10);
        let (positions, step) = ticks(start, end, desired);

        let stroke = Style::stroke(BLACK, line_width);
        axis.scene.line(rect.x, line_y, rect.right(), line_y, stroke);
        for pos in positions {
            let x = axis.px(pos);
            axis.scene.line(x, line_y, x, line_y + dir * tick_len, stroke);
            let style = TextStyle::new(font).anchor(Anchor::Middle).baseline(baseline);
            axis.scene.text(x, line_y + dir * tick_len * 1.5, format_position(pos, step), style);
        }
    }

    /// The chromosome name stands in for an empty title.
    fn draw_label(&self, deco: &mut Decoration<'_>) {
        let title = self.props.title();
        if title.trim().is_empty() {
            deco.label(&self.chrom);
        } else {
            deco.label(title);
        }
    }

    fn clip(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{XScale, YScale};
    use crate::scene::{Item, Rect};
    use trackfig_core::{FileType, PropValue, Region};

    fn context() -> TrackContext {
        TrackContext {
            region: Region::parse("chr2:1000000-2000000").unwrap(),
            plot_width_cm: 20.0,
            dpi: 72.0,
            font_size: 8.0,
            decreasing: false,
        }
    }

    fn draw(track: &XAxisTrack) -> Vec<String> {
        let mut scene = Scene::new(25.0, 2.0, 72.0);
        let rect = Rect::new(0.0, 0.0, 567.0, 56.0);
        let x = XScale::new(1_000_000.0, 2_000_000.0, 0.0, 567.0, false);
        let y = YScale::new(0.0, 1.0, 0.0, 56.0, false);
        track.draw(&mut Axis::new(&mut scene, rect, x, y));
        scene
            .items()
            .iter()
            .filter_map(|item| match item {
                Item::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tick_labels() {
        let mut t = XAxisTrack::new(TrackProperties::with_defaults("x-axis", FileType::XAxis));
        t.load(&context()).unwrap();
        assert_eq!(t.font_pt, 8.0);
        let labels = draw(&t);
        assert!(labels.len() >= 2);
        assert_eq!(labels.first().map(String::as_str), Some("1.0 Mb"));
        assert_eq!(labels.last().map(String::as_str), Some("2.0 Mb"));
    }

    #[test]
    fn test_fontsize_overrides_default() {
        let mut props = TrackProperties::with_defaults("x-axis", FileType::XAxis);
        props.set("fontsize", PropValue::Float(12.0));
        let mut t = XAxisTrack::new(props);
        t.load(&context()).unwrap();
        assert_eq!(t.font_pt, 12.0);
    }
}
