//! Links between two genomic intervals, drawn as arcs, triangles, or as
//! loop/square marks in the rotated contact-matrix frame.

use trackfig_core::io::{Link, LinksReader};
use trackfig_core::{IntervalIndex, TrackProperties};

use super::{finite_range, in_section, warn_missing_chrom, ColorSpec, Decoration, Track, TrackContext, YLimits};
use crate::axis::Axis;
use crate::color::BLACK;
use crate::error::RenderResult;
use crate::scene::{Dash, PathCmd, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinksType {
    Arcs,
    Triangles,
    Loops,
    Squares,
}

pub struct LinksTrack {
    props: TrackProperties,
    index: IntervalIndex<Link>,
    links_type: LinksType,
    color: ColorSpec,
    links: Vec<Link>,
    score_range: (f64, f64),
}

impl LinksTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let index = LinksReader::read_index(&file).map_err(|e| in_section(&props, e))?;
        let links_type = match props.str("links_type") {
            "triangles" => LinksType::Triangles,
            "loops" => LinksType::Loops,
            "squares" => LinksType::Squares,
            _ => LinksType::Arcs,
        };
        Ok(Self {
            index,
            links_type,
            color: ColorSpec::from_props(&props, "color", BLACK)?,
            links: Vec::new(),
            score_range: (0.0, 1.0),
            props,
        })
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The two x positions an arc or triangle connects.
    fn endpoints(&self, link: &Link) -> (f64, f64) {
        if self.props.bool("use_middle") {
            ((link.start1 + link.end1) as f64 / 2.0, (link.start2 + link.end2) as f64 / 2.0)
        } else {
            (link.start1 as f64, link.end2 as f64)
        }
    }

    /// Height of an arc or triangle for `link`.
    fn height(&self, link: &Link) -> f64 {
        let (x0, x1) = self.endpoints(link);
        let distance = (x1 - x0).abs();
        match self.props.str("compact_arcs_level") {
            "1" => distance.sqrt(),
            "2" => 1000.0,
            _ => distance,
        }
    }

    fn style(&self, axis: &Axis<'_>, link: &Link, filled: bool) -> Style {
        let (min, max) = self.score_range;
        let color = self.color.color(None, link.score, min, max);
        let alpha = self.props.f64("alpha");
        let mut style = if filled {
            Style::filled_outline(color, color, axis.pt(self.props.f64("line_width")))
        } else {
            Style::stroke(color, axis.pt(self.props.f64("line_width")))
        };
        style.dash = Dash::parse(self.props.str("line_style"));
        style.with_opacity(alpha)
    }

    /// Outline of the anchors' contact cell, rotated 45 degrees: a point
    /// `(i, j)` lands at `x = (i + j) / 2`, `y = j - i`.
    fn diamond(link: &Link) -> [(f64, f64); 4] {
        let corner = |i: u64, j: u64| ((i + j) as f64 / 2.0, (j as f64 - i as f64).max(0.0));
        [
            corner(link.start1, link.start2),
            corner(link.start1, link.end2),
            corner(link.end1, link.end2),
            corner(link.end1, link.start2),
        ]
    }
}

impl Track for LinksTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        let region = &ctx.region;
        self.links.clear();
        if warn_missing_chrom(&self.props, region, self.index.resolve(&region.chrom)).is_none() {
            return Ok(());
        }
        let region_only = self.props.bool("region_only");
        self.links = self
            .index
            .query(region)
            .into_iter()
            .filter(|l| !region_only || (l.start1 >= region.start && l.end2 <= region.end))
            .cloned()
            .collect();

        let scores = finite_range(self.links.iter().map(|l| l.score)).unwrap_or((0.0, 1.0));
        self.score_range = (
            self.props.opt_f64("min_value").unwrap_or(scores.0),
            self.props.opt_f64("max_value").unwrap_or(scores.1),
        );
        log::debug!("[{}]: {} links in {}", self.props.section, self.links.len(), region);
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        let max = match self.links_type {
            LinksType::Arcs | LinksType::Triangles => self.links.iter().map(|l| self.height(l)).fold(0.0, f64::max),
            LinksType::Loops | LinksType::Squares => {
                self.links.iter().map(|l| (l.end2 as f64 - l.start1 as f64).max(0.0)).fold(0.0, f64::max)
            }
        };
        let max = self.props.opt_f64("ylim").unwrap_or(if max > 0.0 { max } else { 1.0 });
        Some(YLimits::new(0.0, max, self.props.orientation_inverted().unwrap_or(false)))
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        for link in &self.links {
            match self.links_type {
                LinksType::Arcs => {
                    let (x0, x1) = self.endpoints(link);
                    let h = self.height(link);
                    let (p0, p1) = (axis.px(x0), axis.px(x1));
                    let (left, right) = if p0 <= p1 { (x0, x1) } else { (x1, x0) };
                    let rx = (p1 - p0).abs() / 2.0;
                    let ry = (axis.py(h) - axis.py(0.0)).abs();
                    // Drawn left to right on screen; clockwise bulges upward.
                    let sweep = axis.py(h) < axis.py(0.0);
                    let path = [
                        PathCmd::MoveTo(left, 0.0),
                        PathCmd::ArcTo { rx, ry, large: false, sweep, x: right, y: 0.0 },
                    ];
                    let style = self.style(axis, link, false);
                    axis.path(&path, style);
                }
                LinksType::Triangles => {
                    let (x0, x1) = self.endpoints(link);
                    let style = self.style(axis, link, false);
                    axis.polyline(&[(x0, 0.0), ((x0 + x1) / 2.0, self.height(link)), (x1, 0.0)], style);
                }
                LinksType::Loops => {
                    let style = self.style(axis, link, false);
                    let d = Self::diamond(link);
                    axis.polygon(&d, style);
                }
                LinksType::Squares => {
                    let style = self.style(axis, link, true);
                    axis.polygon(&Self::diamond(link), style);
                }
            }
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        if let Some(cmap) = self.color.colormap() {
            deco.colorbar(cmap, self.score_range.0, self.score_range.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackfig_core::{FileType, PropValue, Region};

    fn track(extra: &[(&str, PropValue)]) -> (NamedTempFile, LinksTrack) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t100\t200\tchr1\t900\t1000\t5").unwrap();
        writeln!(file, "chr1\t300\t400\tchr1\t5000\t5100\t1").unwrap();
        writeln!(file, "chr1\t300\t400\tchr2\t500\t600\t1").unwrap();
        let mut props = TrackProperties::with_defaults("links", FileType::Links);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        for (k, v) in extra {
            props.set(k, v.clone());
        }
        let t = LinksTrack::new(props).unwrap();
        (file, t)
    }

    fn context() -> TrackContext {
        TrackContext {
            region: Region::parse("chr1:0-2000").unwrap(),
            plot_width_cm: 10.0,
            dpi: 72.0,
            font_size: 10.0,
            decreasing: false,
        }
    }

    #[test]
    fn test_region_only_drops_outside_anchors() {
        let (_file, mut t) = track(&[]);
        t.load(&context()).unwrap();
        assert_eq!(t.links().len(), 2);

        let (_file, mut t) = track(&[("region_only", PropValue::Bool(true))]);
        t.load(&context()).unwrap();
        assert_eq!(t.links().len(), 1);
        assert_eq!(t.links()[0].end2, 1000);
    }

    #[test]
    fn test_arc_heights() {
        let (_file, mut t) = track(&[("region_only", PropValue::Bool(true))]);
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 900.0, false)));

        let (_file, mut t) = track(&[("region_only", PropValue::Bool(true)), ("use_middle", PropValue::Bool(true))]);
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 800.0, false)));

        let (_file, mut t) = track(&[("ylim", PropValue::Float(50.0))]);
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits().map(|l| l.max), Some(50.0));
    }

    #[test]
    fn test_diamond_corners() {
        let link = Link { chrom: "chr1".into(), start1: 0, end1: 10, start2: 100, end2: 110, score: 0.0 };
        assert_eq!(LinksTrack::diamond(&link), [(50.0, 100.0), (55.0, 110.0), (60.0, 100.0), (55.0, 90.0)]);
    }
}
