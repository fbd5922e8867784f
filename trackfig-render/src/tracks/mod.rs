//! Track handlers.
//!
//! Every track type implements [`Track`]: data is read once per region in
//! `load`, then the compositor asks for y limits and hands the handler an
//! [`Axis`] for the panel and a [`Decoration`] for the y-axis and label
//! columns.

use serde::{Deserialize, Serialize};
use trackfig_core::{FileType, Region, TrackProperties};

use crate::axis::{Axis, YScale};
use crate::color::{Color, Colormap, BLACK};
use crate::error::{RenderError, RenderResult};
use crate::scene::{Anchor, Baseline, Rect, Scene, Style, TextStyle};
use crate::ticks::format_value;

pub mod coverage;
pub mod genes;
pub mod hic;
pub mod links;
pub mod lines;
pub mod maf;
pub mod matrix;
pub mod peaks;
pub mod spacer;
pub mod x_axis;

pub use coverage::CoverageTrack;
pub use genes::GenesTrack;
pub use hic::HicTrack;
pub use links::LinksTrack;
pub use lines::{HLinesTrack, VLinesTrack};
pub use maf::MafTrack;
pub use matrix::MatrixTrack;
pub use peaks::PeaksTrack;
pub use spacer::SpacerTrack;
pub use x_axis::XAxisTrack;

/// Panel height used when neither the track nor its type sets one.
pub const DEFAULT_HEIGHT_CM: f64 = 2.0;

/// What a handler knows about the figure it is drawn into.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackContext {
    pub region: Region,
    pub plot_width_cm: f64,
    pub dpi: f64,
    /// Default font size in points.
    pub font_size: f64,
    /// The region start is drawn on the right.
    pub decreasing: bool,
}

impl TrackContext {
    /// Bases per pixel across the plot column.
    pub fn bp_per_px(&self) -> f64 {
        let width_px = self.plot_width_cm / 2.54 * self.dpi;
        self.region.len() as f64 / width_px.max(1.0)
    }

    pub fn pt_to_px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }
}

/// Y range of a track and its natural orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YLimits {
    pub min: f64,
    pub max: f64,
    /// `min` at the top of the panel.
    pub inverted: bool,
}

impl YLimits {
    pub fn new(min: f64, max: f64, inverted: bool) -> Self {
        Self { min, max, inverted }
    }

    /// Smallest range covering both; the orientation of `self` is kept.
    pub fn union(self, other: YLimits) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max), inverted: self.inverted }
    }

    pub fn scale(&self, panel: Rect) -> YScale {
        YScale::new(self.min, self.max, panel.y, panel.bottom(), self.inverted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAlign {
    #[default]
    Left,
    Right,
    Center,
}

impl LabelAlign {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" | "centre" => Some(Self::Center),
            _ => None,
        }
    }
}

/// Drawing context for the y-axis or label column of one panel.
pub struct Decoration<'a> {
    pub scene: &'a mut Scene,
    /// The column being decorated.
    pub rect: Rect,
    /// The panel the column belongs to.
    pub panel: Rect,
    /// Y scale of the panel, when the group has one.
    pub y: Option<YScale>,
    pub font_px: f64,
    pub align: LabelAlign,
}

impl Decoration<'_> {
    fn pad(&self) -> f64 {
        self.font_px * 0.3
    }

    /// Track title, one text line per `\n`, vertically centered on the panel.
    pub fn label(&mut self, text: &str) {
        let lines: Vec<&str> = text.split('\n').map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            return;
        }
        let (x, anchor) = match self.align {
            LabelAlign::Left => (self.rect.x + self.pad(), Anchor::Start),
            LabelAlign::Right => (self.rect.right() - self.pad(), Anchor::End),
            LabelAlign::Center => (self.rect.x + self.rect.width / 2.0, Anchor::Middle),
        };
        let line_height = self.font_px * 1.2;
        let first = self.panel.center_y() - line_height * (lines.len() as f64 - 1.0) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            let style = TextStyle::new(self.font_px).anchor(anchor);
            self.scene.text(x, first + i as f64 * line_height, *line, style);
        }
    }

    /// `[min - max]` in the top-left corner of the column.
    pub fn data_range(&mut self, min: f64, max: f64) {
        let text = format!("[{} - {}]", format_value(min), format_value(max));
        let style = TextStyle::new(self.font_px * 0.8).baseline(Baseline::Top);
        self.scene.text(self.rect.x + self.pad(), self.panel.y + self.pad() * 0.5, text, style);
    }

    /// Vertical color bar with the low value at the bottom.
    pub fn colorbar(&mut self, cmap: &Colormap, min: f64, max: f64) {
        const STEPS: usize = 32;
        let bar_width = (self.rect.width * 0.15).min(self.font_px).max(2.0);
        let height = self.panel.height * 0.8;
        let top = self.panel.y + self.panel.height * 0.1;
        let x = self.rect.x + self.pad();
        let step = height / STEPS as f64;
        for i in 0..STEPS {
            let t = (i as f64 + 0.5) / STEPS as f64;
            let y = top + height - (i + 1) as f64 * step;
            // Slight overlap hides seams between steps.
            self.scene.rect(Rect::new(x, y, bar_width, step + 0.5), Style::fill(cmap.at(t)));
        }
        self.scene.rect(Rect::new(x, top, bar_width, height), Style::stroke(BLACK, 0.5));

        let size = (self.font_px * 0.7).min(height / 2.0).max(1.0);
        let tx = x + bar_width + self.pad();
        self.scene.text(tx, top, format_value(max), TextStyle::new(size).baseline(Baseline::Top));
        self.scene.text(tx, top + height, format_value(min), TextStyle::new(size).baseline(Baseline::Bottom));
    }
}

/// Per-track-type behavior.
pub trait Track {
    fn properties(&self) -> &TrackProperties;

    fn height_cm(&self, _ctx: &TrackContext) -> f64 {
        self.properties().height().unwrap_or(DEFAULT_HEIGHT_CM)
    }

    /// Read the data for `ctx.region`.
    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()>;

    fn y_limits(&self) -> Option<YLimits> {
        None
    }

    fn draw(&self, axis: &mut Axis<'_>);

    fn draw_y_axis(&self, _deco: &mut Decoration<'_>) {}

    fn draw_label(&self, deco: &mut Decoration<'_>) {
        deco.label(self.properties().title());
    }

    /// Whether drawing is clipped to the panel.
    fn clip(&self) -> bool {
        true
    }
}

/// Registry: the handler for the track's file type.
pub fn build_track(props: TrackProperties) -> RenderResult<Box<dyn Track>> {
    log::debug!("[{}]: building {} track", props.section, props.file_type);
    Ok(match props.file_type {
        FileType::Bigwig | FileType::Bedgraph => Box::new(CoverageTrack::new(props)?),
        FileType::BedgraphMatrix => Box::new(MatrixTrack::new(props)?),
        FileType::Bed | FileType::Gtf => Box::new(GenesTrack::new(props)?),
        FileType::NarrowPeak => Box::new(PeaksTrack::new(props)?),
        FileType::Links => Box::new(LinksTrack::new(props)?),
        FileType::HicMatrix => Box::new(HicTrack::new(props)?),
        FileType::Maf => Box::new(MafTrack::new(props)?),
        FileType::XAxis => Box::new(XAxisTrack::new(props)),
        FileType::Spacer => Box::new(SpacerTrack::new(props)),
        FileType::Vlines => Box::new(VLinesTrack::new(props)?),
        FileType::Hlines => Box::new(HLinesTrack::new(props)?),
    })
}

/// Attach the section name to an error raised while handling a track.
pub(crate) fn in_section(props: &TrackProperties, err: impl Into<RenderError>) -> RenderError {
    match err.into() {
        e @ RenderError::Track { .. } => e,
        e => RenderError::track(&props.section, e.to_string()),
    }
}

pub(crate) fn color_prop(props: &TrackProperties, key: &str) -> RenderResult<Color> {
    Color::parse(props.str(key)).map_err(|e| in_section(props, e))
}

pub(crate) fn opt_color_prop(props: &TrackProperties, key: &str) -> RenderResult<Option<Color>> {
    match props.opt_str(key) {
        Some(text) if !text.trim().is_empty() => Color::parse(text).map(Some).map_err(|e| in_section(props, e)),
        _ => Ok(None),
    }
}

pub(crate) fn colormap_prop(props: &TrackProperties, key: &str) -> RenderResult<Colormap> {
    Colormap::parse(props.str(key)).map_err(|e| in_section(props, e))
}

/// Fill color of a feature: one color, the file's own RGB column, or a
/// colormap over the feature score.
#[derive(Debug, Clone)]
pub enum ColorSpec {
    Solid(Color),
    BedRgb(Color),
    Colormap(Colormap),
}

impl ColorSpec {
    pub fn from_props(props: &TrackProperties, key: &str, fallback: Color) -> RenderResult<Self> {
        let text = props.str(key).trim();
        if text.eq_ignore_ascii_case("bed_rgb") {
            return Ok(ColorSpec::BedRgb(fallback));
        }
        match Color::parse(text) {
            Ok(color) => Ok(ColorSpec::Solid(color)),
            Err(_) => Colormap::parse(text)
                .map(ColorSpec::Colormap)
                .map_err(|_| in_section(props, RenderError::Color(text.to_string()))),
        }
    }

    pub fn color(&self, rgb: Option<(u8, u8, u8)>, score: f64, min: f64, max: f64) -> Color {
        match self {
            ColorSpec::Solid(c) => *c,
            ColorSpec::BedRgb(fallback) => rgb.map(|(r, g, b)| Color::rgb(r, g, b)).unwrap_or(*fallback),
            ColorSpec::Colormap(cmap) => cmap.map(score, min, max),
        }
    }

    pub fn colormap(&self) -> Option<&Colormap> {
        match self {
            ColorSpec::Colormap(cmap) => Some(cmap),
            _ => None,
        }
    }
}

/// Value transform applied before limits and colors are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    None,
    Log,
    Log1p,
    NegLog,
    Log2,
    Log10,
}

impl Transform {
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "log" => Transform::Log,
            "log1p" => Transform::Log1p,
            "-log" => Transform::NegLog,
            "log2" => Transform::Log2,
            "log10" => Transform::Log10,
            _ => Transform::None,
        }
    }

    /// Values outside the log domain become NaN.
    pub fn apply(&self, v: f64, pseudocount: f64) -> f64 {
        let shifted = v + pseudocount;
        let logged = |f: fn(f64) -> f64| if shifted > 0.0 { f(shifted) } else { f64::NAN };
        match self {
            Transform::None => v,
            Transform::Log => logged(f64::ln),
            Transform::Log1p => {
                if v > -1.0 {
                    v.ln_1p()
                } else {
                    f64::NAN
                }
            }
            Transform::NegLog => -logged(f64::ln),
            Transform::Log2 => logged(f64::log2),
            Transform::Log10 => logged(f64::log10),
        }
    }
}

/// Minimum and maximum of the finite values, if any.
pub fn finite_range<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Configured limits where set, else `min(0, data min)` to the data max.
/// Always returns a non-empty range.
pub fn auto_limits(data: Option<(f64, f64)>, min_value: Option<f64>, max_value: Option<f64>) -> (f64, f64) {
    let (lo, hi) = data.unwrap_or((0.0, 1.0));
    let min = min_value.unwrap_or(lo.min(0.0));
    let mut max = max_value.unwrap_or(hi);
    if max <= min {
        max = min + 1.0;
        // `min + 1.0` rounds back to `min` once |min| passes 2^53.
        if max <= min {
            max = min + min.abs() * 1e-6;
        }
        if max <= min {
            max = next_up(min);
        }
    }
    (min, max)
}

/// Smallest float greater than `v` (finite `v`).
fn next_up(v: f64) -> f64 {
    if v == 0.0 {
        return f64::from_bits(1);
    }
    let bits = v.to_bits();
    if v > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Warn once when a track file has no data for the region's chromosome.
pub(crate) fn warn_missing_chrom(props: &TrackProperties, region: &Region, resolved: Option<String>) -> Option<String> {
    if resolved.is_none() {
        log::warn!(
            "[{}]: chromosome '{}' not found in {}, the track is drawn empty",
            props.section,
            region.chrom,
            props.file().map(|f| f.display().to_string()).unwrap_or_default()
        );
    }
    resolved
}
