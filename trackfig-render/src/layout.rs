//! Figure compositor.
//!
//! Tracks are grouped into panels (a track with `overlay_previous` joins the
//! panel before it), panels are stacked top to bottom in the plot column, and
//! each panel gets a y-axis column and a label column on its right:
//!
//! ```text
//! | margin | plot | y-axis | label | margin |
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use trackfig_core::{load_track_properties, FileType, OverlayMode, Region, TrackProperties, TracksFile};

use crate::axis::{Axis, XScale};
use crate::error::{RenderError, RenderResult};
use crate::raster;
use crate::scene::{Anchor, Baseline, Rect, Scene, TextStyle};
use crate::svg;
use crate::tracks::{build_track, in_section, Decoration, LabelAlign, Track, TrackContext, YLimits};

const MARGIN_FRACTION: f64 = 0.01;
const Y_AXIS_FRACTION: f64 = 0.04;
const MIN_Y_AXIS_CM: f64 = 1.5;

/// Figure-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    pub width_cm: f64,
    /// Total height; panel heights are scaled to fit when set.
    pub height_cm: Option<f64>,
    /// Width of the plot column; overrides `width_cm`.
    pub plot_width_cm: Option<f64>,
    pub dpi: f64,
    /// Label font size in points; derived from the width when unset.
    pub font_size: Option<f64>,
    pub title: Option<String>,
    pub track_label_fraction: f64,
    pub track_label_halign: LabelAlign,
    pub decreasing_x_axis: bool,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width_cm: 40.0,
            height_cm: None,
            plot_width_cm: None,
            dpi: 72.0,
            font_size: None,
            title: None,
            track_label_fraction: 0.05,
            track_label_halign: LabelAlign::Left,
            decreasing_x_axis: false,
        }
    }
}

impl FigureOptions {
    pub fn validate(&self) -> RenderResult<()> {
        if self.dpi.is_nan() || self.dpi <= 0.0 {
            return Err(RenderError::Layout(format!("dpi must be positive, got {}", self.dpi)));
        }
        if !(0.0..1.0).contains(&self.track_label_fraction) {
            return Err(RenderError::Layout(format!(
                "track label fraction must be in [0, 1), got {}",
                self.track_label_fraction
            )));
        }
        if let Some(h) = self.height_cm {
            if h.is_nan() || h <= 0.0 {
                return Err(RenderError::Layout(format!("height must be positive, got {}", h)));
            }
        }
        Ok(())
    }

    /// Font size in points: the configured one, else a quarter of the
    /// figure width in cm kept within 6..=14.
    pub fn label_font_pt(&self, width_cm: f64) -> f64 {
        self.font_size.unwrap_or_else(|| (width_cm * 0.25).clamp(6.0, 14.0))
    }
}

/// Column widths in cm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Columns {
    pub width: f64,
    pub margin: f64,
    pub plot: f64,
    pub y_axis: f64,
    pub label: f64,
}

impl Columns {
    pub fn compute(options: &FigureOptions) -> RenderResult<Self> {
        let f = options.track_label_fraction;
        let edges = 2.0 * MARGIN_FRACTION;
        let width = match options.plot_width_cm {
            Some(plot) => {
                // Solve width = plot + y-axis + label + margins for the
                // y-axis at its fractional width, falling back to the
                // fixed minimum when that is narrower.
                let w = plot / (1.0 - Y_AXIS_FRACTION - f - edges);
                if w * Y_AXIS_FRACTION < MIN_Y_AXIS_CM {
                    (plot + MIN_Y_AXIS_CM) / (1.0 - f - edges)
                } else {
                    w
                }
            }
            None => options.width_cm,
        };
        let margin = width * MARGIN_FRACTION;
        let label = width * f;
        let y_axis = (width * Y_AXIS_FRACTION).max(MIN_Y_AXIS_CM);
        let plot = options.plot_width_cm.unwrap_or(width - 2.0 * margin - label - y_axis);
        if plot.is_nan() || plot <= 0.0 || !width.is_finite() {
            return Err(RenderError::Layout(format!(
                "no room for the plot column in a {:.2} cm wide figure",
                width
            )));
        }
        Ok(Self { width, margin, plot, y_axis, label })
    }
}

/// Tracks sharing one panel; the first index is the head.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Group {
    pub members: Vec<usize>,
}

/// Split track indices into panel groups and the vlines tracks.
pub(crate) fn group_tracks(props: &[&TrackProperties]) -> (Vec<Group>, Vec<usize>) {
    let mut groups: Vec<Group> = Vec::new();
    let mut vlines = Vec::new();
    for (i, p) in props.iter().enumerate() {
        if p.file_type == FileType::Vlines {
            vlines.push(i);
            continue;
        }
        match (p.overlay().is_overlay(), groups.last_mut()) {
            (true, Some(group)) => group.members.push(i),
            (overlay, _) => {
                if overlay {
                    log::warn!("[{}]: the first track cannot be an overlay; drawn in its own panel", p.section);
                }
                groups.push(Group { members: vec![i] });
            }
        }
    }
    (groups, vlines)
}

/// A configured figure: tracks built once, drawn for any number of regions.
pub struct Figure {
    tracks: Vec<Box<dyn Track>>,
    options: FigureOptions,
    columns: Columns,
}

impl Figure {
    pub fn new(properties: Vec<TrackProperties>, options: FigureOptions) -> RenderResult<Self> {
        options.validate()?;
        let columns = Columns::compute(&options)?;
        let tracks = properties.into_iter().map(build_track).collect::<RenderResult<Vec<_>>>()?;
        log::info!(
            "Figure of {} tracks, {:.2} cm wide ({:.2} cm plot)",
            tracks.len(),
            columns.width,
            columns.plot
        );
        Ok(Self { tracks, options, columns })
    }

    pub fn from_tracks_file(path: &Path, options: FigureOptions) -> RenderResult<Self> {
        let tracks = TracksFile::from_path(path)?;
        let properties = load_track_properties(&tracks)?;
        Self::new(properties, options)
    }

    pub fn columns(&self) -> Columns {
        self.columns
    }

    pub fn options(&self) -> &FigureOptions {
        &self.options
    }

    fn context(&self, region: &Region) -> TrackContext {
        TrackContext {
            region: region.clone(),
            plot_width_cm: self.columns.plot,
            dpi: self.options.dpi,
            font_size: self.options.label_font_pt(self.columns.width),
            decreasing: self.options.decreasing_x_axis,
        }
    }

    /// Load every track for `region` and compose the figure.
    pub fn render(&mut self, region: &Region) -> RenderResult<Scene> {
        let ctx = self.context(region);
        for track in self.tracks.iter_mut() {
            track.load(&ctx).map_err(|e| in_section(track.properties(), e))?;
        }

        let props: Vec<&TrackProperties> = self.tracks.iter().map(|t| t.properties()).collect();
        let (groups, vlines) = group_tracks(&props);
        log::info!("Rendering {} with {} panels", region, groups.len());

        let font_pt = ctx.font_size;
        let title = self.options.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let title_pt = font_pt * 1.5;
        let title_cm = if title.is_some() { title_pt * 2.0 / 72.0 * 2.54 } else { 0.0 };

        let mut heights: Vec<f64> = groups
            .iter()
            .map(|g| self.tracks[g.members[0]].height_cm(&ctx).max(0.0))
            .collect();
        let natural: f64 = heights.iter().sum();
        if let Some(total) = self.options.height_cm {
            let available = (total - title_cm).max(0.0);
            if natural > 0.0 {
                let factor = available / natural;
                log::debug!("Scaling panel heights by {:.3} to fit {} cm", factor, total);
                heights.iter_mut().for_each(|h| *h *= factor);
            }
        }
        let height_cm = self.options.height_cm.unwrap_or(title_cm + natural);

        let mut scene = Scene::new(self.columns.width, height_cm, self.options.dpi);
        let cols = self.columns;
        let plot_x = scene.cm_to_px(cols.margin);
        let plot_w = scene.cm_to_px(cols.plot);
        let y_axis_x = plot_x + plot_w;
        let y_axis_w = scene.cm_to_px(cols.y_axis);
        let label_x = y_axis_x + y_axis_w;
        let label_w = scene.cm_to_px(cols.label);
        let font_px = scene.pt(font_pt);
        let x = XScale::new(region.start as f64, region.end as f64, plot_x, plot_x + plot_w, ctx.decreasing);

        if let Some(title) = title {
            let style = TextStyle::new(scene.pt(title_pt)).anchor(Anchor::Middle).baseline(Baseline::Middle);
            scene.text(plot_x + plot_w / 2.0, scene.cm_to_px(title_cm) / 2.0, title, style);
        }

        let mut top = scene.cm_to_px(title_cm);
        let plots_top = top;
        for (group, height) in groups.iter().zip(heights) {
            let panel = Rect::new(plot_x, top, plot_w, scene.cm_to_px(height));
            top = panel.bottom();
            self.draw_group(&mut scene, group, panel, x);
            let y_col = Rect::new(y_axis_x, panel.y, y_axis_w, panel.height);
            let label_col = Rect::new(label_x, panel.y, label_w, panel.height);
            self.draw_decorations(&mut scene, group, panel, y_col, label_col, font_px);
        }

        if !vlines.is_empty() {
            let span = Rect::new(plot_x, plots_top, plot_w, (top - plots_top).max(0.0));
            let y = YLimits::new(0.0, 1.0, false).scale(span);
            scene.begin_clip(span);
            for i in vlines {
                self.tracks[i].draw(&mut Axis::new(&mut scene, span, x, y));
            }
            scene.end_clip();
        }
        Ok(scene)
    }

    /// Y limits per member: `share-y` members use the union with the head,
    /// `yes` members keep their own.
    fn group_limits(&self, group: &Group) -> Vec<YLimits> {
        let default = YLimits::new(0.0, 1.0, false);
        let head = &self.tracks[group.members[0]];
        let mut shared = head.y_limits().unwrap_or(default);
        for &i in &group.members[1..] {
            let track = &self.tracks[i];
            if track.properties().overlay() != OverlayMode::ShareY {
                continue;
            }
            if let Some(limits) = track.y_limits() {
                shared = shared.union(limits);
            }
            if let Some(inverted) = track.properties().orientation_inverted() {
                if inverted != shared.inverted {
                    log::warn!(
                        "[{}]: orientation differs from [{}] which it shares the y axis with; following [{}]",
                        track.properties().section,
                        head.properties().section,
                        head.properties().section
                    );
                }
            }
        }
        group
            .members
            .iter()
            .enumerate()
            .map(|(pos, &i)| {
                let track = &self.tracks[i];
                if pos == 0 || track.properties().overlay() == OverlayMode::ShareY {
                    shared
                } else {
                    track.y_limits().unwrap_or(default)
                }
            })
            .collect()
    }

    fn draw_group(&self, scene: &mut Scene, group: &Group, panel: Rect, x: XScale) {
        for (&i, limits) in group.members.iter().zip(self.group_limits(group)) {
            let track = &self.tracks[i];
            let clip = track.clip();
            if clip {
                scene.begin_clip(panel);
            }
            track.draw(&mut Axis::new(scene, panel, x, limits.scale(panel)));
            if clip {
                scene.end_clip();
            }
        }
    }

    fn draw_decorations(&self, scene: &mut Scene, group: &Group, panel: Rect, y_col: Rect, label_col: Rect, font_px: f64) {
        let align = self.options.track_label_halign;
        let head = &self.tracks[group.members[0]];
        let head_limits = self.group_limits(group)[0];
        let has_y = head.y_limits().is_some();
        let mut deco = Decoration {
            scene: &mut *scene,
            rect: y_col,
            panel,
            y: has_y.then(|| head_limits.scale(panel)),
            font_px: font_px.min(panel.height * 0.8),
            align,
        };
        head.draw_y_axis(&mut deco);

        // The label column is shared between titled members; with none
        // titled, the head gets all of it.
        let titled: Vec<usize> = group
            .members
            .iter()
            .copied()
            .filter(|&i| !self.tracks[i].properties().title().trim().is_empty())
            .collect();
        let labelled = if titled.is_empty() { vec![group.members[0]] } else { titled };
        let slice = panel.height / labelled.len() as f64;
        for (n, &i) in labelled.iter().enumerate() {
            let slot = Rect::new(label_col.x, panel.y + n as f64 * slice, label_col.width, slice);
            let mut deco = Decoration {
                scene: &mut *scene,
                rect: slot,
                panel: slot,
                y: None,
                font_px: font_px.min(slice * 0.8),
                align,
            };
            self.tracks[i].draw_label(&mut deco);
        }
    }

    /// Render `region` and write it to `path`; the format follows the
    /// file extension (`svg` or `png`).
    pub fn plot(&mut self, region: &Region, path: &Path) -> RenderResult<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if ext != "svg" && ext != "png" {
            return Err(RenderError::UnsupportedFormat(ext));
        }

        let mut scene = self.render(region)?;
        let (width_px, height_px) = (scene.width_px().round() as u32, scene.height_px().round() as u32);
        let document = svg::write(&mut scene);
        if ext == "svg" {
            std::fs::write(path, document).map_err(|source| RenderError::Write { path: path.to_path_buf(), source })?;
        } else {
            raster::write_png(&document, width_px, height_px, path)?;
        }
        log::info!("Saved {} ({}x{} px)", path.display(), width_px, height_px);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackfig_core::PropValue;

    #[test]
    fn test_columns_from_width() {
        let cols = Columns::compute(&FigureOptions::default()).unwrap();
        assert_eq!(cols.width, 40.0);
        assert!((cols.margin - 0.4).abs() < 1e-9);
        assert!((cols.label - 2.0).abs() < 1e-9);
        assert!((cols.y_axis - 1.6).abs() < 1e-9);
        assert!((cols.plot - 35.6).abs() < 1e-9);
    }

    #[test]
    fn test_columns_from_plot_width() {
        // Wide figure: the y-axis keeps its 4% share.
        let opts = FigureOptions { plot_width_cm: Some(44.5), ..Default::default() };
        let cols = Columns::compute(&opts).unwrap();
        assert!((cols.width - 50.0).abs() < 1e-9);
        assert!((cols.y_axis - 2.0).abs() < 1e-9);

        // Narrow figure: the y-axis falls back to its minimum width.
        let opts = FigureOptions { plot_width_cm: Some(10.0), ..Default::default() };
        let cols = Columns::compute(&opts).unwrap();
        assert_eq!(cols.y_axis, 1.5);
        let total = cols.plot + cols.y_axis + cols.label + 2.0 * cols.margin;
        assert!((total - cols.width).abs() < 1e-9);
    }

    #[test]
    fn test_columns_without_room() {
        let opts = FigureOptions { width_cm: 1.5, ..Default::default() };
        assert!(matches!(Columns::compute(&opts), Err(RenderError::Layout(_))));
    }

    #[test]
    fn test_default_font_size() {
        let opts = FigureOptions::default();
        assert_eq!(opts.label_font_pt(40.0), 10.0);
        assert_eq!(opts.label_font_pt(10.0), 6.0);
        assert_eq!(opts.label_font_pt(100.0), 14.0);
        let opts = FigureOptions { font_size: Some(9.0), ..Default::default() };
        assert_eq!(opts.label_font_pt(100.0), 9.0);
    }

    #[test]
    fn test_grouping() {
        let mut a = TrackProperties::with_defaults("a", FileType::XAxis);
        a.set("overlay_previous", PropValue::Str("yes".into()));
        let b = TrackProperties::with_defaults("b", FileType::Spacer);
        let mut c = TrackProperties::with_defaults("c", FileType::Hlines);
        c.set("overlay_previous", PropValue::Str("share-y".into()));
        let v = TrackProperties::with_defaults("v", FileType::Vlines);
        let d = TrackProperties::with_defaults("d", FileType::Spacer);

        let (groups, vlines) = group_tracks(&[&a, &b, &c, &v, &d]);
        assert_eq!(
            groups,
            vec![Group { members: vec![0] }, Group { members: vec![1, 2] }, Group { members: vec![4] }]
        );
        assert_eq!(vlines, vec![3]);
    }
}
