//! Reference lines: vertical lines at BED positions across the whole
//! figure, and horizontal lines at fixed y values within a panel.

use trackfig_core::io::{BedReader, BedRecord};
use trackfig_core::{IntervalIndex, TrackProperties};

use super::{color_prop, in_section, warn_missing_chrom, Decoration, Track, TrackContext, YLimits};
use crate::axis::Axis;
use crate::color::Color;
use crate::error::{RenderError, RenderResult};
use crate::scene::{Dash, Style};

fn line_style(props: &TrackProperties, color: Color, axis: &Axis<'_>) -> Style {
    Style::stroke(color, axis.pt(props.f64("line_width")))
        .with_dash(Dash::parse(props.str("line_style")))
        .with_opacity(props.f64("alpha"))
}

/// Vertical lines spanning every panel. The compositor draws these last,
/// over an axis covering the full stack of tracks.
pub struct VLinesTrack {
    props: TrackProperties,
    index: IntervalIndex<BedRecord>,
    color: Color,
    positions: Vec<f64>,
}

impl VLinesTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let index = BedReader::read_index(&file).map_err(|e| in_section(&props, e))?;
        Ok(Self { index, color: color_prop(&props, "color")?, positions: Vec::new(), props })
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }
}

impl Track for VLinesTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn height_cm(&self, _ctx: &TrackContext) -> f64 {
        0.0
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        let region = &ctx.region;
        self.positions.clear();
        if warn_missing_chrom(&self.props, region, self.index.resolve(&region.chrom)).is_none() {
            return Ok(());
        }
        let use_end = self.props.bool("use_end");
        let (lo, hi) = (region.start as f64, region.end as f64);
        for record in self.index.query(region) {
            self.positions.push(record.start as f64);
            if use_end {
                self.positions.push(record.end as f64);
            }
        }
        self.positions.retain(|p| *p >= lo && *p <= hi);
        self.positions.sort_by(f64::total_cmp);
        self.positions.dedup();
        Ok(())
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let style = line_style(&self.props, self.color, axis);
        for &x in &self.positions {
            axis.vline(x, style);
        }
    }

    fn draw_label(&self, _deco: &mut Decoration<'_>) {}
}

/// Horizontal lines at the configured `y_values`.
pub struct HLinesTrack {
    props: TrackProperties,
    values: Vec<f64>,
    color: Color,
}

impl HLinesTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let values = Self::parse_values(props.str("y_values")).map_err(|message| RenderError::track(&props.section, message))?;
        Ok(Self { values, color: color_prop(&props, "color")?, props })
    }

    fn parse_values(text: &str) -> Result<Vec<f64>, String> {
        let values = text
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| match v.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(format!("y_values: '{}' is not a finite number", v)),
            })
            .collect::<Result<Vec<f64>, String>>()?;
        if values.is_empty() {
            return Err("y_values is empty".to_string());
        }
        Ok(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Track for HLinesTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, _ctx: &TrackContext) -> RenderResult<()> {
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        let lo = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.props.opt_f64("min_value").unwrap_or(lo.min(0.0));
        let mut max = self.props.opt_f64("max_value").unwrap_or(hi);
        if max <= min {
            max = min + 1.0;
        }
        Some(YLimits::new(min, max, self.props.orientation_inverted().unwrap_or(false)))
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let style = line_style(&self.props, self.color, axis);
        for &y in &self.values {
            axis.hline(y, style);
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        if self.props.bool("show_data_range") {
            if let Some(y) = deco.y {
                deco.data_range(y.min, y.max);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackfig_core::{FileType, PropValue, Region};

    fn context() -> TrackContext {
        TrackContext {
            region: Region::parse("chr1:0-1000").unwrap(),
            plot_width_cm: 10.0,
            dpi: 72.0,
            font_size: 10.0,
            decreasing: false,
        }
    }

    fn vlines(use_end: bool) -> (NamedTempFile, VLinesTrack) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t100\t200").unwrap();
        writeln!(file, "chr1\t200\t300").unwrap();
        writeln!(file, "chr1\t900\t1500").unwrap();
        let mut props = TrackProperties::with_defaults("vlines", FileType::Vlines);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        props.set("use_end", PropValue::Bool(use_end));
        let t = VLinesTrack::new(props).unwrap();
        (file, t)
    }

    #[test]
    fn test_vlines_positions() {
        let (_file, mut t) = vlines(false);
        t.load(&context()).unwrap();
        assert_eq!(t.positions(), [100.0, 200.0, 900.0]);

        let (_file, mut t) = vlines(true);
        t.load(&context()).unwrap();
        assert_eq!(t.positions(), [100.0, 200.0, 300.0, 900.0]);
        assert_eq!(t.height_cm(&context()), 0.0);
    }

    fn hlines(values: &str) -> RenderResult<HLinesTrack> {
        let mut props = TrackProperties::with_defaults("thresholds", FileType::Hlines);
        props.set("y_values", PropValue::Str(values.into()));
        HLinesTrack::new(props)
    }

    #[test]
    fn test_hlines_limits() {
        let t = hlines("2, 5,10").unwrap();
        assert_eq!(t.values(), [2.0, 5.0, 10.0]);
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 10.0, false)));
    }

    #[test]
    fn test_hlines_bad_value_names_section() {
        let err = hlines("1,abc").err().unwrap();
        let message = err.to_string();
        assert!(message.contains("thresholds"));
        assert!(message.contains("abc"));
        assert!(hlines("1,inf").is_err());
    }
}
