//! narrowPeak tracks: peak shapes scaled by signal, or boxes with a summit mark.

use trackfig_core::io::{NarrowPeak, NarrowPeakReader};
use trackfig_core::{IntervalIndex, TrackProperties};

use super::{color_prop, in_section, warn_missing_chrom, Decoration, Track, TrackContext, YLimits};
use crate::axis::Axis;
use crate::color::{Color, BLACK};
use crate::error::RenderResult;
use crate::scene::{Anchor, Baseline, Style, TextStyle};

const SHAPE_POINTS: usize = 24;

pub struct PeaksTrack {
    props: TrackProperties,
    index: IntervalIndex<NarrowPeak>,
    color: Color,
    boxes: bool,
    peaks: Vec<NarrowPeak>,
}

impl PeaksTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let index = NarrowPeakReader::read_index(&file).map_err(|e| in_section(&props, e))?;
        Ok(Self {
            index,
            color: color_prop(&props, "color")?,
            boxes: props.str("type") == "box",
            peaks: Vec::new(),
            props,
        })
    }

    fn max_signal(&self) -> f64 {
        self.props.opt_f64("max_value").unwrap_or_else(|| {
            let max = self.peaks.iter().map(|p| p.signal).filter(|v| v.is_finite()).fold(0.0, f64::max);
            if max > 0.0 {
                max
            } else {
                1.0
            }
        })
    }

    fn apex(&self, peak: &NarrowPeak) -> f64 {
        if self.props.bool("use_summit") {
            peak.summit_position() as f64
        } else {
            (peak.start + peak.end) as f64 / 2.0
        }
    }

    /// Bell-shaped outline from `start` to `end` peaking at the summit.
    /// `width_adjust` widens the bell relative to the peak width.
    fn outline(&self, peak: &NarrowPeak) -> Vec<(f64, f64)> {
        let (start, end) = (peak.start as f64, peak.end as f64);
        let apex = self.apex(peak);
        let height = peak.signal.max(0.0);
        let sigma_scale = self.props.f64("width_adjust").max(0.1) / 4.0;
        let mut points = Vec::with_capacity(SHAPE_POINTS + 2);
        points.push((start, 0.0));
        for i in 0..=SHAPE_POINTS {
            let x = start + (end - start) * i as f64 / SHAPE_POINTS as f64;
            let side = if x < apex { apex - start } else { end - apex };
            let sigma = (side * sigma_scale).max(1e-9);
            let y = height * (-0.5 * ((x - apex) / sigma).powi(2)).exp();
            points.push((x, y));
        }
        points.push((end, 0.0));
        points
    }
}

impl Track for PeaksTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        self.peaks.clear();
        if warn_missing_chrom(&self.props, &ctx.region, self.index.resolve(&ctx.region.chrom)).is_some() {
            self.peaks = self.index.query(&ctx.region).into_iter().cloned().collect();
        }
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        let inverted = self.props.orientation_inverted().unwrap_or(false);
        if self.boxes {
            Some(YLimits::new(0.0, 1.0, inverted))
        } else {
            Some(YLimits::new(0.0, self.max_signal(), inverted))
        }
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let line_width = axis.pt(self.props.f64("line_width"));
        let font = axis.pt(self.props.f64("fontsize"));
        for peak in &self.peaks {
            let label_y;
            if self.boxes {
                axis.rect(peak.start as f64, peak.end as f64, 0.2, 0.6, Style::fill(self.color));
                let apex = self.apex(peak);
                axis.line(apex, 0.15, apex, 0.65, Style::stroke(BLACK, line_width));
                label_y = 0.65;
            } else {
                let fill = Style::fill(self.color);
                axis.polygon(&self.outline(peak), fill);
                label_y = peak.signal.max(0.0);
            }
            if self.props.bool("show_labels") && !peak.name.is_empty() && peak.name != "." {
                let style = TextStyle::new(font).anchor(Anchor::Middle).baseline(Baseline::Bottom);
                axis.text(self.apex(peak), label_y, &peak.name, style);
            }
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        if !self.boxes && self.props.bool("show_data_range") {
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

    fn track(extra: &[(&str, PropValue)]) -> (NamedTempFile, PeaksTrack) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t100\t300\tp1\t0\t.\t5.0\t3.0\t2.0\t50").unwrap();
        writeln!(file, "chr1\t500\t700\tp2\t0\t.\t12.5\t3.0\t2.0\t-1").unwrap();
        let mut props = TrackProperties::with_defaults("peaks", FileType::NarrowPeak);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        for (k, v) in extra {
            props.set(k, v.clone());
        }
        let t = PeaksTrack::new(props).unwrap();
        (file, t)
    }

    fn context() -> TrackContext {
        TrackContext {
            region: Region::parse("chr1:0-1000").unwrap(),
            plot_width_cm: 10.0,
            dpi: 72.0,
            font_size: 10.0,
            decreasing: false,
        }
    }

    #[test]
    fn test_peak_limits_follow_signal() {
        let (_file, mut t) = track(&[]);
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 12.5, false)));

        let (_file, mut t) = track(&[("max_value", PropValue::Float(20.0))]);
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 20.0, false)));
    }

    #[test]
    fn test_outline_peaks_at_summit() {
        let (_file, mut t) = track(&[]);
        t.load(&context()).unwrap();
        let outline = t.outline(&t.peaks[0]);
        let (x, y) = outline.iter().copied().fold((0.0, f64::MIN), |best, p| if p.1 > best.1 { p } else { best });
        assert!((x - 150.0).abs() <= 200.0 / SHAPE_POINTS as f64);
        assert!(y <= 5.0 && y > 4.0);
        assert_eq!(outline.first(), Some(&(100.0, 0.0)));
        assert_eq!(outline.last(), Some(&(300.0, 0.0)));
    }

    #[test]
    fn test_box_type_has_unit_range() {
        let (_file, mut t) = track(&[("type", PropValue::Str("box".into()))]);
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 1.0, false)));
    }
}
