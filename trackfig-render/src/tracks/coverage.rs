//! bigWig and bedGraph signal tracks.

use trackfig_core::io::bigwig::summarize;
use trackfig_core::io::{BedGraphInterval, BedGraphReader, BigWigSource, SummaryMethod};
use trackfig_core::{FileType, IntervalIndex, TrackProperties};

use super::{
    auto_limits, color_prop, colormap_prop, finite_range, in_section, opt_color_prop, warn_missing_chrom, Decoration,
    Track, TrackContext, Transform, YLimits,
};
use crate::axis::Axis;
use crate::color::{Color, Colormap};
use crate::error::RenderResult;
use crate::scene::{Dash, Style};
use crate::ticks::ticks;

enum Source {
    BigWig(BigWigSource),
    BedGraph(IntervalIndex<BedGraphInterval>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotType {
    Fill,
    Line,
    Points,
    Heatmap,
}

impl PlotType {
    fn parse(text: &str) -> Self {
        match text {
            "line" => PlotType::Line,
            "points" => PlotType::Points,
            "heatmap" => PlotType::Heatmap,
            _ => PlotType::Fill,
        }
    }
}

/// One value over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub start: f64,
    pub end: f64,
    pub value: f64,
}

pub struct CoverageTrack {
    props: TrackProperties,
    source: Source,
    plot_type: PlotType,
    color: Color,
    negative_color: Option<Color>,
    colormap: Option<Colormap>,
    transform: Transform,
    samples: Vec<Sample>,
}

impl CoverageTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let source = match props.file_type {
            FileType::Bigwig => Source::BigWig(BigWigSource::open(&file).map_err(|e| in_section(&props, e))?),
            _ => Source::BedGraph(BedGraphReader::read_index(&file).map_err(|e| in_section(&props, e))?),
        };
        let plot_type = PlotType::parse(props.str("plot_type"));
        let colormap = match plot_type {
            PlotType::Heatmap => Some(colormap_prop(&props, "colormap")?),
            _ => None,
        };
        Ok(Self {
            source,
            plot_type,
            color: color_prop(&props, "color")?,
            negative_color: opt_color_prop(&props, "negative_color")?,
            colormap,
            transform: Transform::parse(props.str("transform")),
            samples: Vec::new(),
            props,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    fn limits(&self) -> (f64, f64) {
        let data = finite_range(self.samples.iter().map(|s| s.value));
        auto_limits(data, self.props.opt_f64("min_value"), self.props.opt_f64("max_value"))
    }

    /// Contiguous runs of finite values.
    fn runs(&self) -> Vec<&[Sample]> {
        self.samples
            .split(|s| !s.value.is_finite())
            .filter(|run| !run.is_empty())
            .collect()
    }

    /// Points outlining `run`: steps over each sample, or one point per
    /// sample center with `use_middle`.
    fn outline(&self, run: &[Sample], value: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
        if self.props.bool("use_middle") {
            run.iter().map(|s| ((s.start + s.end) / 2.0, value(s.value))).collect()
        } else {
            run.iter()
                .flat_map(|s| [(s.start, value(s.value)), (s.end, value(s.value))])
                .collect()
        }
    }

    fn fill(&self, axis: &mut Axis<'_>, run: &[Sample], value: impl Fn(f64) -> f64, color: Color, base: f64) {
        let mut points = self.outline(run, value);
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            points.push((last.0, base));
            points.insert(0, (first.0, base));
        }
        let style = Style::fill(color).with_opacity(self.props.f64("alpha"));
        axis.polygon(&points, style);
    }
}

impl Track for CoverageTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        let region = &ctx.region;
        let bins = self.props.i64("number_of_bins").max(1) as usize;
        let method = self.props.opt_str("summary_method").and_then(SummaryMethod::parse);

        let mut samples = match &self.source {
            Source::BigWig(bw) => {
                if warn_missing_chrom(&self.props, region, bw.resolve(&region.chrom)).is_none() {
                    Vec::new()
                } else {
                    let values = bw
                        .summarize(region, bins, method.unwrap_or(SummaryMethod::Mean))
                        .map_err(|e| in_section(&self.props, e))?;
                    binned(region.start as f64, region.end as f64, values)
                }
            }
            Source::BedGraph(index) => {
                if warn_missing_chrom(&self.props, region, index.resolve(&region.chrom)).is_none() {
                    Vec::new()
                } else {
                    let hits = index.query(region);
                    match method {
                        Some(method) => {
                            let values = summarize(hits.iter().map(|i| (i.start, i.end, i.value)), region, bins, method);
                            binned(region.start as f64, region.end as f64, values)
                        }
                        None => hits
                            .iter()
                            .map(|i| Sample { start: i.start as f64, end: i.end as f64, value: i.value })
                            .collect(),
                    }
                }
            }
        };

        let pseudocount = self.props.f64("log_pseudocount");
        let nans_to_zeros = self.props.bool("nans_to_zeros");
        for sample in &mut samples {
            if nans_to_zeros && sample.value.is_nan() {
                sample.value = 0.0;
            }
            sample.value = self.transform.apply(sample.value, pseudocount);
        }
        log::debug!("[{}]: {} values for {}", self.props.section, samples.len(), region);
        self.samples = samples;
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        let (min, max) = self.limits();
        Some(YLimits::new(min, max, self.props.orientation_inverted().unwrap_or(false)))
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let (y_min, y_max) = (axis.y.min, axis.y.max);
        let base = 0f64.clamp(y_min.min(y_max), y_max.max(y_min));

        if self.props.bool("grid") && self.plot_type != PlotType::Heatmap {
            let grid = Style::stroke(Color::rgb(0xd3, 0xd3, 0xd3), axis.pt(0.5)).with_dash(Dash::Dotted);
            for y in ticks(y_min, y_max, 3).0 {
                axis.hline(y, grid);
            }
        }

        match self.plot_type {
            PlotType::Fill => {
                for run in self.runs() {
                    match self.negative_color {
                        Some(negative) => {
                            self.fill(axis, run, |v| v.max(0.0), self.color, base);
                            self.fill(axis, run, |v| v.min(0.0), negative, base);
                        }
                        None => self.fill(axis, run, |v| v, self.color, base),
                    }
                }
            }
            PlotType::Line => {
                let style = Style::stroke(self.color, axis.pt(self.props.f64("line_width")))
                    .with_opacity(self.props.f64("alpha"));
                for run in self.runs() {
                    axis.polyline(&self.outline(run, |v| v), style);
                }
            }
            PlotType::Points => {
                let radius = axis.pt(self.props.f64("point_size")) / 2.0;
                let alpha = self.props.f64("alpha");
                for s in self.samples.iter().filter(|s| s.value.is_finite()) {
                    let color = match self.negative_color {
                        Some(negative) if s.value < 0.0 => negative,
                        _ => self.color,
                    };
                    axis.circle((s.start + s.end) / 2.0, s.value, radius, Style::fill(color).with_opacity(alpha));
                }
            }
            PlotType::Heatmap => {
                let Some(cmap) = &self.colormap else { return };
                let (min, max) = self.limits();
                let (top, bottom) = (axis.y.min, axis.y.max);
                for s in self.samples.iter().filter(|s| s.value.is_finite()) {
                    axis.rect(s.start, s.end, top, bottom, Style::fill(cmap.map(s.value, min, max)));
                }
            }
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        if let (PlotType::Heatmap, Some(cmap)) = (self.plot_type, &self.colormap) {
            let (min, max) = self.limits();
            deco.colorbar(cmap, min, max);
        } else if self.props.bool("show_data_range") {
            if let Some(y) = deco.y {
                deco.data_range(y.min, y.max);
            }
        }
    }
}

/// Equal-width bins over `[start, end)`.
fn binned(start: f64, end: f64, values: Vec<f64>) -> Vec<Sample> {
    let width = (end - start) / values.len().max(1) as f64;
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| Sample { start: start + i as f64 * width, end: start + (i + 1) as f64 * width, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackfig_core::{PropValue, Region};

    fn bedgraph() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t0\t100\t2").unwrap();
        writeln!(file, "chr1\t100\t200\tNaN").unwrap();
        writeln!(file, "chr1\t200\t300\t-4").unwrap();
        writeln!(file, "chr1\t300\t400\t8").unwrap();
        file
    }

    fn context(region: &str) -> TrackContext {
        TrackContext { region: Region::parse(region).unwrap(), plot_width_cm: 10.0, dpi: 72.0, font_size: 10.0, decreasing: false }
    }

    fn track(file: &NamedTempFile) -> TrackProperties {
        let mut props = TrackProperties::with_defaults("signal", FileType::Bedgraph);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        props
    }

    #[test]
    fn test_raw_intervals_and_limits() {
        let file = bedgraph();
        let mut t = CoverageTrack::new(track(&file)).unwrap();
        t.load(&context("1:0-400")).unwrap();
        assert_eq!(t.samples().len(), 4);
        assert_eq!(t.y_limits(), Some(YLimits::new(-4.0, 8.0, false)));
    }

    #[test]
    fn test_summary_and_nans_to_zeros() {
        let file = bedgraph();
        let mut props = track(&file);
        props.set("summary_method", PropValue::Str("max".into()));
        props.set("number_of_bins", PropValue::Int(2));
        props.set("nans_to_zeros", PropValue::Bool(true));
        let mut t = CoverageTrack::new(props).unwrap();
        t.load(&context("chr1:0-400")).unwrap();
        let values: Vec<f64> = t.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 8.0]);
        assert_eq!(t.samples()[1].start, 200.0);
    }

    #[test]
    fn test_configured_limits_and_transform() {
        let file = bedgraph();
        let mut props = track(&file);
        props.set("transform", PropValue::Str("log2".into()));
        props.set("max_value", PropValue::Float(10.0));
        props.set("orientation", PropValue::Str("inverted".into()));
        let mut t = CoverageTrack::new(props).unwrap();
        t.load(&context("chr1:0-400")).unwrap();
        assert_eq!(t.samples()[0].value, 1.0);
        assert!(t.samples()[2].value.is_nan());
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 10.0, true)));
    }

    #[test]
    fn test_unknown_chromosome_is_empty() {
        let file = bedgraph();
        let mut t = CoverageTrack::new(track(&file)).unwrap();
        t.load(&context("chr2:0-400")).unwrap();
        assert!(t.samples().is_empty());
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 1.0, false)));
    }
}
