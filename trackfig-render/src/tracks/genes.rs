//! Gene and feature tracks from BED and GTF files.
//!
//! Features are packed into rows so that neither bodies nor labels
//! overlap. Rows grow downward: row `r` spans `[r, r + 1]` on the y axis.

use trackfig_core::io::gtf::GtfOptions;
use trackfig_core::io::{BedReader, BedRecord, GtfReader};
use trackfig_core::{FileType, IntervalIndex, Strand, TrackProperties};

use super::{
    color_prop, finite_range, in_section, opt_color_prop, warn_missing_chrom, ColorSpec, Decoration, Track,
    TrackContext, YLimits,
};
use crate::axis::Axis;
use crate::color::Color;
use crate::error::RenderResult;
use crate::scene::{Anchor, Scene, Style, TextStyle};

const DEFAULT_COLOR: Color = Color::rgb(0x1f, 0x78, 0xb4);
/// Half the height of a feature body, in row units.
const BODY_HALF: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeneStyle {
    Flybase,
    Ucsc,
    TssArrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Display {
    Stacked,
    Collapsed,
    Interleaved,
    Triangles,
}

#[derive(Debug, Clone)]
struct Placed {
    record: BedRecord,
    row: usize,
}

pub struct GenesTrack {
    props: TrackProperties,
    index: IntervalIndex<BedRecord>,
    style: GeneStyle,
    display: Display,
    color: ColorSpec,
    border: Color,
    utr_color: Color,
    backbone: Option<Color>,
    features: Vec<Placed>,
    rows: usize,
    show_labels: bool,
    font_px: f64,
    score_range: (f64, f64),
}

impl GenesTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let index = match props.file_type {
            FileType::Gtf => {
                let options = GtfOptions {
                    prefered_name: props.str("prefered_name").to_string(),
                    merge_transcripts: props.bool("merge_transcripts"),
                };
                GtfReader::read_index(&file, &options)
            }
            _ => BedReader::read_index(&file),
        }
        .map_err(|e| in_section(&props, e))?;

        let style = match props.str("style") {
            "UCSC" => GeneStyle::Ucsc,
            "tssarrow" => GeneStyle::TssArrow,
            _ => GeneStyle::Flybase,
        };
        let display = match props.str("display") {
            "collapsed" => Display::Collapsed,
            "interleaved" => Display::Interleaved,
            "triangles" => Display::Triangles,
            _ => Display::Stacked,
        };
        log::debug!("[{}]: {} features indexed", props.section, index.len());

        Ok(Self {
            index,
            style,
            display,
            color: ColorSpec::from_props(&props, "color", DEFAULT_COLOR)?,
            border: color_prop(&props, "border_color")?,
            utr_color: color_prop(&props, "color_utr")?,
            backbone: opt_color_prop(&props, "color_backbone")?,
            features: Vec::new(),
            rows: 1,
            show_labels: false,
            font_px: 0.0,
            score_range: (0.0, 1.0),
            props,
        })
    }

    /// Number of rows the current region needs.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// `(name, row)` of every placed feature, in start order.
    pub fn placements(&self) -> Vec<(&str, usize)> {
        self.features.iter().map(|p| (p.record.name.as_str(), p.row)).collect()
    }

    /// Assign rows to `records` (sorted by start). `extent` gives the
    /// occupied interval including the label. Features that do not fit in
    /// `max_rows` get `None`.
    fn pack<F>(&self, records: &[BedRecord], extent: F, max_rows: Option<usize>) -> (Vec<Option<usize>>, usize)
    where
        F: Fn(&BedRecord) -> (f64, f64),
    {
        let mut row_ends: Vec<f64> = Vec::new();
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| extent(&records[a]).0.total_cmp(&extent(&records[b]).0));
        let mut assigned = vec![None; records.len()];

        for (n, i) in order.into_iter().enumerate() {
            let (start, end) = extent(&records[i]);
            let row = match self.display {
                Display::Collapsed | Display::Triangles => Some(0),
                Display::Interleaved => Some(n % 2),
                Display::Stacked => match row_ends.iter().position(|&e| e < start) {
                    Some(r) => Some(r),
                    None if max_rows.map_or(true, |m| row_ends.len() < m) => {
                        row_ends.push(f64::NEG_INFINITY);
                        Some(row_ends.len() - 1)
                    }
                    None => None,
                },
            };
            if let (Display::Stacked, Some(r)) = (self.display, row) {
                row_ends[r] = end;
            }
            assigned[i] = row;
        }
        let used = assigned.iter().flatten().max().map_or(1, |r| r + 1);
        (assigned, used)
    }

    fn feature_color(&self, record: &BedRecord) -> Color {
        let (min, max) = self.score_range;
        self.color.color(record.rgb, record.score, min, max)
    }

    fn draw_feature(&self, axis: &mut Axis<'_>, record: &BedRecord, row: usize) {
        let mid = row as f64 + 0.5;
        let color = self.feature_color(record);
        let line_width = axis.pt(self.props.f64("line_width"));
        let outline = Style::filled_outline(color, self.border, line_width);
        let utr = Style::filled_outline(self.utr_color, self.border, line_width);
        let utr_half = BODY_HALF * self.props.f64("height_utr");

        // Arrow length: the body height, in bases.
        let body_px = (axis.py(mid + BODY_HALF) - axis.py(mid - BODY_HALF)).abs();
        let arrow_bp = body_px * axis.x.bp_per_px();

        let backbone = Style::stroke(self.backbone.unwrap_or(self.border), line_width);
        if record.blocks.len() > 1 || self.style == GeneStyle::Ucsc {
            axis.line(record.start as f64, mid, record.end as f64, mid, backbone);
        }

        let mut blocks: Vec<(f64, f64)> = record.blocks.iter().map(|&(s, e)| (s as f64, e as f64)).collect();
        let arrow_end = self.style == GeneStyle::Flybase && record.strand != Strand::Unknown;
        let included = self.props.bool("arrowhead_included");

        // With the arrowhead inside the feature, the terminal block is shortened.
        if arrow_end && included {
            let shorten = |(s, e): (f64, f64), forward: bool| {
                let len = arrow_bp.min(e - s);
                if forward {
                    (s, e - len)
                } else {
                    (s + len, e)
                }
            };
            match record.strand {
                Strand::Forward => {
                    if let Some(last) = blocks.last_mut() {
                        *last = shorten(*last, true);
                    }
                }
                _ => {
                    if let Some(first) = blocks.first_mut() {
                        *first = shorten(*first, false);
                    }
                }
            }
        }

        let (thick_start, thick_end) = (record.thick_start as f64, record.thick_end as f64);
        for &(s, e) in &blocks {
            if e <= s {
                continue;
            }
            let cs = s.max(thick_start);
            let ce = e.min(thick_end);
            if ce > cs {
                if cs > s {
                    axis.rect(s, cs, mid - utr_half, mid + utr_half, utr);
                }
                axis.rect(cs, ce, mid - BODY_HALF, mid + BODY_HALF, outline);
                if e > ce {
                    axis.rect(ce, e, mid - utr_half, mid + utr_half, utr);
                }
            } else {
                axis.rect(s, e, mid - utr_half, mid + utr_half, utr);
            }
        }

        match self.style {
            GeneStyle::Flybase if arrow_end => {
                let (base, dir) = match record.strand {
                    Strand::Forward => (blocks.last().map_or(record.end as f64, |b| b.1), 1.0),
                    _ => (blocks.first().map_or(record.start as f64, |b| b.0), -1.0),
                };
                let tip = base + dir * arrow_bp;
                let head = [(base, mid - BODY_HALF), (tip, mid), (base, mid + BODY_HALF)];
                axis.polygon(&head, outline);
            }
            GeneStyle::Ucsc if record.strand != Strand::Unknown => {
                self.draw_chevrons(axis, record, mid, body_px, backbone);
            }
            GeneStyle::TssArrow if record.strand != Strand::Unknown => {
                let (tss, dir) = match record.strand {
                    Strand::Forward => (record.start as f64, 1.0),
                    _ => (record.end as f64, -1.0),
                };
                let top = mid - BODY_HALF - 0.2;
                let reach = tss + dir * arrow_bp * 2.0;
                let stroke = Style::stroke(color, line_width);
                axis.polyline(&[(tss, mid - BODY_HALF), (tss, top), (reach, top)], stroke);
                let head = [(reach, top - 0.08), (reach + dir * arrow_bp * 0.6, top), (reach, top + 0.08)];
                axis.polygon(&head, Style::fill(color));
            }
            _ => {}
        }
    }

    /// Strand chevrons along the introns, every `arrow_interval` body heights.
    fn draw_chevrons(&self, axis: &mut Axis<'_>, record: &BedRecord, mid: f64, body_px: f64, style: Style) {
        let bp_per_px = axis.x.bp_per_px();
        let spacing = (self.props.f64("arrow_interval").max(0.5) * body_px * bp_per_px).max(1.0);
        let size = body_px * 0.3 * bp_per_px;
        let dir = if record.strand == Strand::Forward { 1.0 } else { -1.0 };
        let half = BODY_HALF * 0.6;

        let mut x = record.start as f64 + spacing / 2.0;
        while x < record.end as f64 {
            let in_block = record.blocks.iter().any(|&(s, e)| x >= s as f64 - size && x <= e as f64 + size);
            if !in_block {
                let back = x - dir * size;
                axis.polyline(&[(back, mid - half), (x, mid), (back, mid + half)], style);
            }
            x += spacing;
        }
    }

    fn draw_triangle(&self, axis: &mut Axis<'_>, record: &BedRecord) {
        let (s, e) = (record.start as f64, record.end as f64);
        let style = Style::filled_outline(self.feature_color(record), self.border, axis.pt(self.props.f64("line_width")));
        axis.polygon(&[(s, 0.0), ((s + e) / 2.0, e - s), (e, 0.0)], style);
    }

    fn draw_name(&self, axis: &mut Axis<'_>, record: &BedRecord, row: usize) {
        if record.name.is_empty() || record.name == "." {
            return;
        }
        let font = self.font_px.min((axis.py(1.0) - axis.py(0.0)).abs() * 0.8);
        let y = axis.py(row as f64 + 0.5);
        let (a, b) = (axis.px(record.start as f64), axis.px(record.end as f64));
        let (left, right) = (a.min(b), a.max(b));
        let gap = font * 0.3;
        let width = Scene::text_width(&record.name, font);

        let overflows = right + gap + width > axis.rect.right();
        let (x, anchor) = if overflows && self.props.bool("all_labels_inside") {
            (left - gap, Anchor::End)
        } else {
            (right + gap, Anchor::Start)
        };
        axis.scene.text(x, y, record.name.as_str(), TextStyle::new(font).anchor(anchor));
    }
}

impl Track for GenesTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        let region = &ctx.region;
        self.features.clear();
        self.rows = 1;
        let Some(chrom) = warn_missing_chrom(&self.props, region, self.index.resolve(&region.chrom)) else {
            return Ok(());
        };

        let records: Vec<BedRecord> = self.index.query(region).into_iter().cloned().collect();
        let max_labels = self.props.i64("max_labels").max(0) as usize;
        self.show_labels = self.props.bool("labels")
            && matches!(self.display, Display::Stacked | Display::Interleaved)
            && records.len() <= max_labels;
        if self.props.bool("labels") && records.len() > max_labels {
            log::info!(
                "[{}]: {} features in {}, more than max_labels ({}); labels are hidden",
                self.props.section,
                records.len(),
                region,
                max_labels
            );
        }

        self.font_px = ctx.pt_to_px(self.props.f64("fontsize"));
        let bp_per_px = ctx.bp_per_px();
        let show_labels = self.show_labels;
        let font_px = self.font_px;
        let decreasing = ctx.decreasing;
        let extent = |r: &BedRecord| {
            let label_bp = if show_labels && r.name != "." {
                (Scene::text_width(&r.name, font_px) + font_px) * bp_per_px
            } else {
                2.0 * bp_per_px
            };
            if decreasing {
                (r.start as f64 - label_bp, r.end as f64)
            } else {
                (r.start as f64, r.end as f64 + label_bp)
            }
        };

        let max_rows = self.props.opt_i64("gene_rows").map(|r| r.max(1) as usize);
        let (rows, mut used) = self.pack(&records, extent, max_rows);

        if self.props.bool("global_max_row") {
            let all: Vec<BedRecord> = self.index.iter().filter(|r| r.chrom == chrom).cloned().collect();
            let (_, global) = self.pack(&all, extent, max_rows);
            used = used.max(global);
        }

        let skipped = rows.iter().filter(|r| r.is_none()).count();
        if skipped > 0 {
            log::info!("[{}]: {} features do not fit in gene_rows and are not drawn", self.props.section, skipped);
        }

        let scores = finite_range(records.iter().map(|r| r.score)).unwrap_or((0.0, 1.0));
        self.score_range = (
            self.props.opt_f64("min_value").unwrap_or(scores.0),
            self.props.opt_f64("max_value").unwrap_or(scores.1),
        );
        self.features = records
            .into_iter()
            .zip(rows)
            .filter_map(|(record, row)| row.map(|row| Placed { record, row }))
            .collect();
        self.rows = used;
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        match self.display {
            Display::Triangles => {
                let max = self.features.iter().map(|p| p.record.len() as f64).fold(1.0, f64::max);
                Some(YLimits::new(0.0, max, self.props.orientation_inverted().unwrap_or(false)))
            }
            _ => Some(YLimits::new(0.0, self.rows as f64, self.props.orientation_inverted().unwrap_or(true))),
        }
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        for placed in &self.features {
            match self.display {
                Display::Triangles => self.draw_triangle(axis, &placed.record),
                _ => {
                    self.draw_feature(axis, &placed.record, placed.row);
                    if self.show_labels {
                        self.draw_name(axis, &placed.record, placed.row);
                    }
                }
            }
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        if let Some(cmap) = self.color.colormap() {
            deco.colorbar(cmap, self.score_range.0, self.score_range.1);
        }
    }

    fn clip(&self) -> bool {
        !self.props.bool("labels_in_margin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackfig_core::{PropValue, Region};

    fn bed(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    fn props(file: &NamedTempFile, extra: &[(&str, PropValue)]) -> TrackProperties {
        let mut props = TrackProperties::with_defaults("genes", FileType::Bed);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        for (k, v) in extra {
            props.set(k, v.clone());
        }
        props
    }

    fn context() -> TrackContext {
        TrackContext {
            region: Region::parse("chr1:0-10000").unwrap(),
            plot_width_cm: 25.4,
            dpi: 100.0,
            font_size: 10.0,
            decreasing: false,
        }
    }

    const GENES: [&str; 3] = [
        "chr1\t100\t2000\tgeneA\t0\t+",
        "chr1\t1500\t3000\tgeneB\t0\t-",
        "chr1\t6000\t7000\tgeneC\t0\t+",
    ];

    #[test]
    fn test_stacked_rows_avoid_overlap() {
        let file = bed(&GENES);
        let mut t = GenesTrack::new(props(&file, &[])).unwrap();
        t.load(&context()).unwrap();
        assert_eq!(t.placements(), vec![("geneA", 0), ("geneB", 1), ("geneC", 0)]);
        assert_eq!(t.rows(), 2);
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 2.0, true)));
    }

    #[test]
    fn test_gene_rows_drops_extra_features() {
        let file = bed(&GENES);
        let mut t = GenesTrack::new(props(&file, &[("gene_rows", PropValue::Int(1))])).unwrap();
        t.load(&context()).unwrap();
        assert_eq!(t.placements(), vec![("geneA", 0), ("geneC", 0)]);
        assert_eq!(t.rows(), 1);
    }

    #[test]
    fn test_collapsed_and_interleaved() {
        let file = bed(&GENES);
        let mut t = GenesTrack::new(props(&file, &[("display", PropValue::Str("collapsed".into()))])).unwrap();
        t.load(&context()).unwrap();
        assert!(t.placements().iter().all(|(_, row)| *row == 0));

        let mut t = GenesTrack::new(props(&file, &[("display", PropValue::Str("interleaved".into()))])).unwrap();
        t.load(&context()).unwrap();
        assert_eq!(t.placements(), vec![("geneA", 0), ("geneB", 1), ("geneC", 0)]);
    }

    #[test]
    fn test_triangles_limits() {
        let file = bed(&GENES);
        let mut t = GenesTrack::new(props(&file, &[("display", PropValue::Str("triangles".into()))])).unwrap();
        t.load(&context()).unwrap();
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 1900.0, false)));
    }

    #[test]
    fn test_global_max_row_counts_whole_chromosome() {
        let file = bed(&["chr1\t100\t200\ta\t0\t+", "chr1\t50000\t60000\tb\t0\t+", "chr1\t50100\t60000\tc\t0\t+"]);
        let mut t = GenesTrack::new(props(&file, &[("global_max_row", PropValue::Bool(true))])).unwrap();
        t.load(&context()).unwrap();
        assert_eq!(t.placements().len(), 1);
        assert_eq!(t.rows(), 2);
    }
}
