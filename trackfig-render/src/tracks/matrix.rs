//! bedGraph matrix tracks: one value per column per interval, drawn as a
//! heat matrix (one row per column) or as one line per column.

use trackfig_core::io::{BedGraphMatrix, MatrixRow};
use trackfig_core::TrackProperties;

use super::{
    auto_limits, color_prop, colormap_prop, finite_range, in_section, warn_missing_chrom, Decoration, Track,
    TrackContext, YLimits,
};
use crate::axis::Axis;
use crate::color::{Color, Colormap, WHITE};
use crate::error::RenderResult;
use crate::scene::Style;

pub struct MatrixTrack {
    props: TrackProperties,
    matrix: BedGraphMatrix,
    colormap: Colormap,
    color: Color,
    lines: bool,
    rows: Vec<MatrixRow>,
}

impl MatrixTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let matrix = BedGraphMatrix::read_file(&file).map_err(|e| in_section(&props, e))?;
        if props.bool("rasterize") {
            log::debug!("[{}]: rasterize has no effect, cells are written as vector shapes", props.section);
        }
        Ok(Self {
            matrix,
            colormap: colormap_prop(&props, "colormap")?,
            color: color_prop(&props, "color")?,
            lines: props.str("plot_type") == "lines",
            rows: Vec::new(),
            props,
        })
    }

    fn value_range(&self) -> (f64, f64) {
        let data = finite_range(self.rows.iter().flat_map(|r| r.values.iter().copied()));
        auto_limits(data, self.props.opt_f64("min_value"), self.props.opt_f64("max_value"))
    }

    fn columns(&self) -> usize {
        self.matrix.columns.max(1)
    }
}

impl Track for MatrixTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        self.rows.clear();
        if warn_missing_chrom(&self.props, &ctx.region, self.matrix.rows.resolve(&ctx.region.chrom)).is_some() {
            self.rows = self.matrix.query(&ctx.region).into_iter().cloned().collect();
        }
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        if self.lines {
            let (min, max) = self.value_range();
            Some(YLimits::new(min, max, self.props.orientation_inverted().unwrap_or(false)))
        } else {
            Some(YLimits::new(0.0, self.columns() as f64, self.props.orientation_inverted().unwrap_or(true)))
        }
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        if self.lines {
            let style = Style::stroke(self.color, axis.pt(self.props.f64("line_width")));
            let block = self.props.str("pos_score_in_bin") == "block";
            for column in 0..self.columns() {
                let mut points = Vec::new();
                for row in &self.rows {
                    let Some(&v) = row.values.get(column) else { continue };
                    if !v.is_finite() {
                        continue;
                    }
                    if block {
                        points.push((row.start as f64, v));
                        points.push((row.end as f64, v));
                    } else {
                        points.push(((row.start + row.end) as f64 / 2.0, v));
                    }
                }
                axis.polyline(&points, style);
            }
            return;
        }

        let (min, max) = self.value_range();
        for row in &self.rows {
            for (column, &v) in row.values.iter().enumerate() {
                if !v.is_finite() {
                    continue;
                }
                let color = self.colormap.map(v, min, max);
                let y = column as f64;
                axis.rect(row.start as f64, row.end as f64, y, y + 1.0, Style::filled_outline(color, color, 0.2));
            }
        }
        if self.props.bool("plot_horizontal_lines") {
            let separator = Style::stroke(WHITE, axis.pt(0.5));
            for column in 1..self.columns() {
                axis.hline(column as f64, separator);
            }
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        if !self.lines {
            let (min, max) = self.value_range();
            deco.colorbar(&self.colormap, min, max);
        } else if self.props.bool("show_data_range") {
            if let Some(y) = deco.y {
                deco.data_range(y.min, y.max);
            }
        }
    }
}
