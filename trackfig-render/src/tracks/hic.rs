//! Hi-C contact matrices drawn as the upper triangle rotated 45 degrees.
//!
//! A contact between bins `i` and `j` lands at `x = (i + j) / 2` and
//! `y = j - i`, so the y axis is the interaction distance in bases.

use trackfig_core::io::{Contact, ContactMatrix, HicReader};
use trackfig_core::{GenomicPos, TrackProperties};

use super::{colormap_prop, finite_range, in_section, warn_missing_chrom, Decoration, Track, TrackContext, Transform, YLimits};
use crate::axis::Axis;
use crate::color::{Color, Colormap};
use crate::error::RenderResult;
use crate::scene::Style;

const MASKED: Color = Color::rgb(0xd3, 0xd3, 0xd3);

pub struct HicTrack {
    props: TrackProperties,
    matrix: ContactMatrix,
    colormap: Colormap,
    transform: Transform,
    depth: GenomicPos,
    contacts: Vec<Contact>,
    range: (f64, f64),
    drawn_depth: GenomicPos,
}

impl HicTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let matrix = HicReader::read_file(&file).map_err(|e| in_section(&props, e))?;
        log::info!("[{}]: {} contacts at {} bp resolution", props.section, matrix.len(), matrix.bin_size);
        Ok(Self {
            matrix,
            colormap: colormap_prop(&props, "colormap")?,
            transform: Transform::parse(props.str("transform")),
            depth: props.i64("depth").max(1) as GenomicPos,
            contacts: Vec::new(),
            range: (0.0, 1.0),
            drawn_depth: 1,
            props,
        })
    }

    /// Depth actually drawn: the configured depth capped at the region length.
    pub fn effective_depth(&self, region_len: GenomicPos) -> GenomicPos {
        self.depth.min(region_len.max(1))
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    fn value(&self, contact: &Contact) -> f64 {
        self.transform.apply(contact.value * self.props.f64("scale_factor"), 0.0)
    }

    fn cell(contact: &Contact) -> [(f64, f64); 4] {
        let corner = |i: GenomicPos, j: GenomicPos| ((i + j) as f64 / 2.0, (j as f64 - i as f64).max(0.0));
        [
            corner(contact.start1, contact.start2),
            corner(contact.start1, contact.end2),
            corner(contact.end1, contact.end2),
            corner(contact.end1, contact.start2),
        ]
    }
}

impl Track for HicTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    /// With no configured height the triangle keeps its aspect ratio:
    /// half the drawn depth over the region length, times the plot width.
    fn height_cm(&self, ctx: &TrackContext) -> f64 {
        if let Some(height) = self.props.height() {
            return height;
        }
        let len = ctx.region.len().max(1) as f64;
        let depth = self.effective_depth(ctx.region.len()) as f64;
        (depth / 2.0) / len * ctx.plot_width_cm
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        let region = &ctx.region;
        self.contacts.clear();
        let chroms = self.matrix.chromosomes();
        let resolved = trackfig_core::chrom::resolve_chrom(&region.chrom, |c| chroms.iter().any(|name| *name == c));
        if warn_missing_chrom(&self.props, region, resolved).is_none() {
            return Ok(());
        }
        let depth = self.effective_depth(region.len());
        self.drawn_depth = depth;
        self.contacts = self.matrix.query(region, depth).into_iter().copied().collect();

        let data = finite_range(self.contacts.iter().map(|c| self.value(c)));
        let (lo, hi) = data.unwrap_or((0.0, 1.0));
        let min = self.props.opt_f64("min_value").unwrap_or(lo);
        let mut max = self.props.opt_f64("max_value").unwrap_or(hi);
        if max <= min {
            max = min + 1.0;
        }
        self.range = (min, max);
        log::debug!("[{}]: {} contacts within {} bp of the diagonal", self.props.section, self.contacts.len(), depth);
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        let depth = self.drawn_depth.max(1) as f64;
        Some(YLimits::new(0.0, depth, self.props.orientation_inverted().unwrap_or(false)))
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let show_masked = self.props.bool("show_masked_bins");
        let (min, max) = self.range;
        for contact in &self.contacts {
            let value = self.value(contact);
            let color = if value.is_finite() {
                self.colormap.map(value, min, max)
            } else if show_masked {
                MASKED
            } else {
                continue;
            };
            let style = Style::filled_outline(color, color, 0.2);
            axis.polygon(&Self::cell(contact), style);
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        deco.colorbar(&self.colormap, self.range.0, self.range.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackfig_core::{FileType, PropValue, Region};

    fn matrix() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for (i, j, v) in [(0, 0, 10.0), (0, 1000, 4.0), (1000, 1000, 8.0), (0, 5000, 1.0), (1000, 2000, 2.0)] {
            writeln!(file, "chr1\t{}\t{}\tchr1\t{}\t{}\t{}", i, i + 1000, j, j + 1000, v).unwrap();
        }
        file
    }

    fn track(file: &NamedTempFile, extra: &[(&str, PropValue)]) -> HicTrack {
        let mut props = TrackProperties::with_defaults("hic", FileType::HicMatrix);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        for (k, v) in extra {
            props.set(k, v.clone());
        }
        HicTrack::new(props).unwrap()
    }

    fn context(region: &str) -> TrackContext {
        TrackContext {
            region: Region::parse(region).unwrap(),
            plot_width_cm: 20.0,
            dpi: 72.0,
            font_size: 10.0,
            decreasing: false,
        }
    }

    #[test]
    fn test_height_from_depth() {
        let file = matrix();
        let t = track(&file, &[("depth", PropValue::Int(2000))]);
        // depth 2000 over 10 kb: (2000 / 2) / 10000 * 20 cm
        assert!((t.height_cm(&context("chr1:0-10000")) - 2.0).abs() < 1e-9);
        // depth capped at the region length
        assert!((t.height_cm(&context("chr1:0-1000")) - 10.0).abs() < 1e-9);

        let t = track(&file, &[("height", PropValue::Float(3.0))]);
        assert_eq!(t.height_cm(&context("chr1:0-10000")), 3.0);
    }

    #[test]
    fn test_depth_limits_contacts() {
        let file = matrix();
        let mut t = track(&file, &[("depth", PropValue::Int(1000))]);
        t.load(&context("chr1:0-10000")).unwrap();
        assert_eq!(t.contacts().len(), 4);
        assert!(t.contacts().iter().all(|c| c.distance() <= 1000));
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 1000.0, false)));
    }

    #[test]
    fn test_transform_range() {
        let file = matrix();
        let mut t = track(&file, &[("transform", PropValue::Str("log1p".into()))]);
        t.load(&context("chr1:0-10000")).unwrap();
        assert_eq!(t.range.0, 1f64.ln_1p());
        assert_eq!(t.range.1, 10f64.ln_1p());
    }

    #[test]
    fn test_diagonal_cell_is_a_triangle() {
        let contact = Contact { start1: 0, end1: 10, start2: 0, end2: 10, value: 1.0 };
        assert_eq!(HicTrack::cell(&contact), [(0.0, 0.0), (5.0, 10.0), (10.0, 0.0), (5.0, 0.0)]);
    }
}
