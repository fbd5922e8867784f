//! Multiple-alignment tracks: one row per species, each base colored by
//! whether it matches the reference, differs from it, or is a gap.

use trackfig_core::io::{MafBlock, MafIndex};
use trackfig_core::{GenomicPos, Region, Strand, TrackProperties};

use super::{color_prop, in_section, warn_missing_chrom, Decoration, Track, TrackContext, YLimits};
use crate::axis::Axis;
use crate::color::Color;
use crate::error::RenderResult;
use crate::scene::{Anchor, Scene, Style, TextStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    Identical,
    Mismatch,
    Gap,
}

/// A run of aligned bases of one kind on one species row.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRun {
    pub row: usize,
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub kind: BaseKind,
    pub bases: String,
}

pub struct MafTrack {
    props: TrackProperties,
    index: MafIndex,
    species: Vec<String>,
    labels: Vec<String>,
    identical: Color,
    mismatch: Color,
    gap: Color,
    runs: Vec<BaseRun>,
}

/// Watson-Crick complement, keeping case; other symbols pass through.
fn complement(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        'a' => 't',
        't' => 'a',
        'c' => 'g',
        'g' => 'c',
        other => other,
    }
}

fn comma_list(text: Option<&str>) -> Vec<String> {
    text.map(|t| t.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

impl MafTrack {
    pub fn new(props: TrackProperties) -> RenderResult<Self> {
        let file = props.require_file()?;
        let reference = props.str("reference").to_string();
        let index = MafIndex::read_file(&file, &reference).map_err(|e| in_section(&props, e))?;

        // Configured order first, then the rest in order of appearance; the
        // reference always leads.
        let mut species = vec![reference.clone()];
        for name in comma_list(props.opt_str("species_order")).into_iter().chain(index.species().iter().cloned()) {
            if !species.contains(&name) {
                species.push(name);
            }
        }
        let mut labels = comma_list(props.opt_str("species_labels"));
        if labels.len() != species.len() {
            if !labels.is_empty() {
                log::warn!(
                    "[{}]: {} species_labels for {} species; using species names",
                    props.section,
                    labels.len(),
                    species.len()
                );
            }
            labels = species.clone();
        }

        Ok(Self {
            index,
            species,
            labels,
            identical: color_prop(&props, "color_identical")?,
            mismatch: color_prop(&props, "color_mismatch")?,
            gap: color_prop(&props, "color_gap")?,
            runs: Vec::new(),
            props,
        })
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn runs(&self) -> &[BaseRun] {
        &self.runs
    }

    /// Walk the alignment columns of `block`, keeping columns where the
    /// reference has a base, and emit runs per species row. Blocks on the
    /// reference's reverse strand are complemented so letters read on the
    /// forward strand.
    fn block_runs(&self, block: &MafBlock, region: &Region, out: &mut Vec<BaseRun>) {
        let Some(reference) = block.sequence_for(&self.index.reference) else {
            return;
        };
        let (ref_start, _) = reference.forward_range();
        let ref_bases: Vec<char> = reference.text.chars().collect();
        let reverse = reference.strand == Strand::Reverse;
        let ref_len = ref_bases.iter().filter(|c| **c != '-').count() as GenomicPos;

        for (row, species) in self.species.iter().enumerate() {
            let Some(seq) = block.sequence_for(species) else { continue };
            let bases: Vec<char> = seq.text.chars().collect();
            let mut offset: GenomicPos = 0;
            let mut current: Option<BaseRun> = None;

            for (col, &r) in ref_bases.iter().enumerate() {
                if r == '-' {
                    continue;
                }
                let pos = if reverse { ref_start + ref_len - 1 - offset } else { ref_start + offset };
                offset += 1;
                if pos < region.start || pos >= region.end {
                    continue;
                }
                let b = bases.get(col).copied().unwrap_or('-');
                let kind = if b == '-' || b == '.' {
                    BaseKind::Gap
                } else if b.eq_ignore_ascii_case(&r) {
                    BaseKind::Identical
                } else {
                    BaseKind::Mismatch
                };
                let b = if reverse { complement(b) } else { b };

                match current.as_mut() {
                    Some(run) if run.kind == kind && (run.end == pos || run.start == pos + 1) => {
                        if run.end == pos {
                            run.end = pos + 1;
                            run.bases.push(b);
                        } else {
                            run.start = pos;
                            run.bases.insert(0, b);
                        }
                    }
                    _ => {
                        if let Some(done) = current.take() {
                            out.push(done);
                        }
                        current = Some(BaseRun { row, start: pos, end: pos + 1, kind, bases: b.to_string() });
                    }
                }
            }
            out.extend(current);
        }
    }

    fn color(&self, kind: BaseKind) -> Color {
        match kind {
            BaseKind::Identical => self.identical,
            BaseKind::Mismatch => self.mismatch,
            BaseKind::Gap => self.gap,
        }
    }
}

impl Track for MafTrack {
    fn properties(&self) -> &TrackProperties {
        &self.props
    }

    fn load(&mut self, ctx: &TrackContext) -> RenderResult<()> {
        let region = &ctx.region;
        self.runs.clear();
        if warn_missing_chrom(&self.props, region, self.index.resolve(&region.chrom)).is_none() {
            return Ok(());
        }
        let mut runs = Vec::new();
        for block in self.index.query(region) {
            self.block_runs(block, region, &mut runs);
        }
        self.runs = runs;
        Ok(())
    }

    fn y_limits(&self) -> Option<YLimits> {
        Some(YLimits::new(0.0, self.species.len().max(1) as f64, self.props.orientation_inverted().unwrap_or(true)))
    }

    fn draw(&self, axis: &mut Axis<'_>) {
        let row_px = (axis.py(1.0) - axis.py(0.0)).abs();
        let base_px = axis.x.length_px(1.0);
        let font = (row_px * 0.7).min(base_px / 0.6);
        // Letters once a base is wide enough to read.
        let letters = font >= 6.0;

        for run in &self.runs {
            let y0 = run.row as f64 + 0.1;
            let y1 = run.row as f64 + 0.9;
            let color = self.color(run.kind);
            if letters && run.kind != BaseKind::Gap {
                for (i, base) in run.bases.chars().enumerate() {
                    let x = run.start as f64 + i as f64 + 0.5;
                    let style = TextStyle::new(font).anchor(Anchor::Middle).color(color);
                    axis.text(x, run.row as f64 + 0.5, &base.to_string(), style);
                }
            } else {
                axis.rect(run.start as f64, run.end as f64, y0, y1, Style::fill(color));
            }
        }
    }

    fn draw_y_axis(&self, deco: &mut Decoration<'_>) {
        let Some(y) = deco.y else { return };
        let row_px = (y.to_px(1.0) - y.to_px(0.0)).abs();
        let font = deco.font_px.min(row_px * 0.8);
        let x = deco.rect.right() - font * 0.3;
        for (row, label) in self.labels.iter().enumerate() {
            let cy = y.to_px(row as f64 + 0.5);
            let width = Scene::text_width(label, font);
            if width > deco.rect.width {
                log::debug!("[{}]: species label '{}' wider than the y-axis column", self.props.section, label);
            }
            deco.scene.text(x, cy, label.as_str(), TextStyle::new(font).anchor(Anchor::End));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackfig_core::{FileType, PropValue};

    const MAF: &str = "##maf version=1\n\
a score=10\n\
s hg38.chr1 100 6 + 1000 ACG-TAC\n\
s mm10.chr2 500 5 + 2000 ACCAT-C\n\
s rn6.chr3  50  6 + 900  ACGGTAC\n\
\n";

    const MAF_REVERSE: &str = "##maf version=1\n\
a score=3\n\
s hg38.chr1 994 4 - 1000 ACGG\n\
s mm10.chr2 10  4 + 2000 ACTG\n\
\n";

    fn track(extra: &[(&str, PropValue)]) -> (NamedTempFile, MafTrack) {
        track_from(MAF, extra)
    }

    fn track_from(maf: &str, extra: &[(&str, PropValue)]) -> (NamedTempFile, MafTrack) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(maf.as_bytes()).unwrap();
        let mut props = TrackProperties::with_defaults("maf", FileType::Maf);
        props.set("file", PropValue::Str(file.path().display().to_string()));
        props.set("reference", PropValue::Str("hg38".into()));
        for (k, v) in extra {
            props.set(k, v.clone());
        }
        let t = MafTrack::new(props).unwrap();
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
    fn test_species_order() {
        let (_file, t) = track(&[("species_order", PropValue::Str("rn6".into()))]);
        assert_eq!(t.species(), ["hg38", "rn6", "mm10"]);
        assert_eq!(t.y_limits(), Some(YLimits::new(0.0, 3.0, true)));
    }

    #[test]
    fn test_runs_classify_bases() {
        let (_file, mut t) = track(&[]);
        t.load(&context()).unwrap();
        let mouse: Vec<(GenomicPos, GenomicPos, BaseKind)> =
            t.runs().iter().filter(|r| r.row == 1).map(|r| (r.start, r.end, r.kind)).collect();
        // The column where the reference has a gap is dropped.
        assert_eq!(
            mouse,
            vec![
                (100, 102, BaseKind::Identical),
                (102, 103, BaseKind::Mismatch),
                (103, 104, BaseKind::Identical),
                (104, 105, BaseKind::Gap),
                (105, 106, BaseKind::Identical),
            ]
        );
        let human: Vec<_> = t.runs().iter().filter(|r| r.row == 0).collect();
        assert_eq!(human.len(), 1);
        assert_eq!((human[0].start, human[0].end), (100, 106));
    }

    #[test]
    fn test_reverse_strand_block_reads_forward() {
        let (_file, mut t) = track_from(MAF_REVERSE, &[]);
        t.load(&context()).unwrap();
        let human: Vec<_> = t.runs().iter().filter(|r| r.row == 0).collect();
        assert_eq!(human.len(), 1);
        assert_eq!((human[0].start, human[0].end), (2, 6));
        assert_eq!(human[0].bases, "CCGT");

        let mouse: Vec<(GenomicPos, GenomicPos, BaseKind, &str)> = t
            .runs()
            .iter()
            .filter(|r| r.row == 1)
            .map(|r| (r.start, r.end, r.kind, r.bases.as_str()))
            .collect();
        assert_eq!(
            mouse,
            vec![
                (4, 6, BaseKind::Identical, "GT"),
                (3, 4, BaseKind::Mismatch, "A"),
                (2, 3, BaseKind::Identical, "C"),
            ]
        );
    }
}
