//! BED3 … BED12 reader.
//!
//! The number of columns is taken from the first data line; later lines
//! with fewer columns are an error, extra columns are ignored.

use std::path::Path;

use super::{parse_field, split_fields, DataLines, FormatError};
use crate::index::IntervalIndex;
use crate::region::{GenomicPos, Strand};

#[derive(Debug, Clone, PartialEq)]
pub struct BedRecord {
    pub chrom: String,
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub name: String,
    pub score: f64,
    pub strand: Strand,
    pub thick_start: GenomicPos,
    pub thick_end: GenomicPos,
    /// `itemRgb` as parsed from column 9, when present and not "0".
    pub rgb: Option<(u8, u8, u8)>,
    /// Absolute `(start, end)` of every block, sorted.
    pub blocks: Vec<(GenomicPos, GenomicPos)>,
}

impl BedRecord {
    pub fn new(chrom: impl Into<String>, start: GenomicPos, end: GenomicPos) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            name: ".".to_string(),
            score: 0.0,
            strand: Strand::Unknown,
            thick_start: start,
            thick_end: end,
            rgb: None,
            blocks: vec![(start, end)],
        }
    }

    pub fn len(&self) -> GenomicPos {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when thickStart/thickEnd mark a coding region narrower than the feature.
    pub fn has_utr(&self) -> bool {
        self.thick_start > self.start || self.thick_end < self.end
    }
}

pub struct BedReader;

impl BedReader {
    pub fn read_file(path: &Path) -> Result<Vec<BedRecord>, FormatError> {
        let mut records = Vec::new();
        let mut columns: Option<usize> = None;

        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields = split_fields(&line);
            let expected = *columns.get_or_insert(fields.len().min(12));
            if expected < 3 {
                return Err(FormatError::malformed(path, line_no, "BED needs at least 3 columns"));
            }
            if fields.len() < expected {
                return Err(FormatError::malformed(
                    path,
                    line_no,
                    format!("expected {} columns, found {}", expected, fields.len()),
                ));
            }
            records.push(Self::parse_fields(path, line_no, &fields[..expected])?);
        }

        log::debug!("Read {} BED records from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn read_index(path: &Path) -> Result<IntervalIndex<BedRecord>, FormatError> {
        let records = Self::read_file(path)?;
        Ok(IntervalIndex::build(
            records.into_iter().map(|r| (r.chrom.clone(), r.start, r.end, r)),
        ))
    }

    pub fn parse_fields(path: &Path, line: usize, fields: &[&str]) -> Result<BedRecord, FormatError> {
        let start: GenomicPos = parse_field(path, line, fields[1], "start")?;
        let end: GenomicPos = parse_field(path, line, fields[2], "end")?;
        if end < start {
            return Err(FormatError::malformed(path, line, format!("end {} before start {}", end, start)));
        }
        let mut record = BedRecord::new(fields[0], start, end);

        if let Some(name) = fields.get(3) {
            record.name = name.to_string();
        }
        if let Some(score) = fields.get(4) {
            // UCSC allows '.' for a missing score.
            record.score = if *score == "." { 0.0 } else { parse_field(path, line, score, "score")? };
        }
        if let Some(strand) = fields.get(5) {
            record.strand = Strand::from_field(strand);
        }
        if fields.len() >= 8 {
            record.thick_start = parse_field(path, line, fields[6], "thickStart")?;
            record.thick_end = parse_field(path, line, fields[7], "thickEnd")?;
            // A thick region outside the feature means "no coding part".
            if record.thick_start >= record.thick_end {
                record.thick_start = record.end;
                record.thick_end = record.end;
            }
            record.thick_start = record.thick_start.clamp(start, end);
            record.thick_end = record.thick_end.clamp(start, end);
        }
        if let Some(rgb) = fields.get(8) {
            record.rgb = parse_rgb(rgb);
        }
        if fields.len() >= 12 {
            record.blocks = parse_blocks(path, line, start, end, fields[9], fields[10], fields[11])?;
        }
        Ok(record)
    }
}

fn parse_rgb(field: &str) -> Option<(u8, u8, u8)> {
    let parts: Vec<u8> = field.split(',').filter_map(|p| p.trim().parse().ok()).collect();
    match parts.as_slice() {
        [r, g, b] => Some((*r, *g, *b)),
        _ => None,
    }
}

fn parse_blocks(
    path: &Path,
    line: usize,
    start: GenomicPos,
    end: GenomicPos,
    count: &str,
    sizes: &str,
    starts: &str,
) -> Result<Vec<(GenomicPos, GenomicPos)>, FormatError> {
    let count: usize = parse_field(path, line, count, "blockCount")?;
    let list = |s: &str, what: &str| -> Result<Vec<GenomicPos>, FormatError> {
        s.split(',')
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_field(path, line, v, what))
            .collect()
    };
    let sizes = list(sizes, "blockSizes")?;
    let starts = list(starts, "blockStarts")?;
    if sizes.len() < count || starts.len() < count {
        return Err(FormatError::malformed(path, line, "blockCount does not match blockSizes/blockStarts"));
    }

    let mut blocks: Vec<(GenomicPos, GenomicPos)> = starts
        .iter()
        .zip(sizes.iter())
        .take(count)
        .map(|(&s, &len)| {
            let block_start = start.saturating_add(s).min(end);
            (block_start, block_start.saturating_add(len).min(end))
        })
        .collect();
    blocks.sort_unstable();
    if blocks.is_empty() {
        blocks.push((start, end));
    }
    Ok(blocks)
}
