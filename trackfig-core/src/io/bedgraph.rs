//! bedGraph and bedGraph-matrix readers.

use std::path::Path;

use super::{parse_field, split_fields, DataLines, FormatError};
use crate::index::IntervalIndex;
use crate::region::{GenomicPos, Region};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedGraphInterval {
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub value: f64,
}

pub struct BedGraphReader;

impl BedGraphReader {
    pub fn read_index(path: &Path) -> Result<IntervalIndex<BedGraphInterval>, FormatError> {
        let mut entries = Vec::new();
        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields = split_fields(&line);
            if fields.len() < 4 {
                return Err(FormatError::malformed(path, line_no, format!("bedGraph needs 4 columns, found {}", fields.len())));
            }
            let start: GenomicPos = parse_field(path, line_no, fields[1], "start")?;
            let end: GenomicPos = parse_field(path, line_no, fields[2], "end")?;
            let value = parse_value(path, line_no, fields[3])?;
            entries.push((fields[0].to_string(), start, end, BedGraphInterval { start, end, value }));
        }
        log::debug!("Read {} bedGraph intervals from {}", entries.len(), path.display());
        Ok(IntervalIndex::build(entries))
    }
}

fn parse_value(path: &Path, line: usize, field: &str) -> Result<f64, FormatError> {
    match field.trim().to_lowercase().as_str() {
        "nan" | "na" | "." => Ok(f64::NAN),
        _ => parse_field(path, line, field, "value"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub values: Vec<f64>,
}

/// bedGraph with several value columns: `chrom start end v1 ... vn`.
pub struct BedGraphMatrix {
    pub rows: IntervalIndex<MatrixRow>,
    pub columns: usize,
}

impl BedGraphMatrix {
    pub fn read_file(path: &Path) -> Result<Self, FormatError> {
        let mut entries = Vec::new();
        let mut columns: Option<usize> = None;

        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields = split_fields(&line);
            if fields.len() < 4 {
                return Err(FormatError::malformed(path, line_no, "bedGraph matrix needs at least 4 columns"));
            }
            let n = fields.len() - 3;
            let expected = *columns.get_or_insert(n);
            if n != expected {
                return Err(FormatError::malformed(
                    path,
                    line_no,
                    format!("expected {} values, found {}", expected, n),
                ));
            }
            let start: GenomicPos = parse_field(path, line_no, fields[1], "start")?;
            let end: GenomicPos = parse_field(path, line_no, fields[2], "end")?;
            let values = fields[3..]
                .iter()
                .map(|f| parse_value(path, line_no, f))
                .collect::<Result<Vec<f64>, _>>()?;
            entries.push((fields[0].to_string(), start, end, MatrixRow { start, end, values }));
        }

        Ok(Self { rows: IntervalIndex::build(entries), columns: columns.unwrap_or(0) })
    }

    pub fn query(&self, region: &Region) -> Vec<&MatrixRow> {
        self.rows.query(region)
    }
}
