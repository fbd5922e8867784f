//! ENCODE narrowPeak (BED6+4) reader.

use std::path::Path;

use super::{parse_field, split_fields, DataLines, FormatError};
use crate::index::IntervalIndex;
use crate::region::{GenomicPos, Strand};

#[derive(Debug, Clone, PartialEq)]
pub struct NarrowPeak {
    pub chrom: String,
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub name: String,
    pub score: f64,
    pub strand: Strand,
    pub signal: f64,
    pub p_value: f64,
    pub q_value: f64,
    /// Summit offset from `start`; `None` when the file says -1.
    pub summit: Option<GenomicPos>,
}

impl NarrowPeak {
    /// Absolute summit position, defaulting to the peak center.
    pub fn summit_position(&self) -> GenomicPos {
        match self.summit {
            Some(offset) => (self.start + offset).min(self.end),
            None => self.start + (self.end - self.start) / 2,
        }
    }
}

pub struct NarrowPeakReader;

impl NarrowPeakReader {
    pub fn read_index(path: &Path) -> Result<IntervalIndex<NarrowPeak>, FormatError> {
        let mut peaks = Vec::new();
        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields = split_fields(&line);
            if fields.len() < 10 {
                return Err(FormatError::malformed(
                    path,
                    line_no,
                    format!("narrowPeak needs 10 columns, found {}", fields.len()),
                ));
            }
            let start: GenomicPos = parse_field(path, line_no, fields[1], "start")?;
            let end: GenomicPos = parse_field(path, line_no, fields[2], "end")?;
            let summit: i64 = parse_field(path, line_no, fields[9], "peak")?;
            peaks.push(NarrowPeak {
                chrom: fields[0].to_string(),
                start,
                end: end.max(start),
                name: fields[3].to_string(),
                score: if fields[4] == "." { 0.0 } else { parse_field(path, line_no, fields[4], "score")? },
                strand: Strand::from_field(fields[5]),
                signal: parse_field(path, line_no, fields[6], "signalValue")?,
                p_value: parse_field(path, line_no, fields[7], "pValue")?,
                q_value: parse_field(path, line_no, fields[8], "qValue")?,
                summit: u64::try_from(summit).ok(),
            });
        }
        log::debug!("Read {} peaks from {}", peaks.len(), path.display());
        Ok(IntervalIndex::build(peaks.into_iter().map(|p| (p.chrom.clone(), p.start, p.end, p))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_peaks() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t100\t200\tpeak1\t1000\t.\t12.5\t8.1\t5.2\t30").unwrap();
        writeln!(file, "chr1\t300\t400\tpeak2\t500\t+\t3.0\t-1\t-1\t-1").unwrap();
        let index = NarrowPeakReader::read_index(file.path()).unwrap();
        let peaks = index.query(&Region::new("chr1", 0, 1000).unwrap());
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].summit_position(), 130);
        assert_eq!(peaks[1].summit_position(), 350);
        assert_eq!(peaks[0].signal, 12.5);
    }

    #[test]
    fn test_too_few_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chr1\t100\t200\tpeak1\t1000\t.").unwrap();
        assert!(NarrowPeakReader::read_index(file.path()).is_err());
    }
}
