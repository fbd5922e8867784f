//! Hi-C contact matrices in ginteractions text form:
//! `chrom1 start1 end1 chrom2 start2 end2 value`.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;

use super::{parse_field, split_fields, DataLines, FormatError};
use crate::index::IntervalIndex;
use crate::region::{GenomicPos, Region};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub start1: GenomicPos,
    pub end1: GenomicPos,
    pub start2: GenomicPos,
    pub end2: GenomicPos,
    pub value: f64,
}

impl Contact {
    /// Distance between the two bin starts.
    pub fn distance(&self) -> GenomicPos {
        self.start2 - self.start1
    }
}

/// Intra-chromosomal contacts with the upper triangle stored once.
pub struct ContactMatrix {
    pub bin_size: GenomicPos,
    contacts: IntervalIndex<Contact>,
}

impl ContactMatrix {
    /// Contacts whose two anchors both touch `region` and whose distance is
    /// at most `max_distance`.
    pub fn query(&self, region: &Region, max_distance: GenomicPos) -> Vec<&Contact> {
        self.contacts
            .query(region)
            .into_iter()
            .filter(|c| c.end1 > region.start && c.start2 < region.end && c.distance() <= max_distance)
            .collect()
    }

    pub fn chromosomes(&self) -> Vec<&str> {
        self.contacts.chromosomes()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

pub struct HicReader;

impl HicReader {
    pub fn read_file(path: &Path) -> Result<ContactMatrix, FormatError> {
        let mut pairs: IndexMap<(String, GenomicPos, GenomicPos), Contact> = IndexMap::new();
        let mut bin_lengths: HashMap<GenomicPos, usize> = HashMap::new();
        let mut skipped = 0usize;

        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields = split_fields(&line);
            if fields.len() < 7 {
                return Err(FormatError::malformed(
                    path,
                    line_no,
                    format!("ginteractions need 7 columns, found {}", fields.len()),
                ));
            }
            if fields[0] != fields[3] {
                skipped += 1;
                continue;
            }

            let mut contact = Contact {
                start1: parse_field(path, line_no, fields[1], "start1")?,
                end1: parse_field(path, line_no, fields[2], "end1")?,
                start2: parse_field(path, line_no, fields[4], "start2")?,
                end2: parse_field(path, line_no, fields[5], "end2")?,
                value: parse_field(path, line_no, fields[6], "value")?,
            };
            if contact.start2 < contact.start1 {
                std::mem::swap(&mut contact.start1, &mut contact.start2);
                std::mem::swap(&mut contact.end1, &mut contact.end2);
            }
            *bin_lengths.entry(contact.end1.saturating_sub(contact.start1)).or_default() += 1;
            *bin_lengths.entry(contact.end2.saturating_sub(contact.start2)).or_default() += 1;

            pairs
                .entry((fields[0].to_string(), contact.start1, contact.start2))
                .or_insert(contact);
        }

        if skipped > 0 {
            log::debug!("{}: skipped {} inter-chromosomal contacts", path.display(), skipped);
        }

        // Most frequent bin length, smallest on ties.
        let bin_size = bin_lengths
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(len, _)| len)
            .unwrap_or(0);

        log::debug!("Read {} contacts from {} (bin size {})", pairs.len(), path.display(), bin_size);
        let contacts = IntervalIndex::build(
            pairs
                .into_iter()
                .map(|((chrom, _, _), c)| (chrom, c.start1, c.end2.max(c.end1), c)),
        );
        Ok(ContactMatrix { bin_size, contacts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_matrix(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    #[test]
    fn test_bin_size_and_symmetry() {
        let file = write_matrix(&[
            "chr1\t0\t1000\tchr1\t0\t1000\t10",
            "chr1\t0\t1000\tchr1\t1000\t2000\t5",
            "chr1\t1000\t2000\tchr1\t0\t1000\t5",
            "chr1\t1000\t2000\tchr1\t1000\t2000\t8",
            "chr1\t2000\t2500\tchr1\t2000\t2500\t1",
            "chr1\t0\t1000\tchr2\t0\t1000\t3",
        ]);
        let matrix = HicReader::read_file(file.path()).unwrap();
        assert_eq!(matrix.bin_size, 1000);
        assert_eq!(matrix.len(), 4);
    }

    #[test]
    fn test_query_respects_distance() {
        let file = write_matrix(&[
            "chr1\t0\t1000\tchr1\t0\t1000\t10",
            "chr1\t0\t1000\tchr1\t1000\t2000\t5",
            "chr1\t0\t1000\tchr1\t5000\t6000\t2",
        ]);
        let matrix = HicReader::read_file(file.path()).unwrap();
        let region = Region::new("1", 0, 10_000).unwrap();
        assert_eq!(matrix.query(&region, 10_000).len(), 3);
        assert_eq!(matrix.query(&region, 1000).len(), 2);
    }
}
