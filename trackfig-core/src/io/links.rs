//! Links/arcs reader: `chrom1 start1 end1 chrom2 start2 end2 [score]`.

use std::path::Path;

use super::{parse_field, split_fields, DataLines, FormatError};
use crate::index::IntervalIndex;
use crate::region::GenomicPos;

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub chrom: String,
    pub start1: GenomicPos,
    pub end1: GenomicPos,
    pub start2: GenomicPos,
    pub end2: GenomicPos,
    pub score: f64,
}

impl Link {
    /// Left-most and right-most coordinates spanned by both anchors.
    pub fn span(&self) -> (GenomicPos, GenomicPos) {
        (self.start1.min(self.start2), self.end1.max(self.end2))
    }
}

pub struct LinksReader;

impl LinksReader {
    pub fn read_index(path: &Path) -> Result<IntervalIndex<Link>, FormatError> {
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields = split_fields(&line);
            if fields.len() < 6 {
                return Err(FormatError::malformed(path, line_no, format!("links need 6 columns, found {}", fields.len())));
            }
            if fields[0] != fields[3] {
                skipped += 1;
                continue;
            }
            let mut link = Link {
                chrom: fields[0].to_string(),
                start1: parse_field(path, line_no, fields[1], "start1")?,
                end1: parse_field(path, line_no, fields[2], "end1")?,
                start2: parse_field(path, line_no, fields[4], "start2")?,
                end2: parse_field(path, line_no, fields[5], "end2")?,
                score: match fields.get(6) {
                    Some(s) if *s != "." => parse_field(path, line_no, s, "score")?,
                    _ => 0.0,
                },
            };
            // Keep the first anchor on the left.
            if link.start2 < link.start1 {
                std::mem::swap(&mut link.start1, &mut link.start2);
                std::mem::swap(&mut link.end1, &mut link.end2);
            }
            let (s, e) = link.span();
            entries.push((link.chrom.clone(), s, e, link));
        }

        if skipped > 0 {
            log::debug!("{}: skipped {} inter-chromosomal links", path.display(), skipped);
        }
        Ok(IntervalIndex::build(entries))
    }
}
