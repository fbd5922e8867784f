//! GTF reader producing one BED12-like record per transcript (or per gene
//! when transcripts are merged).

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::Path;

use super::{parse_field, DataLines, FormatError};
use crate::index::IntervalIndex;
use crate::io::bed::BedRecord;
use crate::region::{GenomicPos, Strand};

#[derive(Debug, Clone)]
pub struct GtfOptions {
    /// Attribute used for the displayed name.
    pub prefered_name: String,
    /// Merge all transcripts of a gene into one record.
    pub merge_transcripts: bool,
}

impl Default for GtfOptions {
    fn default() -> Self {
        Self { prefered_name: "transcript_name".to_string(), merge_transcripts: false }
    }
}

#[derive(Debug, Default)]
struct Group {
    chrom: String,
    strand: Option<Strand>,
    name: Option<String>,
    exons: Vec<(GenomicPos, GenomicPos)>,
    coding: Vec<(GenomicPos, GenomicPos)>,
    span: Option<(GenomicPos, GenomicPos)>,
}

pub struct GtfReader;

impl GtfReader {
    pub fn read_file(path: &Path, options: &GtfOptions) -> Result<Vec<BedRecord>, FormatError> {
        let mut groups: IndexMap<String, Group> = IndexMap::new();

        for line in DataLines::open(path)? {
            let (line_no, line) = line?;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 9 {
                return Err(FormatError::malformed(path, line_no, format!("GTF line must have 9 fields, found {}", fields.len())));
            }

            let feature = fields[2];
            if !matches!(feature, "exon" | "CDS" | "start_codon" | "stop_codon" | "transcript") {
                continue;
            }

            let start: GenomicPos = parse_field(path, line_no, fields[3], "start")?;
            let end: GenomicPos = parse_field(path, line_no, fields[4], "end")?;
            // GTF is 1-based inclusive.
            let start = start.saturating_sub(1);
            let attributes = parse_attributes(fields[8]);

            let key_attr = if options.merge_transcripts { "gene_id" } else { "transcript_id" };
            let Some(key) = attributes.get(key_attr) else {
                log::debug!("{}:{}: no {} attribute, skipped", path.display(), line_no, key_attr);
                continue;
            };

            let group = groups.entry(key.clone()).or_default();
            group.chrom = fields[0].to_string();
            group.strand.get_or_insert(Strand::from_field(fields[6]));
            if group.name.is_none() {
                group.name = attributes
                    .get(options.prefered_name.as_str())
                    .or_else(|| attributes.get(if options.merge_transcripts { "gene_name" } else { "transcript_name" }))
                    .cloned()
                    .or_else(|| Some(key.clone()));
            }

            let span = group.span.get_or_insert((start, end));
            span.0 = span.0.min(start);
            span.1 = span.1.max(end);

            match feature {
                "exon" => group.exons.push((start, end)),
                "CDS" | "start_codon" | "stop_codon" => group.coding.push((start, end)),
                _ => {}
            }
        }

        let mut records: Vec<BedRecord> = groups
            .into_iter()
            .filter_map(|(key, group)| group_to_record(key, group))
            .collect();
        records.sort_by(|a, b| a.chrom.cmp(&b.chrom).then(a.start.cmp(&b.start)));
        log::debug!("Read {} transcripts from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn read_index(path: &Path, options: &GtfOptions) -> Result<IntervalIndex<BedRecord>, FormatError> {
        let records = Self::read_file(path, options)?;
        Ok(IntervalIndex::build(
            records.into_iter().map(|r| (r.chrom.clone(), r.start, r.end, r)),
        ))
    }
}

fn group_to_record(key: String, group: Group) -> Option<BedRecord> {
    let (span_start, span_end) = group.span?;
    let mut blocks = merge_intervals(group.exons);
    if blocks.is_empty() {
        blocks.push((span_start, span_end));
    }
    let start = blocks.first().map(|b| b.0).unwrap_or(span_start).min(span_start);
    let end = blocks.last().map(|b| b.1).unwrap_or(span_end).max(span_end);

    let mut record = BedRecord::new(group.chrom, start, end);
    record.name = group.name.unwrap_or(key);
    record.strand = group.strand.unwrap_or(Strand::Unknown);
    record.blocks = blocks;

    match (group.coding.iter().map(|c| c.0).min(), group.coding.iter().map(|c| c.1).max()) {
        (Some(cs), Some(ce)) => {
            record.thick_start = cs.max(start);
            record.thick_end = ce.min(end);
        }
        _ => {
            record.thick_start = end;
            record.thick_end = end;
        }
    }
    Some(record)
}

/// Sort and merge overlapping or touching intervals.
fn merge_intervals(mut intervals: Vec<(GenomicPos, GenomicPos)>) -> Vec<(GenomicPos, GenomicPos)> {
    intervals.sort_unstable();
    let mut merged: Vec<(GenomicPos, GenomicPos)> = Vec::with_capacity(intervals.len());
    for (s, e) in intervals {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }
    merged
}

/// Parse `key "value"; key2 "value2";` into a map. The first value of a
/// repeated key wins.
fn parse_attributes(field: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for pair in field.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        if let Some((key, value)) = pair.split_once(char::is_whitespace) {
            let value = value.trim().trim_matches('"').to_string();
            attributes.entry(key.trim().to_string()).or_insert(value);
        }
    }
    attributes
}
