//! MAF (Multiple Alignment Format) reader.
//!
//! Each alignment block begins with an `a` line and holds one `s` line per
//! aligned species. `i`, `e` and `q` lines are kept as block metadata.
//! Blocks are indexed on the coordinates of a chosen reference species.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use super::{open_text, FormatError};
use crate::index::IntervalIndex;
use crate::region::{GenomicPos, Region, Strand};

/// One `s` line of an alignment block.
#[derive(Debug, Clone, PartialEq)]
pub struct MafSequence {
    /// `species.chrom` source name.
    pub src: String,
    pub start: GenomicPos,
    pub size: GenomicPos,
    pub strand: Strand,
    pub src_size: GenomicPos,
    /// Aligned bases with `-` gaps.
    pub text: String,
}

impl MafSequence {
    pub fn species(&self) -> &str {
        self.src.split_once('.').map_or(self.src.as_str(), |(species, _)| species)
    }

    pub fn chrom(&self) -> &str {
        self.src.split_once('.').map_or(self.src.as_str(), |(_, chrom)| chrom)
    }

    /// Start/end on the forward strand.
    pub fn forward_range(&self) -> (GenomicPos, GenomicPos) {
        match self.strand {
            Strand::Reverse => {
                let end = self.src_size.saturating_sub(self.start);
                (end.saturating_sub(self.size), end)
            }
            _ => (self.start, self.start + self.size),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MafBlock {
    pub score: Option<f64>,
    pub sequences: Vec<MafSequence>,
    pub metadata: HashMap<String, String>,
}

impl MafBlock {
    pub fn sequence_for(&self, species: &str) -> Option<&MafSequence> {
        self.sequences.iter().find(|s| s.species() == species)
    }
}

pub struct MafParser;

impl MafParser {
    pub fn parse_file(path: &Path) -> Result<Vec<MafBlock>, FormatError> {
        Self::parse_blocks(open_text(path)?, path)
    }

    /// Parse every block from `reader`; `path` is only used in messages.
    pub fn parse_blocks<R: BufRead>(reader: R, path: &Path) -> Result<Vec<MafBlock>, FormatError> {
        let mut blocks = Vec::new();
        let mut current: Option<MafBlock> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line_no = line_no + 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match trimmed.as_bytes()[0] {
                b'a' => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                    current = Some(Self::parse_alignment_line(trimmed));
                }
                b's' => {
                    let Some(block) = current.as_mut() else {
                        return Err(FormatError::malformed(path, line_no, "sequence line without alignment block"));
                    };
                    let sequence = Self::parse_sequence_line(trimmed)
                        .map_err(|message| FormatError::malformed(path, line_no, message))?;
                    block.sequences.push(sequence);
                }
                kind @ (b'i' | b'e' | b'q') => {
                    if let Some(block) = current.as_mut() {
                        if let Some((_, rest)) = trimmed.split_once(char::is_whitespace) {
                            let key = format!("{}_{}", kind as char, block.metadata.len());
                            block.metadata.insert(key, rest.trim().to_string());
                        }
                    }
                }
                _ => log::trace!("{}:{}: ignored MAF line", path.display(), line_no),
            }
        }

        if let Some(block) = current {
            blocks.push(block);
        }
        Ok(blocks)
    }

    fn parse_alignment_line(line: &str) -> MafBlock {
        let mut block = MafBlock::default();
        for part in line.split_whitespace().skip(1) {
            if let Some((key, value)) = part.split_once('=') {
                if key == "score" {
                    block.score = value.parse::<f64>().ok();
                } else {
                    block.metadata.insert(key.to_string(), value.to_string());
                }
            }
        }
        block
    }

    fn parse_sequence_line(line: &str) -> Result<MafSequence, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 7 {
            return Err(format!("expected 7 fields in sequence line, got {}", parts.len()));
        }
        let number = |field: &str| {
            field
                .parse::<GenomicPos>()
                .map_err(|_| format!("invalid position '{}'", field))
        };
        let strand = match parts[4] {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            other => return Err(format!("invalid strand '{}'", other)),
        };
        Ok(MafSequence {
            src: parts[1].to_string(),
            start: number(parts[2])?,
            size: number(parts[3])?,
            strand,
            src_size: number(parts[5])?,
            text: parts[6].to_string(),
        })
    }
}

/// Alignment blocks indexed on the reference species' coordinates.
pub struct MafIndex {
    pub reference: String,
    blocks: IntervalIndex<MafBlock>,
    species: Vec<String>,
}

impl MafIndex {
    pub fn read_file(path: &Path, reference: &str) -> Result<Self, FormatError> {
        let blocks = MafParser::parse_file(path)?;
        let index = Self::build(blocks, reference);
        if index.blocks.is_empty() {
            return Err(FormatError::Unsupported {
                path: PathBuf::from(path),
                message: format!("no alignment block contains reference species '{}'", reference),
            });
        }
        log::debug!("Indexed {} MAF blocks from {}", index.blocks.len(), path.display());
        Ok(index)
    }

    /// Index `blocks` on `reference`; blocks without it are dropped.
    pub fn build(blocks: Vec<MafBlock>, reference: &str) -> Self {
        let mut species: IndexSet<String> = IndexSet::new();
        let mut entries = Vec::new();

        for block in blocks {
            let Some(reference_seq) = block.sequence_for(reference) else {
                continue;
            };
            let chrom = reference_seq.chrom().to_string();
            let (start, end) = reference_seq.forward_range();
            for seq in &block.sequences {
                species.insert(seq.species().to_string());
            }
            entries.push((chrom, start, end, block));
        }

        Self {
            reference: reference.to_string(),
            blocks: IntervalIndex::build(entries),
            species: species.into_iter().collect(),
        }
    }

    pub fn query(&self, region: &Region) -> Vec<&MafBlock> {
        self.blocks.query(region)
    }

    /// Reference chromosome name matching `chrom`, aliases included.
    pub fn resolve(&self, chrom: &str) -> Option<String> {
        self.blocks.resolve(chrom)
    }

    /// Species in order of first appearance, the reference included.
    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
