//! Genomic regions and strands.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type GenomicPos = u64;

#[derive(Debug, Error, PartialEq)]
pub enum RegionError {
    #[error("Invalid region format: {0}. Expected 'chrom:start-end'")]
    InvalidFormat(String),
    #[error("Invalid region range: {0}. Expected 'start-end'")]
    InvalidRange(String),
    #[error("Invalid position value: {0}")]
    InvalidPosition(String),
    #[error("Region start ({start}) must be less than end ({end})")]
    EmptyRange { start: GenomicPos, end: GenomicPos },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl Strand {
    pub fn from_field(field: &str) -> Self {
        match field {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::Unknown => '.',
        }
    }
}

/// Half-open, 0-based genomic window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub chrom: String,
    pub start: GenomicPos,
    pub end: GenomicPos,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: GenomicPos, end: GenomicPos) -> Result<Self, RegionError> {
        if start >= end {
            return Err(RegionError::EmptyRange { start, end });
        }
        Ok(Self { chrom: chrom.into(), start, end })
    }

    /// Parse formats like "chr1:1M-2M", "chr1:1,000-2,000" or "X:100-200".
    pub fn parse(text: &str) -> Result<Self, RegionError> {
        let text = text.trim();
        let (chrom, range) = text
            .rsplit_once(':')
            .ok_or_else(|| RegionError::InvalidFormat(text.to_string()))?;
        let chrom = chrom.trim();
        if chrom.is_empty() {
            return Err(RegionError::InvalidFormat(text.to_string()));
        }

        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| RegionError::InvalidRange(range.to_string()))?;

        let start = parse_position(start)?;
        let end = parse_position(end)?;
        Self::new(chrom, start, end)
    }

    pub fn len(&self) -> GenomicPos {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, chrom: &str, start: GenomicPos, end: GenomicPos) -> bool {
        self.chrom == chrom && start < self.end && self.start < end
    }

    /// `chrom-start-end`, used to name per-region output files.
    pub fn file_tag(&self) -> String {
        format!("{}-{}-{}", self.chrom, self.start, self.end)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl std::str::FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::parse(s)
    }
}

/// Parse a coordinate with optional thousands separators and K/M/G suffix.
pub fn parse_position(pos: &str) -> Result<GenomicPos, RegionError> {
    let cleaned: String = pos.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
    let upper = cleaned.to_uppercase();
    let invalid = || RegionError::InvalidPosition(pos.trim().to_string());

    let (number, scale) = if let Some(n) = upper.strip_suffix('K') {
        (n, 1_000.0)
    } else if let Some(n) = upper.strip_suffix('M') {
        (n, 1_000_000.0)
    } else if let Some(n) = upper.strip_suffix('G') {
        (n, 1_000_000_000.0)
    } else {
        return upper.parse::<GenomicPos>().map_err(|_| invalid());
    };

    let value: f64 = number.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok((value * scale).round() as GenomicPos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() -> Result<(), RegionError> {
        assert_eq!(parse_position("1000")?, 1000);
        assert_eq!(parse_position("1,000,000")?, 1_000_000);
        assert_eq!(parse_position("1K")?, 1000);
        assert_eq!(parse_position("1.5k")?, 1500);
        assert_eq!(parse_position("2.5M")?, 2_500_000);
        assert_eq!(parse_position("1G")?, 1_000_000_000);
        assert!(parse_position("abc").is_err());
        assert!(parse_position("-5K").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_region() -> Result<(), RegionError> {
        let region = Region::parse("chr1:1M-2M")?;
        assert_eq!(region.chrom, "chr1");
        assert_eq!(region.start, 1_000_000);
        assert_eq!(region.end, 2_000_000);

        let region = Region::parse(" X:1,000-2,000 ")?;
        assert_eq!(region, Region { chrom: "X".into(), start: 1000, end: 2000 });
        assert_eq!(region.len(), 1000);
        Ok(())
    }

    #[test]
    fn test_parse_region_errors() {
        assert!(matches!(Region::parse("chr1"), Err(RegionError::InvalidFormat(_))));
        assert!(matches!(Region::parse("chr1:100"), Err(RegionError::InvalidRange(_))));
        assert!(matches!(Region::parse("chr1:200-100"), Err(RegionError::EmptyRange { .. })));
        assert!(matches!(Region::parse("chr1:100-100"), Err(RegionError::EmptyRange { .. })));
        assert!(matches!(Region::parse(":1-2"), Err(RegionError::InvalidFormat(_))));
    }

    #[test]
    fn test_display_and_tag() {
        let region = Region::new("chr2", 10, 20).unwrap();
        assert_eq!(region.to_string(), "chr2:10-20");
        assert_eq!(region.file_tag(), "chr2-10-20");
        assert!(region.overlaps("chr2", 19, 30));
        assert!(!region.overlaps("chr2", 20, 30));
        assert!(!region.overlaps("chr3", 10, 20));
    }
}
