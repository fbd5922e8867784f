//! bigWig access through `bigtools`, plus the binning/summary logic shared
//! with bedGraph tracks.

use bigtools::BigWigRead;
use std::path::{Path, PathBuf};

use super::FormatError;
use crate::chrom::resolve_chrom;
use crate::region::{GenomicPos, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMethod {
    Mean,
    Max,
    Min,
    Stdev,
    Coverage,
    Sum,
}

impl SummaryMethod {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mean" | "average" => Some(Self::Mean),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "stdev" | "std" => Some(Self::Stdev),
            "coverage" => Some(Self::Coverage),
            "sum" => Some(Self::Sum),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BinAccumulator {
    covered: f64,
    weighted_sum: f64,
    weighted_sq: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl BinAccumulator {
    fn add(&mut self, value: f64, overlap: f64) {
        self.covered += overlap;
        self.weighted_sum += value * overlap;
        self.weighted_sq += value * value * overlap;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn finish(&self, method: SummaryMethod, bin_len: f64) -> f64 {
        if self.covered <= 0.0 || bin_len <= 0.0 {
            return f64::NAN;
        }
        match method {
            SummaryMethod::Mean => self.weighted_sum / self.covered,
            SummaryMethod::Max => self.max.unwrap_or(f64::NAN),
            SummaryMethod::Min => self.min.unwrap_or(f64::NAN),
            SummaryMethod::Sum => self.weighted_sum,
            SummaryMethod::Stdev => {
                let mean = self.weighted_sum / self.covered;
                (self.weighted_sq / self.covered - mean * mean).max(0.0).sqrt()
            }
            SummaryMethod::Coverage => self.covered / bin_len,
        }
    }
}

/// Summarize `(start, end, value)` intervals into `bins` equal-width bins
/// over `region`. Bins without data are NaN for every method. NaN input
/// values are ignored. The bin count is capped at the region length.
pub fn summarize<I>(intervals: I, region: &Region, bins: usize, method: SummaryMethod) -> Vec<f64>
where
    I: IntoIterator<Item = (GenomicPos, GenomicPos, f64)>,
{
    let bins = bins.clamp(1, region.len().max(1) as usize);
    let start = region.start as f64;
    let bin_len = region.len() as f64 / bins as f64;
    let mut acc = vec![BinAccumulator::default(); bins];

    for (s, e, value) in intervals {
        if value.is_nan() {
            continue;
        }
        let s = (s.max(region.start)) as f64;
        let e = (e.min(region.end)) as f64;
        if e <= s {
            continue;
        }
        let first = (((s - start) / bin_len).floor() as usize).min(bins - 1);
        let last = ((((e - start) / bin_len).ceil() as usize).max(first + 1)).min(bins);
        for (i, bin) in acc.iter_mut().enumerate().take(last).skip(first) {
            let b0 = start + i as f64 * bin_len;
            let b1 = b0 + bin_len;
            let overlap = e.min(b1) - s.max(b0);
            if overlap > 0.0 {
                bin.add(value, overlap);
            }
        }
    }

    acc.iter().map(|b| b.finish(method, bin_len)).collect()
}

/// Lazily opened bigWig file. The chromosome list is read at open time;
/// value queries reopen the file.
#[derive(Debug, Clone)]
pub struct BigWigSource {
    path: PathBuf,
    chroms: Vec<(String, u32)>,
}

impl BigWigSource {
    pub fn open(path: &Path) -> Result<Self, FormatError> {
        let reader = BigWigRead::open_file(&path.to_string_lossy()).map_err(|e| read_error(path, e))?;
        let chroms = reader
            .chroms()
            .iter()
            .map(|c| (c.name.clone(), c.length))
            .collect();
        Ok(Self { path: path.to_path_buf(), chroms })
    }

    pub fn chromosomes(&self) -> &[(String, u32)] {
        &self.chroms
    }

    pub fn resolve(&self, chrom: &str) -> Option<String> {
        resolve_chrom(chrom, |c| self.chroms.iter().any(|(name, _)| name == c))
    }

    /// Raw `(start, end, value)` records overlapping `region`.
    pub fn intervals(&self, region: &Region) -> Result<Vec<(GenomicPos, GenomicPos, f64)>, FormatError> {
        let Some(chrom) = self.resolve(&region.chrom) else {
            return Ok(Vec::new());
        };
        let length = self
            .chroms
            .iter()
            .find(|(name, _)| *name == chrom)
            .map(|(_, len)| *len as GenomicPos)
            .unwrap_or(region.end);
        let start = region.start.min(length) as u32;
        let end = region.end.min(length) as u32;
        if start >= end {
            return Ok(Vec::new());
        }

        let mut reader =
            BigWigRead::open_file(&self.path.to_string_lossy()).map_err(|e| read_error(&self.path, e))?;
        let mut out = Vec::new();
        for value in reader.get_interval(&chrom, start, end).map_err(|e| read_error(&self.path, e))? {
            let value = value.map_err(|e| read_error(&self.path, e))?;
            out.push((value.start as GenomicPos, value.end as GenomicPos, value.value as f64));
        }
        Ok(out)
    }

    pub fn summarize(&self, region: &Region, bins: usize, method: SummaryMethod) -> Result<Vec<f64>, FormatError> {
        Ok(summarize(self.intervals(region)?, region, bins, method))
    }
}

fn read_error(path: &Path, e: impl std::fmt::Display) -> FormatError {
    FormatError::Unsupported {
        path: path.to_path_buf(),
        message: format!("bigWig read failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region::new("chr1", 0, 100).unwrap()
    }

    #[test]
    fn test_mean_is_overlap_weighted() {
        let values = summarize(vec![(0, 25, 2.0), (25, 50, 4.0)], &region(), 2, SummaryMethod::Mean);
        assert_eq!(values[0], 3.0);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_max_min_sum_coverage() {
        let data = vec![(0, 10, 1.0), (10, 20, 5.0), (60, 70, -2.0)];
        assert_eq!(summarize(data.clone(), &region(), 2, SummaryMethod::Max), vec![5.0, -2.0]);
        assert_eq!(summarize(data.clone(), &region(), 2, SummaryMethod::Min), vec![1.0, -2.0]);
        assert_eq!(summarize(data.clone(), &region(), 2, SummaryMethod::Sum), vec![60.0, -20.0]);
        assert_eq!(summarize(data, &region(), 2, SummaryMethod::Coverage), vec![0.4, 0.2]);
    }

    #[test]
    fn test_uncovered_bins_are_nan_for_coverage() {
        let values = summarize(vec![(0, 25, 3.0)], &region(), 4, SummaryMethod::Coverage);
        assert_eq!(values[0], 1.0);
        assert!(values[1..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_bins_capped_by_region_length() {
        let small = Region::new("chr1", 0, 10).unwrap();
        let values = summarize(vec![(0, 10, 1.0)], &small, 700, SummaryMethod::Mean);
        assert_eq!(values.len(), 10);
        assert!(values.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_nan_values_ignored() {
        let values = summarize(vec![(0, 100, f64::NAN)], &region(), 4, SummaryMethod::Mean);
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(SummaryMethod::parse("average"), Some(SummaryMethod::Mean));
        assert_eq!(SummaryMethod::parse("MAX"), Some(SummaryMethod::Max));
        assert_eq!(SummaryMethod::parse("median"), None);
    }

    #[test]
    fn test_open_rejects_non_bigwig() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"chr1\t0\t10\t1\n").unwrap();
        assert!(BigWigSource::open(file.path()).is_err());
    }
}
