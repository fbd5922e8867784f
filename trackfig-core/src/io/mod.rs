//! Readers for the genomic formats a track can point at.
//!
//! Text formats share `open_text`, which transparently handles gzip input
//! (sniffed from the magic bytes, not the extension), and `DataLines`, which
//! skips comments and `track`/`browser` header lines.

pub mod bed;
pub mod bedgraph;
pub mod bigwig;
pub mod gtf;
pub mod hic;
pub mod links;
pub mod maf;
pub mod narrow_peak;

pub use bed::{BedReader, BedRecord};
pub use bedgraph::{BedGraphMatrix, BedGraphReader, BedGraphInterval, MatrixRow};
pub use bigwig::{BigWigSource, SummaryMethod};
pub use gtf::GtfReader;
pub use hic::{Contact, ContactMatrix, HicReader};
pub use links::{Link, LinksReader};
pub use maf::{MafBlock, MafIndex, MafParser, MafSequence};
pub use narrow_peak::{NarrowPeak, NarrowPeakReader};

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("{path}:{line}: {message}")]
    Malformed { path: PathBuf, line: usize, message: String },
    #[error("Cannot open {path}: {source}")]
    Open { path: PathBuf, source: std::io::Error },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: {message}")]
    Unsupported { path: PathBuf, message: String },
}

impl FormatError {
    pub fn malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed { path: path.to_path_buf(), line, message: message.into() }
    }
}

/// Open a text file, decompressing gzip when the magic bytes say so.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, FormatError> {
    let open = |p: &Path| File::open(p).map_err(|source| FormatError::Open { path: p.to_path_buf(), source });

    let mut magic = [0u8; 2];
    let n = open(path)?.read(&mut magic)?;
    let file = open(path)?;

    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// File name with a trailing `.gz` removed, lower-cased.
pub fn uncompressed_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.strip_suffix(".gz").map(str::to_string).unwrap_or(name)
}

/// Iterator over the data lines of a text track file as `(line_number, line)`.
pub struct DataLines {
    reader: Box<dyn BufRead>,
    buffer: String,
    line_number: usize,
}

impl DataLines {
    pub fn open(path: &Path) -> Result<Self, FormatError> {
        Ok(Self::new(open_text(path)?))
    }

    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self { reader, buffer: String::new(), line_number: 0 }
    }
}

pub(crate) fn is_header_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

impl Iterator for DataLines {
    type Item = Result<(usize, String), FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buffer.trim_end_matches(['\n', '\r']);
                    if line.trim().is_empty() || is_header_line(line) {
                        continue;
                    }
                    return Some(Ok((self.line_number, line.to_string())));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Split a data line on tabs, falling back to any whitespace for files
/// that were saved with spaces.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() > 1 {
        fields
    } else {
        line.split_whitespace().collect()
    }
}

pub(crate) fn parse_field<T: std::str::FromStr>(
    path: &Path,
    line: usize,
    field: &str,
    what: &str,
) -> Result<T, FormatError> {
    field
        .trim()
        .parse::<T>()
        .map_err(|_| FormatError::malformed(path, line, format!("invalid {}: '{}'", what, field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_data_lines_skip_headers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "track name=demo").unwrap();
        writeln!(file, "browser position chr1:1-100").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "chr1\t1\t2").unwrap();

        let lines: Vec<_> = DataLines::open(file.path()).unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec![(5, "chr1\t1\t2".to_string())]);
    }

    #[test]
    fn test_gzip_is_sniffed() {
        let file = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(File::create(file.path()).unwrap(), Compression::default());
        encoder.write_all(b"chr1\t10\t20\n").unwrap();
        encoder.finish().unwrap();

        let lines: Vec<_> = DataLines::open(file.path()).unwrap().map(|l| l.unwrap().1).collect();
        assert_eq!(lines, vec!["chr1\t10\t20"]);
    }

    #[test]
    fn test_split_fields_whitespace_fallback() {
        assert_eq!(split_fields("chr1 1 2"), vec!["chr1", "1", "2"]);
        assert_eq!(split_fields("chr1\t1\t2"), vec!["chr1", "1", "2"]);
        assert_eq!(uncompressed_name(Path::new("/a/B.Bed.gz")), "b.bed");
    }
}
