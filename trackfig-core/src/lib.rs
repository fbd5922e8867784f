//! trackfig core
//!
//! Genomic regions, chromosome-name aliasing, the per-chromosome interval
//! index, the `.ini` tracks-file parser with its property schemas, and the
//! readers for every supported track format.

/// Regions, strands and coordinate parsing
pub mod region;

/// UCSC/Ensembl chromosome aliasing
pub mod chrom;

/// Interval trees keyed by chromosome
pub mod index;

/// Tracks-file parser
pub mod config;

/// Track property schemas and validation
pub mod properties;

/// Format readers
pub mod io;

pub use chrom::ChromAlias;
pub use config::{ConfigError, TrackSection, TracksFile};
pub use index::IntervalIndex;
pub use properties::{load_track_properties, FileType, OverlayMode, PropValue, TrackProperties};
pub use region::{GenomicPos, Region, RegionError, Strand};

/// Version information for the trackfig core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
