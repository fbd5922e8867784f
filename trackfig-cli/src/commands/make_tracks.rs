//! make-tracks-file command: a starting tracks file for a list of data files

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use trackfig_core::properties::TrackSchema;
use trackfig_core::FileType;

use crate::error::CliError;

/// Properties worth editing for each type, written with their defaults.
fn common_properties(file_type: FileType) -> &'static [&'static str] {
    match file_type {
        FileType::Bigwig | FileType::Bedgraph => {
            &["color", "min_value", "max_value", "number_of_bins", "nans_to_zeros", "summary_method", "show_data_range"]
        }
        FileType::BedgraphMatrix => &["plot_type", "colormap", "min_value", "max_value"],
        FileType::Bed | FileType::Gtf => &["color", "border_color", "fontsize", "style", "display", "labels", "gene_rows"],
        FileType::NarrowPeak => &["color", "type", "show_labels", "use_summit", "max_value"],
        FileType::Links => &["links_type", "color", "line_width", "line_style", "compact_arcs_level"],
        FileType::HicMatrix => &["depth", "colormap", "transform", "min_value", "max_value"],
        FileType::Maf => &["reference", "species_order", "color_identical", "color_mismatch", "color_gap"],
        FileType::XAxis | FileType::Spacer | FileType::Vlines | FileType::Hlines => &[],
    }
}

fn section_name(path: &Path, taken: &mut HashSet<String>) -> String {
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string());
    let stem = stem.strip_suffix(".gz").unwrap_or(&stem).to_string();
    let base = stem.rsplit_once('.').map(|(s, _)| s.to_string()).unwrap_or(stem);
    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{} {}", base, n);
        n += 1;
    }
    name
}

/// Tracks-file text for `files`, in order, separated by spacers.
pub fn tracks_file_text(files: &[PathBuf]) -> Result<String> {
    let mut text = String::from("[x-axis]\nwhere = top\n\n");
    let mut taken: HashSet<String> = ["x-axis".to_string()].into_iter().collect();

    for (i, file) in files.iter().enumerate() {
        let file_type = FileType::from_extension(file)
            .ok_or_else(|| CliError::tracks(format!("cannot determine the track type of {}", file.display())))?;
        let schema = TrackSchema::for_type(file_type);
        let name = section_name(file, &mut taken);
        log::info!("Adding {} as a {} track [{}]", file.display(), file_type, name);

        let _ = writeln!(text, "[spacer {}]\nheight = 0.5\n", i + 1);
        let _ = writeln!(text, "[{}]", name);
        let _ = writeln!(text, "file = {}", file.display());
        let _ = writeln!(text, "title = {}", name);
        if let Some(height) = schema.get("height").and_then(|p| p.default) {
            let _ = writeln!(text, "height = {}", height);
        }
        for key in common_properties(file_type) {
            match schema.get(key).and_then(|p| p.default) {
                Some(value) => {
                    let _ = writeln!(text, "{} = {}", key, value);
                }
                None => {
                    let _ = writeln!(text, "#{} =", key);
                }
            }
        }
        text.push('\n');
    }
    Ok(text)
}

pub fn execute(track_files: &[PathBuf], out: &Path) -> Result<()> {
    let mut files = Vec::with_capacity(track_files.len());
    for file in track_files {
        let absolute = std::fs::canonicalize(file).map_err(|_| CliError::file_not_found(file.clone()))?;
        files.push(absolute);
    }
    let text = tracks_file_text(&files)?;
    std::fs::write(out, text)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to write tracks file {}", out.display()))?;
    log::info!("Wrote {} tracks to {}", files.len(), out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackfig_core::{load_track_properties, TracksFile};

    #[test]
    fn test_sections_per_file() {
        let files = vec![PathBuf::from("/data/signal.bw"), PathBuf::from("/data/genes.bed.gz")];
        let text = tracks_file_text(&files).unwrap();
        assert!(text.starts_with("[x-axis]"));
        assert!(text.contains("[signal]\nfile = /data/signal.bw\ntitle = signal\nheight = 2\ncolor = #33a02c\n"));
        assert!(text.contains("#min_value ="));
        assert!(text.contains("[genes]\nfile = /data/genes.bed.gz"));
        assert!(text.contains("[spacer 2]"));

        let parsed = TracksFile::parse(&text, Path::new("/")).unwrap();
        let names: Vec<&str> = parsed.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["x-axis", "spacer 1", "signal", "spacer 2", "genes"]);
    }

    #[test]
    fn test_duplicate_stems_get_suffix() {
        let files = vec![PathBuf::from("/a/reads.bw"), PathBuf::from("/b/reads.bw")];
        let text = tracks_file_text(&files).unwrap();
        assert!(text.contains("[reads]\n"));
        assert!(text.contains("[reads 2]\n"));
    }

    #[test]
    fn test_unknown_extension() {
        let err = tracks_file_text(&[PathBuf::from("notes.txt")]).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_written_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let bed = dir.path().join("genes.bed");
        std::fs::write(&bed, "chr1\t10\t20\tg\n").unwrap();
        let out = dir.path().join("tracks.ini");
        execute(&[bed], &out).unwrap();

        let props = load_track_properties(&TracksFile::from_path(&out).unwrap()).unwrap();
        let types: Vec<FileType> = props.iter().map(|p| p.file_type).collect();
        assert_eq!(types, [FileType::XAxis, FileType::Spacer, FileType::Bed]);
    }
}
