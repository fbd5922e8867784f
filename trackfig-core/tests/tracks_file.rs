use std::io::Write;
use tempfile::TempDir;
use trackfig_core::io::{BedReader, BedGraphReader};
use trackfig_core::*;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).expect("create fixture");
    f.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn tracks_file_to_properties() {
    let dir = TempDir::new().unwrap();
    write(&dir, "genes.bed", "chr1\t100\t500\tgeneA\t0\t+\n");
    write(&dir, "signal.bg", "chr1\t0\t1000\t2.5\n");
    let ini = write(
        &dir,
        "tracks.ini",
        "[x-axis]\n\n[signal]\nfile = signal.bg\ntype = line:2\ntitle = coverage\n\n\
         [genes]\nfile = genes.bed\noverlay_previous = share-y\ndisplay = collapsed\n\n[spacer]\nheight = 0.5\n",
    );

    let tracks = TracksFile::from_path(&ini).unwrap();
    let props = load_track_properties(&tracks).unwrap();
    let types: Vec<FileType> = props.iter().map(|p| p.file_type).collect();
    assert_eq!(types, vec![FileType::XAxis, FileType::Bedgraph, FileType::Bed, FileType::Spacer]);

    let signal = &props[1];
    assert_eq!(signal.str("plot_type"), "line");
    assert_eq!(signal.f64("line_width"), 2.0);
    assert_eq!(signal.title(), "coverage");
    assert_eq!(signal.file().unwrap(), dir.path().join("signal.bg"));

    assert_eq!(props[2].overlay(), OverlayMode::ShareY);
    assert_eq!(props[2].str("display"), "collapsed");
    assert_eq!(props[3].height(), Some(0.5));

    let region: Region = "1:1-1,000".parse().unwrap();
    let genes = BedReader::read_index(&props[2].file().unwrap()).unwrap();
    assert_eq!(genes.query(&region).len(), 1);
    let signal = BedGraphReader::read_index(&props[1].file().unwrap()).unwrap();
    assert_eq!(signal.query(&region)[0].value, 2.5);
}

#[test]
fn unknown_extension_names_section_and_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "data.xyz", "x\n");
    let ini = write(&dir, "tracks.ini", "[mystery]\nfile = data.xyz\n");
    let tracks = TracksFile::from_path(&ini).unwrap();
    let err = load_track_properties(&tracks).unwrap_err().to_string();
    assert!(err.contains("mystery"));
    assert!(err.contains("data.xyz"));
}

#[test]
fn missing_tracks_file() {
    let err = TracksFile::from_path(std::path::Path::new("/nonexistent/tracks.ini")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
