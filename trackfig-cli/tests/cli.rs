use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn trackfig(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trackfig"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run trackfig")
}

fn fixtures(dir: &TempDir) -> PathBuf {
    std::fs::write(dir.path().join("signal.bg"), "chr1\t0\t5000\t3\nchr1\t5000\t10000\t6\n").unwrap();
    std::fs::write(dir.path().join("genes.bed"), "chr1\t1000\t4000\tgeneA\t0\t+\n").unwrap();
    let ini = dir.path().join("tracks.ini");
    std::fs::write(&ini, "[x-axis]\n\n[signal]\nfile = signal.bg\n\n[genes]\nfile = genes.bed\n").unwrap();
    ini
}

#[test]
fn plot_region_to_svg() {
    let dir = TempDir::new().unwrap();
    fixtures(&dir);
    let out = trackfig(dir.path(), &["plot", "--tracks", "tracks.ini", "--region", "chr1:0-10000", "-o", "fig.svg", "--width", "20"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let svg = std::fs::read_to_string(dir.path().join("fig.svg")).unwrap();
    assert!(svg.contains(r#"width="20.00cm""#) || svg.contains(r#"width="20cm""#), "{}", &svg[..200.min(svg.len())]);
}

#[test]
fn config_file_sets_defaults() {
    let dir = TempDir::new().unwrap();
    fixtures(&dir);
    std::fs::write(dir.path().join("trackfig.toml"), "[figure]\nwidth_cm = 15.0\n\n[output]\nformat = \"svg\"\n").unwrap();
    let out = trackfig(dir.path(), &["plot", "--tracks", "tracks.ini", "--region", "chr1:0-10000", "-o", "fig"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let svg = std::fs::read_to_string(dir.path().join("fig.svg")).unwrap();
    assert!(svg.contains(r#"width="15.00cm""#) || svg.contains(r#"width="15cm""#));
}

#[test]
fn batch_mode_names_outputs_by_region() {
    let dir = TempDir::new().unwrap();
    fixtures(&dir);
    std::fs::write(dir.path().join("regions.bed"), "chr1\t0\t5000\nchr1\t5000\t10000\n").unwrap();
    let out = trackfig(dir.path(), &["plot", "--tracks", "tracks.ini", "--BED", "regions.bed", "-o", "figs/locus.svg"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert!(dir.path().join("figs/locus_chr1-0-5000.svg").exists());
    assert!(dir.path().join("figs/locus_chr1-5000-10000.svg").exists());
}

#[test]
fn bad_region_fails_with_suggestions() {
    let dir = TempDir::new().unwrap();
    fixtures(&dir);
    let out = trackfig(dir.path(), &["plot", "--tracks", "tracks.ini", "--region", "chr1:500-100", "-o", "fig.svg"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid region"), "{}", stderr);
    assert!(stderr.contains("Suggestions:"));
}

#[test]
fn make_tracks_file_then_plot() {
    let dir = TempDir::new().unwrap();
    fixtures(&dir);
    let out = trackfig(dir.path(), &["make-tracks-file", "--trackFiles", "signal.bg", "genes.bed", "-o", "made.ini"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let text = std::fs::read_to_string(dir.path().join("made.ini")).unwrap();
    assert!(text.contains("[signal]"));
    assert!(text.contains("[genes]"));

    let out = trackfig(dir.path(), &["plot", "--tracks", "made.ini", "--region", "chr1:0-10000", "-o", "made.png"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(dir.path().join("made.png").exists());
}
