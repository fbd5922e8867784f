use std::io::Write;
use tempfile::TempDir;
use trackfig_core::Region;
use trackfig_render::scene::Item;
use trackfig_render::{Figure, FigureOptions, RenderError};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).expect("create fixture");
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn fixtures(dir: &TempDir, tracks: &str) -> std::path::PathBuf {
    write(dir, "low.bg", "chr1\t0\t5000\t1\nchr1\t5000\t10000\t4\n");
    write(dir, "high.bg", "chr1\t0\t5000\t10\nchr1\t5000\t10000\t2\n");
    write(dir, "genes.bed", "chr1\t1000\t3000\tgeneA\t0\t+\nchr1\t6000\t9000\tgeneB\t0\t-\n");
    write(dir, "marks.bed", "chr1\t2500\t2600\n");
    write(dir, "tracks.ini", tracks)
}

fn texts(items: &[Item], out: &mut Vec<String>) {
    for item in items {
        match item {
            Item::Text { text, .. } => out.push(text.clone()),
            Item::Clip { items, .. } => texts(items, out),
            Item::Shape(..) => {}
        }
    }
}

fn region() -> Region {
    Region::parse("chr1:0-10000").unwrap()
}

const FULL: &str = "[x-axis]\n\n[low]\nfile = low.bg\ntitle = low\n\n[genes]\nfile = genes.bed\n\n\
                    [marks]\nfile = marks.bed\ntype = vlines\n";

#[test]
fn svg_output_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let ini = fixtures(&dir, FULL);
    let options = FigureOptions { width_cm: 20.0, title: Some("demo".into()), ..Default::default() };

    let a = dir.path().join("a.svg");
    let b = dir.path().join("b.svg");
    Figure::from_tracks_file(&ini, options.clone()).unwrap().plot(&region(), &a).unwrap();
    Figure::from_tracks_file(&ini, options).unwrap().plot(&region(), &b).unwrap();

    let b1 = std::fs::read(&a).unwrap();
    let b2 = std::fs::read(&b).unwrap();
    assert!(b1.starts_with(b"<?xml") || b1.starts_with(b"<svg"));
    assert_eq!(b1, b2, "SVG bytes differ between identical renders");
}

#[test]
fn png_has_figure_dimensions() {
    let dir = TempDir::new().unwrap();
    let ini = fixtures(&dir, FULL);
    let options = FigureOptions { width_cm: 20.0, height_cm: Some(10.0), ..Default::default() };
    let out = dir.path().join("figure.png");
    Figure::from_tracks_file(&ini, options).unwrap().plot(&region(), &out).unwrap();

    let image = image::open(&out).unwrap();
    // 20 cm and 10 cm at 72 dpi
    assert_eq!((image.width(), image.height()), (567, 283));
}

#[test]
fn share_y_overlay_merges_limits() {
    let dir = TempDir::new().unwrap();
    let ini = fixtures(&dir, "[low]\nfile = low.bg\n\n[high]\nfile = high.bg\noverlay_previous = share-y\n");
    let mut scene = Figure::from_tracks_file(&ini, FigureOptions::default()).unwrap().render(&region()).unwrap();
    let mut found = Vec::new();
    texts(scene.items(), &mut found);
    assert!(found.contains(&"[0 - 10]".to_string()), "{:?}", found);
}

#[test]
fn independent_overlay_keeps_head_limits() {
    let dir = TempDir::new().unwrap();
    let ini = fixtures(&dir, "[low]\nfile = low.bg\n\n[high]\nfile = high.bg\noverlay_previous = yes\n");
    let mut scene = Figure::from_tracks_file(&ini, FigureOptions::default()).unwrap().render(&region()).unwrap();
    let mut found = Vec::new();
    texts(scene.items(), &mut found);
    assert!(found.contains(&"[0 - 4]".to_string()), "{:?}", found);
    assert!(!found.contains(&"[0 - 10]".to_string()));
}

#[test]
fn hic_height_follows_depth() {
    let dir = TempDir::new().unwrap();
    write(&dir, "contacts.ginteractions", "chr1\t0\t1000\tchr1\t1000\t2000\t5\n");
    let ini = write(&dir, "tracks.ini", "[hic]\nfile = contacts.ginteractions\ndepth = 2000\n");
    let options = FigureOptions { plot_width_cm: Some(20.0), ..Default::default() };
    let scene = Figure::from_tracks_file(&ini, options).unwrap().render(&region()).unwrap();
    // (2000 / 2) / 10000 * 20 cm
    assert!((scene.height_cm - 2.0).abs() < 1e-9);
}

#[test]
fn missing_chromosome_draws_empty_panel() {
    let dir = TempDir::new().unwrap();
    let ini = fixtures(&dir, FULL);
    let other = Region::parse("chrX:0-1000").unwrap();
    let scene = Figure::from_tracks_file(&ini, FigureOptions::default()).unwrap().render(&other);
    assert!(scene.is_ok());
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ini = fixtures(&dir, FULL);
    let mut figure = Figure::from_tracks_file(&ini, FigureOptions::default()).unwrap();
    let err = figure.plot(&region(), &dir.path().join("figure.pdf")).unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedFormat(ref ext) if ext == "pdf"));
}

#[test]
fn missing_data_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let ini = write(&dir, "tracks.ini", "[signal]\nfile = absent.bw\n");
    let err = Figure::from_tracks_file(&ini, FigureOptions::default()).err().unwrap();
    assert!(matches!(err, RenderError::Config(_)));
    assert!(err.to_string().contains("signal"));
}
