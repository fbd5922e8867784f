//! Plot command: one figure per region

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use trackfig_core::io::BedReader;
use trackfig_core::Region;
use trackfig_render::{Figure, FigureOptions};

use crate::config::Config;
use crate::error::CliError;
use crate::PlotArgs;

/// Figure options from the configuration with command-line overrides.
pub fn figure_options(config: &Config, args: &PlotArgs) -> FigureOptions {
    let mut options = config.figure.clone();
    if let Some(width) = args.width {
        options.width_cm = width;
    }
    if args.height.is_some() {
        options.height_cm = args.height;
    }
    if args.plot_width.is_some() {
        options.plot_width_cm = args.plot_width;
    }
    if let Some(dpi) = args.dpi {
        options.dpi = dpi;
    }
    if args.title.is_some() {
        options.title = args.title.clone();
    }
    if args.font_size.is_some() {
        options.font_size = args.font_size;
    }
    if let Some(fraction) = args.track_label_fraction {
        options.track_label_fraction = fraction;
    }
    if let Some(align) = args.track_label_halign {
        options.track_label_halign = align.into();
    }
    options.decreasing_x_axis |= args.decreasing_x_axis;
    options
}

/// `out` with the configured extension when it has none.
pub fn output_path(out: &Path, default_format: &str) -> PathBuf {
    if out.extension().is_some() {
        out.to_path_buf()
    } else {
        out.with_extension(default_format)
    }
}

/// `{stem}_{chrom}-{start}-{end}.{ext}` next to `out`.
pub fn batch_output_path(out: &Path, region: &Region) -> PathBuf {
    let stem = out.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = out.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
    let name = format!("{}_{}.{}", stem, region.file_tag(), ext);
    match out.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

fn read_regions(bed: &Path) -> Result<Vec<Region>> {
    if !bed.exists() {
        return Err(CliError::file_not_found(bed.to_path_buf()).into());
    }
    let records = BedReader::read_file(bed)
        .map_err(|e| CliError::region(e.to_string()))
        .with_context(|| format!("Failed to read regions from {}", bed.display()))?;
    records
        .into_iter()
        .map(|r| Region::new(r.chrom, r.start, r.end).map_err(|e| anyhow::Error::from(CliError::region(e.to_string()))))
        .collect()
}

pub fn execute(config: &Config, args: PlotArgs) -> Result<()> {
    if !args.tracks.exists() {
        return Err(CliError::file_not_found(args.tracks.clone()).into());
    }
    let options = figure_options(config, &args);
    let out = output_path(&args.out, &config.output.format);

    let mut figure = Figure::from_tracks_file(&args.tracks, options)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to set up tracks from {}", args.tracks.display()))?;

    let jobs: Vec<(Region, PathBuf)> = match (&args.region, &args.bed) {
        (Some(text), _) => {
            let region = Region::parse(text).map_err(|e| CliError::region(e.to_string()))?;
            vec![(region, out)]
        }
        (None, Some(bed)) => read_regions(bed)?
            .into_iter()
            .map(|region| {
                let path = batch_output_path(&out, &region);
                (region, path)
            })
            .collect(),
        (None, None) => return Err(CliError::region("either --region or --BED is required").into()),
    };

    log::info!("Plotting {} region(s)", jobs.len());
    for (region, path) in jobs {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(CliError::from)?;
        }
        figure
            .plot(&region, &path)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to plot {}", region))?;
    }
    Ok(())
}
