use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use config::Config;
use error::{suggestions, CliError};
use trackfig_render::LabelAlign;

#[derive(Parser)]
#[command(name = "trackfig")]
#[command(about = "Stacked genome-track figures from a tracks file")]
#[command(version)]
#[command(long_about = "
trackfig draws coverage, genes, peaks, links, Hi-C matrices and alignments
as stacked panels sharing one genomic x axis.

Examples:
  trackfig make-tracks-file --trackFiles signal.bw genes.bed.gz -o tracks.ini
  trackfig plot --tracks tracks.ini --region chr2:10,000,000-11,000,000 -o locus.png
  trackfig plot --tracks tracks.ini --BED regions.bed -o figures/locus.svg
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plot one region, or every region of a BED file
    Plot(PlotArgs),

    /// Write a tracks file with default settings for the given files
    #[command(name = "make-tracks-file")]
    MakeTracksFile {
        /// Track data files, in drawing order
        #[arg(long = "trackFiles", short = 'f', num_args = 1.., required = true)]
        track_files: Vec<PathBuf>,

        /// Tracks file to write
        #[arg(short, long = "out", required = true)]
        out: PathBuf,
    },
}

#[derive(clap::Args, Clone, Debug)]
pub struct PlotArgs {
    /// Tracks file (.ini)
    #[arg(long, required = true)]
    pub tracks: PathBuf,

    /// Region to plot, e.g. chr1:1,000,000-2,000,000
    #[arg(long, conflicts_with = "bed", required_unless_present = "bed")]
    pub region: Option<String>,

    /// BED file with one region to plot per line
    #[arg(long = "BED")]
    pub bed: Option<PathBuf>,

    /// Output file; .svg or .png
    #[arg(short, long = "outFileName", required = true)]
    pub out: PathBuf,

    /// Figure width in cm
    #[arg(long)]
    pub width: Option<f64>,

    /// Figure height in cm; panel heights are scaled to fit
    #[arg(long)]
    pub height: Option<f64>,

    /// Width of the plot column in cm; the figure width is derived from it
    #[arg(long = "plotWidth")]
    pub plot_width: Option<f64>,

    /// Resolution in dots per inch
    #[arg(long)]
    pub dpi: Option<f64>,

    /// Figure title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Label font size in points
    #[arg(long = "fontSize")]
    pub font_size: Option<f64>,

    /// Fraction of the width used by track labels
    #[arg(long = "trackLabelFraction")]
    pub track_label_fraction: Option<f64>,

    /// Horizontal alignment of track labels
    #[arg(long = "trackLabelHAlign")]
    pub track_label_halign: Option<HAlign>,

    /// Draw the region start on the right
    #[arg(long = "decreasingXAxis")]
    pub decreasing_x_axis: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum HAlign {
    Left,
    Right,
    Center,
}

impl From<HAlign> for LabelAlign {
    fn from(align: HAlign) -> Self {
        match align {
            HAlign::Left => LabelAlign::Left,
            HAlign::Right => LabelAlign::Right,
            HAlign::Center => LabelAlign::Center,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Plot(args) => commands::plot::execute(&config, args),
        Commands::MakeTracksFile { track_files, out } => commands::make_tracks::execute(&track_files, &out),
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        let hint = err.downcast_ref::<CliError>().map(suggestions).unwrap_or("");
        eprintln!("Error: {:#}{}", err, hint);
        std::process::exit(1);
    }
}
