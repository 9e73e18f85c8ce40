//! Theory Plots - standard cosmology plots from a sampler's output directory.
//!
//! Reads the per-section text files a cosmology pipeline writes for a single
//! parameter set and renders every standard plot the directory has data for.

mod catalog;
mod plot;
mod prepare;
mod render;
mod report;
mod sample;

use anyhow::{Context, Result};
use catalog::CATALOG;
use clap::Parser;
use log::warn;
use plot::{ImageType, PlotOptions, PlotOutcome};
use report::RunReport;
use sample::SampleDirectory;
use std::path::PathBuf;

/// Make standard plots of theory predictions from a sample output directory
#[derive(Parser, Debug)]
#[command(name = "theoryplot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of sample output (one sub-directory per section)
    #[arg(required_unless_present = "list")]
    dirname: Option<PathBuf>,

    /// Directory to write plots into (created if missing)
    #[arg(short = 'o', long = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    /// Prefix joined to each plot filename with '_'
    #[arg(short = 'p', long, default_value = "")]
    prefix: String,

    /// Image file type: png, jpg, jpeg, bmp or svg
    #[arg(short = 't', long = "type", default_value = "png")]
    image_type: ImageType,

    /// Only report warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// List the plots this tool knows how to make, then exit
    #[arg(long)]
    list: bool,
}

fn init_logger(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn print_catalog() {
    for descriptor in CATALOG {
        println!("{:<26} {}", descriptor.filename, descriptor.title);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.quiet);

    if args.list {
        print_catalog();
        return Ok(());
    }

    // clap requires DIRNAME whenever --list is absent
    let dirname = args.dirname.context("A sample directory is required")?;
    if !dirname.is_dir() {
        warn!("Sample directory {} does not exist; no plots can be made", dirname.display());
    }

    let sample = SampleDirectory::new(&dirname);
    let options = PlotOptions {
        output_dir: args.output_dir,
        prefix: args.prefix,
        image_type: args.image_type,
    };

    if !args.quiet {
        eprintln!("Loading theory data from: {}", dirname.display());
        eprintln!("Generating plots in: {} (type {})", options.output_dir.display(), options.image_type);
    }
    let outcomes = plot::generate_plots(&sample, &options)?;

    if !args.quiet {
        let rendered: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                PlotOutcome::Rendered { path, .. } => Some(path),
                PlotOutcome::Skipped { .. } => None,
            })
            .collect();
        eprintln!("\nGenerated {} plots:", rendered.len());
        for path in &rendered {
            eprintln!("  • {}", path.display());
        }
        let skipped: Vec<&str> = outcomes
            .iter()
            .filter(|o| matches!(o, PlotOutcome::Skipped { .. }))
            .map(PlotOutcome::filename)
            .collect();
        if !skipped.is_empty() {
            eprintln!("Skipped {} plots with no data: {}", skipped.len(), skipped.join(", "));
        }
    }

    if let Some(report_path) = args.report {
        let report = RunReport::new(&sample, &options, &outcomes);
        report.write(&report_path)?;
        if !args.quiet {
            eprintln!("Report written to: {} ({} rendered)", report_path.display(), report.rendered());
        }
    }

    Ok(())
}
