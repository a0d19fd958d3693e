//! Layers CLI - Command-line driver for the layer composition library
//!
//! Usage:
//!   layers-cli process <job.json> [-o summary.json] [--svg-dir DIR] [-j N]
//!   layers-cli check <job.json>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use slicer_layers::{ClassicPerimeterGenerator, ObjectDescription, PrintObject};
use std::fs;
use std::path::{Path, PathBuf};

/// Merge per-region slices into layers and generate perimeters
#[derive(Parser, Debug)]
#[command(name = "layers-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process a job: merge slices and generate perimeters on every layer
    Process {
        /// Job description (JSON)
        #[arg(value_name = "JOB")]
        input: PathBuf,

        /// Summary output file (defaults to <JOB>.summary.json)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Write per-layer SVG snapshots into this directory
        #[arg(long, value_name = "DIR")]
        svg_dir: Option<PathBuf>,

        /// Number of threads to use (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,
    },

    /// Validate a job and its region configs without processing it
    Check {
        /// Job description (JSON)
        #[arg(value_name = "JOB")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Process {
            input,
            output,
            svg_dir,
            threads,
        } => cmd_process(input, output, svg_dir, threads),
        Commands::Check { input } => cmd_check(input),
    }
}

fn load_job(input: &Path) -> Result<ObjectDescription> {
    info!("Loading job: {}", input.display());
    let description = ObjectDescription::from_json_file(input)
        .with_context(|| format!("Failed to read job {}", input.display()))?;
    description.validate().context("Invalid job")?;
    Ok(description)
}

fn cmd_process(
    input: PathBuf,
    output: Option<PathBuf>,
    svg_dir: Option<PathBuf>,
    threads: usize,
) -> Result<()> {
    let output_path = output.unwrap_or_else(|| input.with_extension("summary.json"));

    // Set thread count if specified
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to initialize thread pool")?;
    }

    let description = load_job(&input)?;
    let mut object =
        PrintObject::from_description(&description).context("Failed to build layer stack")?;
    info!("Built {}", object);

    let progress = ProgressBar::new(object.layer_count() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} layers {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    progress.set_message("processing...");

    object
        .process_layers(&ClassicPerimeterGenerator, |_| progress.inc(1))
        .context("Layer processing failed")?;
    progress.finish_with_message("done");

    let errors = object.layers().iter().filter(|l| l.slicing_errors()).count();
    if errors > 0 {
        warn!("{} layers carry slicing errors", errors);
    }

    if let Some(dir) = svg_dir {
        export_svg(&object, &dir)?;
    }

    let summary = object.summary();
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let islands: usize = summary.layers.iter().map(|l| l.islands).sum();
    let area: f64 = summary.layers.iter().map(|l| l.island_area).sum();
    println!();
    println!("Processing complete!");
    println!("  Output: {}", output_path.display());
    println!("  Layers: {}", summary.layers.len());
    println!("  Islands: {} ({:.2} mm² total)", islands, area);
    Ok(())
}

#[cfg(feature = "debug-svg")]
fn export_svg(object: &PrintObject, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    for layer in object.layers() {
        let slices = dir.join(format!("layer-{:04}-slices.svg", layer.id()));
        let fills = dir.join(format!("layer-{:04}-fills.svg", layer.id()));
        layer
            .export_region_slices_to_svg(&slices)
            .with_context(|| format!("Failed to write {}", slices.display()))?;
        layer
            .export_region_fill_surfaces_to_svg(&fills)
            .with_context(|| format!("Failed to write {}", fills.display()))?;
    }
    info!("SVG snapshots written to {}", dir.display());
    Ok(())
}

#[cfg(not(feature = "debug-svg"))]
fn export_svg(_object: &PrintObject, dir: &Path) -> Result<()> {
    warn!(
        "--svg-dir {} ignored: built without the debug-svg feature",
        dir.display()
    );
    Ok(())
}

fn cmd_check(input: PathBuf) -> Result<()> {
    let description = load_job(&input)?;
    let surfaces: usize = description
        .layers
        .iter()
        .flat_map(|l| &l.regions)
        .map(|r| r.surfaces.len())
        .sum();

    println!("Job OK: {}", input.display());
    println!("  Regions: {}", description.regions.len());
    println!("  Layers: {}", description.layers.len());
    println!("  Surfaces: {}", surfaces);
    for (idx, config) in description.regions.iter().enumerate() {
        println!("  Region {}: {}", idx, config);
    }
    Ok(())
}
