//! Paleogeo CLI - plate reconstruction from rotation files.
//!
//! Reconstruct feature geometries to their position at a past geological
//! time and inspect rotation models.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use paleogeo::export::{write_geometries, ExportError, ExportFormat};
use paleogeo::feature::{JsonFeatureLoader, MissingPlateIdPolicy};
use paleogeo::ids::PlateId;
use paleogeo::reconstruct::{
    reconstruct, ConfigError, ReconstructConfig, ReconstructError, ReconstructRequest, ReconstructionContext,
    ReconstructionSummary,
};
use paleogeo::registry::{CancellationToken, Registry, Utility, UtilityError, UtilityParams};
use paleogeo::rotation::{
    load_rotation_files, PlateCircuit, RotationConfig, RotationError, RotationFileError, RotationModel,
    TimeRangePolicy,
};

/// Plate reconstruction engine.
#[derive(Parser)]
#[command(name = "paleogeo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct features to a past time and write them to a file.
    Reconstruct {
        /// Reconstructable feature files (JSON feature collections).
        #[arg(short, long = "features", required = true, num_args = 1..)]
        features: Vec<PathBuf>,

        /// Rotation files (PLATES4 .rot).
        #[arg(short, long = "rotations", required = true, num_args = 1..)]
        rotations: Vec<PathBuf>,

        /// Reconstruction time in Ma.
        #[arg(short, long)]
        time: f64,

        /// Anchor plate id.
        #[arg(short, long, default_value = "0")]
        anchor: u32,

        /// Output file, or '-' for stdout.
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (inferred from the output extension if omitted).
        #[arg(long)]
        format: Option<FormatArg>,

        #[command(flatten)]
        options: ConfigArgs,
    },

    /// Print the composed rotation of a plate at a time.
    Rotation {
        /// Rotation files (PLATES4 .rot).
        #[arg(short, long = "rotations", required = true, num_args = 1..)]
        rotations: Vec<PathBuf>,

        /// Moving plate id.
        #[arg(short, long)]
        plate: u32,

        /// Time in Ma.
        #[arg(short, long)]
        time: f64,

        /// Anchor plate id.
        #[arg(short, long, default_value = "0")]
        anchor: u32,

        /// Clamp times outside a rotation sequence to its ends.
        #[arg(long)]
        clamp: bool,
    },

    /// Summarize a set of rotation files.
    Info {
        /// Rotation files (PLATES4 .rot).
        #[arg(required = true)]
        rotations: Vec<PathBuf>,
    },

    /// Reconstruct features at evenly spaced times.
    Sweep {
        /// Reconstructable feature files (JSON feature collections).
        #[arg(short, long = "features", required = true, num_args = 1..)]
        features: Vec<PathBuf>,

        /// Rotation files (PLATES4 .rot).
        #[arg(short, long = "rotations", required = true, num_args = 1..)]
        rotations: Vec<PathBuf>,

        /// First time in Ma.
        #[arg(long, default_value = "0")]
        start: f64,

        /// Last time in Ma.
        #[arg(long, default_value = "100")]
        end: f64,

        /// Time step in Ma.
        #[arg(long, default_value = "10")]
        step: f64,

        /// Anchor plate id.
        #[arg(short, long, default_value = "0")]
        anchor: u32,

        /// Directory for one output file per frame.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format for frame files.
        #[arg(long, default_value = "xy")]
        format: FormatArg,

        #[command(flatten)]
        options: ConfigArgs,
    },
}

/// Reconstruction options shared by subcommands; flags override the config file.
#[derive(clap::Args)]
struct ConfigArgs {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clamp times outside a rotation sequence to its ends.
    #[arg(long)]
    clamp: bool,

    /// Fail features that have no reconstruction plate id.
    #[arg(long)]
    reject_missing_plate_id: bool,

    /// Reconstruct features on a single thread.
    #[arg(long)]
    serial: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Plain lon/lat segments separated by '>'.
    Xy,
    /// Segments with feature metadata headers.
    Gmt,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Xy => ExportFormat::Xy,
            FormatArg::Gmt => ExportFormat::Gmt,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
    #[error(transparent)]
    RotationFile(#[from] RotationFileError),
    #[error(transparent)]
    Rotation(#[from] RotationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Utility(#[from] UtilityError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Reconstruct {
            features,
            rotations,
            time,
            anchor,
            output,
            format,
            options,
        } => run_reconstruct(features, rotations, time, PlateId(anchor), output, format, &options),
        Commands::Rotation {
            rotations,
            plate,
            time,
            anchor,
            clamp,
        } => run_rotation(&rotations, PlateId(plate), time, PlateId(anchor), clamp),
        Commands::Info { rotations } => run_info(&rotations),
        Commands::Sweep {
            features,
            rotations,
            start,
            end,
            step,
            anchor,
            output_dir,
            format,
            options,
        } => run_sweep(
            &features,
            &rotations,
            [start, end, step],
            PlateId(anchor),
            output_dir,
            format.into(),
            &options,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_config(options: &ConfigArgs) -> Result<ReconstructConfig, CliError> {
    let mut config = match &options.config {
        Some(path) => ReconstructConfig::from_json_file(path)?,
        None => ReconstructConfig::default(),
    };
    if options.clamp {
        config.rotation.time_range_policy = TimeRangePolicy::Clamp;
    }
    if options.reject_missing_plate_id {
        config.missing_plate_id = MissingPlateIdPolicy::Reject;
    }
    if options.serial {
        config.parallel = false;
    }
    debug!("Using configuration: {:?}", config);
    Ok(config)
}

fn run_reconstruct(
    features: Vec<PathBuf>,
    rotations: Vec<PathBuf>,
    time: f64,
    anchor: PlateId,
    output: PathBuf,
    format: Option<FormatArg>,
    options: &ConfigArgs,
) -> Result<(), CliError> {
    let config = build_config(options)?;
    let start = Instant::now();

    if output == Path::new("-") {
        if !time.is_finite() || time < 0.0 {
            return Err(ReconstructError::NegativeTime(time).into());
        }
        let format = format.map_or(ExportFormat::Xy, ExportFormat::from);
        let context = ReconstructionContext::load(&features, &rotations, &JsonFeatureLoader, config)?;
        let report = context.reconstruct(time, anchor)?;
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        write_geometries(&mut lock, report.geometries(), format)?;
        lock.flush()?;
        print_failures(&report.summary());
        return Ok(());
    }

    let output_format = match format {
        Some(f) => f.into(),
        None => ExportFormat::from_path(&output)?,
    };
    let request = ReconstructRequest {
        reconstructable_files: features,
        rotation_files: rotations,
        time,
        anchor_plate_id: anchor,
        output_path: output,
        output_format,
    };

    let summary = match reconstruct(&request, &JsonFeatureLoader, &config) {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(summary) = e.summary() {
                print_failures(summary);
            }
            return Err(e.into());
        }
    };

    println!("Paleogeo - Reconstruction");
    println!("=========================");
    println!("Time: {} Ma", summary.time);
    println!("Anchor plate: {}", summary.anchor);
    println!();
    println!("Features:      {:>8}", summary.features);
    println!("  Reconstructed: {:>6}", summary.reconstructed);
    println!("  Not valid:     {:>6}", summary.not_valid);
    println!("  Failed:        {:>6}", summary.failed());
    println!("Geometries:    {:>8}", summary.geometries);
    if let Some(export) = &summary.export {
        println!(
            "Output: {} ({} segments, {} points)",
            request.output_path.display(),
            export.segments,
            export.points
        );
    }
    print_failures(&summary);
    println!("Completed in {:.2?}", start.elapsed());
    Ok(())
}

fn print_failures(summary: &ReconstructionSummary) {
    for (feature, error) in &summary.failures {
        eprintln!("  {}: {}", feature, error);
    }
}

fn run_rotation(
    rotations: &[PathBuf],
    plate: PlateId,
    time: f64,
    anchor: PlateId,
    clamp: bool,
) -> Result<(), CliError> {
    let (store, _) = load_rotation_files(rotations)?;
    let mut config = RotationConfig::default();
    if clamp {
        config.time_range_policy = TimeRangePolicy::Clamp;
    }
    let model = RotationModel::build(store, config)?;

    let rotation = model.rotation(plate, time, anchor)?;
    let (pole, angle) = rotation.to_pole_and_angle();

    println!("Plate {} relative to plate {} at {} Ma", plate, anchor, time);
    println!("  Pole:  {:.4}°N {:.4}°E", pole.lat, pole.lon);
    println!("  Angle: {:.4}°", angle);
    match PlateCircuit::new(&model).path(plate, time) {
        Ok(path) => {
            let names: Vec<String> = path.iter().map(PlateId::to_string).collect();
            println!("  Circuit to root: {}", names.join(" -> "));
        }
        Err(e) => debug!("No circuit path for plate {}: {}", plate, e),
    }
    Ok(())
}

fn run_info(rotations: &[PathBuf]) -> Result<(), CliError> {
    let (store, stats) = load_rotation_files(rotations)?;

    println!("Paleogeo - Rotation Model Info");
    println!("==============================");
    println!();
    println!("Files:           {:>8}", rotations.len());
    println!("Records:         {:>8}", stats.records);
    println!("Comment records: {:>8}", stats.comment_records);
    println!("Duplicates:      {:>8}", stats.duplicates);
    println!("Crossovers:      {:>8}", stats.crossovers);
    println!("Moving plates:   {:>8}", store.len());
    if let Some((youngest, oldest)) = store.time_span() {
        println!("Time span:       {} - {} Ma", youngest, oldest);
    }
    let roots: Vec<String> = store.root_plates().iter().map(PlateId::to_string).collect();
    println!("Root plates:     {}", roots.join(", "));
    println!();

    for plate in store.moving_plates() {
        let Some(sequence) = store.sequence(plate) else {
            continue;
        };
        let mut fixed: Vec<PlateId> = Vec::new();
        for sample in sequence.samples() {
            if !fixed.contains(&sample.fixed_plate) {
                fixed.push(sample.fixed_plate);
            }
        }
        let fixed: Vec<String> = fixed.iter().map(PlateId::to_string).collect();
        let (youngest, oldest) = sequence.time_span().unwrap_or((0.0, 0.0));
        println!(
            "  {}: {:>4} samples, {:>8.2} - {:>8.2} Ma, fixed to {}",
            plate,
            sequence.len(),
            youngest,
            oldest,
            fixed.join(", ")
        );
    }

    match RotationModel::build(store, Default::default()) {
        Ok(_) => println!("\nHierarchy: no cycles"),
        Err(e) => println!("\nHierarchy: {}", e),
    }
    Ok(())
}

fn run_sweep(
    features: &[PathBuf],
    rotations: &[PathBuf],
    [start, end, step]: [f64; 3],
    anchor: PlateId,
    output_dir: Option<PathBuf>,
    format: ExportFormat,
    options: &ConfigArgs,
) -> Result<(), CliError> {
    let config = build_config(options)?;
    let context = ReconstructionContext::load(features, rotations, &JsonFeatureLoader, config)?;

    let mut params = UtilityParams {
        anchor,
        output_dir,
        format,
        ..Default::default()
    };
    params.set_param("start", start).set_param("end", end).set_param("step", step);

    let registry: Registry<dyn Utility> = Registry::with_defaults();
    let cancel = CancellationToken::new();
    let begin = Instant::now();
    let outcome = registry.run("sweep", &context, &params, &cancel)?;

    println!(
        "Sweep finished: {} frames{} in {:.2?}",
        outcome.steps,
        if outcome.cancelled { " (cancelled)" } else { "" },
        begin.elapsed()
    );
    Ok(())
}
