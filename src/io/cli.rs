//! Command-line interface: train generators from PNG maps, then generate

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use crate::algorithm::generator::GenerateOptions;
use crate::algorithm::trainer::{BuildConfig, Builder, spawn_build};
use crate::analysis::ingest::TrainingMap;
use crate::io::configuration::{
    DEFAULT_EPOCHS, DEFAULT_LR_END, DEFAULT_LR_START, DEFAULT_RADIUS, DEFAULT_SEED,
    DEFAULT_TEMPERATURE, MAX_REGION_DIMENSION, PROGRESS_POLL_MS,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::{Palette, export_png_map, load_png_map, load_png_map_with};
use crate::io::persist::{TrainedBundle, load_bundle, save_bundle};
use crate::io::progress::TrainingDisplay;
use crate::spatial::geometry::{BorderFlags, ConnectivityKind};
use crate::spatial::region::Region;
use crate::spatial::tiles::{MapBuffer, TileGrid};

#[derive(Parser)]
#[command(name = "tileweave")]
#[command(
    author,
    version,
    about = "Learn tilemap generators from example images and generate new maps"
)]
/// Command-line arguments for the tileweave tool
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand)]
pub enum Command {
    /// Train a generator from one or more example PNGs
    Train(TrainArgs),
    /// Generate a map from a trained generator
    Generate(GenerateArgs),
}

/// Grid connectivity choices on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConnectivityArg {
    Four,
    Eight,
    Hex,
}

impl From<ConnectivityArg> for ConnectivityKind {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Four => Self::Four,
            ConnectivityArg::Eight => Self::Eight,
            ConnectivityArg::Hex => Self::Hex,
        }
    }
}

/// Border side choices on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SideArg {
    Top,
    Bottom,
    Left,
    Right,
}

fn fold_sides(sides: &[SideArg]) -> BorderFlags {
    let mut flags = BorderFlags::default();
    for side in sides {
        match side {
            SideArg::Top => flags.top = true,
            SideArg::Bottom => flags.bottom = true,
            SideArg::Left => flags.left = true,
            SideArg::Right => flags.right = true,
        }
    }
    flags
}

/// Arguments for training
#[derive(Args)]
pub struct TrainArgs {
    /// Example PNG maps
    #[arg(value_name = "PNG", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Neighborhood radius of the classifier
    #[arg(long, default_value_t = DEFAULT_RADIUS)]
    pub radius: usize,

    /// Grid connectivity to learn and enforce
    #[arg(long, value_enum, default_value_t = ConnectivityArg::Four)]
    pub connectivity: ConnectivityArg,

    /// Number of training epochs
    #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
    pub epochs: u64,

    /// Learning rate at the first epoch
    #[arg(long, default_value_t = DEFAULT_LR_START)]
    pub lr_start: f64,

    /// Learning rate approached at the last epoch
    #[arg(long, default_value_t = DEFAULT_LR_END)]
    pub lr_end: f64,

    /// Treat transparent pixels as a real tile instead of holes
    #[arg(long)]
    pub empty_as_tile: bool,

    /// Border sides to enforce against observed border occupancy
    #[arg(long, value_enum, value_delimiter = ',')]
    pub enforce_border: Vec<SideArg>,

    /// Border sides the classifier may sense beyond the region
    #[arg(long, value_enum, value_delimiter = ',')]
    pub acknowledge: Vec<SideArg>,

    /// Relative sampling weight per input, one value per PNG
    #[arg(long, value_delimiter = ',')]
    pub commonality: Vec<f64>,

    /// Random seed for reproducible training
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Output path for the trained generator
    #[arg(short, long, default_value = "generator.bin")]
    pub out: PathBuf,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for generation
#[derive(Args)]
pub struct GenerateArgs {
    /// Path to a trained generator
    #[arg(short, long)]
    pub model: PathBuf,

    /// Output width in cells
    #[arg(short = 'W', long)]
    pub width: usize,

    /// Output height in cells
    #[arg(short = 'H', long)]
    pub height: usize,

    /// PNG whose pixels preset cells of the output
    #[arg(short, long)]
    pub prefill: Option<PathBuf>,

    /// Collapse randomness; negative is near-deterministic, positive noisy
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Discard conflicting preset tiles instead of failing
    #[arg(short, long)]
    pub forceful: bool,

    /// Random seed for reproducible generation
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Output PNG path
    #[arg(short, long, default_value = "generated.png")]
    pub out: PathBuf,
}

/// Run a parsed command
///
/// # Errors
///
/// Propagates build, generation, and io failures.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train(args) => train(args),
        Command::Generate(args) => generate(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    if !args.commonality.is_empty() && args.commonality.len() != args.inputs.len() {
        return Err(invalid_parameter(
            "commonality",
            &args.commonality.len(),
            &"one weight per input PNG is required",
        ));
    }

    let mut palette = Palette::new();
    let mut maps = Vec::with_capacity(args.inputs.len());
    for (index, input) in args.inputs.iter().enumerate() {
        let buffer = load_png_map(input, &mut palette)?;
        let bounds = buffer.occupied_bounds(0).ok_or_else(|| {
            invalid_parameter(
                "input",
                &input.display(),
                &"image contains no opaque pixels",
            )
        })?;
        let weight = args.commonality.get(index).copied().unwrap_or(1.0);
        maps.push(TrainingMap::from_grid(&buffer, bounds, weight));
    }
    info!(
        "loaded {} example maps, {} distinct colors",
        maps.len(),
        palette.len()
    );

    let config = BuildConfig {
        radius: args.radius,
        connectivity: args.connectivity.into(),
        enforce_borders: fold_sides(&args.enforce_border),
        acknowledge_bounds: fold_sides(&args.acknowledge),
        empty_as_tile: args.empty_as_tile,
        lr_start: args.lr_start,
        lr_end: args.lr_end,
        epochs: args.epochs,
        seed: args.seed,
        ..BuildConfig::default()
    };

    let builder = Builder::new(maps, config)?;
    let handle = spawn_build(builder);

    let display = (!args.quiet).then(|| TrainingDisplay::new(args.epochs));
    while !handle.is_finished() {
        if let Some(display) = &display {
            display.update(&handle.progress());
        }
        std::thread::sleep(Duration::from_millis(PROGRESS_POLL_MS));
    }
    if let Some(display) = &display {
        let progress = handle.progress();
        display.update(&progress);
        display.finish(&format!("final loss {:.4}", progress.loss_last));
    }

    let generator = handle.join()?;
    info!(
        "trained {} unique tiles over {} epochs",
        generator.unique_count(),
        generator.epochs_trained()
    );

    save_bundle(
        &TrainedBundle {
            generator,
            palette,
        },
        &args.out,
    )
}

fn generate(args: GenerateArgs) -> Result<()> {
    if args.width == 0
        || args.height == 0
        || args.width > MAX_REGION_DIMENSION
        || args.height > MAX_REGION_DIMENSION
    {
        return Err(invalid_parameter(
            "size",
            &format!("{}x{}", args.width, args.height),
            &format!("dimensions must be in 1..={MAX_REGION_DIMENSION}"),
        ));
    }

    let bundle = load_bundle(&args.model)?;
    let mut grid = match &args.prefill {
        Some(prefill) => load_png_map_with(prefill, &bundle.palette)?,
        None => MapBuffer::new(bundle.generator.layer_count()),
    };

    let region = Region::new([0, 0], [args.width, args.height]);
    let options = GenerateOptions {
        temperature: args.temperature,
        forceful: args.forceful,
        seed: args.seed,
    };
    bundle.generator.generate(&mut grid, region, &options)?;

    export_png_map(&grid, &bundle.palette, region, &args.out)?;
    info!("wrote {}", args.out.display());
    Ok(())
}
