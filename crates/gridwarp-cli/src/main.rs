use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use clap::{Args, Parser, Subcommand};
use gridwarp_core::backend::Cpu;
use gridwarp_core::{
    BSplineInterpolator, BSplineInterpolatorGpu, BSplineTransform, BSplineTransformGpu,
    BoundaryMode, Execution, Interpolator, SampleOptions, SamplingConfig, SplineOrder,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "gridwarp")]
#[command(about = "Warp synthetic images with random B-spline deformations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deform a checkerboard image and report summary statistics
    Warp(WarpArgs),

    /// Run the same deformation on the host and the device and compare
    Compare(CompareArgs),
}

#[derive(Args, Clone)]
struct DeformArgs {
    /// Image shape, e.g. 256,256 or 64,64,64
    #[arg(long, value_delimiter = ',', default_value = "128,128")]
    shape: Vec<usize>,

    /// Control points per axis of the deformation grid
    #[arg(long, default_value_t = 5)]
    control_points: usize,

    /// Standard deviation of the random displacements, in normalized units
    #[arg(long, default_value_t = 0.05)]
    sigma: f32,

    /// Seed for the random deformation
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct WarpArgs {
    #[command(flatten)]
    deform: DeformArgs,

    /// Spline order (0 to 3; device execution supports 0 and 1)
    #[arg(long)]
    order: Option<u8>,

    /// Boundary mode (constant, nearest, mirror, reflect, wrap)
    #[arg(long)]
    mode: Option<BoundaryMode>,

    /// Fill value for constant mode
    #[arg(long)]
    cval: Option<f32>,

    /// Where to sample (host or device)
    #[arg(long, default_value = "host")]
    execution: Execution,

    /// JSON sampling config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the warped image as raw little-endian f32
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    #[command(flatten)]
    deform: DeformArgs,

    /// Spline order (0 or 1)
    #[arg(long, default_value_t = 1)]
    order: u8,

    /// Boundary mode (constant, nearest, mirror, reflect, wrap)
    #[arg(long, default_value = "constant")]
    mode: BoundaryMode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Warp(args) => warp(&args)?,
        Commands::Compare(args) => compare(&args)?,
    }

    Ok(())
}

fn warp(args: &WarpArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SamplingConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SamplingConfig::default(),
    };
    if let Some(order) = args.order {
        config.order = SplineOrder::new(order)?;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(cval) = args.cval {
        config.cval = cval;
    }
    args.execution.validate(config.order)?;

    info!(
        shape = ?args.deform.shape,
        order = config.order.get(),
        mode = %config.mode,
        execution = %args.execution,
        "warping checkerboard"
    );

    let start = Instant::now();
    let values = run(&args.deform, config, args.execution)?;
    let elapsed = start.elapsed();

    let stats = Stats::of(&values);
    info!(
        min = stats.min,
        max = stats.max,
        mean = stats.mean,
        elapsed_ms = elapsed.as_secs_f64() * 1e3,
        "warp finished"
    );

    if let Some(path) = &args.output {
        write_raw(path, &values)?;
        info!("Wrote {} values to {}", values.len(), path.display());
    }
    Ok(())
}

fn compare(args: &CompareArgs) -> Result<()> {
    let order = Execution::Device.validate(SplineOrder::new(args.order)?)?;
    let config = SamplingConfig::new().with_order(order).with_mode(args.mode);

    let start = Instant::now();
    let host = run(&args.deform, config, Execution::Host)?;
    let host_elapsed = start.elapsed();

    let start = Instant::now();
    let device = run(&args.deform, config, Execution::Device)?;
    let device_elapsed = start.elapsed();

    let max_diff = host
        .iter()
        .zip(&device)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);

    info!(
        order = order.get(),
        mode = %args.mode,
        host_ms = host_elapsed.as_secs_f64() * 1e3,
        device_ms = device_elapsed.as_secs_f64() * 1e3,
        max_abs_diff = max_diff,
        "comparison finished"
    );
    println!("max abs difference: {max_diff:e}");
    Ok(())
}

/// Run one deformation on the backend matching `execution`.
fn run(deform: &DeformArgs, config: SamplingConfig, execution: Execution) -> Result<Vec<f32>> {
    match execution {
        Execution::Host => warp_on::<Cpu>(deform, config, execution, &Default::default()),
        Execution::Device => run_device(deform, config),
    }
}

#[cfg(feature = "wgpu")]
fn run_device(deform: &DeformArgs, config: SamplingConfig) -> Result<Vec<f32>> {
    warp_on::<gridwarp_core::backend::Gpu>(deform, config, Execution::Device, &Default::default())
}

#[cfg(not(feature = "wgpu"))]
fn run_device(deform: &DeformArgs, config: SamplingConfig) -> Result<Vec<f32>> {
    debug!("built without wgpu, running device path on the CPU backend");
    warp_on::<Cpu>(deform, config, Execution::Device, &Default::default())
}

fn warp_on<B: Backend>(
    deform: &DeformArgs,
    config: SamplingConfig,
    execution: Execution,
    device: &B::Device,
) -> Result<Vec<f32>> {
    match deform.shape.len() {
        1 => warp_nd::<B, 1>(to_array(&deform.shape)?, deform, config, execution, device),
        2 => warp_nd::<B, 2>(to_array(&deform.shape)?, deform, config, execution, device),
        3 => warp_nd::<B, 3>(to_array(&deform.shape)?, deform, config, execution, device),
        4 => warp_nd::<B, 4>(to_array(&deform.shape)?, deform, config, execution, device),
        n => bail!("Unsupported image rank {n}; use 1 to 4 comma-separated sizes"),
    }
}

fn warp_nd<B: Backend, const D: usize>(
    shape: [usize; D],
    deform: &DeformArgs,
    config: SamplingConfig,
    execution: Execution,
    device: &B::Device,
) -> Result<Vec<f32>> {
    if deform.control_points == 0 {
        bail!("--control-points must be at least 1");
    }
    let image = checkerboard::<B, D>(shape, device)?;
    let grid_shape = [deform.control_points; D];
    let displacement = random_grid(D * deform.control_points.pow(D as u32), deform.sigma, deform.seed);
    debug!(?grid_shape, sigma = deform.sigma, seed = deform.seed, "random deformation grid");

    let order = config.order.get();
    let warped = match execution {
        Execution::Host => {
            let interpolator = BSplineInterpolator::with_config(image, config)?;
            let transform = BSplineTransform::<B, D>::from_flat(grid_shape, &displacement, order, device)?;
            debug!(%transform, "host transform");
            interpolator.transform(&[&transform], SampleOptions::default())?
        }
        Execution::Device => {
            let interpolator = BSplineInterpolatorGpu::with_config(image, config)?;
            let transform = BSplineTransformGpu::<B, D>::from_flat(grid_shape, &displacement, order, device)?;
            debug!(%transform, "device transform");
            interpolator.transform(&[&transform], SampleOptions::default())?
        }
    };

    warped
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("failed to read warped image: {e:?}"))
}

fn to_array<const D: usize>(shape: &[usize]) -> Result<[usize; D]> {
    shape
        .try_into()
        .map_err(|_| anyhow!("expected {D} sizes, got {}", shape.len()))
}

/// Checkerboard with eight squares along the longest axis.
fn checkerboard<B: Backend, const D: usize>(shape: [usize; D], device: &B::Device) -> Result<Tensor<B, D>> {
    if shape.iter().any(|&s| s == 0) {
        bail!("Image shape {shape:?} has an empty axis");
    }
    let cell = (shape.iter().copied().max().unwrap_or(1) / 8).max(1);
    let total: usize = shape.iter().product();
    let mut values = Vec::with_capacity(total);
    let mut index = [0usize; D];
    for _ in 0..total {
        let parity: usize = index.iter().map(|&i| i / cell).sum();
        values.push((parity % 2) as f32);
        for d in (0..D).rev() {
            index[d] += 1;
            if index[d] < shape[d] {
                break;
            }
            index[d] = 0;
        }
    }
    Ok(Tensor::from_data(TensorData::new(values, shape.to_vec()), device))
}

/// Normally distributed displacements via the Box-Muller transform.
fn random_grid(len: usize, sigma: f32, seed: u64) -> Vec<f32> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut values = Vec::with_capacity(len + 1);
    while values.len() < len {
        let u1 = rng.f64().max(f64::MIN_POSITIVE);
        let u2 = rng.f64();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = std::f64::consts::TAU * u2;
        values.push((radius * angle.cos()) as f32 * sigma);
        values.push((radius * angle.sin()) as f32 * sigma);
    }
    values.truncate(len);
    values
}

fn write_raw(path: &Path, values: &[f32]) -> Result<()> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

struct Stats {
    min: f32,
    max: f32,
    mean: f32,
}

impl Stats {
    fn of(values: &[f32]) -> Self {
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let sum: f64 = values.iter().map(|&v| v as f64).sum();
        Self {
            min,
            max,
            mean: (sum / values.len().max(1) as f64) as f32,
        }
    }
}
