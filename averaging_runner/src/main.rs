use anyhow::Context;
use averaging_report::{ReportInput, RunSummary, write_reports};
use clap::Parser;
use noise_averaging::core_modules::utils::image_helper;
use noise_averaging::{AveragingPipeline, NoiseRatioRange, PipelineConfig, PipelineOutcome};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demonstrates noise reduction by averaging: corrupts a reference image many
/// times with salt-and-pepper noise, averages growing groups of the copies and
/// reports how the variance falls.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Reference image.
    input: PathBuf,

    /// Directory for averaged images and reports.
    #[arg(long, default_value = "result")]
    output: PathBuf,

    /// Directory the noisy samples are persisted to (and reloaded from).
    #[arg(long, default_value = "noisy_samples")]
    samples_dir: PathBuf,

    /// Number of noisy samples to generate.
    #[arg(long)]
    samples: Option<usize>,

    /// Comma-separated, increasing group sizes, e.g. 1,5,10,50,100,500.
    #[arg(long, value_delimiter = ',')]
    group_sizes: Option<Vec<usize>>,

    /// Lower bound of the per-sample noise ratio.
    #[arg(long)]
    min_ratio: Option<f64>,

    /// Upper bound of the per-sample noise ratio.
    #[arg(long)]
    max_ratio: Option<f64>,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Generate samples on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker count for --parallel (0 = one per CPU).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Reload previously persisted samples instead of generating new ones.
    #[arg(long, conflicts_with = "parallel")]
    reuse_samples: bool,

    /// Do not write the noisy samples to disk.
    #[arg(long, conflicts_with = "reuse_samples")]
    no_persist: bool,

    /// JSON file with pipeline settings; command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose trace output on stderr.
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(samples) = cli.samples {
        config.sample_count = samples;
    }
    if let Some(group_sizes) = &cli.group_sizes {
        config.group_sizes = group_sizes.clone();
    }
    if cli.min_ratio.is_some() || cli.max_ratio.is_some() {
        let min = cli.min_ratio.unwrap_or(config.ratio_range.min().value());
        let max = cli.max_ratio.unwrap_or(config.ratio_range.max().value());
        config.ratio_range = NoiseRatioRange::new(min, max)?;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    config.validate()?;
    Ok(config)
}

async fn produce_outcome(
    cli: &Cli,
    pipeline: &AveragingPipeline,
    reference: &noise_averaging::Frame,
) -> anyhow::Result<PipelineOutcome> {
    let sample_count = pipeline.config().sample_count;

    if cli.reuse_samples {
        info!(dir = %cli.samples_dir.display(), "reloading persisted samples");
        let samples = image_helper::load_sample_prefix(&cli.samples_dir, sample_count)
            .context("reloading persisted samples")?;
        return Ok(pipeline.run_with_samples(samples)?);
    }

    let outcome = if cli.parallel {
        pipeline.run_parallel(reference, cli.workers).await?
    } else {
        pipeline.run(reference)?
    };

    if !cli.no_persist {
        image_helper::save_sample_set(&cli.samples_dir, &outcome.samples)
            .with_context(|| format!("persisting samples to {}", cli.samples_dir.display()))?;
    }
    Ok(outcome)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    // --- 1. Configuration ---
    let config = build_config(&cli)?;
    let pipeline = AveragingPipeline::new(config)?;

    // --- 2. Reference Image ---
    let reference = image_helper::load(&cli.input)
        .with_context(|| format!("reading reference image {}", cli.input.display()))?;
    info!(
        height = reference.height(),
        width = reference.width(),
        channels = reference.channels(),
        "loaded reference image"
    );

    // --- 3. Samples & Grouped Averaging ---
    let outcome = produce_outcome(&cli, &pipeline, &reference).await?;

    // --- 4. Averaged Images ---
    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;
    let reference_path = cli.output.join("original.png");
    image_helper::save(&reference_path, &reference)?;

    let mut group_image_hrefs = Vec::with_capacity(outcome.groups.len());
    for group in &outcome.groups {
        let path = image_helper::result_path(&cli.output, group.stat.k);
        image_helper::save(&path, &group.image)?;
        info!(k = group.stat.k, path = %path.display(), "saved averaged image");
        group_image_hrefs.push(file_name(&path));
    }

    // --- 5. Reports ---
    let summary = RunSummary {
        sample_count: outcome.samples.len(),
        seed: pipeline.config().seed,
        stats: outcome.stats(),
    };
    let written = write_reports(
        &cli.output,
        &ReportInput {
            title: "Image Denoising Through Averaging".to_string(),
            reference_href: file_name(&reference_path),
            summary: summary.clone(),
            group_image_hrefs,
        },
    )?;
    info!(csv = %written.csv.display(), html = %written.html.display(), "reports written");

    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let summary = run(cli).await?;

    println!("{:>8}  {:>12}  {:>16}", "k", "average", "variance");
    for stat in &summary.stats {
        println!("{:>8}  {:>12.4}  {:>16.4}", stat.k, stat.average, stat.variance);
    }
    Ok(())
}
