// THEORY:
// The `pipeline` module is the top-level API of the averaging engine. It wires the
// two core stages into one call:
//
// Stage 1: Sample Synthesis - draw `sample_count` corrupted copies of the reference,
//          each with its own noise ratio, in generation order.
// Stage 2: Grayscale Folding - the aggregator measures single-channel intensity, so
//          color samples are collapsed to luma before averaging.
// Stage 3: Grouped Averaging - for every configured group size k, in increasing
//          order, average the first k samples and record (k, average, variance).
//
// All parameters are validated when the pipeline is built and again against the
// actual sample count before any group is averaged, so a bad configuration never
// produces a partial table.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::group_aggregator::aggregate;
use crate::core_modules::noise_ratio::NoiseRatioRange;
use crate::core_modules::sample_set::SampleSet;
use crate::error::{AveragingError, Result};
use crate::parallel_pipeline::ParallelSampler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub use crate::core_modules::stat_result::StatResult;

pub const DEFAULT_SAMPLE_COUNT: usize = 500;
pub const STANDARD_GROUP_SIZES: [usize; 6] = [1, 5, 10, 50, 100, 500];

/// Configuration for the AveragingPipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many noisy samples to synthesize.
    pub sample_count: usize,
    /// Group sizes to average, strictly increasing, each at most `sample_count`.
    pub group_sizes: Vec<usize>,
    /// Range each sample's noise ratio is drawn from.
    pub ratio_range: NoiseRatioRange,
    /// Fixed seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            group_sizes: STANDARD_GROUP_SIZES.to_vec(),
            ratio_range: NoiseRatioRange::default(),
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(AveragingError::invalid("sample_count", "at least one sample is required"));
        }
        validate_group_sizes(&self.group_sizes, self.sample_count)
    }
}

fn validate_group_sizes(group_sizes: &[usize], available: usize) -> Result<()> {
    if group_sizes.is_empty() {
        return Err(AveragingError::invalid("group_sizes", "no group sizes configured"));
    }
    if group_sizes.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(AveragingError::invalid(
            "group_sizes",
            format!("group sizes must be strictly increasing, got {group_sizes:?}"),
        ));
    }
    if let Some(&k) = group_sizes.iter().find(|&&k| k == 0 || k > available) {
        return Err(AveragingError::invalid(
            "group_sizes",
            format!("group size {k} is outside [1, {available}]"),
        ));
    }
    Ok(())
}

/// The averaged image and statistics of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    pub stat: StatResult,
    pub image: Frame,
}

/// Everything a run produced, in generation / increasing-k order.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub samples: SampleSet,
    pub groups: Vec<GroupOutcome>,
}

impl PipelineOutcome {
    pub fn stats(&self) -> Vec<StatResult> {
        self.groups.iter().map(|group| group.stat).collect()
    }
}

/// The main, top-level struct for the averaging engine.
pub struct AveragingPipeline {
    config: PipelineConfig,
}

impl AveragingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generates the sample set on the calling thread and aggregates every group.
    pub fn run(&self, reference: &Frame) -> Result<PipelineOutcome> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        // Stage 1: Sample Synthesis
        info!(count = self.config.sample_count, "generating noisy samples");
        let samples = SampleSet::generate(
            reference,
            self.config.sample_count,
            &self.config.ratio_range,
            &mut rng,
        )?;

        self.run_with_samples(samples)
    }

    /// Same as [`run`](Self::run), with samples generated on a tokio worker pool.
    /// `workers == 0` sizes the pool to the number of CPUs.
    pub async fn run_parallel(&self, reference: &Frame, workers: usize) -> Result<PipelineOutcome> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        info!(
            count = self.config.sample_count,
            seed, "generating noisy samples in parallel"
        );
        let sampler =
            ParallelSampler::new(reference.clone(), self.config.ratio_range, seed, workers)?;
        let samples = sampler.generate(self.config.sample_count).await?;

        self.run_with_samples(samples)
    }

    /// Aggregates every configured group over an existing sample set, e.g. one
    /// reloaded from disk.
    pub fn run_with_samples(&self, samples: SampleSet) -> Result<PipelineOutcome> {
        validate_group_sizes(&self.config.group_sizes, samples.len())?;

        // Stage 2: Grayscale Folding
        let grayscale = samples.to_grayscale();

        // Stage 3: Grouped Averaging
        info!(groups = ?self.config.group_sizes, "averaging sample groups");
        let mut groups = Vec::with_capacity(self.config.group_sizes.len());
        for &k in &self.config.group_sizes {
            let aggregate = aggregate(&grayscale, k)?;
            debug!(
                k,
                average = aggregate.stat.average,
                variance = aggregate.stat.variance,
                "group complete"
            );
            groups.push(GroupOutcome {
                stat: aggregate.stat,
                image: aggregate.mean_image,
            });
        }

        Ok(PipelineOutcome { samples, groups })
    }
}
