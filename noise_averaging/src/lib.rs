// THEORY:
// This file is the main entry point for the `noise_averaging` library crate.
// It exposes the averaging engine: synthesize many salt-and-pepper corrupted
// copies of a reference image, average growing groups of them, and measure how
// the variance of the averaged image falls as the group grows.
//
// The high-level interface is `AveragingPipeline` (sequential) and its
// `run_parallel` variant backed by `ParallelSampler`. The building blocks in
// `core_modules` (frames, the noise injector, the group aggregator and the file
// helpers) are public as well, so callers can drive each stage on their own.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::frame::frame::Frame;
pub use core_modules::group_aggregator::{
    GroupAggregate, PixelwiseStatistics, aggregate, pixelwise_statistics,
};
pub use core_modules::noise_injector::{NoiseCensus, inject, inject_with_census};
pub use core_modules::noise_ratio::{NoiseRatio, NoiseRatioRange};
pub use core_modules::sample_set::SampleSet;
pub use core_modules::stat_result::StatResult;
pub use error::{AveragingError, Result};
pub use pipeline::{AveragingPipeline, GroupOutcome, PipelineConfig, PipelineOutcome};
