// THEORY:
// The `GroupAggregator` turns the first k samples of an ensemble into one averaged
// frame and summarizes that frame with two global scalars. It is the layer where
// the noise actually gets cancelled out.
//
// Algorithm:
// 1.  Validate everything before reading a single intensity: k in [1, |samples|],
//     a non-empty set, and every sample sharing the shape of sample 0.
// 2.  Accumulate the k frames position by position into an f64 buffer, then divide
//     by k. This is the floating-point mean image. Summing 8-bit values in f64 keeps
//     several hundred samples far away from any overflow or precision loss.
// 3.  `average` is the mean of every value of the mean image, and `variance` is the
//     mean squared deviation from that average. Both are single global numbers.
// 4.  Only after the statistics are taken is the mean image rounded to 8 bits for
//     storage, so quantization never leaks into the reported numbers.
//
// The global statistics above are what the reporting layer consumes. The textbook
// per-pixel ensemble quantities (mean and variance of each position across the k
// samples) are a different measurement and are exposed as their own operation,
// `pixelwise_statistics`.

use crate::core_modules::frame::frame::{Dimensions, Frame, Intensity};
use crate::core_modules::sample_set::SampleSet;
use crate::core_modules::stat_result::{StatResult, mean_and_variance};
use crate::error::{AveragingError, Result};
use tracing::debug;

/// The outcome of averaging one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub stat: StatResult,
    /// The mean image, rounded and clamped to 8 bits.
    pub mean_image: Frame,
}

/// Per-position ensemble statistics across the first k samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelwiseStatistics {
    pub k: usize,
    pub dimensions: Dimensions,
    /// Ensemble mean of every stored value, row-major.
    pub mean: Vec<f64>,
    /// Ensemble (population) variance of every stored value, row-major.
    pub variance: Vec<f64>,
    /// Mean of `variance` over all positions.
    pub mean_variance: f64,
}

/// Averages the first `k` samples and returns the mean image with its global
/// average and variance.
pub fn aggregate(samples: &SampleSet, k: usize) -> Result<GroupAggregate> {
    let group = validate_group(samples, k)?;
    let reference = &group[0];

    let mean = mean_image(group);
    let (average, variance) = mean_and_variance(mean.iter().copied());
    debug!(k, average, variance, "aggregated sample group");

    let rounded: Vec<Intensity> = mean
        .iter()
        .map(|v| v.round().clamp(0.0, 255.0) as Intensity)
        .collect();
    let mean_image = Frame::new(reference.height(), reference.width(), reference.channels(), rounded)?;

    Ok(GroupAggregate {
        stat: StatResult {
            k,
            average,
            variance,
        },
        mean_image,
    })
}

/// Per-pixel ensemble mean and variance across the first `k` samples.
pub fn pixelwise_statistics(samples: &SampleSet, k: usize) -> Result<PixelwiseStatistics> {
    let group = validate_group(samples, k)?;

    let mean = mean_image(group);
    let mut squared_deviation = vec![0.0f64; mean.len()];
    for frame in group {
        for ((acc, &value), &m) in squared_deviation.iter_mut().zip(frame.data()).zip(&mean) {
            *acc += (value as f64 - m).powi(2);
        }
    }
    let variance: Vec<f64> = squared_deviation.into_iter().map(|s| s / k as f64).collect();
    let (mean_variance, _) = mean_and_variance(variance.iter().copied());

    Ok(PixelwiseStatistics {
        k,
        dimensions: group[0].dimensions(),
        mean,
        variance,
        mean_variance,
    })
}

/// Fail-fast checks shared by every aggregation entry point. Returns the group.
fn validate_group(samples: &SampleSet, k: usize) -> Result<&[Frame]> {
    if samples.is_empty() {
        return Err(AveragingError::invalid("samples", "sample set is empty"));
    }
    if k == 0 {
        return Err(AveragingError::invalid("k", "group size must be at least 1"));
    }
    let group = samples.first(k).ok_or_else(|| {
        AveragingError::invalid(
            "k",
            format!("group size {k} exceeds the {} available samples", samples.len()),
        )
    })?;

    let expected = samples.frames()[0].dimensions();
    if let Some((index, frame)) = samples
        .iter()
        .enumerate()
        .find(|(_, frame)| frame.dimensions() != expected)
    {
        return Err(AveragingError::DimensionMismatch {
            index,
            expected,
            found: frame.dimensions(),
        });
    }
    if group[0].is_empty() {
        return Err(AveragingError::invalid("samples", "samples have no pixels"));
    }
    Ok(group)
}

/// Accumulate-then-divide pass producing the floating-point mean image.
fn mean_image(group: &[Frame]) -> Vec<f64> {
    let mut sum = vec![0.0f64; group[0].data().len()];
    for frame in group {
        for (acc, &value) in sum.iter_mut().zip(frame.data()) {
            *acc += value as f64;
        }
    }
    let count = group.len() as f64;
    sum.iter_mut().for_each(|v| *v /= count);
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::noise_ratio::{NoiseRatio, NoiseRatioRange};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noisy_set(reference: &Frame, count: usize, ratio: f64, seed: u64) -> SampleSet {
        let range = NoiseRatioRange::fixed(NoiseRatio::new(ratio).expect("ratio"));
        SampleSet::generate(reference, count, &range, &mut StdRng::seed_from_u64(seed))
            .expect("generate")
    }

    #[test]
    fn single_sample_group_matches_direct_statistics() {
        let reference = Frame::gray(10, 10, (0..100).map(|i| (i * 2) as u8).collect())
            .expect("frame");
        let samples = noisy_set(&reference, 3, 0.1, 21);
        let group = aggregate(&samples, 1).expect("aggregate");
        let (average, variance) = samples.frames()[0].statistics();
        assert_relative_eq!(group.stat.average, average, epsilon = 1e-9);
        assert_relative_eq!(group.stat.variance, variance, epsilon = 1e-9);
        assert_eq!(&group.mean_image, &samples.frames()[0]);
    }

    #[test]
    fn mean_image_is_pixelwise_average() {
        let samples = SampleSet::from_frames(vec![
            Frame::gray(1, 3, vec![0, 10, 255]).expect("frame"),
            Frame::gray(1, 3, vec![1, 20, 255]).expect("frame"),
        ]);
        let group = aggregate(&samples, 2).expect("aggregate");
        // 0.5 rounds away from zero.
        assert_eq!(group.mean_image.data(), &[1, 15, 255]);
        // Statistics come from the unrounded mean (0.5, 15, 255).
        assert_relative_eq!(group.stat.average, (0.5 + 15.0 + 255.0) / 3.0);
    }

    #[test]
    fn statistics_use_unrounded_mean() {
        let samples = SampleSet::from_frames(vec![
            Frame::gray(1, 2, vec![0, 0]).expect("frame"),
            Frame::gray(1, 2, vec![1, 0]).expect("frame"),
        ]);
        let group = aggregate(&samples, 2).expect("aggregate");
        assert_relative_eq!(group.stat.average, 0.25);
        assert_relative_eq!(group.stat.variance, 0.0625);
    }

    #[test]
    fn rejects_out_of_range_group_sizes() {
        let samples = noisy_set(&Frame::filled(5, 5, 128), 4, 0.1, 1);
        for k in [0, 5] {
            let err = aggregate(&samples, k).unwrap_err();
            assert!(
                matches!(err, AveragingError::InvalidParameter { parameter: "k", .. }),
                "k = {k}"
            );
        }
    }

    #[test]
    fn rejects_empty_sample_set() {
        let err = aggregate(&SampleSet::new(), 1).unwrap_err();
        assert!(matches!(err, AveragingError::InvalidParameter { parameter: "samples", .. }));
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let mut samples = noisy_set(&Frame::filled(8, 8, 128), 3, 0.1, 2);
        samples.push(Frame::filled(8, 9, 128));
        let err = aggregate(&samples, 2).unwrap_err();
        match err {
            AveragingError::DimensionMismatch {
                index,
                expected,
                found,
            } => {
                assert_eq!(index, 3);
                assert_eq!(expected, (8, 8, 1));
                assert_eq!(found, (8, 9, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn constant_gray_round_trip() {
        let reference = Frame::filled(50, 50, 128);
        let samples = noisy_set(&reference, 10, 0.1, 2024);
        let single = aggregate(&samples, 1).expect("k = 1");
        let group = aggregate(&samples, 10).expect("k = 10");
        assert!((group.stat.average - 128.0).abs() < 3.0, "average {}", group.stat.average);
        assert!(
            group.stat.variance < single.stat.variance / 2.0,
            "variance {} vs single {}",
            group.stat.variance,
            single.stat.variance
        );
    }

    #[test]
    fn variance_falls_across_standard_group_sizes() {
        let reference = Frame::filled(48, 48, 128);
        let range = NoiseRatioRange::fixed(NoiseRatio::new(0.05).expect("ratio"));
        let sizes = [1, 5, 10, 50, 100, 500];
        for trial in 0..3u64 {
            let samples = SampleSet::generate(
                &reference,
                500,
                &range,
                &mut StdRng::seed_from_u64(100 + trial),
            )
            .expect("generate");
            let variances: Vec<f64> = sizes
                .iter()
                .map(|&k| aggregate(&samples, k).expect("aggregate").stat.variance)
                .collect();
            for pair in variances.windows(2) {
                assert!(pair[1] < pair[0], "trial {trial}: {variances:?}");
            }
            assert!(variances[5] < variances[0] / 50.0, "trial {trial}: {variances:?}");
        }
    }

    #[test]
    fn pixelwise_variance_shrinks_like_one_over_k_of_its_mean() {
        let reference = Frame::filled(20, 20, 128);
        let samples = noisy_set(&reference, 50, 0.1, 77);
        let stats = pixelwise_statistics(&samples, 50).expect("pixelwise");
        assert_eq!(stats.mean.len(), 400);
        assert_eq!(stats.variance.len(), 400);
        // Per-pixel variance of a single 0.1 salt-and-pepper draw around 128 is about
        // 0.1 * 128^2; allow generous slack.
        assert!(stats.mean_variance > 800.0 && stats.mean_variance < 2500.0);
        let global = aggregate(&samples, 50).expect("aggregate");
        assert_relative_eq!(
            stats.mean.iter().sum::<f64>() / 400.0,
            global.stat.average,
            epsilon = 1e-9
        );
    }

    #[test]
    fn pixelwise_variance_is_zero_for_identical_samples() {
        let frame = Frame::gray(2, 2, vec![5, 6, 7, 8]).expect("frame");
        let samples = SampleSet::from_frames(vec![frame.clone(), frame.clone(), frame]);
        let stats = pixelwise_statistics(&samples, 3).expect("pixelwise");
        assert!(stats.variance.iter().all(|&v| v == 0.0));
        assert_eq!(stats.mean, vec![5.0, 6.0, 7.0, 8.0]);
    }
}
