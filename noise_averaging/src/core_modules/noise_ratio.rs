// THEORY:
// A `NoiseRatio` is the target fraction of pixel positions a single sample should
// have forced to black or white. It is validated once, at construction, so the
// injector can trust it. Zero is accepted (the identity case); one and above are
// not, because at 1.0 the pepper and salt bands would meet and every pixel would
// be replaced, which is no longer "noise" on an image.
//
// Each sample draws its own ratio from a `NoiseRatioRange`, so the ensemble mixes
// lightly and heavily corrupted samples the way a real acquisition would.

use crate::error::{AveragingError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct NoiseRatio(f64);

impl NoiseRatio {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            return Err(AveragingError::invalid(
                "ratio",
                format!("noise ratio must lie in [0, 1), got {value}"),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Draws strictly below this value become pepper (0).
    pub fn pepper_threshold(self) -> f64 {
        self.0 / 2.0
    }

    /// Draws strictly above this value become salt (255).
    pub fn salt_threshold(self) -> f64 {
        1.0 - self.0 / 2.0
    }
}

impl TryFrom<f64> for NoiseRatio {
    type Error = AveragingError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NoiseRatio> for f64 {
    fn from(ratio: NoiseRatio) -> f64 {
        ratio.0
    }
}

#[derive(Deserialize)]
struct RatioBounds {
    min: f64,
    max: f64,
}

/// Inclusive range that per-sample noise ratios are drawn from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RatioBounds")]
pub struct NoiseRatioRange {
    min: NoiseRatio,
    max: NoiseRatio,
}

impl NoiseRatioRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let min = NoiseRatio::new(min)?;
        let max = NoiseRatio::new(max)?;
        if min > max {
            return Err(AveragingError::invalid(
                "ratio_range",
                format!("minimum {} exceeds maximum {}", min.value(), max.value()),
            ));
        }
        Ok(Self { min, max })
    }

    /// A degenerate range that always yields `ratio`.
    pub fn fixed(ratio: NoiseRatio) -> Self {
        Self {
            min: ratio,
            max: ratio,
        }
    }

    pub fn min(&self) -> NoiseRatio {
        self.min
    }

    pub fn max(&self) -> NoiseRatio {
        self.max
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> NoiseRatio {
        if self.min == self.max {
            return self.min;
        }
        // Both bounds are already below 1.0, so the draw is too.
        NoiseRatio(rng.random_range(self.min.value()..=self.max.value()))
    }
}

impl Default for NoiseRatioRange {
    fn default() -> Self {
        Self {
            min: NoiseRatio(0.01),
            max: NoiseRatio(0.1),
        }
    }
}

impl TryFrom<RatioBounds> for NoiseRatioRange {
    type Error = AveragingError;

    fn try_from(bounds: RatioBounds) -> Result<Self> {
        Self::new(bounds.min, bounds.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn accepts_zero_and_values_below_one() {
        assert!(NoiseRatio::new(0.0).is_ok());
        assert!(NoiseRatio::new(0.999).is_ok());
    }

    #[test]
    fn rejects_one_negative_and_nan() {
        for bad in [1.0, 1.5, -0.01, f64::NAN, f64::INFINITY] {
            let err = NoiseRatio::new(bad).unwrap_err();
            assert!(
                matches!(err, AveragingError::InvalidParameter { parameter: "ratio", .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn thresholds_split_ratio_evenly() {
        let ratio = NoiseRatio::new(0.2).expect("ratio");
        assert_eq!(ratio.pepper_threshold(), 0.1);
        assert_eq!(ratio.salt_threshold(), 0.9);
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let err = NoiseRatioRange::new(0.1, 0.01).unwrap_err();
        assert!(matches!(err, AveragingError::InvalidParameter { parameter: "ratio_range", .. }));
    }

    #[test]
    fn range_draws_stay_inside_bounds() {
        let range = NoiseRatioRange::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let ratio = range.sample(&mut rng).value();
            assert!((0.01..=0.1).contains(&ratio), "{ratio} escaped the range");
        }
    }

    #[test]
    fn range_deserializes_and_validates() {
        let range: NoiseRatioRange =
            serde_json::from_str(r#"{"min":0.02,"max":0.05}"#).expect("valid range");
        assert_eq!(range.min().value(), 0.02);
        assert!(serde_json::from_str::<NoiseRatioRange>(r#"{"min":0.5,"max":1.0}"#).is_err());
    }
}
