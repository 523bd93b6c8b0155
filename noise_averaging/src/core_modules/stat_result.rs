use serde::{Deserialize, Serialize};

/// One row of the terminal artifact: the group size and the global statistics of
/// that group's averaged image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatResult {
    /// Number of samples averaged together (k >= 1).
    pub k: usize,
    /// Mean of every pixel of the averaged image.
    pub average: f64,
    /// Mean squared deviation of the averaged image's pixels from `average`.
    pub variance: f64,
}

/// Two-pass population mean and variance, accumulated in f64.
///
/// An empty input yields `(0.0, 0.0)`; callers that must reject empty data do so
/// before getting here.
pub(crate) fn mean_and_variance<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let values = values.into_iter();
    let mut count = 0usize;
    let mut sum = 0.0f64;
    for v in values.clone() {
        sum += v;
        count += 1;
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_input_has_zero_variance() {
        let (mean, variance) = mean_and_variance(vec![7.5; 10]);
        assert_relative_eq!(mean, 7.5);
        assert_relative_eq!(variance, 0.0);
    }

    #[test]
    fn matches_hand_computed_values() {
        let (mean, variance) = mean_and_variance([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(variance, 4.0);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(mean_and_variance(Vec::<f64>::new()), (0.0, 0.0));
    }
}
