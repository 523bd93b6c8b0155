// THEORY:
// A `SampleSet` is the ordered ensemble of corrupted frames. The order is the
// generation order and it is load-bearing: "a group of k" always means the first
// k samples that were generated. Indices are therefore assigned when a sample is
// produced and never derived from file names or completion order.
//
// The container itself does not police shapes. Shape agreement is an invariant
// the aggregator checks eagerly, which lets callers (and tests) hand it any
// collection of frames and get a precise `DimensionMismatch` back.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::noise_injector::inject;
use crate::core_modules::noise_ratio::NoiseRatioRange;
use crate::error::{AveragingError, Result};
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    samples: Vec<Frame>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn from_frames(samples: Vec<Frame>) -> Self {
        Self { samples }
    }

    /// Generates `count` corrupted copies of `reference`, drawing a fresh ratio from
    /// `range` for every sample and consuming `rng` sequentially.
    pub fn generate<R: Rng>(
        reference: &Frame,
        count: usize,
        range: &NoiseRatioRange,
        rng: &mut R,
    ) -> Result<Self> {
        if count == 0 {
            return Err(AveragingError::invalid("sample_count", "at least one sample is required"));
        }
        if reference.is_empty() {
            return Err(AveragingError::invalid("image", "reference image has no pixels"));
        }

        let mut set = Self::with_capacity(count);
        for index in 0..count {
            let ratio = range.sample(rng);
            let sample = inject(reference, ratio, rng)?;
            debug!(index, ratio = ratio.value(), "generated noisy sample");
            set.push(sample);
        }
        Ok(set)
    }

    /// Appends a sample and returns the generation index it was assigned.
    pub fn push(&mut self, sample: Frame) -> usize {
        self.samples.push(sample);
        self.samples.len() - 1
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.samples.get(index)
    }

    /// The first `k` samples in generation order, if that many exist.
    pub fn first(&self, k: usize) -> Option<&[Frame]> {
        self.samples.get(..k)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.samples
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.samples.iter()
    }

    /// A grayscale copy of every sample, preserving order.
    pub fn to_grayscale(&self) -> SampleSet {
        self.samples.iter().map(Frame::to_grayscale).collect()
    }
}

impl FromIterator<Frame> for SampleSet {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
