// THEORY:
// The `NoiseInjector` is the leaf of the engine: it takes the reference frame and
// produces one independently corrupted copy of it using the salt-and-pepper model.
//
// Algorithm, per pixel position:
// 1.  Normalize the intensities to [0.0, 1.0].
// 2.  Draw one uniform value r in [0, 1) from the caller's generator.
// 3.  r below ratio/2 forces the position to 0.0 (pepper); r above 1 - ratio/2
//     forces it to 1.0 (salt); anything in between leaves it untouched.
// 4.  Denormalize back to 0..=255 by rounding and clamping.
//
// A multi-channel frame gets one draw per position and every channel of a forced
// position is forced together, so the noise is impulsive in the spatial sense and
// not per color component. The generator is always passed in explicitly: a fixed
// seed reproduces the exact same sample.

use crate::core_modules::frame::frame::{Frame, Intensity};
use crate::core_modules::noise_ratio::NoiseRatio;
use crate::error::{AveragingError, Result};
use rand::Rng;

pub type NormalizedIntensity = f64;

const PEPPER: NormalizedIntensity = 0.0;
const SALT: NormalizedIntensity = 1.0;

/// How many positions of a sample were forced, split by polarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoiseCensus {
    pub salted: usize,
    pub peppered: usize,
    /// Total pixel positions considered.
    pub positions: usize,
}

impl NoiseCensus {
    pub fn forced(&self) -> usize {
        self.salted + self.peppered
    }

    pub fn forced_fraction(&self) -> f64 {
        if self.positions == 0 {
            return 0.0;
        }
        self.forced() as f64 / self.positions as f64
    }
}

/// Produces one salt-and-pepper corrupted copy of `image`.
pub fn inject<R: Rng>(image: &Frame, ratio: NoiseRatio, rng: &mut R) -> Result<Frame> {
    inject_with_census(image, ratio, rng).map(|(frame, _)| frame)
}

/// Same as [`inject`], also reporting how many positions were forced.
pub fn inject_with_census<R: Rng>(
    image: &Frame,
    ratio: NoiseRatio,
    rng: &mut R,
) -> Result<(Frame, NoiseCensus)> {
    if image.is_empty() {
        return Err(AveragingError::invalid("image", "reference image has no pixels"));
    }

    let channels = image.channels() as usize;
    let pepper_below = ratio.pepper_threshold();
    let salt_above = ratio.salt_threshold();

    let mut census = NoiseCensus {
        positions: image.pixel_count(),
        ..NoiseCensus::default()
    };
    let mut data = Vec::with_capacity(image.data().len());

    for position in image.data().chunks_exact(channels) {
        let draw: f64 = rng.random();
        let forced = if draw < pepper_below {
            census.peppered += 1;
            Some(PEPPER)
        } else if draw > salt_above {
            census.salted += 1;
            Some(SALT)
        } else {
            None
        };

        for &value in position {
            let normalized = forced.unwrap_or_else(|| normalize(value));
            data.push(denormalize(normalized));
        }
    }

    let frame = Frame::new(image.height(), image.width(), image.channels(), data)?;
    Ok((frame, census))
}

#[inline]
fn normalize(value: Intensity) -> NormalizedIntensity {
    value as NormalizedIntensity / 255.0
}

#[inline]
fn denormalize(value: NormalizedIntensity) -> Intensity {
    (value * 255.0).round().clamp(0.0, 255.0) as Intensity
}
