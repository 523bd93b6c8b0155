//! Image file I/O at the edge of the engine.
//!
//! Frames are written as PNG so a re-decoded sample holds exactly the intensities
//! that were encoded; a lossy codec here would add its own artifacts to every
//! variance measurement.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::sample_set::SampleSet;
use crate::error::{AveragingError, Result};
use image::{ExtendedColorType, ImageEncoder};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decodes an image file into a frame, keeping its channel layout.
pub fn load(path: &Path) -> Result<Frame> {
    let decoded = image::open(path).map_err(|err| AveragingError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let frame = Frame::from_dynamic(decoded)?;
    if frame.is_empty() {
        return Err(AveragingError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: "decoded image has no pixels".to_string(),
        });
    }
    Ok(frame)
}

/// Decodes an image file and collapses it to a single luma channel.
pub fn load_grayscale(path: &Path) -> Result<Frame> {
    load(path).map(|frame| frame.to_grayscale())
}

/// Encodes a frame losslessly as PNG.
pub fn save(path: &Path, frame: &Frame) -> Result<()> {
    let color_type = match frame.channels() {
        1 => ExtendedColorType::L8,
        2 => ExtendedColorType::La8,
        3 => ExtendedColorType::Rgb8,
        _ => ExtendedColorType::Rgba8,
    };
    let output = BufWriter::new(fs::File::create(path)?);
    let encoder = image::codecs::png::PngEncoder::new(output);
    encoder.write_image(frame.data(), frame.width(), frame.height(), color_type)?;
    Ok(())
}

pub fn sample_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("noisy_sample_{index}.png"))
}

pub fn result_path(dir: &Path, k: usize) -> PathBuf {
    dir.join(format!("result_for_{k}_samples.png"))
}

/// Persists every sample under its generation index.
pub fn save_sample_set(dir: &Path, samples: &SampleSet) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        let path = sample_path(dir, index);
        save(&path, sample)?;
        paths.push(path);
    }
    debug!(count = paths.len(), dir = %dir.display(), "persisted sample set");
    Ok(paths)
}

/// Reloads the first `count` persisted samples in generation order.
pub fn load_sample_prefix(dir: &Path, count: usize) -> Result<SampleSet> {
    let mut samples = SampleSet::with_capacity(count);
    for index in 0..count {
        samples.push(load(&sample_path(dir, index))?);
    }
    Ok(samples)
}
