// THEORY:
// The `Frame` module is the data model every other layer speaks. A `Frame` is a
// "dumb" container of 8-bit intensities laid out row-major, with an optional
// channel axis: (H, W) for grayscale, (H, W, C) for color. It is immutable once
// produced; every processing step in the engine returns a brand new `Frame`.
//
// Key architectural principles:
// 1.  **Shape is explicit**: height, width and channel count travel with the data,
//     so shape mismatches are detectable without guessing from buffer lengths.
// 2.  **Emptiness is representable**: a 0x0 frame can exist, but the operations that
//     consume frames refuse it up front. This keeps "no image" a validation error at
//     the operation boundary instead of a panic at construction time.
// 3.  **Bridge to the codec layer**: conversions to and from `image::DynamicImage`
//     live here so the I/O collaborator never has to know our layout.

pub mod frame {
    use crate::core_modules::stat_result::mean_and_variance;
    use crate::error::{AveragingError, Result};
    use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

    pub type Intensity = u8;
    /// (height, width, channels)
    pub type Dimensions = (u32, u32, u8);

    const MAX_CHANNELS: u8 = 4;

    /// Rec. 601 luma weights, the same weighting used for the luminance heuristic of
    /// color frames elsewhere in the engine.
    const LUMA_RED: f64 = 0.299;
    const LUMA_GREEN: f64 = 0.587;
    const LUMA_BLUE: f64 = 0.114;

    /// An immutable 8-bit image, grayscale or multi-channel, stored row-major.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Frame {
        /// Number of rows.
        height: u32,
        /// Number of columns.
        width: u32,
        /// Interleaved channels per pixel position (1 = grayscale).
        channels: u8,
        /// `height * width * channels` intensities.
        data: Vec<Intensity>,
    }

    impl Frame {
        pub fn new(height: u32, width: u32, channels: u8, data: Vec<Intensity>) -> Result<Self> {
            if channels == 0 || channels > MAX_CHANNELS {
                return Err(AveragingError::invalid(
                    "channels",
                    format!("expected 1..={MAX_CHANNELS} channels, got {channels}"),
                ));
            }
            let expected = height as usize * width as usize * channels as usize;
            if data.len() != expected {
                return Err(AveragingError::invalid(
                    "data",
                    format!(
                        "buffer holds {} values but {height}x{width}x{channels} needs {expected}",
                        data.len()
                    ),
                ));
            }
            Ok(Self {
                height,
                width,
                channels,
                data,
            })
        }

        /// Builds a single-channel frame.
        pub fn gray(height: u32, width: u32, data: Vec<Intensity>) -> Result<Self> {
            Self::new(height, width, 1, data)
        }

        /// A grayscale frame where every pixel holds `value`.
        pub fn filled(height: u32, width: u32, value: Intensity) -> Self {
            Self {
                height,
                width,
                channels: 1,
                data: vec![value; height as usize * width as usize],
            }
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn channels(&self) -> u8 {
            self.channels
        }

        pub fn dimensions(&self) -> Dimensions {
            (self.height, self.width, self.channels)
        }

        /// Number of pixel positions (height x width), independent of channels.
        pub fn pixel_count(&self) -> usize {
            self.height as usize * self.width as usize
        }

        pub fn is_empty(&self) -> bool {
            self.data.is_empty()
        }

        pub fn data(&self) -> &[Intensity] {
            &self.data
        }

        pub fn into_data(self) -> Vec<Intensity> {
            self.data
        }

        /// Collapses the channel axis to a single luma channel.
        ///
        /// - 1 channel: returned as-is.
        /// - 2 channels (gray + alpha): alpha is dropped.
        /// - 3/4 channels (RGB[A]): Rec. 601 weighted sum, rounded; alpha is dropped.
        pub fn to_grayscale(&self) -> Frame {
            let channels = self.channels as usize;
            let data = match self.channels {
                1 => return self.clone(),
                2 => self.data.chunks_exact(channels).map(|p| p[0]).collect(),
                _ => self
                    .data
                    .chunks_exact(channels)
                    .map(|p| {
                        let luma = LUMA_RED * p[0] as f64
                            + LUMA_GREEN * p[1] as f64
                            + LUMA_BLUE * p[2] as f64;
                        luma.round().clamp(0.0, 255.0) as Intensity
                    })
                    .collect(),
            };
            Frame {
                height: self.height,
                width: self.width,
                channels: 1,
                data,
            }
        }

        /// Global (average, variance) over every stored value of this frame.
        /// Returns `(0.0, 0.0)` for an empty frame.
        pub fn statistics(&self) -> (f64, f64) {
            mean_and_variance(self.data.iter().map(|&v| v as f64))
        }

        /// Adopts a decoded image. Layouts other than 8-bit L/LA/RGB/RGBA are
        /// converted to 8-bit RGB first.
        pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
            let (width, height) = (image.width(), image.height());
            let (channels, data) = match image {
                DynamicImage::ImageLuma8(buffer) => (1, buffer.into_raw()),
                DynamicImage::ImageLumaA8(buffer) => (2, buffer.into_raw()),
                DynamicImage::ImageRgb8(buffer) => (3, buffer.into_raw()),
                DynamicImage::ImageRgba8(buffer) => (4, buffer.into_raw()),
                other => (3, other.to_rgb8().into_raw()),
            };
            Self::new(height, width, channels, data)
        }

        /// Hands the frame to the codec layer.
        pub fn to_dynamic(&self) -> Result<DynamicImage> {
            let (width, height, data) = (self.width, self.height, self.data.clone());
            let image = match self.channels {
                1 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
                2 => GrayAlphaImage::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
                3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
                _ => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
            };
            image.ok_or_else(|| {
                AveragingError::invalid("frame", "buffer does not match its declared dimensions")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::frame::*;
    use crate::error::AveragingError;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_buffer_of_wrong_length() {
        let err = Frame::gray(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, AveragingError::InvalidParameter { parameter: "data", .. }));
    }

    #[test]
    fn rejects_unsupported_channel_count() {
        let err = Frame::new(1, 1, 5, vec![0; 5]).unwrap_err();
        assert!(matches!(err, AveragingError::InvalidParameter { parameter: "channels", .. }));
    }

    #[test]
    fn empty_frame_is_constructible_but_flagged() {
        let frame = Frame::gray(0, 0, Vec::new()).expect("0x0 frame");
        assert!(frame.is_empty());
        assert_eq!(frame.statistics(), (0.0, 0.0));
    }

    #[test]
    fn grayscale_uses_rec601_weights() {
        // Pure red, pure green, pure blue, white.
        let rgb = Frame::new(
            1,
            4,
            3,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        )
        .expect("rgb frame");
        let gray = rgb.to_grayscale();
        assert_eq!(gray.dimensions(), (1, 4, 1));
        assert_eq!(gray.data(), &[76, 150, 29, 255]);
    }

    #[test]
    fn grayscale_drops_alpha() {
        let la = Frame::new(1, 2, 2, vec![10, 255, 200, 0]).expect("gray-alpha frame");
        assert_eq!(la.to_grayscale().data(), &[10, 200]);
    }

    #[test]
    fn statistics_of_two_level_frame() {
        let frame = Frame::gray(1, 4, vec![0, 0, 100, 100]).expect("frame");
        let (average, variance) = frame.statistics();
        assert_relative_eq!(average, 50.0);
        assert_relative_eq!(variance, 2500.0);
    }

    #[test]
    fn dynamic_image_conversion_keeps_layout() {
        let frame = Frame::new(2, 3, 3, (0..18).collect()).expect("rgb frame");
        let dynamic = frame.to_dynamic().expect("to dynamic");
        assert_eq!((dynamic.width(), dynamic.height()), (3, 2));
        let back = Frame::from_dynamic(dynamic).expect("from dynamic");
        assert_eq!(back, frame);
    }
}
