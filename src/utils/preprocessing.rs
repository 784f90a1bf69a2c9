//! Tensor preparation and mask recovery for model backends

use crate::error::SegmentationError;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use ndarray::Array4;

/// Model input geometry and normalization
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingConfig {
    /// Model input size as `[width, height]`
    pub target_size: [u32; 2],
    /// Per-channel mean (RGB, 0-1 range)
    pub normalization_mean: [f32; 3],
    /// Per-channel standard deviation
    pub normalization_std: [f32; 3],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            target_size: [320, 320],
            normalization_mean: [0.485, 0.456, 0.406],
            normalization_std: [0.229, 0.224, 0.225],
        }
    }
}

/// Shared image preprocessing utilities
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Convert an image into a normalized NCHW tensor of the model input size
    ///
    /// The image is stretched to the target size; the mask is stretched back
    /// by `mask_from_output`, so the aspect ratio round-trips.
    #[must_use]
    pub fn preprocess_for_inference(
        image: &DynamicImage,
        config: &PreprocessingConfig,
    ) -> Array4<f32> {
        let [width, height] = config.target_size;
        let resized = image::imageops::resize(
            &image.to_rgb8(),
            width,
            height,
            FilterType::Lanczos3,
        );

        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for channel in 0..3 {
                let value = f32::from(pixel[channel]) / 255.0;
                let normalized = (value - config.normalization_mean[channel])
                    / config.normalization_std[channel];
                if let Some(elem) = tensor.get_mut([0, channel, y as usize, x as usize]) {
                    *elem = normalized;
                }
            }
        }

        tensor
    }

    /// Turn a raw single-channel prediction into a mask of the original size
    ///
    /// Values are min-max normalized to 0-255 before resizing, since salient
    /// object models do not emit calibrated probabilities.
    pub fn mask_from_output(
        values: &[f32],
        output_size: (u32, u32),
        original_size: (u32, u32),
    ) -> Result<GrayImage, SegmentationError> {
        let (width, height) = output_size;
        let expected = width as usize * height as usize;
        if values.len() < expected || expected == 0 {
            return Err(SegmentationError::backend(
                "preprocessing",
                format!(
                    "prediction has {} values, expected {width}x{height}",
                    values.len()
                ),
            ));
        }

        let plane = values.get(..expected).unwrap_or(values);
        let (min, max) = plane
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let range = max - min;

        let mut mask = GrayImage::new(width, height);
        for (pixel, value) in mask.pixels_mut().zip(plane) {
            let scaled = if range > f32::EPSILON {
                (value - min) / range
            } else {
                value.clamp(0.0, 1.0)
            };
            *pixel = Luma([(scaled * 255.0).round().clamp(0.0, 255.0) as u8]);
        }

        if (width, height) == original_size {
            return Ok(mask);
        }
        Ok(image::imageops::resize(
            &mask,
            original_size.0,
            original_size.1,
            FilterType::Lanczos3,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image() -> DynamicImage {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(100, 50, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_preprocess_for_inference_shape() {
        let config = PreprocessingConfig {
            target_size: [64, 32],
            ..PreprocessingConfig::default()
        };
        let tensor = ImagePreprocessor::preprocess_for_inference(&create_test_image(), &config);
        assert_eq!(tensor.shape(), &[1, 3, 32, 64]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let config = PreprocessingConfig {
            target_size: [8, 8],
            ..PreprocessingConfig::default()
        };
        let tensor = ImagePreprocessor::preprocess_for_inference(&create_test_image(), &config);

        let red = tensor[[0, 0, 4, 4]];
        let green = tensor[[0, 1, 4, 4]];
        // Resampling may shift a channel by one level
        assert!((red - (1.0 - 0.485) / 0.229).abs() < 0.05);
        assert!((green - (0.0 - 0.456) / 0.224).abs() < 0.05);
    }

    #[test]
    fn test_mask_from_output_normalizes() {
        let values = [0.2, 0.4, 0.6, 0.2];
        let mask = ImagePreprocessor::mask_from_output(&values, (2, 2), (2, 2)).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(0, 1)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn test_mask_from_output_resizes() {
        let values = vec![1.0; 16];
        let mask = ImagePreprocessor::mask_from_output(&values, (4, 4), (10, 6)).unwrap();
        assert_eq!(mask.dimensions(), (10, 6));
        assert!(mask.get_pixel(5, 3)[0] >= 254);
    }

    #[test]
    fn test_mask_from_output_too_short() {
        let values = [0.5; 3];
        assert!(ImagePreprocessor::mask_from_output(&values, (2, 2), (2, 2)).is_err());
    }
}
