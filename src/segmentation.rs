//! Segmentation service abstraction

use crate::error::SegmentationError;
use image::{DynamicImage, GrayImage, RgbaImage};

/// Trait for background segmentation backends
///
/// Implementations take an image and return one of the same pixel
/// dimensions whose alpha channel separates foreground from removed
/// background. They are shared across threads so the presentation driver
/// can run removal off its event loop.
pub trait SegmentationService: Send + Sync {
    /// Short backend name for logs and diagnostics
    fn name(&self) -> &str;

    /// Remove the background of `image`
    ///
    /// # Errors
    /// - Backend runtime failures
    /// - Images the backend cannot handle
    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, SegmentationError>;
}

/// Apply a single-channel mask as the alpha channel of `image`
///
/// The mask must have the same dimensions as the image. Fully transparent
/// pixels are zeroed so the removed background carries no colour.
pub fn apply_alpha_mask(
    image: &DynamicImage,
    mask: &GrayImage,
) -> Result<RgbaImage, SegmentationError> {
    let rgba = image.to_rgba8();
    if rgba.dimensions() != mask.dimensions() {
        return Err(SegmentationError::DimensionMismatch {
            expected: rgba.dimensions(),
            actual: mask.dimensions(),
        });
    }

    let mut result = RgbaImage::new(rgba.width(), rgba.height());
    for ((pixel, alpha), out) in rgba
        .pixels()
        .zip(mask.pixels())
        .zip(result.pixels_mut())
    {
        // Keep existing transparency of the source
        let a = ((u16::from(alpha[0]) * u16::from(pixel[3])) / 255) as u8;
        *out = if a > 0 {
            image::Rgba([pixel[0], pixel[1], pixel[2], a])
        } else {
            image::Rgba([0, 0, 0, 0])
        };
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn test_apply_alpha_mask() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255])));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 0, Luma([0]));

        let result = apply_alpha_mask(&image, &mask).unwrap();
        assert_eq!(*result.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*result.get_pixel(1, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_apply_alpha_mask_keeps_source_transparency() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 128])));
        let mask = GrayImage::from_pixel(1, 1, Luma([255]));

        let result = apply_alpha_mask(&image, &mask).unwrap();
        assert_eq!(result.get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn test_apply_alpha_mask_dimension_mismatch() {
        let image = DynamicImage::new_rgb8(4, 4);
        let mask = GrayImage::new(2, 2);
        assert!(matches!(
            apply_alpha_mask(&image, &mask),
            Err(SegmentationError::DimensionMismatch { .. })
        ));
    }
}
