//! Colour-key segmentation backend
//!
//! Estimates the background colour from the image corners and makes every
//! pixel within a per-channel tolerance of it transparent. Works well for
//! product shots and icons on flat backgrounds and needs no model file.

use crate::error::SegmentationError;
use crate::segmentation::{apply_alpha_mask, SegmentationService};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

/// Inset of the corner samples from the image edge, in pixels
const CORNER_INSET: u32 = 5;

#[derive(Debug, Clone)]
pub struct ColorKeySegmenter {
    tolerance: u8,
}

impl ColorKeySegmenter {
    #[must_use]
    pub fn new(tolerance: u8) -> Self {
        Self { tolerance }
    }

    #[must_use]
    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    /// Average of the four corner samples
    fn estimate_background(rgba: &RgbaImage) -> Rgba<u8> {
        let (width, height) = rgba.dimensions();
        let x_inset = CORNER_INSET.min((width - 1) / 2);
        let y_inset = CORNER_INSET.min((height - 1) / 2);
        let corners = [
            (x_inset, y_inset),
            (width - 1 - x_inset, y_inset),
            (x_inset, height - 1 - y_inset),
            (width - 1 - x_inset, height - 1 - y_inset),
        ];

        let mut sums = [0u32; 4];
        for (x, y) in corners {
            let pixel = rgba.get_pixel(x, y);
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += u32::from(channel);
            }
        }
        Rgba(sums.map(|s| (s / 4) as u8))
    }

    fn is_background(&self, pixel: Rgba<u8>, key: Rgba<u8>) -> bool {
        pixel.0[..3]
            .iter()
            .zip(&key.0[..3])
            .all(|(p, k)| p.abs_diff(*k) <= self.tolerance)
    }
}

impl Default for ColorKeySegmenter {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SegmentationService for ColorKeySegmenter {
    fn name(&self) -> &str {
        "color-key"
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, SegmentationError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SegmentationError::UnsupportedImage(format!(
                "{}x{} raster has no pixels",
                image.width(),
                image.height()
            )));
        }

        let rgba = image.to_rgba8();
        let key = Self::estimate_background(&rgba);
        tracing::debug!(
            key = ?key.0,
            tolerance = self.tolerance,
            "Estimated background colour"
        );

        let mask = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            if self.is_background(*rgba.get_pixel(x, y), key) {
                Luma([0])
            } else {
                Luma([255])
            }
        });

        let result = apply_alpha_mask(image, &mask)?;
        Ok(DynamicImage::ImageRgba8(result))
    }
}
