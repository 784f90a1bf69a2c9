//! Aspect-ratio-preserving fit of images into a preview box
//!
//! The fit always scales: small images are enlarged until their limiting
//! axis touches the box, large images are shrunk the same way.

use crate::error::{Result, StudioError};
use crate::types::FitBox;
use image::imageops::FilterType;
use image::DynamicImage;

/// Compute the display dimensions of a `width`x`height` source fitted into `fit_box`
///
/// The result satisfies `out_w <= box.width`, `out_h <= box.height`, at
/// least one side equal to the box side, and both sides at least 1.
///
/// # Errors
/// - `InvalidImage` if either source side is zero
/// - `InvalidConfig` if either box side is zero
///
/// # Examples
/// ```rust
/// use bgremove_studio::{fit_dimensions, FitBox};
///
/// assert_eq!(fit_dimensions(1920, 1080, FitBox::new(400, 400)).unwrap(), (400, 225));
/// assert_eq!(fit_dimensions(100, 200, FitBox::new(400, 400)).unwrap(), (200, 400));
/// ```
pub fn fit_dimensions(width: u32, height: u32, fit_box: FitBox) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(StudioError::invalid_image(format!(
            "cannot fit a {width}x{height} raster"
        )));
    }
    if fit_box.width == 0 || fit_box.height == 0 {
        return Err(StudioError::invalid_config(format!(
            "fit box must be non-empty, got {fit_box}"
        )));
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let (box_w, box_h) = (u64::from(fit_box.width), u64::from(fit_box.height));

    // w/h > box_w/box_h, compared exactly in integers
    let (out_w, out_h) = if w * box_h > box_w * h {
        (box_w, rounded_div(box_w * h, w))
    } else {
        (rounded_div(box_h * w, h), box_h)
    };

    // Rounding never exceeds the box side on the derived axis, since the
    // exact quotient is itself bounded by it.
    let out_w = out_w.clamp(1, box_w);
    let out_h = out_h.clamp(1, box_h);

    Ok((to_u32(out_w), to_u32(out_h)))
}

/// Resize `image` to its fitted dimensions for `fit_box`
///
/// Uses Lanczos3 resampling.
pub fn fit_image(image: &DynamicImage, fit_box: FitBox) -> Result<DynamicImage> {
    fit_image_with_filter(image, fit_box, FilterType::Lanczos3)
}

/// Resize `image` to its fitted dimensions with an explicit resampling filter
pub fn fit_image_with_filter(
    image: &DynamicImage,
    fit_box: FitBox,
    filter: FilterType,
) -> Result<DynamicImage> {
    let (out_w, out_h) = fit_dimensions(image.width(), image.height(), fit_box)?;
    tracing::trace!(
        source_width = image.width(),
        source_height = image.height(),
        out_width = out_w,
        out_height = out_h,
        "Fitting image into preview box"
    );
    Ok(image.resize_exact(out_w, out_h, filter))
}

/// `round(numerator / denominator)` with halves rounded up
///
/// Rounds on the remainder so products of two `u32` sides never overflow.
fn rounded_div(numerator: u64, denominator: u64) -> u64 {
    let remainder = numerator % denominator;
    numerator / denominator + u64::from(remainder * 2 >= denominator)
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
