//! Mock segmentation backends for testing without model files

use crate::error::SegmentationError;
use crate::segmentation::SegmentationService;
use image::DynamicImage;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted outcome of a `MockSegmenter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Return the input as RGBA with full opacity
    Opaque,
    /// Return a fully transparent image of the input size
    Transparent,
    /// Return an image of the given (wrong) size
    WrongSize(u32, u32),
    /// Fail with a backend error carrying the message
    Fail(String),
}

/// Mock backend with scripted behaviour and a call counter
#[derive(Debug)]
pub struct MockSegmenter {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockSegmenter {
    #[must_use]
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn opaque() -> Self {
        Self::new(MockBehavior::Opaque)
    }

    #[must_use]
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self::new(MockBehavior::Fail(message.into()))
    }

    /// Number of `remove_background` calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSegmenter {
    fn default() -> Self {
        Self::opaque()
    }
}

impl SegmentationService for MockSegmenter {
    fn name(&self) -> &str {
        "mock"
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, SegmentationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Opaque => Ok(DynamicImage::ImageRgba8(image.to_rgba8())),
            MockBehavior::Transparent => {
                Ok(DynamicImage::new_rgba8(image.width(), image.height()))
            },
            MockBehavior::WrongSize(w, h) => Ok(DynamicImage::new_rgba8(*w, *h)),
            MockBehavior::Fail(message) => Err(SegmentationError::backend("mock", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_counts_calls() {
        let mock = MockSegmenter::opaque();
        let image = DynamicImage::new_rgb8(4, 2);

        let out = mock.remove_background(&image).unwrap();
        assert!(out.color().has_alpha());
        assert_eq!((out.width(), out.height()), (4, 2));

        let _ = mock.remove_background(&image);
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_mock_failure() {
        let mock = MockSegmenter::failing("model exploded");
        let err = mock
            .remove_background(&DynamicImage::new_rgb8(1, 1))
            .unwrap_err();
        assert!(err.to_string().contains("model exploded"));
    }
}
