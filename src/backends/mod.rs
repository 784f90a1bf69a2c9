//! Segmentation backends and the factory that builds them
//!
//! - Colour-key backend (always available, no model file)
//! - Tract backend (pure Rust ONNX inference, feature `tract`)
//! - Mock backend (scripted behaviour for tests)

pub mod color_key;
pub mod mock;

#[cfg(feature = "tract")]
pub mod tract;

pub use self::color_key::ColorKeySegmenter;
pub use self::mock::{MockBehavior, MockSegmenter};

#[cfg(feature = "tract")]
pub use self::tract::TractSegmenter;

use crate::config::{BackendType, StudioConfig};
use crate::error::{Result, StudioError};
use crate::segmentation::SegmentationService;
use std::sync::Arc;

/// Factory trait for creating segmentation backends
pub trait BackendFactory: Send + Sync {
    /// Create the segmenter selected by `config.backend`
    ///
    /// # Errors
    ///
    /// Returns `StudioError::InvalidConfig` for:
    /// - Backends not compiled into this build
    /// - A Tract backend without a model path
    /// - Model loading failures
    fn create_segmenter(&self, config: &StudioConfig) -> Result<Arc<dyn SegmentationService>>;

    /// List available backend types
    fn available_backends(&self) -> Vec<BackendType>;
}

/// Default backend factory implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create_segmenter(&self, config: &StudioConfig) -> Result<Arc<dyn SegmentationService>> {
        match config.backend {
            BackendType::ColorKey => Ok(Arc::new(ColorKeySegmenter::new(
                config.color_key_tolerance,
            ))),
            BackendType::Tract => create_tract(config),
        }
    }

    fn available_backends(&self) -> Vec<BackendType> {
        let mut backends = vec![BackendType::ColorKey];
        if cfg!(feature = "tract") {
            backends.push(BackendType::Tract);
        }
        backends
    }
}

#[cfg(feature = "tract")]
fn create_tract(config: &StudioConfig) -> Result<Arc<dyn SegmentationService>> {
    use crate::utils::preprocessing::PreprocessingConfig;

    let model_path = config.model_path.as_ref().ok_or_else(|| {
        StudioError::invalid_config("The tract backend requires a model path (--model)")
    })?;
    let preprocessing = PreprocessingConfig {
        target_size: config.model_input_size,
        normalization_mean: config.normalization_mean,
        normalization_std: config.normalization_std,
    };
    Ok(Arc::new(TractSegmenter::from_file(model_path, preprocessing)?))
}

#[cfg(not(feature = "tract"))]
fn create_tract(_config: &StudioConfig) -> Result<Arc<dyn SegmentationService>> {
    Err(StudioError::invalid_config(
        "Tract backend not available in this build. Rebuild with the 'tract' feature.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factory_color_key() {
        let config = StudioConfig::builder()
            .color_key_tolerance(12)
            .build()
            .unwrap();
        let segmenter = DefaultBackendFactory.create_segmenter(&config).unwrap();
        assert_eq!(segmenter.name(), "color-key");
    }

    #[test]
    fn test_tract_requires_model_path() {
        let config = StudioConfig::builder()
            .backend(BackendType::Tract)
            .build()
            .unwrap();
        let result = DefaultBackendFactory.create_segmenter(&config);
        assert!(matches!(result, Err(StudioError::InvalidConfig(_))));
    }

    #[test]
    fn test_available_backends() {
        let backends = DefaultBackendFactory.available_backends();
        assert!(backends.contains(&BackendType::ColorKey));
        assert_eq!(backends.contains(&BackendType::Tract), cfg!(feature = "tract"));
    }
}
