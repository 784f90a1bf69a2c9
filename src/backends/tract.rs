//! Tract segmentation backend for salient-object ONNX models
//!
//! Runs U²-Net / ISNet style models with Tract, a pure Rust inference
//! library. The model is loaded once, optimized for a fixed input shape,
//! and shared read-only between removals.

use crate::error::{Result, SegmentationError, StudioError};
use crate::segmentation::{apply_alpha_mask, SegmentationService};
use crate::utils::preprocessing::{ImagePreprocessor, PreprocessingConfig};
use image::DynamicImage;
use instant::Instant;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tract backend running a single-output segmentation model
#[derive(Debug)]
pub struct TractSegmenter {
    model: TractModel,
    model_path: PathBuf,
    preprocessing: PreprocessingConfig,
}

impl TractSegmenter {
    /// Load and optimize the ONNX model at `path`
    ///
    /// # Errors
    /// - `StudioError::InvalidConfig` if the file is missing, is not a valid
    ///   ONNX model, or cannot be specialised to the configured input size
    pub fn from_file<P: AsRef<Path>>(path: P, preprocessing: PreprocessingConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StudioError::invalid_config(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let load_start = Instant::now();
        let [width, height] = preprocessing.target_size;
        let model_error = |stage: &str, e: TractError| {
            StudioError::invalid_config(format!(
                "Failed to {stage} '{}': {e}",
                path.display()
            ))
        };

        let model = onnx()
            .model_for_path(path)
            .map_err(|e| model_error("load ONNX model", e))?
            .with_input_fact(
                0,
                f32::fact([1, 3, height as usize, width as usize]).into(),
            )
            .map_err(|e| model_error("set input shape for", e))?
            .into_optimized()
            .map_err(|e| model_error("optimize model", e))?
            .into_runnable()
            .map_err(|e| model_error("create runnable model from", e))?;

        tracing::info!(
            model = %path.display(),
            input = %format!("{width}x{height}"),
            elapsed_ms = load_start.elapsed().as_millis() as u64,
            "Tract backend initialized"
        );

        Ok(Self {
            model,
            model_path: path.to_path_buf(),
            preprocessing,
        })
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    #[must_use]
    pub fn preprocessing(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }

    fn infer(&self, image: &DynamicImage) -> std::result::Result<image::GrayImage, SegmentationError> {
        let inference_error =
            |message: String| SegmentationError::backend("tract", message);

        let input = ImagePreprocessor::preprocess_for_inference(image, &self.preprocessing);
        let shape = input.shape().to_vec();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(&shape, &data)
            .map_err(|e| inference_error(format!("Failed to build input tensor: {e}")))?;

        let inference_start = Instant::now();
        let outputs = self
            .model
            .run(tvec![tensor.into()])
            .map_err(|e| inference_error(format!("Tract inference failed: {e}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| inference_error("No output tensor found".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| inference_error(format!("Failed to read output tensor: {e}")))?;

        // Salient-object models emit [1, 1, H, W]; the first map is the finest
        let dims = view.shape();
        let (out_h, out_w) = match dims {
            [.., h, w] => (*h, *w),
            _ => {
                return Err(inference_error(format!(
                    "Expected at least 2D output tensor, got {}D",
                    dims.len()
                )))
            },
        };
        let values: Vec<f32> = view.iter().copied().collect();

        tracing::debug!(
            output = ?dims,
            elapsed_ms = inference_start.elapsed().as_millis() as u64,
            "Tract inference completed"
        );

        let output_size = (
            u32::try_from(out_w).map_err(|e| inference_error(e.to_string()))?,
            u32::try_from(out_h).map_err(|e| inference_error(e.to_string()))?,
        );
        ImagePreprocessor::mask_from_output(&values, output_size, (image.width(), image.height()))
    }
}

impl SegmentationService for TractSegmenter {
    fn name(&self) -> &str {
        "tract"
    }

    fn remove_background(
        &self,
        image: &DynamicImage,
    ) -> std::result::Result<DynamicImage, SegmentationError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SegmentationError::UnsupportedImage(format!(
                "{}x{} raster has no pixels",
                image.width(),
                image.height()
            )));
        }

        let mask = self.infer(image)?;
        let result = apply_alpha_mask(image, &mask)?;
        Ok(DynamicImage::ImageRgba8(result))
    }
}
