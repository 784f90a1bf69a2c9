//! Configuration types for the studio session and its collaborators

use crate::error::{Result, StudioError};
use crate::types::FitBox;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest accepted preview side, in pixels
pub const MAX_PREVIEW_SIDE: u32 = 16_384;

/// Output image format for saved results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// TIFF with alpha channel transparency and lossless compression
    Tiff,
}

impl OutputFormat {
    /// File extension without the dot
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tiff => "tiff",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Tiff => write!(f, "TIFF"),
        }
    }
}

/// Segmentation backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendType {
    /// Border colour keying, no model required
    #[default]
    ColorKey,
    /// ONNX salient-object model run by Tract (pure Rust)
    Tract,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColorKey => write!(f, "color-key"),
            Self::Tract => write!(f, "tract"),
        }
    }
}

/// Configuration for a studio session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Box previews are fitted into
    pub preview_box: FitBox,

    /// Format used when saving the result
    pub output_format: OutputFormat,

    /// Segmentation backend
    pub backend: BackendType,

    /// ONNX model file (required by the Tract backend)
    pub model_path: Option<PathBuf>,

    /// Model input size as `[width, height]`
    pub model_input_size: [u32; 2],

    /// Per-channel normalization mean (RGB, 0-1 range)
    pub normalization_mean: [f32; 3],

    /// Per-channel normalization standard deviation
    pub normalization_std: [f32; 3],

    /// Per-channel tolerance of the colour-key backend
    pub color_key_tolerance: u8,

    /// Directory for saves without an explicit path (None = home directory)
    pub save_dir: Option<PathBuf>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            preview_box: FitBox::default(),
            output_format: OutputFormat::default(),
            backend: BackendType::default(),
            model_path: None,
            model_input_size: [320, 320],
            normalization_mean: [0.485, 0.456, 0.406],
            normalization_std: [0.229, 0.224, 0.225],
            color_key_tolerance: 30,
            save_dir: None,
        }
    }
}

impl StudioConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bgremove_studio::{BackendType, StudioConfig};
    ///
    /// let config = StudioConfig::builder()
    ///     .backend(BackendType::ColorKey)
    ///     .preview_size(320, 240)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.preview_box.width, 320);
    /// ```
    #[must_use]
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            StudioError::invalid_config(format!(
                "Failed to parse configuration file '{}': {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - Preview box sides: 1-16384
    /// - Model input sides: non-zero
    /// - Normalization std: strictly positive
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("preview width", self.preview_box.width),
            ("preview height", self.preview_box.height),
        ] {
            if value == 0 || value > MAX_PREVIEW_SIDE {
                return Err(StudioError::config_value_error(name, value, "1-16384"));
            }
        }

        if self.model_input_size.contains(&0) {
            return Err(StudioError::invalid_config(format!(
                "Model input size must be non-zero, got {}x{}",
                self.model_input_size[0], self.model_input_size[1]
            )));
        }

        if self.normalization_std.iter().any(|s| *s <= 0.0) {
            return Err(StudioError::invalid_config(
                "Normalization standard deviation must be positive",
            ));
        }

        Ok(())
    }

    /// Directory for saves without an explicit path
    #[must_use]
    pub fn resolved_save_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Builder for `StudioConfig`
#[derive(Debug, Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from a file)
    #[must_use]
    pub fn from_config(config: StudioConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn preview_box(mut self, preview_box: FitBox) -> Self {
        self.config.preview_box = preview_box;
        self
    }

    #[must_use]
    pub fn preview_size(self, width: u32, height: u32) -> Self {
        self.preview_box(FitBox::new(width, height))
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: BackendType) -> Self {
        self.config.backend = backend;
        self
    }

    #[must_use]
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.model_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn model_input_size(mut self, width: u32, height: u32) -> Self {
        self.config.model_input_size = [width, height];
        self
    }

    #[must_use]
    pub fn color_key_tolerance(mut self, tolerance: u8) -> Self {
        self.config.color_key_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn save_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.save_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StudioConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = StudioConfig::default();
        assert_eq!(config.preview_box, FitBox::new(400, 400));
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.backend, BackendType::ColorKey);
        assert_eq!(config.model_input_size, [320, 320]);
        assert_eq!(config.color_key_tolerance, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        assert!(StudioConfig::builder().preview_size(0, 400).build().is_err());
        assert!(StudioConfig::builder()
            .preview_size(400, MAX_PREVIEW_SIDE + 1)
            .build()
            .is_err());
        assert!(StudioConfig::builder()
            .model_input_size(0, 320)
            .build()
            .is_err());

        let config = StudioConfig::builder()
            .backend(BackendType::Tract)
            .model_path("/models/u2net.onnx")
            .output_format(OutputFormat::Tiff)
            .build()
            .unwrap();
        assert_eq!(config.backend, BackendType::Tract);
        assert_eq!(config.model_path, Some(PathBuf::from("/models/u2net.onnx")));
        assert_eq!(config.output_format.extension(), "tiff");
    }

    #[test]
    fn test_from_json_file_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(
            &path,
            r#"{ "preview_box": { "width": 200, "height": 100 }, "backend": "tract" }"#,
        )
        .unwrap();

        let config = StudioConfig::from_json_file(&path).unwrap();
        assert_eq!(config.preview_box, FitBox::new(200, 100));
        assert_eq!(config.backend, BackendType::Tract);
        // Unspecified fields keep their defaults
        assert_eq!(config.color_key_tolerance, 30);
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempdir().unwrap();

        let missing = StudioConfig::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(StudioError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let broken = StudioConfig::from_json_file(&path);
        assert!(matches!(broken, Err(StudioError::InvalidConfig(_))));

        let path = dir.path().join("zero.json");
        std::fs::write(&path, r#"{ "preview_box": { "width": 0, "height": 10 } }"#).unwrap();
        assert!(StudioConfig::from_json_file(&path).is_err());
    }

    #[test]
    fn test_resolved_save_dir_prefers_explicit() {
        let config = StudioConfig::builder().save_dir("/tmp/out").build().unwrap();
        assert_eq!(config.resolved_save_dir(), PathBuf::from("/tmp/out"));
    }
}
