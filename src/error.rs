//! Error types for session transitions and their collaborators

use crate::types::{Action, Phase};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Errors surfaced to the presentation driver
///
/// A failed transition never modifies the session, so every variant is
/// recoverable: the caller reports it and the session stays usable.
#[derive(Error, Debug)]
pub enum StudioError {
    /// A zero-dimension raster reached the fit resizer
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The file extension is not on the load allow-list
    #[error(
        "Unsupported format '{extension}' for '{}'. Supported formats: jpg, jpeg, png, bmp",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The codec could not read the image
    #[error("Could not open image '{}': {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The codec could not write the result
    #[error("Failed to save image '{}': {source}", .path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The segmentation service failed
    #[error("Failed to remove background: {0}")]
    BackgroundRemoval(#[from] SegmentationError),

    /// The action is not permitted in the current phase
    #[error("Cannot {action} while the session is {phase}")]
    InvalidState { action: Action, phase: Phase },

    /// An off-thread removal finished after the session was reloaded or cleared
    #[error("Background removal result discarded: the session changed while it was running")]
    StaleRemoval,

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors outside the image codec
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create an unsupported format error from the offending path
    pub fn unsupported_format<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("(no extension)")
            .to_string();
        Self::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }
    }

    pub fn image_load<P: AsRef<Path>>(path: P, source: CodecError) -> Self {
        Self::ImageLoad {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn image_save<P: AsRef<Path>>(path: P, source: CodecError) -> Self {
        Self::ImageSave {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_state(action: Action, phase: Phase) -> Self {
        Self::InvalidState { action, phase }
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {parameter}: {value} (valid range: {valid_range})"
        ))
    }
}

/// Failures of the image codec collaborator
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("file does not exist")]
    NotFound,

    #[error("decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("encode error: {0}")]
    Encode(#[source] image::ImageError),

    #[error("{operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The decoded raster has a zero side
    #[error("decoded raster is {width}x{height}")]
    EmptyRaster { width: u32, height: u32 },
}

/// Failures of the segmentation service collaborator
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// The backend (model runtime, etc.) failed
    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },

    /// The input cannot be segmented by this backend
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// The output raster does not match the input size
    #[error(
        "output is {}x{} but input was {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl SegmentationError {
    pub fn backend<B: Into<String>, M: std::fmt::Display>(backend: B, message: M) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = StudioError::invalid_config("fit box must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: fit box must not be empty"
        );

        let err = StudioError::invalid_state(Action::Save, Phase::Loaded);
        assert_eq!(
            err.to_string(),
            "Cannot save the result while the session is loaded"
        );
    }

    #[test]
    fn test_unsupported_format_extension() {
        let err = StudioError::unsupported_format("/tmp/notes.txt");
        match &err {
            StudioError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "txt"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("jpg, jpeg, png, bmp"));

        let err = StudioError::unsupported_format("/tmp/README");
        assert!(err.to_string().contains("(no extension)"));
    }

    #[test]
    fn test_load_error_keeps_cause() {
        let err = StudioError::image_load("/x/photo.jpg", CodecError::NotFound);
        assert!(err.to_string().contains("/x/photo.jpg"));
        assert!(err.to_string().contains("does not exist"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_segmentation_error_conversion() {
        let err: StudioError = SegmentationError::DimensionMismatch {
            expected: (10, 20),
            actual: (5, 5),
        }
        .into();
        assert!(matches!(err, StudioError::BackgroundRemoval(_)));
        assert!(err.to_string().contains("5x5"));
        assert!(err.to_string().contains("10x20"));
    }

    #[test]
    fn test_config_value_error() {
        let err = StudioError::config_value_error("preview width", 0, "1-16384");
        let message = err.to_string();
        assert!(message.contains("preview width"));
        assert!(message.contains("1-16384"));
    }
}
