//! Shared utilities for model backends

pub mod preprocessing;

pub use preprocessing::{ImagePreprocessor, PreprocessingConfig};
