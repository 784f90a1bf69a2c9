//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliBackend, CliOutputFormat};
use crate::{
    config::{BackendType, OutputFormat, StudioConfig, StudioConfigBuilder},
    types::FitBox,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a `StudioConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration: file values first, flags on top
    pub(crate) fn from_cli(cli: &Cli) -> Result<StudioConfig> {
        let base = match &cli.config {
            Some(path) => StudioConfig::from_json_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => StudioConfig::default(),
        };

        let mut builder = StudioConfigBuilder::from_config(base);

        if let Some(backend) = cli.backend {
            builder = builder.backend(match backend {
                CliBackend::ColorKey => BackendType::ColorKey,
                CliBackend::Tract => BackendType::Tract,
            });
        }
        // A model without an explicit backend implies tract
        if let Some(model) = &cli.model {
            builder = builder.model_path(model);
            if cli.backend.is_none() {
                builder = builder.backend(BackendType::Tract);
            }
        }
        if let Some(tolerance) = cli.tolerance {
            builder = builder.color_key_tolerance(tolerance);
        }
        if let Some(format) = cli.format {
            builder = builder.output_format(match format {
                CliOutputFormat::Png => OutputFormat::Png,
                CliOutputFormat::Tiff => OutputFormat::Tiff,
            });
        }
        if let Some(size) = &cli.preview_size {
            builder = builder.preview_box(Self::parse_preview_size(size)?);
        }
        if let Some(dir) = &cli.save_dir {
            builder = builder.save_dir(dir);
        }

        builder.build().context("Invalid configuration")
    }

    fn parse_preview_size(value: &str) -> Result<FitBox> {
        FitBox::parse(value)
            .with_context(|| format!("Invalid preview size '{value}', expected WIDTHxHEIGHT"))
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.interactive && cli.output.is_some() {
            anyhow::bail!("--output only applies to one-shot mode");
        }

        if let Some(size) = &cli.preview_size {
            Self::parse_preview_size(size)?;
        }

        if cli.backend == Some(CliBackend::ColorKey) && cli.model.is_some() {
            anyhow::bail!("--model is only used by the tract backend");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["bgremove-studio"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_cli_config_conversion() {
        let cli = parse(&[
            "photo.jpg",
            "--tolerance",
            "12",
            "--format",
            "tiff",
            "--preview-size",
            "320x240",
            "--save-dir",
            "/tmp/out",
        ]);

        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.backend, BackendType::ColorKey);
        assert_eq!(config.color_key_tolerance, 12);
        assert_eq!(config.output_format, OutputFormat::Tiff);
        assert_eq!(config.preview_box, FitBox::new(320, 240));
        assert_eq!(config.save_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_model_implies_tract() {
        let cli = parse(&["photo.jpg", "--model", "/models/u2net.onnx"]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.backend, BackendType::Tract);
        assert_eq!(config.model_path, Some(PathBuf::from("/models/u2net.onnx")));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(
            &path,
            r#"{ "color_key_tolerance": 50, "preview_box": { "width": 100, "height": 100 } }"#,
        )
        .unwrap();

        let cli = parse(&["photo.jpg", "--config", path.to_str().unwrap(), "--tolerance", "5"]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.color_key_tolerance, 5);
        assert_eq!(config.preview_box, FitBox::new(100, 100));
    }

    #[test]
    fn test_cli_validation() {
        assert!(CliConfigBuilder::validate_cli(&parse(&["photo.jpg"])).is_ok());
        assert!(CliConfigBuilder::validate_cli(&parse(&["--interactive", "-o", "x.png"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&["photo.jpg", "--preview-size", "big"])).is_err());
        assert!(CliConfigBuilder::validate_cli(&parse(&[
            "photo.jpg",
            "--backend",
            "color-key",
            "--model",
            "m.onnx"
        ]))
        .is_err());
    }

    #[test]
    fn test_zero_preview_size_rejected() {
        let cli = parse(&["photo.jpg", "--preview-size", "0x100"]);
        assert!(CliConfigBuilder::from_cli(&cli).is_err());
    }
}
