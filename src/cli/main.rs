//! Background Removal Studio CLI
//!
//! Command-line presentation driver: a one-shot mode mirroring the
//! load, remove, save sequence, and an interactive shell over one session.

use super::config::CliConfigBuilder;
use super::shell;
use crate::{
    backends::{BackendFactory, DefaultBackendFactory},
    driver::{Command, Driver, Outcome},
    error::StudioError,
    tracing_config::events,
    types::Action,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Background removal studio
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-studio")]
pub struct Cli {
    /// Input image (jpg, jpeg, png, bmp) for one-shot mode
    #[arg(value_name = "INPUT", required_unless_present_any = &["interactive", "show_backends"])]
    pub input: Option<PathBuf>,

    /// Output file [default: <stem>_no_bg.png beside the input]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Start an interactive session shell instead of one-shot mode
    #[arg(short, long)]
    pub interactive: bool,

    /// JSON configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Segmentation backend
    #[arg(short, long, value_enum)]
    pub backend: Option<CliBackend>,

    /// ONNX model file for the tract backend
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Per-channel tolerance of the color-key backend (0-255)
    #[arg(long)]
    pub tolerance: Option<u8>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// Preview box as WIDTHxHEIGHT [default: 400x400]
    #[arg(long, value_name = "WxH")]
    pub preview_size: Option<String>,

    /// Write fitted previews (original.png, result.png) into this directory
    #[arg(long, value_name = "DIR")]
    pub preview_dir: Option<PathBuf>,

    /// Directory for `save` without a path in the interactive shell [default: home]
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show available backends and exit
    #[arg(long)]
    pub show_backends: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackend {
    ColorKey,
    Tract,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Tiff,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    if cli.show_backends {
        show_backend_diagnostics();
        return Ok(());
    }

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    info!("Backend: {}", config.backend);
    debug!(preview_box = %config.preview_box, format = %config.output_format, "Configuration ready");

    let mut driver = Driver::new(config).context("Failed to create session")?;

    if cli.interactive {
        return shell::run(&mut driver, cli.preview_dir.as_deref()).await;
    }

    let input = cli
        .input
        .as_deref()
        .context("An input image is required outside interactive mode")?;
    let written = run_one_shot(&mut driver, input, cli.output.clone()).await?;
    println!("✅ Saved {}", written.display());

    if let Some(dir) = &cli.preview_dir {
        write_previews(&driver, dir)?;
    }

    Ok(())
}

fn init_tracing(verbose_count: u8) -> Result<()> {
    use crate::tracing_config::{init_cli_tracing, TracingFormat};

    let session_id = init_cli_tracing(verbose_count, TracingFormat::Console)
        .context("Failed to initialize tracing subscriber")?;
    debug!(session_id = %session_id, verbosity = verbose_count, "Tracing initialized");
    Ok(())
}

fn show_backend_diagnostics() {
    println!("🔍 Segmentation Backends");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let cpu_count = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    println!("💻 System: {cpu_count} CPU cores detected");

    let available = DefaultBackendFactory.available_backends();
    for backend in [crate::BackendType::ColorKey, crate::BackendType::Tract] {
        let status = if available.contains(&backend) {
            "✅ Available"
        } else {
            "❌ Not compiled in"
        };
        let description = match backend {
            crate::BackendType::ColorKey => "Border colour keying, no model required",
            crate::BackendType::Tract => "ONNX salient-object model via Tract (pure Rust)",
        };
        println!("  • {backend}: {status} - {description}");
    }

    println!("\n💡 Usage Examples:");
    println!("  bgremove-studio photo.jpg                          # color-key, writes photo_no_bg.png");
    println!("  bgremove-studio --backend tract --model u2net.onnx photo.jpg");
    println!("  bgremove-studio --interactive --preview-dir /tmp/previews");
}

/// Load, remove and save one image, returning the path written
async fn run_one_shot(driver: &mut Driver, input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    let start_time = Instant::now();

    let loaded = driver
        .dispatch(Command::Load(input.to_path_buf()))
        .with_context(|| format!("Failed to load {}", input.display()))?;
    info!("{loaded}");

    remove_with_spinner(driver).await?;

    let target = match output {
        Some(path) => path,
        None => {
            let dir = input.parent().unwrap_or_else(|| Path::new(""));
            driver
                .session()
                .suggested_save_path(dir)
                .ok_or_else(|| StudioError::invalid_state(Action::Save, driver.phase()))?
        },
    };

    let outcome = driver.dispatch(Command::Save(Some(target)))?;
    events::progress(&format!(
        "Processed {} in {:.2}s",
        input.display(),
        start_time.elapsed().as_secs_f64()
    ));

    match outcome {
        Outcome::Saved(path) => Ok(path),
        other => anyhow::bail!("Unexpected outcome of save: {other}"),
    }
}

/// Run background removal off the async runtime behind a spinner
///
/// The driver is borrowed mutably for the duration, so no other command can
/// be dispatched until the removal has been committed or rejected.
pub(crate) async fn remove_with_spinner(driver: &mut Driver) -> Result<Outcome> {
    let job = driver.session().begin_removal()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(format!(
        "Removing background ({})",
        driver.session().backend_name()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let joined = tokio::task::spawn_blocking(move || job.run()).await;
    spinner.finish_and_clear();
    let output = joined.context("Background removal task panicked")?;

    driver.session_mut().finish_removal(output)?;
    let (width, height) = driver
        .session()
        .result()
        .map_or((0, 0), |image| (image.width(), image.height()));
    Ok(Outcome::Processed { width, height })
}

pub(crate) fn write_previews(driver: &Driver, dir: &Path) -> Result<()> {
    let written = driver
        .write_previews(dir)
        .with_context(|| format!("Failed to write previews to {}", dir.display()))?;
    for path in written {
        println!("🖼  Preview {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_one_shot_arguments() {
        let cli = Cli::try_parse_from([
            "bgremove-studio",
            "photo.jpg",
            "-o",
            "out.png",
            "--backend",
            "color-key",
            "--tolerance",
            "12",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.input, Some(PathBuf::from("photo.jpg")));
        assert_eq!(cli.output, Some(PathBuf::from("out.png")));
        assert_eq!(cli.backend, Some(CliBackend::ColorKey));
        assert_eq!(cli.tolerance, Some(12));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.interactive);
    }

    #[test]
    fn test_input_required_outside_interactive() {
        assert!(Cli::try_parse_from(["bgremove-studio"]).is_err());
        assert!(Cli::try_parse_from(["bgremove-studio", "--interactive"]).is_ok());
        assert!(Cli::try_parse_from(["bgremove-studio", "--show-backends"]).is_ok());
    }

    #[tokio::test]
    async fn test_run_one_shot_writes_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        image::RgbImage::from_pixel(12, 12, image::Rgb([200, 200, 200]))
            .save(&input)
            .unwrap();

        let mut driver = Driver::new(crate::StudioConfig::default()).unwrap();
        let written = run_one_shot(&mut driver, &input, None).await.unwrap();

        assert_eq!(written, dir.path().join("photo_no_bg.png"));
        assert!(written.is_file());
    }
}
