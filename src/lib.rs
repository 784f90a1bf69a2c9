#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Removal Studio
//!
//! Core of a small background-removal utility: load an image, remove its
//! background with a pluggable segmentation backend, preview both images
//! fitted into a box, and save the cut-out.
//!
//! ## Features
//!
//! - **Fit-Resizer**: aspect-preserving scaling into a preview box with exact
//!   integer rounding
//! - **Session State Machine**: `Empty` / `Loaded` / `Processed` phases with
//!   action gating and strong failure guarantees
//! - **Backends**: colour keying (no model) and Tract ONNX inference (pure Rust)
//! - **Headless driver**: command dispatch usable from any front end
//! - **CLI**: one-shot and interactive modes (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_studio::{driver::{Command, Driver}, StudioConfig};
//!
//! let mut driver = Driver::new(StudioConfig::default())?;
//! driver.dispatch(Command::Load("photo.jpg".into()))?;
//! driver.dispatch(Command::RemoveBackground)?;
//! driver.dispatch(Command::Save(Some("photo_no_bg.png".into())))?;
//! # Ok::<(), bgremove_studio::StudioError>(())
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): Tract backend for ONNX salient-object models
//! - `cli` (default): command-line interface and subscriber setup
//! - `tracing-json`: JSON log output for the CLI

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod resize;
pub mod segmentation;
pub mod services;
pub mod session;
pub mod tracing_config;
pub mod types;
pub mod utils;

use std::path::{Path, PathBuf};

// Public API exports
pub use backends::{BackendFactory, ColorKeySegmenter, DefaultBackendFactory};
pub use config::{BackendType, OutputFormat, StudioConfig, StudioConfigBuilder};
pub use driver::{Command, Driver, Outcome};
pub use error::{CodecError, Result, SegmentationError, StudioError};
pub use resize::{fit_dimensions, fit_image};
pub use segmentation::SegmentationService;
pub use services::{FileImageCodec, ImageCodec};
pub use session::{RemovalJob, RemovalOutput, Session};
pub use types::{Action, ActionSet, FitBox, Phase, Slot};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Load, remove the background and save in one call
///
/// Without an explicit `output` the result is written beside the input as
/// `<stem>_no_bg.<ext>`. Returns the path written.
///
/// # Examples
///
/// ```rust,no_run
/// use bgremove_studio::{remove_background_file, StudioConfig};
///
/// let written = remove_background_file("input.png", None, &StudioConfig::default())?;
/// println!("saved {}", written.display());
/// # Ok::<(), bgremove_studio::StudioError>(())
/// ```
pub fn remove_background_file<P: AsRef<Path>>(
    input: P,
    output: Option<PathBuf>,
    config: &StudioConfig,
) -> Result<PathBuf> {
    let input = input.as_ref();
    let mut driver = Driver::new(config.clone())?;
    driver.dispatch(Command::Load(input.to_path_buf()))?;
    driver.dispatch(Command::RemoveBackground)?;

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
    driver.session().save(target)
}
