//! Headless presentation driver
//!
//! Maps user commands onto session transitions and renders the preview
//! slots. Any front end (the CLI shell, a GUI, a test harness) drives the
//! session through this type and serializes its calls.

use crate::backends::{BackendFactory, DefaultBackendFactory};
use crate::config::{OutputFormat, StudioConfig};
use crate::error::{CodecError, Result, StudioError};
use crate::services::FileImageCodec;
use crate::session::Session;
use crate::types::{Action, ActionSet, Phase, Slot};
use image::DynamicImage;
use std::fmt;
use std::path::{Path, PathBuf};

/// User command dispatched to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the file chosen in a picker
    Load(PathBuf),
    /// Load a raw drag-and-drop payload
    Drop(String),
    RemoveBackground,
    /// Save to a path, or to the suggested path in the save directory
    Save(Option<PathBuf>),
    Clear,
}

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Loaded {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    Processed {
        width: u32,
        height: u32,
    },
    Saved(PathBuf),
    Cleared,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded {
                path,
                width,
                height,
            } => write!(f, "Loaded {} ({width}x{height})", path.display()),
            Self::Processed { width, height } => {
                write!(f, "Background removed ({width}x{height})")
            },
            Self::Saved(path) => write!(f, "Saved {}", path.display()),
            Self::Cleared => write!(f, "Session cleared"),
        }
    }
}

/// Both preview slots fitted into the configured box
#[derive(Debug, Clone, Default)]
pub struct Previews {
    pub original: Option<DynamicImage>,
    pub result: Option<DynamicImage>,
}

/// Strip the whitespace and `{...}` wrapping some platforms add to dropped paths
///
/// # Examples
/// ```rust
/// use bgremove_studio::driver::normalize_drop_payload;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     normalize_drop_payload(" {C:/My Photos/cat.png}\n"),
///     PathBuf::from("C:/My Photos/cat.png")
/// );
/// ```
#[must_use]
pub fn normalize_drop_payload(payload: &str) -> PathBuf {
    let trimmed = payload.trim();
    let unwrapped = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);
    PathBuf::from(unwrapped)
}

/// Owns the session and configuration of one running front end
#[derive(Debug)]
pub struct Driver {
    session: Session,
    config: StudioConfig,
}

impl Driver {
    /// Create a driver with the backend selected by `config`
    ///
    /// # Errors
    /// - `StudioError::InvalidConfig` for an invalid configuration or a
    ///   backend that cannot be created
    pub fn new(config: StudioConfig) -> Result<Self> {
        Self::with_factory(config, &DefaultBackendFactory)
    }

    /// Create a driver using a custom backend factory
    pub fn with_factory(config: StudioConfig, factory: &dyn BackendFactory) -> Result<Self> {
        config.validate()?;
        let segmenter = factory.create_segmenter(&config)?;
        tracing::debug!(
            backend = %segmenter.name(),
            preview_box = %config.preview_box,
            "Driver created"
        );
        let session = Session::new(segmenter).with_output_format(config.output_format);
        Ok(Self { session, config })
    }

    /// Wrap an existing session
    #[must_use]
    pub fn with_session(session: Session, config: StudioConfig) -> Self {
        Self { session, config }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access for front ends that run removal off-thread
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    #[must_use]
    pub fn actions(&self) -> ActionSet {
        self.session.actions()
    }

    /// Where `Command::Save(None)` writes
    #[must_use]
    pub fn default_save_path(&self) -> Option<PathBuf> {
        self.session
            .suggested_save_path(self.config.resolved_save_dir())
    }

    /// Dispatch one command to the session
    ///
    /// # Errors
    /// Any transition error; the session is unchanged when one is returned.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(?command, phase = %self.phase(), "Dispatching command");
        match command {
            Command::Load(path) => self.load(path),
            Command::Drop(payload) => {
                let path = normalize_drop_payload(&payload);
                if !path.exists() {
                    return Err(StudioError::image_load(&path, CodecError::NotFound));
                }
                self.load(path)
            },
            Command::RemoveBackground => {
                self.session.remove_background()?;
                let (width, height) = self
                    .session
                    .result()
                    .map_or((0, 0), |image| (image.width(), image.height()));
                Ok(Outcome::Processed { width, height })
            },
            Command::Save(path) => {
                let target = match path {
                    Some(path) => path,
                    None => self.default_save_path().ok_or_else(|| {
                        StudioError::invalid_state(Action::Save, self.phase())
                    })?,
                };
                self.session.save(target).map(Outcome::Saved)
            },
            Command::Clear => {
                self.session.clear();
                Ok(Outcome::Cleared)
            },
        }
    }

    fn load(&mut self, path: PathBuf) -> Result<Outcome> {
        self.session.load(&path)?;
        let (width, height) = self
            .session
            .original()
            .map_or((0, 0), |image| (image.width(), image.height()));
        Ok(Outcome::Loaded {
            path,
            width,
            height,
        })
    }

    /// Render both slots with the configured preview box
    pub fn previews(&self) -> Result<Previews> {
        let fit_box = self.config.preview_box;
        Ok(Previews {
            original: self.session.preview(Slot::Original, fit_box)?,
            result: self.session.preview(Slot::Result, fit_box)?,
        })
    }

    /// Write the non-empty previews into `dir` as `original.png` / `result.png`
    pub fn write_previews<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let previews = self.previews()?;
        let mut written = Vec::new();
        for (name, image) in [("original", previews.original), ("result", previews.result)] {
            let Some(image) = image else { continue };
            let path = dir.join(format!("{name}.png"));
            FileImageCodec::save_image(&image, &path, OutputFormat::Png)
                .map_err(|source| StudioError::image_save(&path, source))?;
            written.push(path);
        }
        Ok(written)
    }
}
