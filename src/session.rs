//! Session state machine for one editing task
//!
//! A `Session` tracks one image through Load, RemoveBackground and Save.
//! Each phase variant carries exactly the data valid in that phase, and a
//! failed transition never touches the state, so the session stays usable
//! after any error.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bgremove_studio::{backends::ColorKeySegmenter, Phase, Session};
//! use std::sync::Arc;
//!
//! let mut session = Session::new(Arc::new(ColorKeySegmenter::default()));
//! session.load("/photos/photo.jpg")?;
//! session.remove_background()?;
//! assert_eq!(session.phase(), Phase::Processed);
//! assert_eq!(session.suggested_filename().as_deref(), Some("photo_no_bg.png"));
//! session.save("/photos/photo_no_bg.png")?;
//! # Ok::<(), bgremove_studio::StudioError>(())
//! ```

use crate::config::OutputFormat;
use crate::error::{CodecError, Result, SegmentationError, StudioError};
use crate::resize::fit_image;
use crate::segmentation::SegmentationService;
use crate::services::{FileImageCodec, FormatHandler, ImageCodec};
use crate::tracing_config::spans;
use crate::types::{Action, ActionSet, FitBox, Phase, Slot};
use image::DynamicImage;
use instant::{Duration, Instant};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Image loaded by a successful Load
#[derive(Clone)]
struct LoadedImage {
    source_path: PathBuf,
    original: Arc<DynamicImage>,
}

enum State {
    Empty,
    Loaded(LoadedImage),
    Processed {
        image: LoadedImage,
        result: Arc<DynamicImage>,
    },
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            Self::Empty => Phase::Empty,
            Self::Loaded(_) => Phase::Loaded,
            Self::Processed { .. } => Phase::Processed,
        }
    }

    fn loaded(&self) -> Option<&LoadedImage> {
        match self {
            Self::Empty => None,
            Self::Loaded(image) | Self::Processed { image, .. } => Some(image),
        }
    }
}

/// The single mutable record of one in-progress editing task
pub struct Session {
    codec: Box<dyn ImageCodec>,
    segmenter: Arc<dyn SegmentationService>,
    output_format: OutputFormat,
    generation: u64,
    state: State,
}

impl Session {
    /// Create an empty session reading and writing files with `FileImageCodec`
    #[must_use]
    pub fn new(segmenter: Arc<dyn SegmentationService>) -> Self {
        Self::with_codec(Box::new(FileImageCodec::new()), segmenter)
    }

    /// Create an empty session with a custom codec
    #[must_use]
    pub fn with_codec(codec: Box<dyn ImageCodec>, segmenter: Arc<dyn SegmentationService>) -> Self {
        Self {
            codec,
            segmenter,
            output_format: OutputFormat::default(),
            generation: 0,
            state: State::Empty,
        }
    }

    /// Set the format used by Save and the suggested filename
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.state.loaded().map(|image| image.source_path.as_path())
    }

    #[must_use]
    pub fn original(&self) -> Option<&DynamicImage> {
        self.state.loaded().map(|image| image.original.as_ref())
    }

    #[must_use]
    pub fn result(&self) -> Option<&DynamicImage> {
        match &self.state {
            State::Processed { result, .. } => Some(result.as_ref()),
            _ => None,
        }
    }

    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Name of the segmentation backend in use
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.segmenter.name()
    }

    /// Counter bumped by every Load and Clear
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Actions the presentation layer should currently enable
    #[must_use]
    pub fn actions(&self) -> ActionSet {
        ActionSet::for_phase(self.phase())
    }

    #[must_use]
    pub fn is_permitted(&self, action: Action) -> bool {
        action.is_permitted_in(self.phase())
    }

    fn ensure_permitted(&self, action: Action) -> Result<()> {
        if self.is_permitted(action) {
            Ok(())
        } else {
            Err(StudioError::invalid_state(action, self.phase()))
        }
    }

    /// Load the image at `path`, discarding any previous image and result
    ///
    /// # Errors
    /// - `StudioError::UnsupportedFormat` if the extension is not on the
    ///   allow-list (no decode is attempted)
    /// - `StudioError::ImageLoad` if the codec cannot read the file
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let _span = spans::load(path).entered();

        if !FormatHandler::is_supported_input(path) {
            return Err(StudioError::unsupported_format(path));
        }

        let image = self
            .codec
            .decode(path)
            .map_err(|source| StudioError::image_load(path, source))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(StudioError::image_load(
                path,
                CodecError::EmptyRaster {
                    width: image.width(),
                    height: image.height(),
                },
            ));
        }

        tracing::info!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Image loaded"
        );

        self.generation += 1;
        self.state = State::Loaded(LoadedImage {
            source_path: path.to_path_buf(),
            original: Arc::new(image),
        });
        Ok(())
    }

    /// Run background removal inline and store the result
    ///
    /// # Errors
    /// - `StudioError::InvalidState` when no image is loaded
    /// - `StudioError::BackgroundRemoval` when the segmenter fails; the
    ///   session keeps its previous phase and result
    pub fn remove_background(&mut self) -> Result<()> {
        let job = self.begin_removal()?;
        let output = job.run();
        self.finish_removal(output)
    }

    /// Start a removal that can run on another thread
    ///
    /// The job holds shared handles to the original image and the segmenter,
    /// so the session can be read (and rendered) while it runs.
    ///
    /// # Errors
    /// - `StudioError::InvalidState` when no image is loaded
    pub fn begin_removal(&self) -> Result<RemovalJob> {
        self.ensure_permitted(Action::RemoveBackground)?;
        let image = self
            .state
            .loaded()
            .ok_or_else(|| StudioError::invalid_state(Action::RemoveBackground, self.phase()))?;

        Ok(RemovalJob {
            generation: self.generation,
            original: Arc::clone(&image.original),
            segmenter: Arc::clone(&self.segmenter),
        })
    }

    /// Commit the output of a removal job
    ///
    /// # Errors
    /// - `StudioError::StaleRemoval` if the session was reloaded or cleared
    ///   after the job started
    /// - `StudioError::BackgroundRemoval` if the segmenter failed or returned
    ///   an image of the wrong size
    pub fn finish_removal(&mut self, output: RemovalOutput) -> Result<()> {
        if output.generation != self.generation {
            tracing::warn!(
                job_generation = output.generation,
                session_generation = self.generation,
                "Discarding stale background removal result"
            );
            return Err(StudioError::StaleRemoval);
        }

        let image = self
            .state
            .loaded()
            .cloned()
            .ok_or_else(|| StudioError::invalid_state(Action::RemoveBackground, self.phase()))?;

        let result = output.result?;
        let expected = (image.original.width(), image.original.height());
        let actual = (result.width(), result.height());
        if expected != actual {
            return Err(SegmentationError::DimensionMismatch { expected, actual }.into());
        }

        tracing::info!(
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Background removed"
        );

        self.state = State::Processed {
            image,
            result: Arc::new(result),
        };
        Ok(())
    }

    /// Encode the result to `path`, returning the path actually written
    ///
    /// A missing or mismatched extension is replaced by the configured
    /// format's, so `out.jpg` is written as `out.png` when saving PNG.
    /// The session is unchanged whatever the outcome.
    ///
    /// # Errors
    /// - `StudioError::InvalidState` unless the session is processed
    /// - `StudioError::ImageSave` if the codec cannot write the file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        self.ensure_permitted(Action::Save)?;
        let State::Processed { result, .. } = &self.state else {
            return Err(StudioError::invalid_state(Action::Save, self.phase()));
        };

        let path = FormatHandler::with_format_extension(path.as_ref(), self.output_format);
        let format = self.output_format.to_string();
        let _span = spans::save(&path, &format).entered();

        self.codec
            .encode(result, &path, self.output_format)
            .map_err(|source| StudioError::image_save(&path, source))?;

        tracing::info!("Result saved");
        Ok(path)
    }

    /// Reset the session to empty
    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = State::Empty;
        tracing::debug!(generation = self.generation, "Session cleared");
    }

    /// Default output filename, `<stem>_no_bg.<ext>`, once an image is loaded
    #[must_use]
    pub fn suggested_filename(&self) -> Option<String> {
        self.source_path()
            .map(|path| FormatHandler::output_filename(path, self.output_format))
    }

    /// Default output path inside `dir`
    #[must_use]
    pub fn suggested_save_path<P: AsRef<Path>>(&self, dir: P) -> Option<PathBuf> {
        self.suggested_filename()
            .map(|name| dir.as_ref().join(name))
    }

    /// Render a slot fitted into `fit_box`, or `None` when the slot is empty
    ///
    /// # Errors
    /// - `StudioError::InvalidConfig` for a zero-sized box
    pub fn preview(&self, slot: Slot, fit_box: FitBox) -> Result<Option<DynamicImage>> {
        let image = match slot {
            Slot::Original => self.original(),
            Slot::Result => self.result(),
        };
        let Some(image) = image else {
            return Ok(None);
        };

        let _span = spans::preview(&slot.to_string(), &fit_box.to_string()).entered();
        fit_image(image, fit_box).map(Some)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase())
            .field("source_path", &self.source_path())
            .field("backend", &self.segmenter.name())
            .field("output_format", &self.output_format)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Background removal detached from the session
pub struct RemovalJob {
    generation: u64,
    original: Arc<DynamicImage>,
    segmenter: Arc<dyn SegmentationService>,
}

impl RemovalJob {
    /// Generation of the session when the job started
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run the segmenter; this is the long-running part of a removal
    #[must_use]
    pub fn run(self) -> RemovalOutput {
        let dimensions = (self.original.width(), self.original.height());
        let _span = spans::removal(self.segmenter.name(), dimensions, self.generation).entered();

        let start = Instant::now();
        let result = self.segmenter.remove_background(&self.original);
        let elapsed = start.elapsed();
        if let Err(e) = &result {
            tracing::debug!(error = %e, "Segmentation failed");
        }

        RemovalOutput {
            generation: self.generation,
            result,
            elapsed,
        }
    }
}

impl fmt::Debug for RemovalJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalJob")
            .field("generation", &self.generation)
            .field("backend", &self.segmenter.name())
            .finish_non_exhaustive()
    }
}

/// Output of a `RemovalJob`, committed with `Session::finish_removal`
#[derive(Debug)]
pub struct RemovalOutput {
    generation: u64,
    result: std::result::Result<DynamicImage, SegmentationError>,
    elapsed: Duration,
}

impl RemovalOutput {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
