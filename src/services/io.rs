//! Image I/O operations service
//!
//! This module separates file I/O operations from the session logic,
//! so transitions can be tested against an in-memory codec.

use crate::{config::OutputFormat, error::CodecError};
use image::DynamicImage;
use std::path::Path;

/// Codec collaborator used by the session to read and write images
pub trait ImageCodec: Send + Sync {
    /// Decode the image stored at `path`
    ///
    /// # Errors
    /// - `CodecError::NotFound` if the file does not exist
    /// - `CodecError::Decode` / `CodecError::Io` on read or decode failures
    /// - `CodecError::EmptyRaster` if the decoded raster has a zero side
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError>;

    /// Encode `image` to `path` in `format`
    ///
    /// # Errors
    /// - `CodecError::Encode` / `CodecError::Io` on write failures
    fn encode(&self, image: &DynamicImage, path: &Path, format: OutputFormat)
        -> Result<(), CodecError>;
}

/// File-system codec backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageCodec;

impl FileImageCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load an image from a file path
    ///
    /// Tries extension-based format detection first, then falls back to
    /// sniffing the file content.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgremove_studio::services::FileImageCodec;
    ///
    /// let image = FileImageCodec::load_image("input.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, CodecError> {
        let path_ref = path.as_ref();

        if !path_ref.is_file() {
            return Err(CodecError::NotFound);
        }

        let image = match image::open(path_ref) {
            Ok(img) => img,
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|source| CodecError::Io {
                    operation: "read image data",
                    source,
                })?;

                // Report the original error if sniffing fails too, it names the
                // format the extension promised.
                image::load_from_memory(&data).map_err(|_| CodecError::Decode(e))?
            },
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(CodecError::EmptyRaster {
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(image)
    }

    /// Save an image to a file with the specified format
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgremove_studio::{services::FileImageCodec, OutputFormat};
    /// use image::DynamicImage;
    ///
    /// # let image = DynamicImage::new_rgba8(100, 100);
    /// FileImageCodec::save_image(&image, "output.png", OutputFormat::Png)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
    ) -> Result<(), CodecError> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CodecError::Io {
                operation: "create output directory",
                source,
            })?;
        }

        let image_format = match format {
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Tiff => image::ImageFormat::Tiff,
        };

        image
            .save_with_format(path_ref, image_format)
            .map_err(CodecError::Encode)?;

        log::debug!("Saved {} image to {}", format, path_ref.display());
        Ok(())
    }
}

impl ImageCodec for FileImageCodec {
    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        Self::load_image(path)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: OutputFormat,
    ) -> Result<(), CodecError> {
        Self::save_image(image, path, format)
    }
}
