//! Input allow-list and output naming

use crate::config::OutputFormat;
use std::path::{Path, PathBuf};

/// Extensions accepted by Load, lowercase and without the dot
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Suffix appended to the source stem for the suggested output name
pub const OUTPUT_SUFFIX: &str = "_no_bg";

/// Service for input format checks and output file naming
pub struct FormatHandler;

impl FormatHandler {
    /// Check if a file path has a supported input extension (case-insensitive)
    ///
    /// # Examples
    /// ```rust
    /// use bgremove_studio::services::FormatHandler;
    ///
    /// assert!(FormatHandler::is_supported_input("photo.JPG"));
    /// assert!(!FormatHandler::is_supported_input("photo.webp"));
    /// ```
    pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext_lower = ext.to_lowercase();
                SUPPORTED_INPUT_EXTENSIONS.contains(&ext_lower.as_str())
            })
    }

    /// Suggested output filename for a source path: `<stem>_no_bg.<ext>`
    ///
    /// # Examples
    /// ```rust
    /// use bgremove_studio::{services::FormatHandler, OutputFormat};
    ///
    /// assert_eq!(
    ///     FormatHandler::output_filename("/x/photo.jpg", OutputFormat::Png),
    ///     "photo_no_bg.png"
    /// );
    /// ```
    pub fn output_filename<P: AsRef<Path>>(source: P, format: OutputFormat) -> String {
        let stem = source
            .as_ref()
            .file_stem()
            .map_or_else(|| "image".into(), |s| s.to_string_lossy());
        format!("{stem}{OUTPUT_SUFFIX}.{}", format.extension())
    }

    /// Give `path` the extension of `format`
    ///
    /// A missing or mismatched extension is replaced, so the file name always
    /// agrees with the encoded bytes. `tif` is accepted for TIFF.
    #[must_use]
    pub fn with_format_extension(path: &Path, format: OutputFormat) -> PathBuf {
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| {
                ext == format.extension() || (format == OutputFormat::Tiff && ext == "tif")
            });

        if matches {
            path.to_path_buf()
        } else {
            path.with_extension(format.extension())
        }
    }
}
