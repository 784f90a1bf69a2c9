//! Collaborator services used by the session
//!
//! - `io`: the image codec contract and its file-system implementation
//! - `format`: load allow-list and output naming

pub mod format;
pub mod io;

pub use format::{FormatHandler, OUTPUT_SUFFIX, SUPPORTED_INPUT_EXTENSIONS};
pub use io::{FileImageCodec, ImageCodec};
