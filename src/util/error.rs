//! Error types for cornermatch.

use thiserror::Error;

/// Result alias for cornermatch operations.
pub type CornerMatchResult<T> = std::result::Result<T, CornerMatchError>;

/// Errors that can occur when building inputs or configuring the matcher.
///
/// Data-level issues during matching (a corner whose window leaves the frame,
/// a corner with no acceptable candidate) are silently excluded rather than
/// reported here; only contract violations at construction boundaries
/// surface as errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CornerMatchError {
    /// Image width or height is zero.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the image width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The pixel buffer does not cover the declared geometry.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Correlation window side is even or outside the supported range.
    #[error("unsupported match size {match_sz}: must be odd and within 3..=15")]
    InvalidMatchSize { match_sz: u8 },
    /// Image decoding or loading failed.
    #[cfg(feature = "image-io")]
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
}
