//! Error types for paralign library.

use thiserror::Error;

/// Result type alias for paralign operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building paragraph features.
///
/// The alignment algorithm itself has no failure modes: degenerate inputs
/// (empty lists, a single language, fully mismatched documents) are handled
/// as explicit data cases. Errors only arise when an upstream segment is too
/// malformed to turn into a well-formed
/// [`ParagraphFeature`](crate::model::ParagraphFeature).
#[derive(Error, Debug)]
pub enum Error {
    /// A segment's bounding box has non-finite or negative geometry.
    #[error("Invalid bounding box on page {page}: {reason}")]
    InvalidBounds {
        /// Page number of the offending segment
        page: u32,
        /// What was wrong with the geometry
        reason: String,
    },

    /// Page dimensions are unusable (zero, negative or non-finite).
    #[error("Invalid page dimensions: {0} x {1}")]
    InvalidPageDimensions(f32, f32),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
