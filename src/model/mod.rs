//! Data model for cross-language paragraph alignment.
//!
//! This module defines the intermediate representation that bridges the
//! upstream layout/segmentation stage and the alignment pipeline: raw
//! segments in, feature records and per-language sets out. The model is
//! source-format agnostic; it only assumes page coordinates in points.

mod feature;
mod geometry;
mod language;
mod segment;

pub use feature::{reindex, ParagraphFeature};
pub use geometry::{BoundingBox, FontStyle};
pub use language::{AlignedDocument, Correspondence, LanguageParagraphSet};
pub use segment::{PageContext, ParagraphType, RawSegment, Token};
