//! # paralign
//!
//! Cross-language paragraph alignment library for Rust.
//!
//! Given the same document rendered in several languages as ordered,
//! feature-rich paragraph lists, this library pairs every paragraph of a
//! main (reference) language with its counterpart in each secondary
//! language, producing equal-length aligned lists with explicit
//! placeholders where a counterpart is missing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paralign::{align, LanguageParagraphSet, PageContext, RawSegment};
//!
//! fn main() -> paralign::Result<()> {
//!     let page = PageContext::new(595.0, 842.0, 12);
//!     let english: Vec<RawSegment> = load_segments("en");
//!     let french: Vec<RawSegment> = load_segments("fr");
//!
//!     let document = align(vec![
//!         LanguageParagraphSet::from_segments("en", &english, &page)?.main(),
//!         LanguageParagraphSet::from_segments("fr", &french, &page)?,
//!     ])?;
//!
//!     for (main, counterpart) in document
//!         .main
//!         .aligned
//!         .iter()
//!         .zip(&document.secondary("fr").unwrap().aligned)
//!     {
//!         println!("{:?} <-> {:?}", main, counterpart);
//!     }
//!     Ok(())
//! }
//! # fn load_segments(_lang: &str) -> Vec<paralign::RawSegment> { Vec::new() }
//! ```
//!
//! ## Features
//!
//! - **Multi-signal scoring**: text, numbers, punctuation, geometry, fonts
//! - **Multi-pass greedy matching**: falling thresholds, windowed search
//! - **Segmentation repair**: speculative splits and merges, kept only
//!   when they raise the match score
//! - **Preprocessing pipeline**: header/footer removal, cross-page merging,
//!   garbage filtering
//! - **Parallel alignment**: uses Rayon across secondary languages

pub mod align;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod score;
pub mod text;

// Re-export commonly used types
pub use align::{
    AlignOptions, AlignmentMap, DocumentAligner, MatcherOptions, RepairEngine, RepairOptions,
};
pub use error::{Error, Result};
pub use model::{
    AlignedDocument, BoundingBox, Correspondence, FontStyle, LanguageParagraphSet, PageContext,
    ParagraphFeature, ParagraphType, RawSegment, Token,
};
pub use preprocess::{PreprocessOptions, Preprocessor};
pub use score::MatchScore;

/// Align language renditions of a document with default options.
///
/// The main language is the flagged set, or the first one when none is
/// flagged. Secondary outputs all share the main list's length.
///
/// # Example
///
/// ```no_run
/// use paralign::{align, LanguageParagraphSet};
///
/// # let sets: Vec<LanguageParagraphSet> = Vec::new();
/// let document = align(sets).unwrap();
/// println!("{} aligned paragraphs", document.aligned_len());
/// ```
pub fn align(languages: Vec<LanguageParagraphSet>) -> Result<AlignedDocument> {
    DocumentAligner::default().align(languages)
}

/// Align with custom options.
///
/// # Example
///
/// ```no_run
/// use paralign::{align_with_options, AlignOptions, LanguageParagraphSet};
///
/// # let sets: Vec<LanguageParagraphSet> = Vec::new();
/// let options = AlignOptions::new()
///     .with_main_language("en")
///     .parallel();
/// let document = align_with_options(sets, options).unwrap();
/// ```
pub fn align_with_options(
    languages: Vec<LanguageParagraphSet>,
    options: AlignOptions,
) -> Result<AlignedDocument> {
    DocumentAligner::new(options).align(languages)
}

/// Score two paragraphs against each other.
///
/// Convenience wrapper over [`MatchScore::between`] for callers who only
/// need the aggregate.
pub fn score_pair(a: &ParagraphFeature, b: &ParagraphFeature) -> f64 {
    MatchScore::overall(a, b)
}
