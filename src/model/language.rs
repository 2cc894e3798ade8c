//! Per-language paragraph collections and alignment results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::feature::{reindex, ParagraphFeature};
use super::segment::{PageContext, RawSegment};

/// One accepted pairing between a main paragraph and a secondary paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Index into the main paragraph list
    pub main_index: usize,
    /// Index into the secondary paragraph list
    pub secondary_index: usize,
    /// Overall match score of the pairing
    pub score: f64,
}

/// The paragraphs of one language rendition of a document, plus the aligned
/// result once the orchestrator has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageParagraphSet {
    /// Language tag (e.g. "en", "fr")
    pub language: String,
    /// Ordered paragraph list
    pub paragraphs: Vec<ParagraphFeature>,
    /// Whether this is the reference language
    pub is_main: bool,
    /// Aligned output: one slot per main paragraph, `None` = no counterpart
    pub aligned: Vec<Option<ParagraphFeature>>,
    /// Diagnostic score map keyed by main paragraph index
    pub scores: HashMap<usize, Correspondence>,
}

impl LanguageParagraphSet {
    /// Create a secondary language set.
    pub fn new(language: impl Into<String>, paragraphs: Vec<ParagraphFeature>) -> Self {
        let mut paragraphs = paragraphs;
        reindex(&mut paragraphs);
        Self {
            language: language.into(),
            paragraphs,
            is_main: false,
            aligned: Vec::new(),
            scores: HashMap::new(),
        }
    }

    /// Flag this set as the main (reference) language.
    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    /// Build a set straight from upstream raw segments.
    pub fn from_segments(
        language: impl Into<String>,
        segments: &[RawSegment],
        page: &PageContext,
    ) -> Result<Self> {
        let paragraphs = segments
            .iter()
            .enumerate()
            .map(|(i, s)| ParagraphFeature::build(i, s, page))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(language, paragraphs))
    }

    /// Number of paragraphs currently held.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether the set holds no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Cleaned texts of the aligned output, empty string for placeholders.
    pub fn aligned_texts(&self) -> Vec<String> {
        self.aligned
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .map(|p| p.text_cleaned.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Result of aligning every secondary language against the main language.
///
/// All aligned lists have the same length as the (possibly repair-adjusted)
/// main paragraph list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedDocument {
    /// The reference language, aligned to itself
    pub main: LanguageParagraphSet,
    /// Secondary languages, positionally aligned to the main language
    pub secondaries: Vec<LanguageParagraphSet>,
}

impl AlignedDocument {
    /// Common length of every aligned list.
    pub fn aligned_len(&self) -> usize {
        self.main.aligned.len()
    }

    /// Look up a secondary language by tag.
    pub fn secondary(&self, language: &str) -> Option<&LanguageParagraphSet> {
        self.secondaries.iter().find(|s| s.language == language)
    }
}
