//! The cross-language paragraph feature record.
//!
//! A [`ParagraphFeature`] is built once per raw segment and carries every
//! signal the scorer compares: normalized text, word list, the two numeric
//! views, punctuation fingerprint, and the geometric/font descriptors.
//! `merge` and `split` are pure constructors returning new records, which is
//! what lets the repair engine speculate on a candidate and discard it
//! without touching the owning list.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::text;

use super::geometry::{BoundingBox, FontStyle};
use super::segment::{PageContext, ParagraphType, RawSegment};

/// Feature record for one paragraph of one language rendition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphFeature {
    /// Position in the owning list (kept in step by [`reindex`])
    pub index: usize,
    /// Page width in points
    pub page_width: f32,
    /// Page height in points
    pub page_height: f32,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Paragraph type tag
    pub kind: ParagraphType,
    /// Paragraph bounding box; None only when no underlying tokens exist
    pub bounds: Option<BoundingBox>,
    /// Original segment text, untouched
    pub original_text: String,
    /// Diacritics-stripped, lowercased, whitespace-collapsed text
    pub text_cleaned: String,
    /// Words of the cleaned text
    pub words: Vec<String>,
    /// Numbers with every digit run parsed separately
    pub numbers_by_spaces: Vec<u64>,
    /// Numbers with adjacent purely-numeric words concatenated
    pub numbers_merged: Vec<u64>,
    /// Ordered non-alphanumeric, non-space characters
    pub punctuation: Vec<char>,
    /// First word of the cleaned text
    pub first_word: String,
    /// Dominant font of the covered tokens
    pub font: FontStyle,
    /// Bounding box of the first covered token
    pub first_token_bounds: Option<BoundingBox>,
    /// Bounding box of the last covered token
    pub last_token_bounds: Option<BoundingBox>,
}

impl ParagraphFeature {
    /// Build a feature record from a raw segment.
    ///
    /// Missing boxes default safely to `None`; declared geometry that is
    /// non-finite or negative is rejected with a typed error.
    pub fn build(index: usize, segment: &RawSegment, page: &PageContext) -> Result<Self> {
        if !page.is_well_formed() {
            return Err(Error::InvalidPageDimensions(page.width, page.height));
        }
        if let Some(bounds) = &segment.bounds {
            if !bounds.is_well_formed() {
                return Err(Error::InvalidBounds {
                    page: segment.page_number,
                    reason: "non-finite or negative segment box".to_string(),
                });
            }
        }
        for token in &segment.tokens {
            if !token.bounds.is_well_formed() {
                return Err(Error::InvalidBounds {
                    page: segment.page_number,
                    reason: format!("non-finite or negative token box for {:?}", token.text),
                });
            }
        }

        let derived = TextDerived::from_text(&segment.text);
        let font = dominant_font(segment);

        Ok(Self {
            index,
            page_width: page.width,
            page_height: page.height,
            page_number: segment.page_number,
            kind: segment.kind,
            bounds: segment.bounds,
            original_text: segment.text.clone(),
            text_cleaned: derived.cleaned,
            words: derived.words,
            numbers_by_spaces: derived.numbers_by_spaces,
            numbers_merged: derived.numbers_merged,
            punctuation: derived.punctuation,
            first_word: derived.first_word,
            font,
            first_token_bounds: segment.tokens.first().map(|t| t.bounds),
            last_token_bounds: segment.tokens.last().map(|t| t.bounds),
        })
    }

    /// Merge this paragraph with the one following it in reading order.
    ///
    /// Pure: returns a new record with both texts joined by a space and all
    /// derived fields recomputed. Page, type, font and bounding-box metadata
    /// come from the left operand; the last-token box comes from the right
    /// operand so that [`distance`](Self::distance) keeps working after the
    /// merge.
    pub fn merge(&self, other: &ParagraphFeature) -> ParagraphFeature {
        let joined = if self.original_text.is_empty() {
            other.original_text.clone()
        } else if other.original_text.is_empty() {
            self.original_text.clone()
        } else {
            format!("{} {}", self.original_text, other.original_text)
        };
        self.rederive(joined, self.index)
            .with_token_bounds(self.first_token_bounds, other.last_token_bounds)
    }

    /// Split this paragraph at the first whole-word occurrence of
    /// `separator_word` (compared on cleaned form).
    ///
    /// The separator starts the second half. Returns `None` when the word is
    /// absent or already at the very start. Both halves keep this record's
    /// page/font/bounding-box metadata, an approximation since the true
    /// sub-boxes are unknown at this layer.
    pub fn split(&self, separator_word: &str) -> Option<(ParagraphFeature, ParagraphFeature)> {
        let original_words: Vec<&str> = self.original_text.split_whitespace().collect();
        let at = original_words
            .iter()
            .position(|w| text::clean_text(w) == separator_word)?;
        if at == 0 {
            return None;
        }

        let head = original_words[..at].join(" ");
        let tail = original_words[at..].join(" ");
        let first = self
            .rederive(head, self.index)
            .with_token_bounds(self.first_token_bounds, self.last_token_bounds);
        let second = self
            .rederive(tail, self.index + 1)
            .with_token_bounds(self.first_token_bounds, self.last_token_bounds);
        Some((first, second))
    }

    /// Vertical gap to the next paragraph as a fraction of page height.
    ///
    /// Measured from this paragraph's last token box to `next`'s first token
    /// box, falling back to the paragraph boxes when token boxes are absent.
    /// 0.0 across different pages or when geometry is missing.
    pub fn distance(&self, next: &ParagraphFeature) -> f32 {
        if self.page_number != next.page_number || self.page_height <= 0.0 {
            return 0.0;
        }
        let bottom = self
            .last_token_bounds
            .or(self.bounds)
            .map(|b| b.bottom());
        let top = next.first_token_bounds.or(next.bounds).map(|b| b.top);
        match (bottom, top) {
            (Some(bottom), Some(top)) => ((top - bottom) / self.page_height).max(0.0),
            _ => 0.0,
        }
    }

    /// Count whole-word occurrences of `word` in the original text, compared
    /// on cleaned form.
    pub fn count_word(&self, word: &str) -> usize {
        self.original_text
            .split_whitespace()
            .filter(|w| text::clean_text(w) == word)
            .count()
    }

    /// Whether the paragraph carries no cleaned text at all.
    pub fn is_empty(&self) -> bool {
        self.text_cleaned.is_empty()
    }

    /// Number of words in the cleaned text.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn rederive(&self, original_text: String, index: usize) -> ParagraphFeature {
        let derived = TextDerived::from_text(&original_text);
        ParagraphFeature {
            index,
            original_text,
            text_cleaned: derived.cleaned,
            words: derived.words,
            numbers_by_spaces: derived.numbers_by_spaces,
            numbers_merged: derived.numbers_merged,
            punctuation: derived.punctuation,
            first_word: derived.first_word,
            ..self.clone()
        }
    }

    fn with_token_bounds(
        mut self,
        first: Option<BoundingBox>,
        last: Option<BoundingBox>,
    ) -> ParagraphFeature {
        self.first_token_bounds = first;
        self.last_token_bounds = last;
        self
    }
}

/// Rewrite `index` fields to match list positions.
///
/// Called after any filter or structural repair so that positional scoring
/// and the alignment maps stay consistent. References between components are
/// plain indices into the owning list, never record identity.
pub fn reindex(paragraphs: &mut [ParagraphFeature]) {
    for (i, paragraph) in paragraphs.iter_mut().enumerate() {
        paragraph.index = i;
    }
}

/// All text-derived fields, computed in one place so that build, merge and
/// split cannot drift apart.
struct TextDerived {
    cleaned: String,
    words: Vec<String>,
    numbers_by_spaces: Vec<u64>,
    numbers_merged: Vec<u64>,
    punctuation: Vec<char>,
    first_word: String,
}

impl TextDerived {
    fn from_text(original: &str) -> Self {
        let cleaned = text::clean_text(original);
        let words = text::split_words(&cleaned);
        let numbers_by_spaces = text::numbers_by_spaces(&words);
        let numbers_merged = text::numbers_merged_adjacent(&words);
        let punctuation = text::punctuation_fingerprint(&cleaned);
        let first_word = words.first().cloned().unwrap_or_default();
        Self {
            cleaned,
            words,
            numbers_by_spaces,
            numbers_merged,
            punctuation,
            first_word,
        }
    }
}

/// Character-length-weighted dominant font of a segment's tokens.
fn dominant_font(segment: &RawSegment) -> FontStyle {
    if segment.tokens.is_empty() {
        return FontStyle::default();
    }

    let total: usize = segment.tokens.iter().map(|t| t.text.chars().count()).sum();
    if total == 0 {
        return segment.tokens[0].font;
    }

    let mut weighted_size = 0.0f32;
    let mut bold_chars = 0usize;
    let mut italic_chars = 0usize;
    for token in &segment.tokens {
        let chars = token.text.chars().count();
        weighted_size += token.font.size * chars as f32;
        if token.font.bold {
            bold_chars += chars;
        }
        if token.font.italic {
            italic_chars += chars;
        }
    }

    FontStyle {
        size: weighted_size / total as f32,
        bold: bold_chars * 2 > total,
        italic: italic_chars * 2 > total,
    }
}
