//! Fuzzy match scoring between two paragraph feature records.
//!
//! Twelve independent sub-scores in [0, 1] plus one aggregate. The aggregate
//! is an unweighted mean: it is deliberately a tunable detail, anchored only
//! by its fixed points (a paragraph scores 1.0 against itself, disjoint
//! paragraphs score near 0, half-overlapping text scores near 0.5).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{BoundingBox, ParagraphFeature};
use crate::text;

/// Number of sub-scores feeding the aggregate.
const SUB_SCORE_COUNT: f64 = 12.0;

/// Multi-signal similarity between a main-language paragraph and a
/// secondary-language paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Same position in the owning list
    pub same_index: f64,
    /// Same paragraph type tag
    pub same_type: f64,
    /// Same page number
    pub same_page: f64,
    /// Word-set intersection over the longer word list
    pub text_overlap: f64,
    /// One minus the relative word-count difference
    pub word_count: f64,
    /// Shared numbers over the larger number set (both numeric views)
    pub shared_numbers: f64,
    /// Fuzzy similarity of the first words
    pub first_word: f64,
    /// Shared punctuation marks over the longer fingerprint
    pub punctuation: f64,
    /// Vertical-center proximity as a fraction of page height
    pub vertical_position: f64,
    /// Right-edge proximity as a fraction of page width (justification proxy)
    pub right_margin: f64,
    /// Horizontal-center proximity as a fraction of page width (indentation proxy)
    pub horizontal_center: f64,
    /// Font agreement: size similarity (half) plus bold/italic equality
    /// (a quarter each)
    pub font: f64,
    /// Aggregate of all sub-scores, in [0, 1]
    pub overall_score: f64,
}

impl MatchScore {
    /// Score paragraph `a` against paragraph `b`.
    pub fn between(a: &ParagraphFeature, b: &ParagraphFeature) -> MatchScore {
        let same_index = equality(a.index == b.index);
        let same_type = equality(a.kind == b.kind);
        let same_page = equality(a.page_number == b.page_number);
        let text_overlap = word_overlap(&a.words, &b.words);
        let word_count = count_similarity(a.words.len(), b.words.len());
        let shared_numbers = number_overlap(a, b);
        let first_word = text::word_similarity(&a.first_word, &b.first_word);
        let punctuation = punctuation_overlap(&a.punctuation, &b.punctuation);
        let vertical_position = box_proximity(a, b, |p, bb| bb.center_y() / p.page_height);
        let right_margin = box_proximity(a, b, |p, bb| bb.right() / p.page_width);
        let horizontal_center = box_proximity(a, b, |p, bb| bb.center_x() / p.page_width);
        let font = font_similarity(a, b);

        let overall_score = (same_index
            + same_type
            + same_page
            + text_overlap
            + word_count
            + shared_numbers
            + first_word
            + punctuation
            + vertical_position
            + right_margin
            + horizontal_center
            + font)
            / SUB_SCORE_COUNT;

        MatchScore {
            same_index,
            same_type,
            same_page,
            text_overlap,
            word_count,
            shared_numbers,
            first_word,
            punctuation,
            vertical_position,
            right_margin,
            horizontal_center,
            font,
            overall_score,
        }
    }

    /// Aggregate score only.
    pub fn overall(a: &ParagraphFeature, b: &ParagraphFeature) -> f64 {
        MatchScore::between(a, b).overall_score
    }
}

fn equality(eq: bool) -> f64 {
    if eq {
        1.0
    } else {
        0.0
    }
}

/// Multiset word intersection divided by the longer list's length.
///
/// Repeated words count once per occurrence on both sides, so a paragraph
/// always overlaps fully with itself.
fn word_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in a {
        *counts.entry(word.as_str()).or_insert(0) += 1;
    }
    let mut shared = 0usize;
    for word in b {
        if let Some(n) = counts.get_mut(word.as_str()) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }
    shared as f64 / a.len().max(b.len()) as f64
}

/// One minus the relative difference between two counts.
fn count_similarity(a: usize, b: usize) -> f64 {
    if a == 0 && b == 0 {
        return 1.0;
    }
    let max = a.max(b) as f64;
    1.0 - (a.abs_diff(b) as f64) / max
}

/// Shared numbers across both numeric views, over the larger set.
fn number_overlap(a: &ParagraphFeature, b: &ParagraphFeature) -> f64 {
    let set_a: BTreeSet<u64> = a
        .numbers_by_spaces
        .iter()
        .chain(a.numbers_merged.iter())
        .copied()
        .collect();
    let set_b: BTreeSet<u64> = b
        .numbers_by_spaces
        .iter()
        .chain(b.numbers_merged.iter())
        .copied()
        .collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let shared = set_a.intersection(&set_b).count();
    shared as f64 / set_a.len().max(set_b.len()) as f64
}

/// Multiset intersection of punctuation fingerprints over the longer one.
fn punctuation_overlap(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in a {
        *counts.entry(*c).or_insert(0) += 1;
    }
    let mut shared = 0usize;
    for c in b {
        if let Some(n) = counts.get_mut(c) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }
    shared as f64 / a.len().max(b.len()) as f64
}

/// Proximity of a normalized box coordinate between two paragraphs.
///
/// Both boxes missing compares as a perfect match, one missing as a total
/// mismatch, matching the crate-wide degenerate-input convention.
fn box_proximity(
    a: &ParagraphFeature,
    b: &ParagraphFeature,
    coord: impl Fn(&ParagraphFeature, &BoundingBox) -> f32,
) -> f64 {
    match (&a.bounds, &b.bounds) {
        (None, None) => 1.0,
        (Some(box_a), Some(box_b)) => {
            let diff = (coord(a, box_a) - coord(b, box_b)).abs() as f64;
            (1.0 - diff).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Size similarity (half weight) plus bold and italic equality (a quarter
/// weight each).
fn font_similarity(a: &ParagraphFeature, b: &ParagraphFeature) -> f64 {
    let size = if a.font.size == 0.0 && b.font.size == 0.0 {
        1.0
    } else if a.font.size <= 0.0 || b.font.size <= 0.0 {
        0.0
    } else {
        let max = a.font.size.max(b.font.size) as f64;
        1.0 - ((a.font.size - b.font.size).abs() as f64) / max
    };
    let bold = equality(a.font.bold == b.font.bold);
    let italic = equality(a.font.italic == b.font.italic);
    0.5 * size + 0.25 * bold + 0.25 * italic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageContext, ParagraphType, RawSegment};

    fn page() -> PageContext {
        PageContext::new(600.0, 800.0, 3)
    }

    fn feature(index: usize, text: &str) -> ParagraphFeature {
        feature_at(index, text, 100.0)
    }

    fn feature_at(index: usize, text: &str, top: f32) -> ParagraphFeature {
        let segment = RawSegment::new(1, ParagraphType::Text, text)
            .with_bounds(BoundingBox::new(50.0, top, 500.0, 40.0));
        ParagraphFeature::build(index, &segment, &page()).unwrap()
    }

    #[test]
    fn test_self_match_is_perfect() {
        let p = feature(2, "Article 5. The committee shall convene.");
        let score = MatchScore::between(&p, &p);
        assert_eq!(score.overall_score, 1.0);
        assert_eq!(score.text_overlap, 1.0);
        assert_eq!(score.shared_numbers, 1.0);
    }

    #[test]
    fn test_self_match_with_repeated_words_is_perfect() {
        // "the" occurs twice; repeated words must not dilute the overlap
        let p = feature(1, "The committee approved the proposal.");
        let score = MatchScore::between(&p, &p);
        assert_eq!(score.text_overlap, 1.0);
        assert_eq!(score.overall_score, 1.0);
    }

    #[test]
    fn test_word_overlap_counts_repeats_per_occurrence() {
        let a = feature(0, "one two two three");
        let b = feature(0, "one two four five");
        // "two" is shared once, not twice
        let score = MatchScore::between(&a, &b);
        assert!((score.text_overlap - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_paragraphs_score_near_zero() {
        let mut a = feature(0, "alpha beta; 12 gamma.");
        let mut b = feature(5, "uno dos (99)");
        a.page_number = 1;
        a.font = crate::model::FontStyle::new(10.0, false, false);
        b.page_number = 7;
        b.kind = ParagraphType::ListItem;
        b.font = crate::model::FontStyle::new(20.0, true, true);
        b.bounds = Some(BoundingBox::new(10.0, 700.0, 80.0, 20.0));
        let score = MatchScore::between(&a, &b);
        assert_eq!(score.text_overlap, 0.0);
        assert_eq!(score.shared_numbers, 0.0);
        assert_eq!(score.punctuation, 0.0);
        assert!(score.overall_score < 0.25);
    }

    #[test]
    fn test_half_overlap_text_scores_half() {
        let a = feature(0, "alpha beta gamma delta");
        let b = feature(0, "alpha beta other words");
        let score = MatchScore::between(&a, &b);
        assert!((score.text_overlap - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_conventions() {
        let empty_a = feature(0, "");
        let empty_b = feature(0, "");
        let full = feature(0, "some words here");

        let both = MatchScore::between(&empty_a, &empty_b);
        assert_eq!(both.text_overlap, 1.0);
        assert_eq!(both.word_count, 1.0);
        assert_eq!(both.shared_numbers, 1.0);
        assert_eq!(both.punctuation, 1.0);

        let one = MatchScore::between(&empty_a, &full);
        assert_eq!(one.text_overlap, 0.0);
        assert_eq!(one.word_count, 0.0);
        assert_eq!(one.first_word, 0.0);
    }

    #[test]
    fn test_shared_numbers_uses_both_views() {
        let a = feature(0, "meeting on 15 16 2021");
        let b = feature(0, "reunion du 15162021");
        // a's merged view produces 15162021, matching b's literal number
        let score = MatchScore::between(&a, &b);
        assert!(score.shared_numbers > 0.0);
    }

    #[test]
    fn test_vertical_position_tracks_geometry() {
        let a = feature_at(0, "text", 100.0);
        let near = feature_at(0, "text", 120.0);
        let far = feature_at(0, "text", 700.0);
        let near_score = MatchScore::between(&a, &near).vertical_position;
        let far_score = MatchScore::between(&a, &far).vertical_position;
        assert!(near_score > far_score);
        assert!((near_score - (1.0 - 20.0 / 800.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_geometry_conventions() {
        let mut a = feature(0, "text");
        let mut b = feature(0, "text");
        a.bounds = None;
        let one_missing = MatchScore::between(&a, &b);
        assert_eq!(one_missing.vertical_position, 0.0);

        b.bounds = None;
        let both_missing = MatchScore::between(&a, &b);
        assert_eq!(both_missing.vertical_position, 1.0);
        assert_eq!(both_missing.overall_score, 1.0);
    }

    #[test]
    fn test_font_halves_style_weight() {
        let mut a = feature(0, "text");
        let mut b = feature(0, "text");
        a.font = crate::model::FontStyle::new(10.0, true, false);
        b.font = crate::model::FontStyle::new(10.0, false, false);
        let score = MatchScore::between(&a, &b);
        // Size equal (0.5) + italic equal (0.25), bold differs
        assert!((score.font - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_punctuation_multiset_overlap() {
        let a = feature(0, "a, b, c.");
        let b = feature(0, "x, y.");
        // a: [',', ',', '.']  b: [',', '.']  shared 2 of max 3
        let score = MatchScore::between(&a, &b);
        assert!((score.punctuation - 2.0 / 3.0).abs() < 1e-9);
    }
}
