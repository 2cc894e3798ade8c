//! Multi-pass greedy matching between a main and a secondary paragraph list.
//!
//! The matcher is deliberately greedy and order-preserving, not globally
//! optimal: each pass sweeps the main list once with a falling acceptance
//! threshold, pass 1 searching a window around a moving pivot and later
//! passes searching the open gaps between already-matched anchors. Ties go
//! to scan order. Swapping this for an optimal sequence aligner would change
//! observable behavior and is out of scope.

use std::collections::HashMap;

use crate::model::{Correspondence, ParagraphFeature};
use crate::score::MatchScore;

/// Acceptance thresholds, processed high to low.
pub const DEFAULT_THRESHOLDS: [f64; 6] = [0.90, 0.86, 0.82, 0.78, 0.74, 0.70];

/// Secondary-index window searched around the pivot in pass 1.
pub const DEFAULT_WINDOW: usize = 50;

/// A score above this ends a candidate scan immediately.
pub const DEFAULT_SHORT_CIRCUIT: f64 = 0.95;

/// Gap-filling accepts a probe scoring above (lowest threshold − this).
pub const DEFAULT_GAP_FILL_MARGIN: f64 = 0.3;

/// Search parameters for one alignment call.
#[derive(Debug, Clone)]
pub struct MatcherOptions {
    /// Acceptance thresholds, high to low
    pub thresholds: Vec<f64>,
    /// Pass-1 window radius around the pivot
    pub window: usize,
    /// Scan short-circuit score
    pub short_circuit: f64,
    /// Margin subtracted from the lowest threshold during gap-filling
    pub gap_fill_margin: f64,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            window: DEFAULT_WINDOW,
            short_circuit: DEFAULT_SHORT_CIRCUIT,
            gap_fill_margin: DEFAULT_GAP_FILL_MARGIN,
        }
    }
}

/// Partial injective main-to-secondary correspondence with scores.
#[derive(Debug, Clone)]
pub struct AlignmentMap {
    /// One slot per main paragraph
    slots: Vec<Option<Correspondence>>,
    /// Whether enough of the main list matched to call this the same document
    same_document: bool,
}

impl AlignmentMap {
    /// The correspondence for a main index, if matched.
    pub fn get(&self, main_index: usize) -> Option<&Correspondence> {
        self.slots.get(main_index).and_then(|s| s.as_ref())
    }

    /// Number of matched main paragraphs.
    pub fn matched_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of main paragraphs covered by the map.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the map covers no main paragraphs.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the document-identity gate passed.
    ///
    /// Fails when the main list is non-empty and half or fewer of its
    /// paragraphs found a counterpart; the secondary is then treated as a
    /// different document and its output becomes all placeholders.
    pub fn is_same_document(&self) -> bool {
        self.same_document
    }

    /// All accepted correspondences in main order.
    pub fn correspondences(&self) -> impl Iterator<Item = &Correspondence> {
        self.slots.iter().flatten()
    }
}

/// One alignment call between two paragraph lists.
///
/// Holds the per-call score memoization cache and the unmatched pools; both
/// are discarded when the call returns.
pub struct ParagraphMatcher<'a> {
    main: &'a [ParagraphFeature],
    secondary: &'a [ParagraphFeature],
    options: &'a MatcherOptions,
    cache: HashMap<(usize, usize), f64>,
    slots: Vec<Option<Correspondence>>,
    used_secondary: Vec<bool>,
}

impl<'a> ParagraphMatcher<'a> {
    /// Create a matcher over the two lists.
    pub fn new(
        main: &'a [ParagraphFeature],
        secondary: &'a [ParagraphFeature],
        options: &'a MatcherOptions,
    ) -> Self {
        Self {
            main,
            secondary,
            options,
            cache: HashMap::new(),
            slots: vec![None; main.len()],
            used_secondary: vec![false; secondary.len()],
        }
    }

    /// Run every pass, the identity gate, and gap-filling.
    pub fn align(mut self) -> AlignmentMap {
        for (pass, &threshold) in self.options.thresholds.iter().enumerate() {
            if pass == 0 {
                self.run_pivot_pass(threshold);
            } else {
                self.run_gap_pass(threshold);
            }
            log::debug!(
                "align: pass {} (threshold {:.2}): {} of {} matched",
                pass,
                threshold,
                self.matched_count(),
                self.main.len()
            );
        }

        let same_document = self.main.is_empty() || self.matched_count() * 2 > self.main.len();
        if same_document {
            self.fill_gaps();
        } else {
            log::debug!(
                "align: identity gate failed ({} of {} matched)",
                self.matched_count(),
                self.main.len()
            );
        }

        AlignmentMap {
            slots: self.slots,
            same_document,
        }
    }

    /// Pass 1: windowed search around a pivot secondary index.
    ///
    /// The pivot starts at 0, jumps to the matched index after a success and
    /// creeps forward by one (clamped to the last index) after a failure,
    /// keeping the search local and roughly monotonic.
    fn run_pivot_pass(&mut self, threshold: f64) {
        if self.secondary.is_empty() {
            return;
        }
        let last = self.secondary.len() - 1;
        let mut pivot = 0usize;
        for main_index in 0..self.main.len() {
            match self.scan_window(main_index, pivot, threshold) {
                Some(correspondence) => {
                    pivot = correspondence.secondary_index;
                    self.commit(correspondence);
                }
                None => pivot = (pivot + 1).min(last),
            }
        }
    }

    /// Later passes: search the open gap between the nearest matched
    /// anchors around each still-unmatched main index.
    fn run_gap_pass(&mut self, threshold: f64) {
        for main_index in 0..self.main.len() {
            if self.slots[main_index].is_some() {
                continue;
            }
            let start = (0..main_index)
                .rev()
                .find_map(|i| self.slots[i])
                .map(|c| c.secondary_index + 1)
                .unwrap_or(0);
            let end = (main_index + 1..self.main.len())
                .find_map(|i| self.slots[i])
                .map(|c| c.secondary_index)
                .unwrap_or(self.secondary.len());
            if let Some(correspondence) = self.scan_range(main_index, start, end, threshold) {
                self.commit(correspondence);
            }
        }
    }

    /// Scan the pivot window nearest-first, forward before backward at equal
    /// distance. First score above the short-circuit wins outright.
    fn scan_window(
        &mut self,
        main_index: usize,
        pivot: usize,
        threshold: f64,
    ) -> Option<Correspondence> {
        let mut best: Option<Correspondence> = None;
        for offset in 0..=self.options.window {
            let forward = pivot + offset;
            if forward < self.secondary.len() {
                if let Some(done) = self.consider(main_index, forward, threshold, &mut best) {
                    return Some(done);
                }
            }
            if offset > 0 {
                if let Some(backward) = pivot.checked_sub(offset) {
                    if let Some(done) = self.consider(main_index, backward, threshold, &mut best) {
                        return Some(done);
                    }
                }
            }
        }
        best
    }

    /// Scan an index range ascending.
    fn scan_range(
        &mut self,
        main_index: usize,
        start: usize,
        end: usize,
        threshold: f64,
    ) -> Option<Correspondence> {
        let mut best: Option<Correspondence> = None;
        for secondary_index in start..end.min(self.secondary.len()) {
            if let Some(done) = self.consider(main_index, secondary_index, threshold, &mut best) {
                return Some(done);
            }
        }
        best
    }

    /// Score one candidate, updating the running best. Returns the
    /// correspondence directly when the short-circuit fires.
    fn consider(
        &mut self,
        main_index: usize,
        secondary_index: usize,
        threshold: f64,
        best: &mut Option<Correspondence>,
    ) -> Option<Correspondence> {
        if self.used_secondary[secondary_index] {
            return None;
        }
        let score = self.score(main_index, secondary_index);
        let correspondence = Correspondence {
            main_index,
            secondary_index,
            score,
        };
        if score > self.options.short_circuit {
            return Some(correspondence);
        }
        if score > threshold && best.map_or(true, |b| score > b.score) {
            *best = Some(correspondence);
        }
        None
    }

    /// Gap-filling: an unmatched main paragraph whose predecessor matched
    /// gets one probe at the secondary paragraph right after the
    /// predecessor's match, accepted on a relaxed threshold.
    fn fill_gaps(&mut self) {
        let relaxed = self
            .options
            .thresholds
            .last()
            .copied()
            .unwrap_or(DEFAULT_THRESHOLDS[DEFAULT_THRESHOLDS.len() - 1])
            - self.options.gap_fill_margin;
        for main_index in 1..self.main.len() {
            if self.slots[main_index].is_some() {
                continue;
            }
            let Some(previous) = self.slots[main_index - 1] else {
                continue;
            };
            let probe = previous.secondary_index + 1;
            if probe >= self.secondary.len() || self.used_secondary[probe] {
                continue;
            }
            let score = self.score(main_index, probe);
            if score > relaxed {
                log::debug!(
                    "align: gap-filled main {} with secondary {} at {:.2}",
                    main_index,
                    probe,
                    score
                );
                self.commit(Correspondence {
                    main_index,
                    secondary_index: probe,
                    score,
                });
            }
        }
    }

    fn commit(&mut self, correspondence: Correspondence) {
        self.used_secondary[correspondence.secondary_index] = true;
        self.slots[correspondence.main_index] = Some(correspondence);
    }

    fn matched_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn score(&mut self, main_index: usize, secondary_index: usize) -> f64 {
        *self
            .cache
            .entry((main_index, secondary_index))
            .or_insert_with(|| {
                MatchScore::overall(&self.main[main_index], &self.secondary[secondary_index])
            })
    }
}

/// Align `secondary` against `main` with the given options.
pub fn match_lists(
    main: &[ParagraphFeature],
    secondary: &[ParagraphFeature],
    options: &MatcherOptions,
) -> AlignmentMap {
    ParagraphMatcher::new(main, secondary, options).align()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, PageContext, ParagraphType, RawSegment};

    fn page() -> PageContext {
        PageContext::new(600.0, 800.0, 1)
    }

    fn features(texts: &[&str]) -> Vec<ParagraphFeature> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let segment = RawSegment::new(1, ParagraphType::Text, *t).with_bounds(
                    BoundingBox::new(50.0, 100.0 + 100.0 * i as f32, 500.0, 40.0),
                );
                ParagraphFeature::build(i, &segment, &page()).unwrap()
            })
            .collect()
    }

    fn align(main: &[ParagraphFeature], secondary: &[ParagraphFeature]) -> AlignmentMap {
        match_lists(main, secondary, &MatcherOptions::default())
    }

    #[test]
    fn test_identical_lists_match_in_order() {
        let main = features(&["First paragraph text", "Second paragraph text", "Third one"]);
        let secondary = main.clone();
        let map = align(&main, &secondary);

        assert!(map.is_same_document());
        assert_eq!(map.matched_count(), 3);
        let matched: Vec<usize> = map
            .correspondences()
            .map(|c| c.secondary_index)
            .collect();
        assert_eq!(matched, vec![0, 1, 2]);
        assert!(map.correspondences().all(|c| c.score > 0.99));
    }

    #[test]
    fn test_empty_main_is_trivially_same_document() {
        let main: Vec<ParagraphFeature> = Vec::new();
        let secondary = features(&["anything"]);
        let map = align(&main, &secondary);
        assert!(map.is_same_document());
        assert!(map.is_empty());
    }

    #[test]
    fn test_empty_secondary_fails_gate() {
        let main = features(&["one", "two", "three"]);
        let map = align(&main, &[]);
        assert!(!map.is_same_document());
        assert_eq!(map.matched_count(), 0);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_unrelated_documents_fail_gate() {
        let main = features(&[
            "alpha beta; 12 gamma.",
            "delta epsilon; 34 zeta.",
            "eta theta; 56 iota.",
        ]);
        let mut secondary = features(&["uno dos (99)", "tres cuatro (88)", "cinco seis (77)"]);
        for (i, p) in secondary.iter_mut().enumerate() {
            p.page_number = 7;
            p.index = i + 40;
        }
        let map = align(&main, &secondary);
        assert!(!map.is_same_document());
    }

    #[test]
    fn test_missing_middle_leaves_gap() {
        let main = features(&["Text 0. common words", "Text 1. common words", "Text 2. common words"]);
        let mut secondary = features(&["Text 0. common words", "Text 2. common words"]);
        // Secondary paragraph 1 keeps the geometry of main paragraph 2
        secondary[1].bounds = main[2].bounds;
        let map = align(&main, &secondary);

        assert!(map.is_same_document());
        assert_eq!(map.get(0).unwrap().secondary_index, 0);
        assert!(map.get(1).is_none());
        assert_eq!(map.get(2).unwrap().secondary_index, 1);
    }

    #[test]
    fn test_pivot_keeps_matches_monotonic() {
        let texts: Vec<String> = (0..8)
            .map(|i| format!("Paragraph {i} shares common running words"))
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let main = features(&refs);
        let secondary = main.clone();
        let map = align(&main, &secondary);
        let matched: Vec<usize> = map
            .correspondences()
            .map(|c| c.secondary_index)
            .collect();
        let mut sorted = matched.clone();
        sorted.sort_unstable();
        assert_eq!(matched, sorted);
        assert_eq!(map.matched_count(), 8);
    }

    #[test]
    fn test_score_memoization_is_per_call() {
        let main = features(&["one two three"]);
        let secondary = features(&["one two three"]);
        let options = MatcherOptions::default();
        let mut matcher = ParagraphMatcher::new(&main, &secondary, &options);
        let first = matcher.score(0, 0);
        let second = matcher.score(0, 0);
        assert_eq!(first, second);
        assert_eq!(matcher.cache.len(), 1);
    }
}
