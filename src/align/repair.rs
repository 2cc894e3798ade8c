//! Speculative split/merge repair of segmentation mismatches.
//!
//! The matcher can only reassign paragraphs that already exist; when one
//! language's segmenter split a paragraph the other merged, the lists can
//! never reach a 1:1 correspondence. This engine builds candidate repairs
//! with the pure [`merge`](ParagraphFeature::merge) and
//! [`split`](ParagraphFeature::split) constructors, rescores them against
//! the recorded counterpart, and commits only improvements. It performs at
//! most one structural change per invocation and tells the orchestrator
//! whether either list's paragraph count changed, so alignment can be
//! re-run.

use regex::Regex;

use crate::model::{reindex, ParagraphFeature};
use crate::score::MatchScore;

use super::matcher::AlignmentMap;

/// Maximum vertical gap, as a fraction of page height, for two secondary
/// paragraphs to be merge candidates.
pub const DEFAULT_MERGE_DISTANCE: f32 = 0.02;

/// Tuning knobs for the repair engine.
#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Maximum vertical gap for merging two adjacent paragraphs
    pub merge_distance: f32,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            merge_distance: DEFAULT_MERGE_DISTANCE,
        }
    }
}

/// What one engine invocation changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairOutcome {
    /// The main paragraph list changed length
    pub main_changed: bool,
    /// The secondary paragraph list changed length
    pub secondary_changed: bool,
}

impl RepairOutcome {
    /// Whether any list changed.
    pub fn changed(&self) -> bool {
        self.main_changed || self.secondary_changed
    }
}

/// Recognizes the list-marker words that justify splitting a paragraph:
/// numeric, alphabetic and roman-numeral markers, bullets, bracketed
/// variants, with or without a trailing `.`, `)` or `-`.
pub struct SeparatorMarkers {
    pattern: Regex,
}

impl SeparatorMarkers {
    /// Compile the marker pattern.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"(?x)^(?:
                    [•‣▪◦*–—-]                                 # bullets and dashes
                    | \( (?:\d{1,3}|[ivxlcdm]{1,7}|[a-z]) \)   # (1) (iv) (a)
                    | \[ (?:\d{1,3}|[ivxlcdm]{1,7}|[a-z]) \]   # [1] [iv] [a]
                    | (?:\d{1,3}|[ivxlcdm]{1,7}|[a-z]) [.)-]?  # 1. iv) a-
                )$",
            )
            .unwrap(),
        }
    }

    /// Whether a cleaned word looks like a list marker.
    pub fn is_marker(&self, word: &str) -> bool {
        !word.is_empty() && self.pattern.is_match(word)
    }
}

impl Default for SeparatorMarkers {
    fn default() -> Self {
        Self::new()
    }
}

/// The segmentation repair engine for one main/secondary pair.
pub struct RepairEngine {
    options: RepairOptions,
    markers: SeparatorMarkers,
    /// Whether repairs may change the main list (disabled when the main
    /// list must stay frozen, e.g. during parallel alignment)
    allow_main_changes: bool,
}

impl RepairEngine {
    /// Create an engine with the given options.
    pub fn new(options: RepairOptions) -> Self {
        Self {
            options,
            markers: SeparatorMarkers::new(),
            allow_main_changes: true,
        }
    }

    /// Freeze the main list: only secondary-side repairs are allowed.
    pub fn frozen_main(mut self) -> Self {
        self.allow_main_changes = false;
        self
    }

    /// Attempt one repair. Secondary-side mismatches are tried first, then
    /// main-side ones, mirroring each other with roles reversed.
    pub fn repair(
        &self,
        main: &mut Vec<ParagraphFeature>,
        secondary: &mut Vec<ParagraphFeature>,
        map: &AlignmentMap,
    ) -> RepairOutcome {
        if let Some(outcome) = self.repair_over_segmented_secondary(main, secondary, map) {
            return outcome;
        }
        if let Some(outcome) = self.repair_unmatched_main(main, secondary, map) {
            return outcome;
        }
        RepairOutcome::default()
    }

    /// Secondary over-segmented: an unmatched secondary paragraph sits next
    /// to a matched one. Prefer splitting the main counterpart at the list
    /// marker that starts the extra paragraph; fall back to merging the two
    /// secondary paragraphs when they are vertically adjacent.
    fn repair_over_segmented_secondary(
        &self,
        main: &mut Vec<ParagraphFeature>,
        secondary: &mut Vec<ParagraphFeature>,
        map: &AlignmentMap,
    ) -> Option<RepairOutcome> {
        let main_by_secondary = reverse_lookup(map, secondary.len());

        for s in 0..secondary.len() {
            if main_by_secondary[s].is_some() {
                continue;
            }

            // Unmatched paragraph after a matched one: the main counterpart
            // holds both halves, the unmatched half starting at its marker.
            if s > 0 {
                if let Some(m) = main_by_secondary[s - 1] {
                    let recorded = map.get(m).map(|c| c.score).unwrap_or(0.0);
                    let marker = secondary[s].first_word.clone();
                    if self.allow_main_changes {
                        if let Some((first, second)) = self.try_split(&main[m], &marker) {
                            if MatchScore::overall(&first, &secondary[s - 1]) >= recorded {
                                log::debug!("repair: split main {} at marker {:?}", m, marker);
                                splice_pair(main, m, first, second);
                                return Some(RepairOutcome {
                                    main_changed: true,
                                    ..Default::default()
                                });
                            }
                        }
                    }
                    if secondary[s - 1].distance(&secondary[s]) <= self.options.merge_distance {
                        let merged = secondary[s - 1].merge(&secondary[s]);
                        if MatchScore::overall(&main[m], &merged) >= recorded {
                            log::debug!("repair: merged secondary {} into {}", s, s - 1);
                            splice_merge(secondary, s - 1, merged);
                            return Some(RepairOutcome {
                                secondary_changed: true,
                                ..Default::default()
                            });
                        }
                    }
                }
            }

            // Unmatched paragraph before a matched one: mirrored, the
            // matched half starts the second part of the main counterpart.
            if s + 1 < secondary.len() {
                if let Some(m) = main_by_secondary[s + 1] {
                    let recorded = map.get(m).map(|c| c.score).unwrap_or(0.0);
                    let marker = secondary[s + 1].first_word.clone();
                    if self.allow_main_changes {
                        if let Some((first, second)) = self.try_split(&main[m], &marker) {
                            if MatchScore::overall(&second, &secondary[s + 1]) >= recorded {
                                log::debug!("repair: split main {} at marker {:?}", m, marker);
                                splice_pair(main, m, first, second);
                                return Some(RepairOutcome {
                                    main_changed: true,
                                    ..Default::default()
                                });
                            }
                        }
                    }
                    if secondary[s].distance(&secondary[s + 1]) <= self.options.merge_distance {
                        let merged = secondary[s].merge(&secondary[s + 1]);
                        if MatchScore::overall(&main[m], &merged) >= recorded {
                            log::debug!("repair: merged secondary {} into {}", s + 1, s);
                            splice_merge(secondary, s, merged);
                            return Some(RepairOutcome {
                                secondary_changed: true,
                                ..Default::default()
                            });
                        }
                    }
                }
            }
        }
        None
    }

    /// Main-side mismatches, roles reversed: an unmatched main paragraph is
    /// merged into its matched neighbor when that does not lower the score,
    /// otherwise the secondary counterpart is split at the unmatched
    /// paragraph's marker.
    fn repair_unmatched_main(
        &self,
        main: &mut Vec<ParagraphFeature>,
        secondary: &mut Vec<ParagraphFeature>,
        map: &AlignmentMap,
    ) -> Option<RepairOutcome> {
        for u in 0..main.len() {
            if map.get(u).is_some() {
                continue;
            }

            // Matched predecessor
            if u > 0 {
                if let Some(c) = map.get(u - 1) {
                    let t = c.secondary_index;
                    if self.allow_main_changes {
                        let merged = main[u - 1].merge(&main[u]);
                        if MatchScore::overall(&merged, &secondary[t]) >= c.score {
                            log::debug!("repair: merged main {} into {}", u, u - 1);
                            splice_merge(main, u - 1, merged);
                            return Some(RepairOutcome {
                                main_changed: true,
                                ..Default::default()
                            });
                        }
                    }
                    let marker = main[u].first_word.clone();
                    if let Some((first, second)) = self.try_split(&secondary[t], &marker) {
                        if MatchScore::overall(&main[u - 1], &first) >= c.score {
                            log::debug!("repair: split secondary {} at marker {:?}", t, marker);
                            splice_pair(secondary, t, first, second);
                            return Some(RepairOutcome {
                                secondary_changed: true,
                                ..Default::default()
                            });
                        }
                    }
                }
            }

            // Matched successor
            if u + 1 < main.len() {
                if let Some(c) = map.get(u + 1) {
                    let t = c.secondary_index;
                    if self.allow_main_changes {
                        let merged = main[u].merge(&main[u + 1]);
                        if MatchScore::overall(&merged, &secondary[t]) >= c.score {
                            log::debug!("repair: merged main {} into {}", u + 1, u);
                            splice_merge(main, u, merged);
                            return Some(RepairOutcome {
                                main_changed: true,
                                ..Default::default()
                            });
                        }
                    }
                    let marker = main[u + 1].first_word.clone();
                    if let Some((first, second)) = self.try_split(&secondary[t], &marker) {
                        if MatchScore::overall(&main[u + 1], &second) >= c.score {
                            log::debug!("repair: split secondary {} at marker {:?}", t, marker);
                            splice_pair(secondary, t, first, second);
                            return Some(RepairOutcome {
                                secondary_changed: true,
                                ..Default::default()
                            });
                        }
                    }
                }
            }
        }
        None
    }

    /// Split `container` at `marker` only when the marker is a recognized
    /// list marker occurring exactly once, and not already at the very
    /// start or end of the text.
    fn try_split(
        &self,
        container: &ParagraphFeature,
        marker: &str,
    ) -> Option<(ParagraphFeature, ParagraphFeature)> {
        if !self.markers.is_marker(marker) {
            return None;
        }
        if container.count_word(marker) != 1 {
            return None;
        }
        if container.first_word == marker {
            return None;
        }
        if container.words.last().map(String::as_str) == Some(marker) {
            return None;
        }
        container.split(marker)
    }
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new(RepairOptions::default())
    }
}

/// Secondary index -> main index lookup for one alignment map.
fn reverse_lookup(map: &AlignmentMap, secondary_len: usize) -> Vec<Option<usize>> {
    let mut lookup = vec![None; secondary_len];
    for c in map.correspondences() {
        if c.secondary_index < secondary_len {
            lookup[c.secondary_index] = Some(c.main_index);
        }
    }
    lookup
}

/// Replace the paragraph at `at` with two halves and reindex.
fn splice_pair(
    list: &mut Vec<ParagraphFeature>,
    at: usize,
    first: ParagraphFeature,
    second: ParagraphFeature,
) {
    list[at] = first;
    list.insert(at + 1, second);
    reindex(list);
}

/// Replace the paragraphs at `at` and `at + 1` with their merge and reindex.
fn splice_merge(list: &mut Vec<ParagraphFeature>, at: usize, merged: ParagraphFeature) {
    list[at] = merged;
    list.remove(at + 1);
    reindex(list);
}
