//! Alignment pipeline: preprocessing, matching and repair across languages.
//!
//! [`DocumentAligner`] drives the whole pipeline. Every language list is
//! preprocessed independently, then each secondary language is matched
//! against the main language. When matching leaves segmentation mismatches,
//! the repair engine gets a bounded number of rounds to fix them, each
//! followed by a fresh alignment. Repairs may also reshape the main list; in
//! that case every secondary is re-aligned once against the final main list
//! so all outputs share its length.

mod matcher;
mod repair;

pub use matcher::{
    match_lists, AlignmentMap, MatcherOptions, ParagraphMatcher, DEFAULT_GAP_FILL_MARGIN,
    DEFAULT_SHORT_CIRCUIT, DEFAULT_THRESHOLDS, DEFAULT_WINDOW,
};
pub use repair::{
    RepairEngine, RepairOptions, RepairOutcome, SeparatorMarkers, DEFAULT_MERGE_DISTANCE,
};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{AlignedDocument, Correspondence, LanguageParagraphSet, PageContext};
use crate::preprocess::{PreprocessOptions, Preprocessor};

/// Repair rounds allowed per secondary language.
pub const DEFAULT_REPAIR_ROUNDS: usize = 2;

/// Configuration for one [`DocumentAligner`].
#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// Matching parameters
    pub matcher: MatcherOptions,
    /// Preprocessing parameters
    pub preprocess: PreprocessOptions,
    /// Repair parameters
    pub repair: RepairOptions,
    /// Language tag that overrides main-language selection
    pub main_language: Option<String>,
    /// Whether to run segmentation repair at all
    pub run_repair: bool,
    /// Maximum repair rounds per secondary language
    pub repair_rounds: usize,
    /// Align secondaries on the rayon pool; freezes the main list
    pub parallel: bool,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            matcher: MatcherOptions::default(),
            preprocess: PreprocessOptions::default(),
            repair: RepairOptions::default(),
            main_language: None,
            run_repair: true,
            repair_rounds: DEFAULT_REPAIR_ROUNDS,
            parallel: false,
        }
    }
}

impl AlignOptions {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the set with this language tag to be the main language.
    pub fn with_main_language(mut self, language: impl Into<String>) -> Self {
        self.main_language = Some(language.into());
        self
    }

    /// Replace the acceptance thresholds.
    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.matcher.thresholds = thresholds;
        self
    }

    /// Disable segmentation repair.
    pub fn without_repair(mut self) -> Self {
        self.run_repair = false;
        self
    }

    /// Align secondary languages in parallel. The main paragraph list is
    /// frozen, so only secondary-side repairs can run.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }
}

/// The alignment orchestrator.
pub struct DocumentAligner {
    options: AlignOptions,
}

impl DocumentAligner {
    /// Create an aligner with the given options.
    pub fn new(options: AlignOptions) -> Self {
        Self { options }
    }

    /// Align every secondary language against the main language.
    ///
    /// The main set is the one matching the configured override, else the
    /// flagged set, else the first supplied set. Returns an error only when
    /// no sets are supplied; degenerate inputs (empty lists, unrelated
    /// documents) produce placeholder output, not errors.
    pub fn align(&self, languages: Vec<LanguageParagraphSet>) -> Result<AlignedDocument> {
        let mut languages = languages;
        if languages.is_empty() {
            return Err(Error::Other("no language sets supplied".into()));
        }

        let main_position = self.select_main(&languages);
        let mut main = languages.remove(main_position);
        main.is_main = true;
        let mut secondaries = languages;

        let preprocessor = Preprocessor::new(self.options.preprocess.clone());
        main.paragraphs = preprocess_set(&preprocessor, std::mem::take(&mut main.paragraphs));
        for secondary in &mut secondaries {
            secondary.is_main = false;
            secondary.paragraphs =
                preprocess_set(&preprocessor, std::mem::take(&mut secondary.paragraphs));
        }
        log::debug!(
            "align: main {:?} with {} paragraphs, {} secondaries",
            main.language,
            main.paragraphs.len(),
            secondaries.len()
        );

        if self.options.parallel {
            // Workers get their own copy of the frozen main set; with main
            // repair disabled none of the copies can diverge.
            let frozen = &main;
            secondaries.par_iter_mut().for_each(|secondary| {
                let mut main_copy = frozen.clone();
                self.align_secondary(&mut main_copy, secondary, false);
            });
        } else {
            let mut main_reshaped = false;
            for secondary in &mut secondaries {
                let before = main.paragraphs.len();
                self.align_secondary(&mut main, secondary, true);
                main_reshaped |= main.paragraphs.len() != before;
            }
            // A repair changed the main list: one reconciliation pass with
            // the main list frozen re-sizes every aligned output.
            if main_reshaped {
                log::debug!("align: main list reshaped by repair, re-aligning secondaries");
                for secondary in &mut secondaries {
                    self.align_secondary(&mut main, secondary, false);
                }
            }
        }

        main.aligned = main.paragraphs.iter().cloned().map(Some).collect();
        main.scores = main
            .paragraphs
            .iter()
            .map(|p| {
                (
                    p.index,
                    Correspondence {
                        main_index: p.index,
                        secondary_index: p.index,
                        score: 1.0,
                    },
                )
            })
            .collect();

        Ok(AlignedDocument { main, secondaries })
    }

    /// Align one secondary against the main list, repairing when allowed.
    fn align_secondary(
        &self,
        main: &mut LanguageParagraphSet,
        secondary: &mut LanguageParagraphSet,
        allow_main_repair: bool,
    ) {
        let mut map = match_lists(&main.paragraphs, &secondary.paragraphs, &self.options.matcher);

        if self.options.run_repair && map.is_same_document() {
            let engine = if allow_main_repair {
                RepairEngine::new(self.options.repair.clone())
            } else {
                RepairEngine::new(self.options.repair.clone()).frozen_main()
            };
            for round in 0..self.options.repair_rounds {
                if map.matched_count() == main.paragraphs.len()
                    && main.paragraphs.len() == secondary.paragraphs.len()
                {
                    break;
                }
                let outcome =
                    engine.repair(&mut main.paragraphs, &mut secondary.paragraphs, &map);
                if !outcome.changed() {
                    break;
                }
                log::debug!(
                    "align: {:?} repair round {} changed main={} secondary={}",
                    secondary.language,
                    round,
                    outcome.main_changed,
                    outcome.secondary_changed
                );
                map = match_lists(&main.paragraphs, &secondary.paragraphs, &self.options.matcher);
                if !map.is_same_document() {
                    break;
                }
            }
        }

        finalize(secondary, main.paragraphs.len(), &map);
    }

    fn select_main(&self, languages: &[LanguageParagraphSet]) -> usize {
        if let Some(tag) = &self.options.main_language {
            if let Some(position) = languages.iter().position(|s| &s.language == tag) {
                return position;
            }
        }
        languages.iter().position(|s| s.is_main).unwrap_or(0)
    }
}

impl Default for DocumentAligner {
    fn default() -> Self {
        Self::new(AlignOptions::default())
    }
}

/// Preprocess one language's paragraphs with a page context derived from
/// the paragraphs themselves.
fn preprocess_set(
    preprocessor: &Preprocessor,
    paragraphs: Vec<crate::model::ParagraphFeature>,
) -> Vec<crate::model::ParagraphFeature> {
    let Some(page) = derive_page_context(&paragraphs) else {
        return paragraphs;
    };
    preprocessor.run(paragraphs, &page)
}

/// Page dimensions from the first paragraph and the highest page number
/// seen. Returns `None` for an empty list.
fn derive_page_context(paragraphs: &[crate::model::ParagraphFeature]) -> Option<PageContext> {
    let first = paragraphs.first()?;
    let page_count = paragraphs.iter().map(|p| p.page_number).max().unwrap_or(1);
    Some(PageContext::new(
        first.page_width,
        first.page_height,
        page_count,
    ))
}

/// Populate a secondary set's aligned output and score map from one
/// alignment map. A failed identity gate yields all placeholders.
fn finalize(secondary: &mut LanguageParagraphSet, main_len: usize, map: &AlignmentMap) {
    if !map.is_same_document() {
        secondary.aligned = vec![None; main_len];
        secondary.scores = std::collections::HashMap::new();
        return;
    }
    secondary.aligned = (0..main_len)
        .map(|m| {
            map.get(m)
                .map(|c| secondary.paragraphs[c.secondary_index].clone())
        })
        .collect();
    secondary.scores = map
        .correspondences()
        .map(|c| (c.main_index, *c))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, ParagraphFeature, ParagraphType, RawSegment};

    /// Paragraphs padded to a realistic length so preprocessing keeps them.
    fn set(language: &str, texts: &[&str]) -> LanguageParagraphSet {
        let page = PageContext::new(600.0, 800.0, 1);
        let paragraphs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let body = format!(
                    "{t} the quick brown fox jumps over the lazy dog near the riverbank every morning"
                );
                let segment = RawSegment::new(1, ParagraphType::Text, &body).with_bounds(
                    BoundingBox::new(50.0, 100.0 + 100.0 * i as f32, 500.0, 12.0),
                );
                ParagraphFeature::build(i, &segment, &page).unwrap()
            })
            .collect();
        LanguageParagraphSet::new(language, paragraphs)
    }

    #[test]
    fn test_no_languages_is_an_error() {
        let result = DocumentAligner::default().align(Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_first_set_is_main_by_default() {
        let document = DocumentAligner::default()
            .align(vec![set("en", &["one"]), set("fr", &["un"])])
            .unwrap();
        assert_eq!(document.main.language, "en");
        assert!(document.main.is_main);
        assert_eq!(document.secondaries.len(), 1);
    }

    #[test]
    fn test_flagged_set_wins_over_first() {
        let document = DocumentAligner::default()
            .align(vec![set("en", &["one"]), set("fr", &["un"]).main()])
            .unwrap();
        assert_eq!(document.main.language, "fr");
    }

    #[test]
    fn test_configured_main_wins_over_flag() {
        let aligner = DocumentAligner::new(AlignOptions::new().with_main_language("de"));
        let document = aligner
            .align(vec![
                set("en", &["one"]).main(),
                set("de", &["eins"]),
            ])
            .unwrap();
        assert_eq!(document.main.language, "de");
    }

    #[test]
    fn test_main_only_document_aligns_to_itself() {
        let document = DocumentAligner::default()
            .align(vec![set("en", &["one", "two"])])
            .unwrap();
        assert_eq!(document.aligned_len(), 2);
        assert!(document.main.aligned.iter().all(Option::is_some));
        assert!(document.secondaries.is_empty());
    }

    #[test]
    fn test_empty_secondary_becomes_placeholders() {
        let document = DocumentAligner::default()
            .align(vec![set("en", &["one", "two", "three"]), set("fr", &[])])
            .unwrap();
        let fr = document.secondary("fr").unwrap();
        assert_eq!(fr.aligned.len(), 3);
        assert!(fr.aligned.iter().all(Option::is_none));
        assert!(fr.scores.is_empty());
    }
}
