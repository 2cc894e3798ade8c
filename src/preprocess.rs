//! Per-language preprocessing applied before alignment.
//!
//! Each language's paragraph list passes through the same filter chain:
//! type filtering, repeated header/footer removal, duplicate collapsing,
//! cross-page merging, garbage removal and oversized-block removal. The
//! filters are independent of any other language; alignment only sees the
//! cleaned, reindexed lists.

use std::collections::BTreeSet;

use crate::model::{reindex, PageContext, ParagraphFeature, ParagraphType};
use crate::text;

/// Tuning knobs for the preprocessing filters.
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Fraction of page height treated as header/footer band
    pub band_fraction: f32,

    /// Cleaned-text similarity for two paragraphs to cluster as the same
    /// repeated header/footer
    pub repeat_similarity: f64,

    /// A repeat cluster must span at least this many pages...
    pub min_repeat_pages: u32,

    /// ...or this fraction of the page count, whichever is larger
    pub repeat_page_fraction: f32,

    /// A continuation line's last token must reach within this fraction of
    /// the paragraph's own right edge
    pub merge_own_margin: f32,

    /// ...and within this fraction of the page's right edge
    pub merge_page_margin: f32,

    /// Area per corrected character above which a block is dropped
    pub density_limit: f32,

    /// Font size at which the density correction factor is exactly 1.0
    pub reference_font_size: f32,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            band_fraction: 0.2,
            repeat_similarity: 0.9,
            min_repeat_pages: 3,
            repeat_page_fraction: 0.2,
            merge_own_margin: 0.10,
            merge_page_margin: 0.20,
            density_limit: 100.0,
            reference_font_size: 10.0,
        }
    }
}

/// The preprocessing filter chain.
pub struct Preprocessor {
    options: PreprocessOptions,
}

impl Preprocessor {
    /// Create a preprocessor with the given options.
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    /// Run all filters in order and reindex the survivors.
    pub fn run(
        &self,
        paragraphs: Vec<ParagraphFeature>,
        page: &PageContext,
    ) -> Vec<ParagraphFeature> {
        let before = paragraphs.len();
        let mut paragraphs = self.filter_running_text(paragraphs);
        paragraphs = self.remove_repeated_headers(paragraphs, page);
        paragraphs = self.collapse_duplicates(paragraphs);
        paragraphs = self.merge_cross_page(paragraphs, page);
        paragraphs = self.remove_garbage(paragraphs);
        paragraphs = self.remove_oversized(paragraphs);
        reindex(&mut paragraphs);
        log::debug!(
            "preprocess: {} paragraphs in, {} out",
            before,
            paragraphs.len()
        );
        paragraphs
    }

    /// Filter 1: keep only running-text paragraph types.
    pub fn filter_running_text(&self, paragraphs: Vec<ParagraphFeature>) -> Vec<ParagraphFeature> {
        paragraphs
            .into_iter()
            .filter(|p| p.kind.is_running_text())
            .collect()
    }

    /// Filter 2: drop repeated page headers and footers.
    ///
    /// Among paragraphs touching the top or bottom band of the page, fuzzy
    /// clusters of near-identical cleaned text that recur on enough pages
    /// are removed, as is anything explicitly typed as header, footer or
    /// footnote.
    pub fn remove_repeated_headers(
        &self,
        paragraphs: Vec<ParagraphFeature>,
        page: &PageContext,
    ) -> Vec<ParagraphFeature> {
        let required_pages = (self.options.min_repeat_pages as usize)
            .max((self.options.repeat_page_fraction * page.page_count as f32).ceil() as usize);

        struct Cluster {
            representative: String,
            members: Vec<usize>,
            pages: BTreeSet<u32>,
        }
        let mut clusters: Vec<Cluster> = Vec::new();

        for (i, paragraph) in paragraphs.iter().enumerate() {
            if !self.in_margin_band(paragraph, page) {
                continue;
            }
            let slot = clusters.iter_mut().find(|c| {
                text::text_similarity(&c.representative, &paragraph.text_cleaned)
                    >= self.options.repeat_similarity
            });
            match slot {
                Some(cluster) => {
                    cluster.members.push(i);
                    cluster.pages.insert(paragraph.page_number);
                }
                None => clusters.push(Cluster {
                    representative: paragraph.text_cleaned.clone(),
                    members: vec![i],
                    pages: BTreeSet::from([paragraph.page_number]),
                }),
            }
        }

        let mut dropped: BTreeSet<usize> = BTreeSet::new();
        for cluster in &clusters {
            if cluster.pages.len() >= required_pages {
                log::debug!(
                    "preprocess: dropping repeated margin text {:?} on {} pages",
                    cluster.representative,
                    cluster.pages.len()
                );
                dropped.extend(cluster.members.iter().copied());
            }
        }

        paragraphs
            .into_iter()
            .enumerate()
            .filter(|(i, p)| {
                !dropped.contains(i)
                    && !matches!(
                        p.kind,
                        ParagraphType::Footnote
                            | ParagraphType::PageHeader
                            | ParagraphType::PageFooter
                    )
            })
            .map(|(_, p)| p)
            .collect()
    }

    /// Filter 3: collapse consecutive paragraphs with identical cleaned text.
    pub fn collapse_duplicates(&self, paragraphs: Vec<ParagraphFeature>) -> Vec<ParagraphFeature> {
        let mut result: Vec<ParagraphFeature> = Vec::new();
        for paragraph in paragraphs {
            if result
                .last()
                .is_some_and(|prev| prev.text_cleaned == paragraph.text_cleaned)
            {
                continue;
            }
            result.push(paragraph);
        }
        result
    }

    /// Filter 4: merge paragraphs continued across a page break.
    pub fn merge_cross_page(
        &self,
        paragraphs: Vec<ParagraphFeature>,
        page: &PageContext,
    ) -> Vec<ParagraphFeature> {
        let mut result: Vec<ParagraphFeature> = Vec::new();
        let mut iter = paragraphs.into_iter();
        let Some(mut current) = iter.next() else {
            return result;
        };
        for next in iter {
            if self.should_merge_across_pages(&current, &next, page) {
                log::debug!(
                    "preprocess: merging across pages {} and {}",
                    current.page_number,
                    next.page_number
                );
                current = current.merge(&next);
            } else {
                result.push(std::mem::replace(&mut current, next));
            }
        }
        result.push(current);
        result
    }

    /// Filter 5: drop paragraphs with no usable textual content.
    pub fn remove_garbage(&self, paragraphs: Vec<ParagraphFeature>) -> Vec<ParagraphFeature> {
        paragraphs
            .into_iter()
            .filter(|p| {
                text::has_alphanumeric(&p.text_cleaned)
                    && text::recognized_script_chars(&p.text_cleaned) > 1
            })
            .collect()
    }

    /// Filter 6: drop blocks whose box is far too large for their text.
    pub fn remove_oversized(&self, paragraphs: Vec<ParagraphFeature>) -> Vec<ParagraphFeature> {
        paragraphs
            .into_iter()
            .filter(|p| {
                let Some(bounds) = &p.bounds else {
                    return true;
                };
                let chars = p.text_cleaned.chars().filter(|c| *c != ' ').count();
                if chars == 0 {
                    return bounds.area() <= 0.0;
                }
                let correction = if p.font.size > 0.0 {
                    p.font.size / self.options.reference_font_size
                } else {
                    1.0
                };
                let density = bounds.area() / (chars as f32 * correction);
                density <= self.options.density_limit
            })
            .collect()
    }

    fn in_margin_band(&self, paragraph: &ParagraphFeature, page: &PageContext) -> bool {
        let Some(bounds) = &paragraph.bounds else {
            return false;
        };
        let band = self.options.band_fraction * page.height;
        bounds.top <= band || bounds.bottom() >= page.height - band
    }

    fn should_merge_across_pages(
        &self,
        a: &ParagraphFeature,
        b: &ParagraphFeature,
        page: &PageContext,
    ) -> bool {
        if b.page_number != a.page_number + 1 {
            return false;
        }
        if !a.kind.allows_cross_page_merge() || !b.kind.allows_cross_page_merge() {
            return false;
        }
        if text::ends_sentence(&a.original_text) || !text::starts_alphanumeric(&b.original_text) {
            return false;
        }
        // The first half must run to the end of its line: its last token
        // close to both the paragraph's and the page's right edge.
        let Some(own) = &a.bounds else {
            return false;
        };
        let Some(last) = a.last_token_bounds.or(a.bounds) else {
            return false;
        };
        let fills_own_width = own.right() - last.right() <= self.options.merge_own_margin * own.width;
        let reaches_page_edge =
            page.width - last.right() <= self.options.merge_page_margin * page.width;
        fills_own_width && reaches_page_edge
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessOptions::default())
    }
}
