//! End-to-end segmentation repair tests.
//!
//! Both directions of the split/merge repair, driven through the public
//! alignment entry points rather than the engine directly.

use paralign::{align, BoundingBox, LanguageParagraphSet, PageContext, ParagraphType, RawSegment};

const FILLER: &str =
    "with additional running words so the paragraph has realistic body length";

fn page() -> PageContext {
    PageContext::new(600.0, 800.0, 1)
}

fn segment(text: &str, bounds: BoundingBox) -> RawSegment {
    RawSegment::new(1, ParagraphType::Text, text.to_string()).with_bounds(bounds)
}

fn intro(language_hint: &str) -> String {
    format!("Intro paragraph {language_hint} {FILLER}")
}

fn item(marker: &str, body: &str) -> String {
    format!("{marker} {body} item {FILLER}")
}

/// Intro plus two list items, each its own paragraph.
fn itemized(language_hint: &str) -> LanguageParagraphSet {
    let segments = vec![
        segment(&intro(language_hint), BoundingBox::new(50.0, 100.0, 500.0, 12.0)),
        segment(&item("1.", "first"), BoundingBox::new(50.0, 160.0, 500.0, 12.0)),
        segment(&item("2.", "second"), BoundingBox::new(50.0, 174.0, 500.0, 12.0)),
    ];
    LanguageParagraphSet::from_segments(language_hint, &segments, &page()).unwrap()
}

/// Intro plus both list items merged into a single paragraph.
fn merged(language_hint: &str) -> LanguageParagraphSet {
    let both = format!("{} {}", item("1.", "first"), item("2.", "second"));
    let segments = vec![
        segment(&intro(language_hint), BoundingBox::new(50.0, 100.0, 500.0, 12.0)),
        segment(&both, BoundingBox::new(50.0, 160.0, 500.0, 26.0)),
    ];
    LanguageParagraphSet::from_segments(language_hint, &segments, &page()).unwrap()
}

#[test]
fn test_main_split_when_secondary_lists_items_separately() {
    // The main segmenter merged two list items the secondary kept apart.
    // Repair splits the main paragraph at the "2." marker, and re-alignment
    // then pairs all three paragraphs.
    let document = align(vec![merged("en").main(), itemized("fr")]).unwrap();

    assert_eq!(document.main.paragraphs.len(), 3);
    assert_eq!(document.aligned_len(), 3);

    let fr = document.secondary("fr").unwrap();
    assert_eq!(fr.aligned.len(), 3);
    assert!(fr.aligned.iter().all(Option::is_some));
    assert!(fr.aligned[1]
        .as_ref()
        .unwrap()
        .original_text
        .starts_with("1."));
    assert!(fr.aligned[2]
        .as_ref()
        .unwrap()
        .original_text
        .starts_with("2."));
}

#[test]
fn test_main_merge_when_secondary_merged_items() {
    // Mirror case: the secondary merged what the main kept apart. The
    // unmatched main item is merged into its matched neighbor, since the
    // merged pair scores at least as well as the recorded pairing.
    let document = align(vec![itemized("en").main(), merged("fr")]).unwrap();

    assert_eq!(document.main.paragraphs.len(), 2);
    assert_eq!(document.aligned_len(), 2);
    assert!(document.main.paragraphs[1].original_text.contains("1."));
    assert!(document.main.paragraphs[1].original_text.contains("2."));

    let fr = document.secondary("fr").unwrap();
    assert!(fr.aligned.iter().all(Option::is_some));
    let score = fr.scores.get(&1).unwrap().score;
    assert!(score > 0.9);
}

#[test]
fn test_repair_leaves_genuinely_missing_content_alone() {
    // The secondary simply lacks the second item; nothing to split at, and
    // merging would lower the recorded score. The gap stays a placeholder.
    let en = itemized("en").main();
    let fr_segments = vec![
        segment(&intro("fr"), BoundingBox::new(50.0, 100.0, 500.0, 12.0)),
        segment(&item("1.", "first"), BoundingBox::new(50.0, 160.0, 500.0, 12.0)),
    ];
    let fr = LanguageParagraphSet::from_segments("fr", &fr_segments, &page()).unwrap();

    let document = align(vec![en, fr]).unwrap();
    assert_eq!(document.main.paragraphs.len(), 3);
    let fr = document.secondary("fr").unwrap();
    assert_eq!(fr.aligned.len(), 3);
    assert!(fr.aligned[0].is_some());
    assert!(fr.aligned[1].is_some());
    assert!(fr.aligned[2].is_none());
}
