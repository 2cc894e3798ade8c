//! Text normalization and comparison primitives.
//!
//! Everything the feature model derives from raw segment text lives here:
//! diacritic-stripped cleaning, the two numeric-token views, punctuation
//! fingerprints, script detection for garbage filtering, and the fuzzy
//! string similarities used by the scorer and the header/footer filter.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text for cross-language comparison.
///
/// Decomposes to NFD, drops combining marks (so `é` and `e` compare equal),
/// lowercases, and collapses whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .collect();

    let mut result = String::with_capacity(stripped.len());
    let mut last_was_space = true; // Leading whitespace is dropped
    for c in stripped.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }
    while result.ends_with(' ') {
        result.pop();
    }
    result
}

/// Split cleaned text into words.
pub fn split_words(cleaned: &str) -> Vec<String> {
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Extract every ASCII digit run in a word as a separate number.
fn digit_runs(word: &str) -> Vec<u64> {
    let mut numbers = Vec::new();
    let mut run = String::new();
    for c in word.chars() {
        if c.is_ascii_digit() {
            run.push(c);
        } else if !run.is_empty() {
            if let Ok(n) = run.parse::<u64>() {
                numbers.push(n);
            }
            run.clear();
        }
    }
    if !run.is_empty() {
        if let Ok(n) = run.parse::<u64>() {
            numbers.push(n);
        }
    }
    numbers
}

/// The "by spaces" numeric view: every digit run anywhere in any word is its
/// own number.
///
/// `["15", "February", "2021"]` yields `[15, 2021]`.
pub fn numbers_by_spaces(words: &[String]) -> Vec<u64> {
    words.iter().flat_map(|w| digit_runs(w)).collect()
}

/// The "merged adjacent" numeric view: maximal runs of purely-numeric words
/// are concatenated before parsing.
///
/// `["15", "16", "2021"]` yields `[15162021]`. Words that merely contain
/// digits break a run and contribute their digit runs individually.
pub fn numbers_merged_adjacent(words: &[String]) -> Vec<u64> {
    let mut numbers = Vec::new();
    let mut buffer = String::new();

    let mut flush = |buffer: &mut String, numbers: &mut Vec<u64>| {
        if !buffer.is_empty() {
            if let Ok(n) = buffer.parse::<u64>() {
                numbers.push(n);
            }
            buffer.clear();
        }
    };

    for word in words {
        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            buffer.push_str(word);
        } else {
            flush(&mut buffer, &mut numbers);
            numbers.extend(digit_runs(word));
        }
    }
    flush(&mut buffer, &mut numbers);
    numbers
}

/// Ordered non-alphanumeric, non-space characters of a text.
pub fn punctuation_fingerprint(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .collect()
}

/// Check whether a character belongs to one of the scripts the garbage
/// filter recognizes: Latin, Cyrillic, Greek, Arabic (including Arabic
/// presentation forms).
pub fn is_recognized_script_char(c: char) -> bool {
    let code = c as u32;

    // Basic Latin letters
    c.is_ascii_alphabetic()
    // Latin-1 Supplement letters through Latin Extended-B
    || (0x00C0..=0x024F).contains(&code) && c.is_alphabetic()
    // Greek and Coptic, Greek Extended
    || (0x0370..=0x03FF).contains(&code)
    || (0x1F00..=0x1FFF).contains(&code)
    // Cyrillic, Cyrillic Supplement
    || (0x0400..=0x052F).contains(&code)
    // Arabic, Arabic Supplement
    || (0x0600..=0x077F).contains(&code)
    // Arabic Presentation Forms A and B
    || (0xFB50..=0xFDFF).contains(&code)
    || (0xFE70..=0xFEFF).contains(&code)
}

/// Count script-recognized characters in a text.
pub fn recognized_script_chars(text: &str) -> usize {
    text.chars().filter(|c| is_recognized_script_char(*c)).count()
}

/// Check whether a text contains any alphanumeric character.
pub fn has_alphanumeric(text: &str) -> bool {
    text.chars().any(|c| c.is_alphanumeric())
}

/// Check whether a paragraph text ends with sentence-final punctuation.
///
/// Used to veto cross-page merging: a paragraph ending in `.`, `!`, `?` or
/// `;` is treated as complete.
pub fn ends_sentence(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some('.') | Some('!') | Some('?') | Some(';')
    )
}

/// Check whether a text starts with an alphanumeric character.
pub fn starts_alphanumeric(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .map(|c| c.is_alphanumeric())
        .unwrap_or(false)
}

/// Fuzzy similarity for full paragraph texts, in [0, 1].
///
/// Normalized Levenshtein over the cleaned texts; both empty compares as a
/// perfect match.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Fuzzy similarity for short tokens such as first words, in [0, 1].
///
/// Jaro-Winkler weights shared prefixes, which suits list markers and
/// cognate first words across languages.
pub fn word_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::jaro_winkler(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_text_strips_diacritics_and_whitespace() {
        assert_eq!(clean_text("  Résumé\t du  DOCUMENT\n"), "resume du document");
        assert_eq!(clean_text("Ángel  über"), "angel uber");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let once = clean_text("Déjà   vu. ");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_numbers_by_spaces() {
        assert_eq!(
            numbers_by_spaces(&words(&["15", "February", "2021"])),
            vec![15, 2021]
        );
        assert_eq!(
            numbers_by_spaces(&words(&["15", "16", "2021"])),
            vec![15, 16, 2021]
        );
        // Digit runs inside mixed tokens are separate numbers
        assert_eq!(numbers_by_spaces(&words(&["ab12cd34"])), vec![12, 34]);
    }

    #[test]
    fn test_numbers_merged_adjacent() {
        assert_eq!(
            numbers_merged_adjacent(&words(&["15", "16", "2021"])),
            vec![15162021]
        );
        assert_eq!(
            numbers_merged_adjacent(&words(&["15", "February", "2021"])),
            vec![15, 2021]
        );
        // A mixed token breaks the run
        assert_eq!(
            numbers_merged_adjacent(&words(&["1", "2", "a3", "4"])),
            vec![12, 3, 4]
        );
    }

    #[test]
    fn test_numbers_overlong_run_skipped() {
        let giant = "9".repeat(40);
        assert!(numbers_by_spaces(&[giant.clone()]).is_empty());
        assert!(numbers_merged_adjacent(&[giant]).is_empty());
    }

    #[test]
    fn test_punctuation_fingerprint() {
        assert_eq!(
            punctuation_fingerprint("Art. 5(2) - intro;"),
            vec!['.', '(', ')', '-', ';']
        );
        assert!(punctuation_fingerprint("plain words").is_empty());
    }

    #[test]
    fn test_recognized_script_chars() {
        assert_eq!(recognized_script_chars("abc"), 3);
        assert_eq!(recognized_script_chars("привет"), 6);
        assert_eq!(recognized_script_chars("αβγ"), 3);
        assert_eq!(recognized_script_chars("مرحبا"), 5);
        // Digits and punctuation are not script characters
        assert_eq!(recognized_script_chars("123 !?"), 0);
    }

    #[test]
    fn test_sentence_boundaries() {
        assert!(ends_sentence("Done."));
        assert!(ends_sentence("Really? "));
        assert!(!ends_sentence("to be continued"));
        assert!(starts_alphanumeric("1. item"));
        assert!(!starts_alphanumeric("(note)"));
    }

    #[test]
    fn test_similarity_degenerate_cases() {
        assert_eq!(text_similarity("", ""), 1.0);
        assert_eq!(word_similarity("", ""), 1.0);
        assert_eq!(word_similarity("", "word"), 0.0);
        assert!(text_similarity("page 1 of 9", "page 2 of 9") > 0.8);
        assert!(word_similarity("1.", "1.") > 0.99);
    }
}
