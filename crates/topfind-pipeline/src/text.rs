//! Accent/case folding and stop words shared by the taxonomy matcher and
//! the keyword filters.

use std::collections::HashSet;
use std::sync::LazyLock;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const ENGLISH: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has",
    "have", "how", "in", "into", "is", "it", "its", "of", "on", "or", "so", "than", "that",
    "the", "their", "then", "there", "these", "this", "to", "was", "what", "when", "which",
    "who", "why", "will", "with", "you", "your",
];

const SPANISH: &[&str] = &[
    "a", "al", "con", "como", "de", "del", "el", "en", "entre", "es", "esta", "este", "la",
    "las", "lo", "los", "mas", "mi", "no", "o", "para", "pero", "por", "que", "se", "sin",
    "sobre", "su", "sus", "un", "una", "unos", "unas", "y",
];

const ITALIAN: &[&str] = &[
    "a", "al", "alla", "che", "con", "da", "dal", "dei", "del", "della", "delle", "di", "e",
    "gli", "i", "il", "in", "la", "le", "lo", "nel", "nella", "non", "o", "per", "su", "tra",
    "un", "una", "uno",
];

const CZECH: &[&str] = &[
    "a", "aby", "ale", "by", "do", "i", "jak", "je", "k", "na", "nebo", "o", "od", "po",
    "pro", "s", "se", "si", "ta", "to", "u", "v", "ve", "z", "za", "ze",
];

const SLOVENE: &[&str] = &[
    "da", "do", "in", "iz", "je", "k", "ki", "na", "ne", "o", "od", "pa", "po", "pri", "s",
    "se", "so", "v", "z", "za", "ali",
];

static ALL_STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [ENGLISH, SPANISH, ITALIAN, CZECH, SLOVENE]
        .into_iter()
        .flatten()
        .copied()
        .collect()
});

/// A set of folded words ignored when matching phrases.
#[derive(Debug, Clone, Copy)]
pub struct StopWords {
    words: &'static [&'static str],
    all: bool,
}

impl StopWords {
    /// Stop words of one language (ISO 639-1). Unknown languages fall back to
    /// English.
    #[must_use]
    pub fn for_lang(lang: &str) -> Self {
        let words = match lang.trim().to_ascii_lowercase().as_str() {
            "es" => SPANISH,
            "it" => ITALIAN,
            "cs" => CZECH,
            "sl" => SLOVENE,
            _ => ENGLISH,
        };
        Self { words, all: false }
    }

    /// The union of every supported language's stop words.
    #[must_use]
    pub fn all_languages() -> Self {
        Self {
            words: &[],
            all: true,
        }
    }

    /// `word` must already be folded.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        if self.all {
            ALL_STOP_WORDS.contains(word)
        } else {
            self.words.contains(&word)
        }
    }
}

/// Lower-cases `text` and strips diacritics (`"Sáenz"` → `"saenz"`).
#[must_use]
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Folded whitespace-delimited words of `phrase` with stop words removed.
#[must_use]
pub fn content_words(phrase: &str, stop_words: StopWords) -> Vec<String> {
    fold(phrase)
        .split_whitespace()
        .filter(|word| !stop_words.contains(word))
        .map(str::to_string)
        .collect()
}

/// Non-overlapping occurrences of `needle` in `haystack`.
#[must_use]
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_and_case() {
        assert_eq!(fold("Cáncer de MAMA"), "cancer de mama");
        assert_eq!(fold("Žena ČESKÁ"), "zena ceska");
    }

    #[test]
    fn content_words_drop_stop_words() {
        assert_eq!(
            content_words("Apoyo para el cáncer", StopWords::for_lang("es")),
            vec!["apoyo", "cancer"]
        );
    }

    #[test]
    fn language_lists_are_separate() {
        assert!(StopWords::for_lang("es").contains("para"));
        assert!(!StopWords::for_lang("en").contains("para"));
        assert!(StopWords::all_languages().contains("para"));
        assert!(StopWords::all_languages().contains("the"));
    }

    #[test]
    fn counts_repeated_terms() {
        assert_eq!(count_occurrences("care and more care", "care"), 2);
        assert_eq!(count_occurrences("anything", ""), 0);
    }
}
