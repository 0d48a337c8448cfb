//! Language matching for the `language` filter.

/// ISO 639-1 codes mapped to the ISO 639-3 codes the detector reports.
const ISO_639_3: &[(&str, &str)] = &[
    ("en", "eng"),
    ("es", "spa"),
    ("it", "ita"),
    ("cs", "ces"),
    ("sl", "slv"),
    ("fr", "fra"),
    ("de", "deu"),
    ("pt", "por"),
    ("nl", "nld"),
    ("ca", "cat"),
    ("pl", "pol"),
    ("ro", "ron"),
    ("sv", "swe"),
    ("da", "dan"),
    ("fi", "fin"),
    ("hu", "hun"),
    ("ru", "rus"),
    ("tr", "tur"),
    ("el", "ell"),
    ("sk", "slk"),
    ("hr", "hrv"),
];

/// Primary subtag of a language code, lower-cased (`"EN-us"` → `"en"`).
fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Whether any of the declared codes names `target`.
pub(crate) fn declares(declared: &[String], target: &str) -> bool {
    let target = primary_subtag(target);
    declared.iter().any(|code| primary_subtag(code) == target)
}

fn to_iso_639_3(target: &str) -> String {
    let primary = primary_subtag(target);
    ISO_639_3
        .iter()
        .find(|(two, _)| *two == primary)
        .map_or(primary, |(_, three)| (*three).to_string())
}

/// Outcome of running detection over a row's text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Detection {
    /// At least one field was confidently detected as the target language.
    Matches,
    /// Every confident detection named some other language.
    Differs,
    /// Nothing could be detected with confidence.
    Unknown,
}

/// Runs detection on each text and compares against `target` (ISO 639-1).
pub(crate) fn detect<'a>(texts: impl IntoIterator<Item = &'a str>, target: &str) -> Detection {
    let target = to_iso_639_3(target);
    let mut saw_other = false;
    for text in texts {
        if text.trim().is_empty() {
            continue;
        }
        let Some(info) = whatlang::detect(text) else {
            continue;
        };
        if !info.is_reliable() {
            continue;
        }
        if info.lang().code() == target {
            return Detection::Matches;
        }
        saw_other = true;
    }
    if saw_other {
        Detection::Differs
    } else {
        Detection::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_codes_match_on_primary_subtag() {
        let declared = vec!["EN".to_string(), "pt-BR".to_string()];
        assert!(declares(&declared, "en"));
        assert!(declares(&declared, "pt"));
        assert!(!declares(&declared, "es"));
    }

    #[test]
    fn maps_two_letter_codes() {
        assert_eq!(to_iso_639_3("es"), "spa");
        assert_eq!(to_iso_639_3("sl"), "slv");
        assert_eq!(to_iso_639_3("xx"), "xx");
    }

    #[test]
    fn empty_texts_are_unknown() {
        assert_eq!(detect(["", "   "], "en"), Detection::Unknown);
    }

    #[test]
    fn detects_long_english_text() {
        let text = "This application helps patients and families find support groups, \
                    track their treatment schedule and talk with other people who have \
                    been through the same experience.";
        assert_eq!(detect([text], "en"), Detection::Matches);
        assert_eq!(detect([text], "es"), Detection::Differs);
    }
}
