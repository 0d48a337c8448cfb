//! Taxonomy tagging.
//!
//! A synonym matches a text when every one of its non-stop words occurs,
//! after folding, as a substring of the folded text. Word order and
//! adjacency are not checked, so a multi-word synonym can match words that
//! are scattered across the text (`"lung cancer"` matches "cancer of the
//! lung" and also "cancer patients with lung transplants").

use std::collections::{BTreeMap, BTreeSet};

use topfind_core::{ResourceTable, Taxonomy, Value};

use crate::text::{content_words, fold, StopWords};

/// Matched synonyms per `group.term` key. Every taxonomy pair is present;
/// an empty set means no synonym of that pair matched.
pub type Tags = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug)]
struct TermMatcher {
    key: String,
    /// `(synonym as written, its folded content words)`.
    synonyms: Vec<(String, Vec<String>)>,
}

/// Precomputed folded synonym sets for one taxonomy.
#[derive(Debug)]
pub struct TaxonomyMatcher {
    terms: Vec<TermMatcher>,
}

impl TaxonomyMatcher {
    /// Builds a matcher using the stop words of `lang`.
    #[must_use]
    pub fn new(taxonomy: &Taxonomy, lang: &str) -> Self {
        let stop_words = StopWords::for_lang(lang);
        let terms = taxonomy
            .terms()
            .map(|(group, term, synonyms)| TermMatcher {
                key: Taxonomy::tag_key(group, term),
                synonyms: synonyms
                    .iter()
                    .map(|s| (s.clone(), content_words(s, stop_words)))
                    .collect(),
            })
            .collect();
        Self { terms }
    }

    /// Column names this matcher adds, in taxonomy order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.key.clone()).collect()
    }

    #[must_use]
    pub fn tag(&self, text: &str) -> Tags {
        let folded = fold(text);
        self.terms
            .iter()
            .map(|term| {
                let matched = term
                    .synonyms
                    .iter()
                    .filter(|(_, words)| words.iter().all(|w| folded.contains(w.as_str())))
                    .map(|(synonym, _)| synonym.clone())
                    .collect();
                (term.key.clone(), matched)
            })
            .collect()
    }

    /// Adds one list column per taxonomy pair to `table`, tagging the
    /// combined title, description and (for videos) tags of every row.
    pub fn tag_table(&self, table: &mut ResourceTable) {
        for key in self.keys() {
            table.add_column(&key);
        }
        for row in table.rows_mut() {
            let text = ["title", "description", "tags"]
                .iter()
                .filter_map(|column| row.get(column).searchable_text())
                .collect::<Vec<_>>()
                .join(" ");
            for (key, matched) in self.tag(&text) {
                row.set(&key, Value::List(matched.into_iter().collect()));
            }
        }
    }
}

/// Tags one text against `taxonomy` with English stop words.
#[must_use]
pub fn tag(text: &str, taxonomy: &Taxonomy) -> Tags {
    TaxonomyMatcher::new(taxonomy, "en").tag(text)
}
