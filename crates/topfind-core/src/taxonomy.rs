//! Keyword taxonomies: group -> canonical term -> synonyms.
//!
//! A taxonomy is supplied per project (YAML or JSON) and threaded through a
//! search explicitly. The canonical term is only matched when it is also
//! listed among its own synonyms.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    groups: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Taxonomy {
    #[must_use]
    pub fn new(groups: BTreeMap<String, BTreeMap<String, Vec<String>>>) -> Self {
        Self { groups }
    }

    /// Builder used by tests and callers assembling a taxonomy in code.
    #[must_use]
    pub fn with_term(mut self, group: &str, term: &str, synonyms: &[&str]) -> Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(
                term.to_string(),
                synonyms.iter().map(|s| (*s).to_string()).collect(),
            );
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }

    /// Iterates `(group, canonical term, synonyms)` in sorted order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.groups.iter().flat_map(|(group, terms)| {
            terms
                .iter()
                .map(move |(term, synonyms)| (group.as_str(), term.as_str(), synonyms.as_slice()))
        })
    }

    /// Column / tag key for a group + canonical term pair.
    #[must_use]
    pub fn tag_key(group: &str, term: &str) -> String {
        format!("{group}.{term}")
    }

    /// All tag keys in iteration order.
    #[must_use]
    pub fn tag_keys(&self) -> Vec<String> {
        self.terms()
            .map(|(group, term, _)| Self::tag_key(group, term))
            .collect()
    }

    /// Validates an untyped document and converts it into a taxonomy.
    ///
    /// Every group must be an object and every term must map to a list of
    /// strings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMetadataSpec`] naming the offending
    /// group or term.
    pub fn from_json_value(doc: &serde_json::Value) -> Result<Self, ValidationError> {
        let serde_json::Value::Object(groups) = doc else {
            return Err(ValidationError::InvalidMetadataSpec(
                "taxonomy must be an object of groups".to_string(),
            ));
        };

        let mut out = BTreeMap::new();
        for (group, terms) in groups {
            let serde_json::Value::Object(terms) = terms else {
                return Err(ValidationError::InvalidMetadataSpec(format!(
                    "taxonomy group '{group}' must be an object of terms"
                )));
            };

            let mut parsed_terms = BTreeMap::new();
            for (term, synonyms) in terms {
                let serde_json::Value::Array(items) = synonyms else {
                    return Err(ValidationError::InvalidMetadataSpec(format!(
                        "synonyms for '{group}.{term}' must be a list"
                    )));
                };
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(s) => list.push(s.clone()),
                        other => {
                            return Err(ValidationError::InvalidMetadataSpec(format!(
                                "synonym {other} in '{group}.{term}' is not a string"
                            )));
                        }
                    }
                }
                parsed_terms.insert(term.clone(), list);
            }
            out.insert(group.clone(), parsed_terms);
        }

        Ok(Self { groups: out })
    }
}

/// Load a taxonomy from a YAML or JSON file and validate its shape.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if the
/// document has the wrong shape.
pub fn load_taxonomy(path: &Path) -> Result<Taxonomy, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    // JSON is a subset of YAML, so one parser covers both formats.
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
    let doc = serde_json::to_value(yaml)?;

    Ok(Taxonomy::from_json_value(&doc)?)
}
