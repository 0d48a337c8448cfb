//! Named search configurations persisted as JSON, one file per resource kind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter_spec::FilterSpec;
use crate::resource::ResourceKind;
use crate::taxonomy::Taxonomy;

/// Every input of one search, as saved for later reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub queries: Vec<String>,
    pub lang: String,
    pub country: String,
    #[serde(default)]
    pub queries_synonyms: Vec<Vec<String>>,
    #[serde(default)]
    pub filter_values: FilterSpec,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default, skip_serializing_if = "Taxonomy::is_empty")]
    pub taxonomy: Taxonomy,
}

/// Directory-backed store of [`SearchConfig`]s.
///
/// Each kind lives in `<dir>/<kind>.json` as an object keyed by config name.
/// A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn list(&self, kind: ResourceKind) -> Result<Vec<String>, ConfigError> {
        Ok(self.read_all(kind)?.into_keys().collect())
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(&self, kind: ResourceKind, name: &str) -> Result<Option<SearchConfig>, ConfigError> {
        Ok(self.read_all(kind)?.remove(name))
    }

    /// Saves `config` under `name`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store cannot be read or written.
    pub fn save(
        &self,
        kind: ResourceKind,
        name: &str,
        config: &SearchConfig,
    ) -> Result<(), ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "configuration name must be non-empty".to_string(),
            ));
        }
        let mut all = self.read_all(kind)?;
        all.insert(name.to_string(), config.clone());
        self.write_all(kind, &all)
    }

    /// Removes `name`. Returns whether an entry existed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store cannot be read or written.
    pub fn delete(&self, kind: ResourceKind, name: &str) -> Result<bool, ConfigError> {
        let mut all = self.read_all(kind)?;
        let existed = all.remove(name).is_some();
        if existed {
            self.write_all(kind, &all)?;
        }
        Ok(existed)
    }

    fn read_all(&self, kind: ResourceKind) -> Result<BTreeMap<String, SearchConfig>, ConfigError> {
        let path = self.path_for(kind);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(io_error(&path, e)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(
        &self,
        kind: ResourceKind,
        all: &BTreeMap<String, SearchConfig>,
    ) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(kind);
        let body = serde_json::to_string_pretty(all)?;
        std::fs::write(&path, body).map_err(|e| io_error(&path, e))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::FileIo {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> SearchConfig {
        SearchConfig {
            queries: vec!["cancer".to_string(), "support".to_string()],
            lang: "en".to_string(),
            country: "us".to_string(),
            queries_synonyms: vec![vec!["tumor".to_string()], vec![]],
            filter_values: FilterSpec::new().with("free", true).with("score", 3.0),
            metadata: vec!["appId".to_string(), "title".to_string()],
            taxonomy: Taxonomy::default(),
        }
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        assert!(store.list(ResourceKind::Apps).unwrap().is_empty());
        assert!(store.load(ResourceKind::Apps, "x").unwrap().is_none());
    }

    #[test]
    fn save_then_load_returns_same_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested"));
        store
            .save(ResourceKind::Apps, "oncology", &sample_config())
            .expect("save should create the directory");

        let loaded = store.load(ResourceKind::Apps, "oncology").unwrap();
        assert_eq!(loaded, Some(sample_config()));
        assert_eq!(store.list(ResourceKind::Apps).unwrap(), ["oncology"]);
        // Other kinds are stored separately.
        assert!(store.list(ResourceKind::News).unwrap().is_empty());
    }

    #[test]
    fn delete_reports_whether_entry_existed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        store
            .save(ResourceKind::Videos, "a", &sample_config())
            .unwrap();

        assert!(store.delete(ResourceKind::Videos, "a").unwrap());
        assert!(!store.delete(ResourceKind::Videos, "a").unwrap());
    }

    #[test]
    fn rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let err = store
            .save(ResourceKind::Apps, "  ", &sample_config())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn reads_file_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("podcasts.json"),
            r#"{"weekly": {"queries": ["sleep"], "lang": "es", "country": "es",
                "filter_values": {"free": true, "recent_update": 5}}}"#,
        )
        .unwrap();

        let store = ConfigStore::new(dir.path());
        let config = store
            .load(ResourceKind::Podcasts, "weekly")
            .unwrap()
            .expect("config should exist");
        assert_eq!(config.lang, "es");
        assert!(config.queries_synonyms.is_empty());
        assert_eq!(config.filter_values.len(), 2);
    }
}
