//! The provider adapter contract shared by every external source.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use topfind_core::ResourceKind;

use crate::error::ScraperError;

/// One external platform feeding a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    GooglePlay,
    AppStore,
    Spotify,
    ApplePodcasts,
    YouTube,
    GoogleNews,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::GooglePlay,
        ProviderKind::AppStore,
        ProviderKind::Spotify,
        ProviderKind::ApplePodcasts,
        ProviderKind::YouTube,
        ProviderKind::GoogleNews,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::GooglePlay => "google_play",
            ProviderKind::AppStore => "app_store",
            ProviderKind::Spotify => "spotify",
            ProviderKind::ApplePodcasts => "apple_podcasts",
            ProviderKind::YouTube => "youtube",
            ProviderKind::GoogleNews => "google_news",
        }
    }

    #[must_use]
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            ProviderKind::GooglePlay | ProviderKind::AppStore => ResourceKind::Apps,
            ProviderKind::Spotify | ProviderKind::ApplePodcasts => ResourceKind::Podcasts,
            ProviderKind::YouTube => ResourceKind::Videos,
            ProviderKind::GoogleNews => ResourceKind::News,
        }
    }

    /// Providers that feed `kind`, in concatenation order.
    #[must_use]
    pub fn for_resource(kind: ResourceKind) -> &'static [ProviderKind] {
        match kind {
            ResourceKind::Apps => &[ProviderKind::GooglePlay, ProviderKind::AppStore],
            ResourceKind::Podcasts => &[ProviderKind::Spotify, ProviderKind::ApplePodcasts],
            ResourceKind::Videos => &[ProviderKind::YouTube],
            ResourceKind::News => &[ProviderKind::GoogleNews],
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market a search targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContext {
    /// ISO 639-1 language code, lower-case (`en`).
    pub lang: String,
    /// ISO 3166-1 alpha-2 country code, lower-case (`us`).
    pub country: String,
}

impl SearchContext {
    #[must_use]
    pub fn new(lang: &str, country: &str) -> Self {
        Self {
            lang: lang.trim().to_ascii_lowercase(),
            country: country.trim().to_ascii_lowercase(),
        }
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new("en", "us")
    }
}

/// A provider-native search result before `parse`.
pub type RawItem = JsonValue;

/// A parsed item, still keyed by provider-native field names.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRow {
    pub provider: ProviderKind,
    pub fields: Map<String, JsonValue>,
    /// Set when a secondary lookup timed out or failed and the row carries
    /// only what the search listing provided.
    pub degraded: bool,
}

impl ProviderRow {
    #[must_use]
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            fields: Map::new(),
            degraded: false,
        }
    }

    /// Builds a row from a JSON object; anything else yields an empty row.
    #[must_use]
    pub fn from_object(provider: ProviderKind, item: RawItem) -> Self {
        let fields = match item {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            provider,
            fields,
            degraded: false,
        }
    }

    pub fn set(&mut self, field: &str, value: impl Into<JsonValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(JsonValue::as_str)
    }
}

/// Capability set of one external source.
///
/// `search` pages through results for one expanded query string. `parse`
/// turns one raw result into a row, performing any secondary lookups under
/// a per-item deadline: a lookup that times out degrades the row instead of
/// failing it.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError>;

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError>;
}
