//! Apple Podcasts adapter: show search followed by per-show episode lookups.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Url;
use serde_json::Value as JsonValue;

use super::{clean_string_fields, meta_content, required_id};
use crate::enrich::{enrichment_deadline, with_deadline};
use crate::error::ScraperError;
use crate::http::{decode_json, endpoint, parse_base_url, HttpSettings, ProviderHttp};
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};
use crate::types::ItunesResponse;

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com/";
const SHOW_LIMIT: &str = "200";
const EPISODES_PER_SHOW: &str = "5";
const CONCURRENT_LOOKUPS: usize = 4;

pub struct ApplePodcastsAdapter {
    http: ProviderHttp,
    base_url: Url,
    context: SearchContext,
    deadline: Duration,
}

impl ApplePodcastsAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &HttpSettings, context: SearchContext) -> Result<Self, ScraperError> {
        Self::with_base_url(settings, context, DEFAULT_BASE_URL)
    }

    /// Creates an adapter against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        settings: &HttpSettings,
        context: SearchContext,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            http: ProviderHttp::new(ProviderKind::ApplePodcasts, settings)?,
            base_url: parse_base_url(base_url)?,
            context,
            deadline: enrichment_deadline(ProviderKind::ApplePodcasts),
        })
    }

    /// Overrides the episode-page fetch deadline.
    #[must_use]
    pub fn with_enrichment_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    async fn episodes_of(&self, show_id: &str) -> Result<Vec<JsonValue>, ScraperError> {
        let mut url = endpoint(&self.base_url, "lookup")?;
        url.query_pairs_mut()
            .append_pair("id", show_id)
            .append_pair("media", "podcast")
            .append_pair("entity", "podcastEpisode")
            .append_pair("limit", EPISODES_PER_SHOW)
            .append_pair("country", &self.context.country);
        let response: ItunesResponse = self
            .http
            .get_json(&url, &format!("apple podcasts lookup {show_id}"))
            .await?;
        Ok(response
            .results
            .into_iter()
            .filter(|r| r.get("wrapperType").and_then(JsonValue::as_str) == Some("podcastEpisode"))
            .collect())
    }
}

#[async_trait]
impl ProviderAdapter for ApplePodcastsAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ApplePodcasts
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        let mut url = endpoint(&self.base_url, "search")?;
        url.query_pairs_mut()
            .append_pair("term", query)
            .append_pair("media", "podcast")
            .append_pair("limit", SHOW_LIMIT)
            .append_pair("country", &self.context.country);
        let body = self.http.get_text(&url).await?;
        let shows: ItunesResponse =
            decode_json(&body, &format!("apple podcasts search '{query}'"))?;

        let show_ids: Vec<String> = shows
            .results
            .iter()
            .filter_map(|show| show.get("collectionId").or_else(|| show.get("trackId")))
            .filter_map(|id| match id {
                JsonValue::Number(n) => Some(n.to_string()),
                JsonValue::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        tracing::debug!(query, shows = show_ids.len(), "apple podcasts shows found");

        let episodes: Vec<Vec<JsonValue>> = stream::iter(show_ids)
            .map(|show_id| async move {
                match self.episodes_of(&show_id).await {
                    Ok(episodes) => episodes,
                    Err(e) => {
                        tracing::warn!(show_id = %show_id, error = %e, "apple podcasts episode lookup failed");
                        Vec::new()
                    }
                }
            })
            .buffered(CONCURRENT_LOOKUPS)
            .collect()
            .await;

        Ok(episodes.into_iter().flatten().collect())
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        required_id(ProviderKind::ApplePodcasts, &item, "trackId")?;
        let mut row = ProviderRow::from_object(ProviderKind::ApplePodcasts, item);

        let has_description = ["description", "shortDescription"]
            .iter()
            .filter_map(|field| row.str_field(field))
            .any(|text| !text.trim().is_empty());
        if !has_description {
            if let Some(page) = row.str_field("trackViewUrl").map(str::to_string) {
                match self.page_description(&page).await {
                    Ok(Some(description)) => row.set("description", description),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(url = %page, error = %e, "episode page fetch failed");
                        row.degraded = true;
                    }
                }
            }
        } else if row.str_field("description").is_none_or(|d| d.trim().is_empty()) {
            let short = row.str_field("shortDescription").map(str::to_string);
            if let Some(short) = short {
                row.set("description", short);
            }
        }

        clean_string_fields(&mut row.fields);
        Ok(row)
    }
}

impl ApplePodcastsAdapter {
    async fn page_description(&self, page: &str) -> Result<Option<String>, ScraperError> {
        let url = parse_base_url(page)?;
        let http = self.http.clone();
        let html = with_deadline(ProviderKind::ApplePodcasts, self.deadline, async move {
            http.get_text(&url).await
        })
        .await?;
        Ok(meta_content(&html, "description").or_else(|| meta_content(&html, "og:description")))
    }
}
