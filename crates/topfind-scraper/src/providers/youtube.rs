//! Video platform adapter for the `YouTube` Data API v3.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value as JsonValue};

use super::{clean_string_fields, iso8601_duration_secs, parse_count, set_query_param};
use crate::credentials::{with_rotation, Credential, CredentialRing};
use crate::enrich::{enrichment_deadline, keyed_with_deadline};
use crate::error::ScraperError;
use crate::http::{decode_json, endpoint, parse_base_url, HttpSettings, ProviderHttp};
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};
use crate::types::{YouTubeChannel, YouTubeListResponse, YouTubeSearchResponse, YouTubeVideo};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const PAGE_SIZE: &str = "50";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub struct YouTubeAdapter {
    http: ProviderHttp,
    base_url: Url,
    context: SearchContext,
    credentials: CredentialRing,
    deadline: Duration,
}

impl YouTubeAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: &HttpSettings,
        context: SearchContext,
        api_keys: Vec<String>,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(settings, context, api_keys, DEFAULT_BASE_URL)
    }

    /// Creates an adapter against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        settings: &HttpSettings,
        context: SearchContext,
        api_keys: Vec<String>,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            http: ProviderHttp::new(ProviderKind::YouTube, settings)?,
            base_url: parse_base_url(base_url)?,
            context,
            credentials: CredentialRing::new(api_keys),
            deadline: enrichment_deadline(ProviderKind::YouTube),
        })
    }

    /// Overrides the per-item enrichment deadline.
    #[must_use]
    pub fn with_enrichment_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn search_url(&self, query: &str, page_token: Option<&str>) -> Result<Url, ScraperError> {
        let mut url = endpoint(&self.base_url, "search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("part", "snippet")
                .append_pair("type", "video")
                .append_pair("maxResults", PAGE_SIZE)
                .append_pair("q", query)
                .append_pair("relevanceLanguage", &self.context.lang)
                .append_pair("regionCode", &self.context.country.to_ascii_uppercase());
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }
}

/// GETs a Data API URL with the ring's current key.
async fn keyed_get(
    http: &ProviderHttp,
    credentials: &CredentialRing,
    url: &Url,
) -> Result<String, ScraperError> {
    with_rotation(credentials, ProviderKind::YouTube, |credential| {
        get_with_key(http, credential, url)
    })
    .await
}

async fn get_with_key(
    http: &ProviderHttp,
    credential: Credential,
    url: &Url,
) -> Result<String, ScraperError> {
    let mut keyed = url.clone();
    set_query_param(&mut keyed, "key", &credential.key);
    http.get_text(&keyed).await
}

#[async_trait]
impl ProviderAdapter for YouTubeAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::YouTube
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..self.http.settings().max_pages {
            let url = self.search_url(query, page_token.as_deref())?;
            let context = format!("youtube search '{query}' page {page}");
            let body = match keyed_get(&self.http, &self.credentials, &url).await {
                Ok(body) => body,
                Err(e) if page > 0 && !e.is_quota() => {
                    tracing::warn!(query, page, error = %e, "youtube page failed, keeping earlier pages");
                    break;
                }
                Err(e) => return Err(e),
            };
            let response: YouTubeSearchResponse = decode_json(&body, &context)?;

            for item in response.items {
                let Some(video_id) = item.id.video_id else {
                    continue;
                };
                let mut raw = match item.snippet {
                    JsonValue::Object(map) => map,
                    _ => Map::new(),
                };
                raw.insert("video_id".to_string(), JsonValue::String(video_id));
                items.push(JsonValue::Object(raw));
            }

            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
            self.http.page_delay().await;
        }

        Ok(items)
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        let video_id = super::required_id(ProviderKind::YouTube, &item, "video_id")?;
        let mut row = listing_row(&video_id, &item);

        let mut video_url = endpoint(&self.base_url, "videos")?;
        video_url
            .query_pairs_mut()
            .append_pair("part", "snippet,contentDetails,statistics")
            .append_pair("id", &video_id);
        let channel_url = match row.str_field("channelId") {
            Some(channel_id) => {
                let mut url = endpoint(&self.base_url, "channels")?;
                url.query_pairs_mut()
                    .append_pair("part", "statistics")
                    .append_pair("id", channel_id);
                Some(url)
            }
            None => None,
        };

        let context = format!("youtube video '{video_id}'");
        let lookup = |credential: Credential| {
            let http = self.http.clone();
            let video_url = video_url.clone();
            let channel_url = channel_url.clone();
            let context = context.clone();
            async move {
                let body = get_with_key(&http, credential.clone(), &video_url).await?;
                let videos: YouTubeListResponse<YouTubeVideo> = decode_json(&body, &context)?;
                let channel = match channel_url {
                    Some(url) => {
                        let body = get_with_key(&http, credential, &url).await?;
                        let channels: YouTubeListResponse<YouTubeChannel> =
                            decode_json(&body, &context)?;
                        channels.items.into_iter().next()
                    }
                    None => None,
                };
                Ok((videos.items.into_iter().next(), channel))
            }
        };

        let details =
            keyed_with_deadline(&self.credentials, ProviderKind::YouTube, self.deadline, lookup)
                .await;
        match details {
            Ok((Some(video), channel)) => apply_details(&mut row.fields, video, channel),
            Ok((None, _)) => {
                tracing::debug!(video_id = %video_id, "youtube video lookup returned no items");
                row.degraded = true;
            }
            Err(e) => {
                tracing::debug!(video_id = %video_id, error = %e, "youtube enrichment failed, keeping search snippet");
                row.degraded = true;
            }
        }

        clean_string_fields(&mut row.fields);
        Ok(row)
    }
}

fn listing_row(video_id: &str, item: &JsonValue) -> ProviderRow {
    let mut row = ProviderRow::new(ProviderKind::YouTube);
    row.set("video_id", video_id);
    row.set("video_URL", format!("{WATCH_URL}{video_id}"));
    for field in ["title", "description", "channelId", "channelTitle", "publishedAt"] {
        if let Some(value) = item.get(field).filter(|v| !v.is_null()) {
            row.set(field, value.clone());
        }
    }
    row
}

fn apply_details(
    fields: &mut Map<String, JsonValue>,
    video: YouTubeVideo,
    channel: Option<YouTubeChannel>,
) {
    if let Some(description) = video.snippet.description {
        fields.insert("description_complete".to_string(), JsonValue::String(description));
    }
    if !video.snippet.tags.is_empty() {
        fields.insert("tags".to_string(), JsonValue::String(video.snippet.tags.join(";")));
    }
    if let Some(licensed) = video.content_details.licensed_content {
        fields.insert("licensedContent".to_string(), JsonValue::Bool(licensed));
    }
    if let Some(secs) = video
        .content_details
        .duration
        .as_deref()
        .and_then(iso8601_duration_secs)
    {
        fields.insert("duration".to_string(), JsonValue::from(secs));
    }
    let stats = video.statistics;
    fields.insert("viewCount".to_string(), parse_count(stats.view_count.as_deref()));
    fields.insert("likeCount".to_string(), parse_count(stats.like_count.as_deref()));
    fields.insert("commentCount".to_string(), parse_count(stats.comment_count.as_deref()));
    let subscribers = channel
        .and_then(|c| c.statistics.subscriber_count)
        .map_or(JsonValue::Null, |count| parse_count(Some(&count)));
    fields.insert("subscriberCount".to_string(), subscribers);
}
