//! Android (Google Play) adapter backed by `SerpApi`.
//!
//! `search` walks `engine=google_play` result pages through
//! `serpapi_pagination.next`. `parse` performs an `engine=google_play_product`
//! detail lookup per app under a deadline; when the lookup times out or
//! fails the row keeps the listing fields and is marked degraded.
//!
//! Rows use the field names of the Play store's own app-details payload
//! (`appId`, `genre`, `released`, `updated`, `minInstalls`, `privacyPolicy`,
//! ...) so the schema normalizer sees one Android vocabulary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Map, Value as JsonValue};

use super::{clean_string_fields, required_id, set_query_param};
use crate::credentials::{with_rotation, Credential, CredentialRing};
use crate::enrich::{enrichment_deadline, keyed_with_deadline};
use crate::error::ScraperError;
use crate::http::{decode_json, endpoint, is_quota_message, parse_base_url, HttpSettings, ProviderHttp};
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};
use crate::types::{SerpApiProductResponse, SerpApiSearchResponse};

const DEFAULT_BASE_URL: &str = "https://serpapi.com/";
const MAX_SEARCH_PAGES: usize = 30;

pub struct GooglePlayAdapter {
    http: ProviderHttp,
    base_url: Url,
    context: SearchContext,
    credentials: CredentialRing,
    deadline: Duration,
}

impl GooglePlayAdapter {
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
            http: ProviderHttp::new(ProviderKind::GooglePlay, settings)?,
            base_url: parse_base_url(base_url)?,
            context,
            credentials: CredentialRing::new(api_keys),
            deadline: enrichment_deadline(ProviderKind::GooglePlay),
        })
    }

    /// Overrides the per-item detail lookup deadline.
    #[must_use]
    pub fn with_enrichment_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, ScraperError> {
        let mut url = endpoint(&self.base_url, "search.json")?;
        url.query_pairs_mut()
            .append_pair("engine", "google_play")
            .append_pair("store", "apps")
            .append_pair("q", query)
            .append_pair("hl", &self.context.lang)
            .append_pair("gl", &self.context.country);
        Ok(url)
    }

    fn max_pages(&self) -> usize {
        self.http.settings().max_pages.min(MAX_SEARCH_PAGES)
    }
}

/// GETs a `SerpApi` URL with the ring's current key, rotating keys when the
/// plan is exhausted.
async fn serpapi_get(
    http: &ProviderHttp,
    credentials: &CredentialRing,
    url: &Url,
    context: &str,
) -> Result<String, ScraperError> {
    with_rotation(credentials, ProviderKind::GooglePlay, |credential| {
        serpapi_fetch(http, credential, url, context)
    })
    .await
}

/// One `SerpApi` GET with a fixed key. Quota exhaustion comes back as
/// [`ScraperError::QuotaExceeded`] for the caller to act on.
async fn serpapi_fetch(
    http: &ProviderHttp,
    credential: Credential,
    url: &Url,
    context: &str,
) -> Result<String, ScraperError> {
    let mut keyed = url.clone();
    set_query_param(&mut keyed, "api_key", &credential.key);
    let body = http.get_text(&keyed).await?;
    // SerpApi reports some failures in a 200 body.
    if let Ok(JsonValue::Object(obj)) = serde_json::from_str::<JsonValue>(&body) {
        if let Some(message) = obj.get("error").and_then(JsonValue::as_str) {
            if is_quota_message(message) {
                return Err(ScraperError::QuotaExceeded {
                    provider: ProviderKind::GooglePlay.to_string(),
                });
            }
            if !message.to_ascii_lowercase().contains("hasn't returned any results") {
                return Err(ScraperError::Malformed {
                    provider: ProviderKind::GooglePlay.to_string(),
                    reason: format!("{context}: {message}"),
                });
            }
        }
    }
    Ok(body)
}

#[async_trait]
impl ProviderAdapter for GooglePlayAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GooglePlay
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        let mut items = Vec::new();
        let mut url = self.search_url(query)?;

        for page in 0..self.max_pages() {
            let context = format!("google play search '{query}' page {page}");
            let body = match serpapi_get(&self.http, &self.credentials, &url, &context).await {
                Ok(body) => body,
                Err(e) if page > 0 && !e.is_quota() => {
                    tracing::warn!(query, page, error = %e, "google play page failed, keeping earlier pages");
                    break;
                }
                Err(e) => return Err(e),
            };
            let response: SerpApiSearchResponse = decode_json(&body, &context)?;

            let before = items.len();
            items.extend(response.organic_results.into_iter().flat_map(|group| group.items));
            tracing::debug!(query, page, count = items.len() - before, "google play search page");

            let Some(next) = response.serpapi_pagination.and_then(|p| p.next) else {
                break;
            };
            url = parse_base_url(&next)?;
            self.http.page_delay().await;
        }

        Ok(items)
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        let product_id = required_id(ProviderKind::GooglePlay, &item, "product_id")?;
        let mut row = listing_row(&product_id, &item);

        let mut detail_url = endpoint(&self.base_url, "search.json")?;
        detail_url
            .query_pairs_mut()
            .append_pair("engine", "google_play_product")
            .append_pair("store", "apps")
            .append_pair("product_id", &product_id)
            .append_pair("hl", &self.context.lang)
            .append_pair("gl", &self.context.country);

        let context = format!("google play product '{product_id}'");
        let lookup = |credential: Credential| {
            let http = self.http.clone();
            let url = detail_url.clone();
            let context = context.clone();
            async move {
                let body = serpapi_fetch(&http, credential, &url, &context).await?;
                decode_json::<SerpApiProductResponse>(&body, &context)
            }
        };

        let detail = keyed_with_deadline(
            &self.credentials,
            ProviderKind::GooglePlay,
            self.deadline,
            lookup,
        )
        .await;
        match detail {
            Ok(detail) => apply_detail(&mut row.fields, detail),
            Err(e) => {
                tracing::debug!(product_id = %product_id, error = %e, "google play detail lookup failed, keeping listing fields");
                row.degraded = true;
            }
        }

        clean_string_fields(&mut row.fields);
        Ok(row)
    }
}

/// Row built from a search listing alone.
fn listing_row(product_id: &str, item: &JsonValue) -> ProviderRow {
    let mut row = ProviderRow::new(ProviderKind::GooglePlay);
    row.set("appId", product_id);
    let copy = |row: &mut ProviderRow, from: &str, to: &str| {
        if let Some(value) = item.get(from).filter(|v| !v.is_null()) {
            row.set(to, value.clone());
        }
    };
    copy(&mut row, "title", "title");
    copy(&mut row, "link", "url");
    copy(&mut row, "rating", "score");
    copy(&mut row, "author", "developer");
    copy(&mut row, "description", "description");
    copy(&mut row, "category", "genre");

    let price = item.get("price").and_then(JsonValue::as_str);
    row.set("free", if is_free_offer(price) { "True" } else { "False" });
    if let Some(price) = price {
        row.set("price", price);
    }
    row
}

fn apply_detail(fields: &mut Map<String, JsonValue>, detail: SerpApiProductResponse) {
    if let Some(info) = detail.product_info {
        put_text(fields, "title", info.title);
        put_text(fields, "minInstalls", info.downloads);
        put_text(fields, "contentRating", info.content_rating.and_then(|l| l.text));
        put_text(fields, "developer", info.authors.into_iter().find_map(|a| a.text));
        let offer = info.offers.into_iter().find_map(|o| o.text);
        let free = if is_free_offer(offer.as_deref()) { "True" } else { "False" };
        fields.insert("free".to_string(), JsonValue::from(free));
        if offer.as_deref().is_some_and(|o| o.contains(['$', '€', '£'])) {
            put_text(fields, "price", offer);
        }
        if let Some(rating) = info.rating {
            fields.insert("score".to_string(), JsonValue::from(rating));
        }
        if let Some(reviews) = info.reviews {
            fields.insert("ratings".to_string(), JsonValue::from(reviews));
        }
    }

    if let Some(about) = detail.about_this_app {
        put_text(fields, "description", about.snippet);
        for entry in about.info {
            match entry.name.to_ascii_lowercase().as_str() {
                "updated on" => put_text(fields, "updated", entry.value),
                "released on" => put_text(fields, "released", entry.value),
                "offered by" => put_text(fields, "developer", entry.value),
                _ => {}
            }
        }
    }

    if let Some(developer) = detail.developer {
        put_text(fields, "developerWebsite", developer.website);
        put_text(fields, "privacyPolicy", developer.privacy_policy);
    }
}

fn put_text(fields: &mut Map<String, JsonValue>, key: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        fields.insert(key.to_string(), JsonValue::String(value));
    }
}

/// An "Install" offer, a zero price or no price at all means the app is free.
fn is_free_offer(offer: Option<&str>) -> bool {
    match offer.map(str::trim) {
        None | Some("") => true,
        Some(text) => {
            let lower = text.to_ascii_lowercase();
            lower == "free"
                || lower.starts_with("install")
                || lower.trim_start_matches(['$', '€', '£']).parse::<f64>() == Ok(0.0)
        }
    }
}
