//! iOS App Store adapter backed by the iTunes Search API.

use async_trait::async_trait;
use reqwest::Url;

use super::{clean_string_fields, required_id, strip_jsonp};
use crate::error::ScraperError;
use crate::http::{decode_json, endpoint, parse_base_url, HttpSettings, ProviderHttp};
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};
use crate::types::ItunesResponse;

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com/";
const RESULT_LIMIT: &str = "200";

/// Searches `entity=software` in the context's storefront. The API answers
/// with a single JSONP page of up to 200 results.
pub struct AppStoreAdapter {
    http: ProviderHttp,
    base_url: Url,
    context: SearchContext,
}

impl AppStoreAdapter {
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
            http: ProviderHttp::new(ProviderKind::AppStore, settings)?,
            base_url: parse_base_url(base_url)?,
            context,
        })
    }

    fn search_url(&self, query: &str) -> Result<Url, ScraperError> {
        let mut url = endpoint(&self.base_url, "search")?;
        url.query_pairs_mut()
            .append_pair("term", query)
            .append_pair("entity", "software")
            .append_pair("callback", "result")
            .append_pair("limit", RESULT_LIMIT)
            .append_pair("country", &self.context.country);
        Ok(url)
    }
}

#[async_trait]
impl ProviderAdapter for AppStoreAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AppStore
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        let url = self.search_url(query)?;
        let body = self.http.get_text(&url).await?;
        let response: ItunesResponse =
            decode_json(strip_jsonp(&body), &format!("app store search '{query}'"))?;
        tracing::debug!(
            query,
            result_count = response.result_count,
            "app store search page"
        );
        Ok(response.results)
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        required_id(ProviderKind::AppStore, &item, "bundleId")?;
        let mut row = ProviderRow::from_object(ProviderKind::AppStore, item);
        clean_string_fields(&mut row.fields);
        Ok(row)
    }
}
