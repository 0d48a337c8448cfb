//! Spotify podcast-episode adapter using the client-credentials flow.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Mutex;

use super::{clean_string_fields, required_id};
use crate::error::ScraperError;
use crate::http::{decode_json, endpoint, parse_base_url, HttpSettings, ProviderHttp};
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};
use crate::types::{SpotifySearchResponse, SpotifyToken};

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com/";
const DEFAULT_API_URL: &str = "https://api.spotify.com/";
const PAGE_SIZE: &str = "50";
/// Tokens are refreshed this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyAdapter {
    http: ProviderHttp,
    accounts_url: Url,
    api_url: Url,
    context: SearchContext,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for SpotifyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyAdapter")
            .field("api_url", &self.api_url.as_str())
            .field("context", &self.context)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl SpotifyAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: &HttpSettings,
        context: SearchContext,
        client_id: String,
        client_secret: String,
    ) -> Result<Self, ScraperError> {
        Self::with_base_urls(
            settings,
            context,
            client_id,
            client_secret,
            DEFAULT_ACCOUNTS_URL,
            DEFAULT_API_URL,
        )
    }

    /// Creates an adapter against custom token and API hosts (for testing
    /// with wiremock, where both usually point at the same mock server).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if either URL does not parse.
    pub fn with_base_urls(
        settings: &HttpSettings,
        context: SearchContext,
        client_id: String,
        client_secret: String,
        accounts_url: &str,
        api_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            http: ProviderHttp::new(ProviderKind::Spotify, settings)?,
            accounts_url: parse_base_url(accounts_url)?,
            api_url: parse_base_url(api_url)?,
            context,
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Returns a cached bearer token, requesting a new one when it is absent
    /// or about to expire.
    async fn access_token(&self) -> Result<String, ScraperError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let url = endpoint(&self.accounts_url, "api/token")?;
        let body = self
            .http
            .send_text(|client| {
                client
                    .post(url.clone())
                    .basic_auth(&self.client_id, Some(&self.client_secret))
                    .form(&[("grant_type", "client_credentials")])
            })
            .await?;
        let token: SpotifyToken = decode_json(&body, "spotify token")?;
        tracing::debug!(expires_in = token.expires_in, "spotify token refreshed");

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = token.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// GETs an API URL with the bearer token, refreshing the token once on 401.
    async fn authorized_get(&self, url: &Url) -> Result<String, ScraperError> {
        let token = self.access_token().await?;
        match self.get_with_token(url, &token).await {
            Err(ScraperError::UnexpectedStatus { status: 401, .. }) => {
                tracing::debug!("spotify token rejected, requesting a new one");
                self.invalidate_token().await;
                let token = self.access_token().await?;
                self.get_with_token(url, &token).await
            }
            other => other,
        }
    }

    async fn get_with_token(&self, url: &Url, token: &str) -> Result<String, ScraperError> {
        self.http
            .send_text(|client| client.get(url.clone()).bearer_auth(token))
            .await
    }

    fn search_url(&self, query: &str) -> Result<Url, ScraperError> {
        let mut url = endpoint(&self.api_url, "v1/search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", "episode")
            .append_pair("limit", PAGE_SIZE)
            .append_pair("market", &self.context.country.to_ascii_uppercase());
        Ok(url)
    }
}

#[async_trait]
impl ProviderAdapter for SpotifyAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Spotify
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        let mut items = Vec::new();
        let mut url = self.search_url(query)?;

        for page in 0..self.http.settings().max_pages {
            let body = match self.authorized_get(&url).await {
                Ok(body) => body,
                Err(e) if page > 0 => {
                    tracing::warn!(query, page, error = %e, "spotify page failed, keeping earlier pages");
                    break;
                }
                Err(e) => return Err(e),
            };
            let response: SpotifySearchResponse =
                decode_json(&body, &format!("spotify search '{query}' page {page}"))?;

            // Episodes unavailable in the market come back as null.
            items.extend(response.episodes.items.into_iter().flatten());

            let Some(next) = response.episodes.next else {
                break;
            };
            url = parse_base_url(&next)?;
            self.http.page_delay().await;
        }

        Ok(items)
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        required_id(ProviderKind::Spotify, &item, "id")?;
        let spotify_url = item
            .pointer("/external_urls/spotify")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let mut row = ProviderRow::from_object(ProviderKind::Spotify, item);
        if let Some(link) = spotify_url {
            row.set("external_urls.spotify", link);
        }
        row.fields.remove("external_urls");
        row.fields.remove("images");
        clean_string_fields(&mut row.fields);
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn adapter() -> SpotifyAdapter {
        SpotifyAdapter::with_base_urls(
            &HttpSettings::default(),
            SearchContext::new("es", "es"),
            "id".to_string(),
            "secret".to_string(),
            "http://localhost:1/",
            "http://localhost:1/",
        )
        .expect("adapter")
    }

    #[test]
    fn search_url_uses_upper_case_market() {
        let url = adapter().search_url("salud").expect("url");
        let query = url.query().unwrap_or_default();
        assert!(query.contains("type=episode"));
        assert!(query.contains("market=ES"));
        assert!(query.contains("limit=50"));
    }

    #[tokio::test]
    async fn parse_flattens_external_url() {
        let row = adapter()
            .parse(json!({
                "id": "ep1",
                "name": "Cuidarse",
                "external_urls": {"spotify": "https://open.spotify.com/episode/ep1"}
            }))
            .await
            .expect("row");
        assert_eq!(
            row.str_field("external_urls.spotify"),
            Some("https://open.spotify.com/episode/ep1")
        );
        assert!(row.get("external_urls").is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", adapter());
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("[redacted]"));
    }
}
