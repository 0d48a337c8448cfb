//! HTTP plumbing shared by the provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use topfind_core::AppConfig;

use crate::error::ScraperError;
use crate::provider::ProviderKind;
use crate::rate_limit::retry_with_backoff;

/// Transport and paging limits applied to every adapter.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Retry attempts after the first failure for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Hard cap on result pages fetched per query.
    pub max_pages: usize,
    pub inter_page_delay_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            max_pages: config.max_pages,
            inter_page_delay_ms: config.inter_page_delay_ms,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "topfind/0.1 (resource-discovery)".to_string(),
            max_retries: 3,
            backoff_base_ms: 500,
            max_pages: 25,
            inter_page_delay_ms: 250,
        }
    }
}

/// A `reqwest` client bound to one provider.
///
/// Maps 429 to [`ScraperError::RateLimited`], quota messages on 403/429 to
/// [`ScraperError::QuotaExceeded`], 404 to [`ScraperError::NotFound`] and any
/// other non-2xx status to [`ScraperError::UnexpectedStatus`]. Transient
/// failures are retried with back-off.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    client: Client,
    provider: ProviderKind,
    settings: HttpSettings,
}

impl ProviderHttp {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(provider: ProviderKind, settings: &HttpSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            provider,
            settings: settings.clone(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Sends the request produced by `build` (once per attempt) and returns
    /// the body of a successful response.
    ///
    /// # Errors
    ///
    /// Returns the mapped status error or [`ScraperError::Http`] once retries
    /// are exhausted.
    pub async fn send_text<B>(&self, build: B) -> Result<String, ScraperError>
    where
        B: Fn(&Client) -> RequestBuilder,
    {
        let provider = self.provider;
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || {
                let request = build(&self.client);
                async move {
                    let response = request.send().await?;
                    read_body(provider, response).await
                }
            },
        )
        .await
    }

    /// # Errors
    ///
    /// See [`ProviderHttp::send_text`].
    pub async fn get_text(&self, url: &Url) -> Result<String, ScraperError> {
        self.send_text(|client| client.get(url.clone())).await
    }

    /// GETs `url` and decodes the body as `T`.
    ///
    /// # Errors
    ///
    /// See [`ProviderHttp::send_text`]; additionally
    /// [`ScraperError::Deserialize`] if the body does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, ScraperError> {
        let body = self.get_text(url).await?;
        decode_json(&body, context)
    }

    /// Sleeps for the configured inter-page delay.
    pub async fn page_delay(&self) {
        if self.settings.inter_page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.settings.inter_page_delay_ms)).await;
        }
    }
}

async fn read_body(provider: ProviderKind, response: Response) -> Result<String, ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.text().await?);
    }

    let url = response.url().to_string();
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60);
    let body = response.text().await.unwrap_or_default();

    if (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS)
        && is_quota_message(&body)
    {
        return Err(ScraperError::QuotaExceeded {
            provider: provider.to_string(),
        });
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(ScraperError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs,
        }),
        StatusCode::NOT_FOUND => Err(ScraperError::NotFound { url }),
        _ => Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url,
        }),
    }
}

/// Whether a provider error message signals an exhausted quota or plan.
pub(crate) fn is_quota_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("quota") || lower.contains("run out of searches")
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, ScraperError> {
    serde_json::from_str::<T>(body).map_err(|e| ScraperError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

/// Joins `path` onto `base`, normalising the trailing slash of `base` so the
/// last base segment is kept.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, ScraperError> {
    let mut normalised = base.clone();
    if !normalised.path().ends_with('/') {
        let with_slash = format!("{}/", normalised.path());
        normalised.set_path(&with_slash);
    }
    normalised
        .join(path.trim_start_matches('/'))
        .map_err(|e| ScraperError::InvalidUrl {
            url: format!("{base}{path}"),
            reason: e.to_string(),
        })
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ScraperError> {
    Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}
