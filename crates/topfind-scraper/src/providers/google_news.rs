//! Google News RSS adapter.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Url;
use serde_json::{Map, Value as JsonValue};

use super::{clean_string_fields, meta_content, strip_html};
use crate::enrich::{enrichment_deadline, with_deadline};
use crate::error::ScraperError;
use crate::http::{parse_base_url, HttpSettings, ProviderHttp};
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow, RawItem, SearchContext};

const DEFAULT_BASE_URL: &str = "https://news.google.com/";

pub struct GoogleNewsAdapter {
    http: ProviderHttp,
    base_url: Url,
    context: SearchContext,
    fetch_articles: bool,
    deadline: Duration,
}

impl GoogleNewsAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: &HttpSettings,
        context: SearchContext,
        fetch_articles: bool,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(settings, context, fetch_articles, DEFAULT_BASE_URL)
    }

    /// Creates an adapter against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        settings: &HttpSettings,
        context: SearchContext,
        fetch_articles: bool,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            http: ProviderHttp::new(ProviderKind::GoogleNews, settings)?,
            base_url: parse_base_url(base_url)?,
            context,
            fetch_articles,
            deadline: enrichment_deadline(ProviderKind::GoogleNews),
        })
    }

    /// Overrides the article download deadline.
    #[must_use]
    pub fn with_enrichment_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    fn feed_url(&self, query: &str) -> Result<Url, ScraperError> {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        let lang = &self.context.lang;
        let country = self.context.country.to_ascii_uppercase();
        let base = self.base_url.as_str().trim_end_matches('/');
        let raw = format!(
            "{base}/rss/search?q={encoded}&hl={lang}&gl={country}&ceid={country}:{lang}"
        );
        parse_base_url(&raw)
    }
}

#[async_trait]
impl ProviderAdapter for GoogleNewsAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GoogleNews
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        let url = self.feed_url(query)?;
        let body = self.http.get_text(&url).await?;
        let items = parse_rss_feed(&body)?;
        tracing::debug!(query, count = items.len(), "google news feed parsed");
        Ok(items.into_iter().map(JsonValue::Object).collect())
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        let mut row = ProviderRow::from_object(ProviderKind::GoogleNews, item);
        if row.str_field("title").is_none() && row.str_field("url").is_none() {
            return Err(ScraperError::Malformed {
                provider: ProviderKind::GoogleNews.to_string(),
                reason: "item has neither title nor link".to_string(),
            });
        }

        if self.fetch_articles {
            if let Some(link) = row.str_field("url").map(str::to_string) {
                let http = self.http.clone();
                let fetched = match parse_base_url(&link) {
                    Ok(url) => {
                        with_deadline(ProviderKind::GoogleNews, self.deadline, async move {
                            http.get_text(&url).await
                        })
                        .await
                    }
                    Err(e) => Err(e),
                };
                match fetched {
                    Ok(html) => apply_article(&mut row.fields, &html),
                    Err(e) => {
                        tracing::debug!(url = %link, error = %e, "article download failed");
                        row.degraded = true;
                    }
                }
            }
        }

        clean_string_fields(&mut row.fields);
        Ok(row)
    }
}

/// Derives article fields from a downloaded page.
fn apply_article(fields: &mut Map<String, JsonValue>, html: &str) {
    let content = strip_html(html);
    fields.insert(
        "textLength".to_string(),
        JsonValue::from(content.chars().count()),
    );
    fields.insert("content".to_string(), JsonValue::String(content));

    let summary =
        meta_content(html, "description").or_else(|| meta_content(html, "og:description"));
    if let Some(summary) = summary {
        fields.insert("summary".to_string(), JsonValue::String(summary));
    }
    if let Some(author) = meta_content(html, "author") {
        fields.insert("authors".to_string(), JsonValue::String(author));
    }
    if let Some(keywords) = meta_content(html, "keywords") {
        fields.insert("keywords".to_string(), JsonValue::String(keywords));
    }
}

/// Parse an RSS feed body into raw item objects.
///
/// Each `<item>` yields `title`, `url`, `published date`, `description`
/// (HTML stripped) and `publisher` (the `<source>` element) when present.
///
/// # Errors
///
/// Returns [`ScraperError::Xml`] if the XML is malformed.
pub fn parse_rss_feed(xml: &str) -> Result<Vec<Map<String, JsonValue>>, ScraperError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current = Map::new();
    let mut in_item = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "item" {
                    in_item = true;
                    current.clear();
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    if !current.is_empty() {
                        items.push(std::mem::take(&mut current));
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    record_field(&mut current, &current_tag, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    record_field(&mut current, &current_tag, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ScraperError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn record_field(item: &mut Map<String, JsonValue>, tag: &str, text: &str) {
    let (key, value) = match tag {
        "title" => ("title", text.to_string()),
        "link" => ("url", text.to_string()),
        "pubDate" => ("published date", text.to_string()),
        "description" => ("description", strip_html(text)),
        "source" => ("publisher", text.to_string()),
        _ => return,
    };
    if !value.is_empty() {
        item.insert(key.to_string(), JsonValue::String(value));
    }
}
