//! Concrete provider adapters and the text helpers they share.

pub mod app_store;
pub mod apple_podcasts;
pub mod google_news;
pub mod google_play;
pub mod spotify;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde_json::Value as JsonValue;

use crate::error::ScraperError;
use crate::provider::ProviderKind;

static META_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+[^>]*>"#).expect("valid meta regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*("([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid script regex")
});

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("valid duration regex")
});

/// Strips a JSONP callback wrapper such as `result({...});`.
///
/// Bodies that are already plain JSON are returned unchanged.
#[must_use]
pub fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close => trimmed[open + 1..close].trim(),
        _ => trimmed,
    }
}

/// Replaces line breaks with spaces and trims.
#[must_use]
pub fn clean_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

/// Applies [`clean_text`] to every string field of a JSON object.
pub(crate) fn clean_string_fields(fields: &mut serde_json::Map<String, JsonValue>) {
    for value in fields.values_mut() {
        if let JsonValue::String(s) = value {
            if s.contains(['\r', '\n']) {
                *s = clean_text(s);
            }
        }
    }
}

/// Strip HTML tags from a string, returning plain text.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, " ");
    let mut result = String::with_capacity(without_code.len());
    let mut in_tag = false;
    for ch in without_code.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of the first `<meta>` whose `name` or `property` equals `key`.
#[must_use]
pub fn meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut matched = false;
        let mut content = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let attr = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            let value = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            match attr.as_str() {
                "name" | "property" if value.eq_ignore_ascii_case(key) => matched = true,
                "content" => content = Some(value.trim().to_string()),
                _ => {}
            }
        }
        if matched {
            content.filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

/// Converts an ISO-8601 duration (`PT1H2M3S`, `P1DT2H`) to seconds.
#[must_use]
pub fn iso8601_duration_secs(raw: &str) -> Option<i64> {
    let caps = ISO_DURATION.captures(raw.trim())?;
    let part = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    Some(part(1) * 86_400 + part(2) * 3_600 + part(3) * 60 + part(4))
}

/// Replaces every `key` query parameter of `url` with a single `value`.
pub(crate) fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(key, value);
    }
}

/// Reads a required identifier field from a raw item.
///
/// Numbers are accepted and rendered as strings.
pub(crate) fn required_id(
    provider: ProviderKind,
    item: &JsonValue,
    field: &str,
) -> Result<String, ScraperError> {
    match item.get(field) {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        _ => Err(ScraperError::Malformed {
            provider: provider.to_string(),
            reason: format!("item has no '{field}'"),
        }),
    }
}

/// Parses a counter that providers send either as a number or a string.
pub(crate) fn parse_count(raw: Option<&str>) -> JsonValue {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map_or(JsonValue::Null, JsonValue::from)
}
