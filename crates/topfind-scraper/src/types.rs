//! Provider response envelopes.
//!
//! Only the envelopes are typed. Individual results are kept as raw JSON
//! objects so `parse` can hand provider-native field names to the schema
//! normalizer untouched.
//!
//! ## Observed shapes
//!
//! ### iTunes Search / Lookup (`ios-store`, `apple-podcasts`)
//! `{"resultCount": n, "results": [...]}`. Software search is requested with
//! `callback=result`, so the body arrives wrapped as `result({...});` and the
//! wrapper must be stripped first. Lookup with `entity=podcastEpisode`
//! returns the show itself as the first result (`wrapperType: "track"`,
//! `kind: "podcast"`) followed by episodes (`wrapperType: "podcastEpisode"`).
//!
//! ### `SerpApi` Google Play (`android-store`)
//! Search results live in `organic_results[*].items[*]`, each carrying a
//! `product_id`. The next page is a full URL in `serpapi_pagination.next`.
//! Errors come back as `{"error": "..."}`, sometimes with HTTP 200; an
//! exhausted plan says "run out of searches".
//!
//! ### Spotify Web API (`spotify-podcasts`)
//! `episodes.items` may contain `null` entries for episodes unavailable in
//! the requested market. `episodes.next` is a full URL or `null`.
//!
//! ### `YouTube` Data API v3 (`video-platform`)
//! Counters in `statistics` are **strings** (`"1234"`), and any of them may
//! be absent when the owner hides them. `contentDetails.duration` is an
//! ISO-8601 duration (`PT1H2M3S`). Quota exhaustion is a 403 whose
//! `error.errors[*].reason` is `quotaExceeded`.

use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize)]
pub struct ItunesResponse {
    #[serde(default, rename = "resultCount")]
    pub result_count: usize,
    #[serde(default)]
    pub results: Vec<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerpApiSearchResponse {
    #[serde(default)]
    pub organic_results: Vec<SerpApiResultGroup>,
    pub serpapi_pagination: Option<SerpApiPagination>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerpApiResultGroup {
    #[serde(default)]
    pub items: Vec<JsonValue>,
}

#[derive(Debug, Deserialize)]
pub struct SerpApiPagination {
    pub next: Option<String>,
}

/// `engine=google_play_product` detail response.
#[derive(Debug, Default, Deserialize)]
pub struct SerpApiProductResponse {
    pub product_info: Option<SerpApiProductInfo>,
    pub about_this_app: Option<SerpApiAboutThisApp>,
    pub developer: Option<SerpApiDeveloper>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerpApiProductInfo {
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub downloads: Option<String>,
    pub content_rating: Option<SerpApiLabel>,
    #[serde(default)]
    pub offers: Vec<SerpApiLabel>,
    #[serde(default)]
    pub authors: Vec<SerpApiLabel>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerpApiAboutThisApp {
    pub snippet: Option<String>,
    #[serde(default)]
    pub info: Vec<SerpApiInfoEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SerpApiInfoEntry {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerpApiDeveloper {
    pub website: Option<String>,
    pub privacy_policy: Option<String>,
}

/// A `{"text": ...}` or `{"name": ...}` label object.
#[derive(Debug, Default, Deserialize)]
pub struct SerpApiLabel {
    #[serde(alias = "name")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpotifySearchResponse {
    pub episodes: SpotifyEpisodePage,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyEpisodePage {
    #[serde(default)]
    pub items: Vec<Option<JsonValue>>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeSearchResponse {
    #[serde(default)]
    pub items: Vec<YouTubeSearchItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeSearchItem {
    pub id: YouTubeVideoRef,
    #[serde(default)]
    pub snippet: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeVideoRef {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeVideo {
    #[serde(default)]
    pub snippet: YouTubeVideoSnippet,
    #[serde(default, rename = "contentDetails")]
    pub content_details: YouTubeContentDetails,
    #[serde(default)]
    pub statistics: YouTubeStatistics,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeVideoSnippet {
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "defaultAudioLanguage")]
    pub default_audio_language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeContentDetails {
    pub duration: Option<String>,
    #[serde(rename = "licensedContent")]
    pub licensed_content: Option<bool>,
    pub caption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeChannel {
    #[serde(default)]
    pub statistics: YouTubeStatistics,
}
