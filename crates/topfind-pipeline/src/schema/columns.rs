//! Unified column schemas and the per-provider mapping tables onto them.

use topfind_core::ResourceKind;
use topfind_scraper::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Int,
    Float,
    Bool,
    Date,
    List,
}

/// What a column holds when its source has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenMissing {
    /// The explicit `None` sentinel.
    Null,
    /// Zero of the column's numeric type, so threshold filters can compare.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub when_missing: WhenMissing,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        ty,
        when_missing: WhenMissing::Null,
    }
}

const fn zeroed(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef {
        name,
        ty,
        when_missing: WhenMissing::Zero,
    }
}

use ColumnType::{Bool, Date, Float, Int, List, Text};

const APP_COLUMNS: &[ColumnDef] = &[
    col("appId", Text),
    col("title", Text),
    col("description", Text),
    col("summary", Text),
    col("url", Text),
    col("genres", List),
    col("developer", Text),
    col("developerWebsite", Text),
    zeroed("score", Float),
    zeroed("ratings", Int),
    col("releaseDate", Date),
    col("currentVersionReleaseDate", Date),
    col("languageCodesISO2A", List),
    col("os", Text),
    col("privacyPolicy", Bool),
    col("privacyPolicyUrl", Text),
    col("contentRating", Text),
    col("free", Bool),
    col("price", Float),
    col("installs", Text),
    col("provider", Text),
];

const VIDEO_COLUMNS: &[ColumnDef] = &[
    col("video_id", Text),
    col("video_URL", Text),
    col("title", Text),
    col("description", Text),
    col("description_complete", Text),
    col("channelId", Text),
    col("channelTitle", Text),
    col("publishedAt", Date),
    col("licensedContent", Bool),
    col("duration", Int),
    col("viewCount", Int),
    col("likeCount", Int),
    col("likes_rate", Float),
    col("commentCount", Int),
    col("subscriberCount", Int),
    col("tags", Text),
    col("provider", Text),
];

const PODCAST_COLUMNS: &[ColumnDef] = &[
    col("id", Text),
    col("title", Text),
    col("description", Text),
    col("releaseDate", Date),
    col("trackTimeMillis", Int),
    col("trackViewUrl", Text),
    col("languages", List),
    col("free", Bool),
    col("provider", Text),
];

const NEWS_COLUMNS: &[ColumnDef] = &[
    col("title", Text),
    col("URL", Text),
    col("description", Text),
    col("publishedAt", Date),
    col("mediaTitle", Text),
    col("language", Text),
    col("authors", List),
    col("summary", Text),
    col("content", Text),
    col("textLength", Int),
    col("keywords", List),
    col("provider", Text),
];

/// The unified schema of `kind`, in column order.
#[must_use]
pub fn unified_columns(kind: ResourceKind) -> &'static [ColumnDef] {
    match kind {
        ResourceKind::Apps => APP_COLUMNS,
        ResourceKind::Videos => VIDEO_COLUMNS,
        ResourceKind::Podcasts => PODCAST_COLUMNS,
        ResourceKind::News => NEWS_COLUMNS,
    }
}

#[must_use]
pub fn column_names(kind: ResourceKind) -> Vec<String> {
    unified_columns(kind)
        .iter()
        .map(|c| c.name.to_string())
        .collect()
}

/// Where a unified column's value comes from for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A provider-native field, coerced to the column type.
    Field(&'static str),
    /// The provider never supplies this column.
    Absent,
    /// The provider's name.
    Provider,
    Text(&'static str),
    Bool(bool),
    /// The search's language code.
    RequestedLanguage,
    /// The search's language code, upper-cased, as a one-element list.
    RequestedLanguageUpper,
    /// `true` when the field holds a non-blank value.
    Present(&'static str),
    /// `true` when the price field is zero or absent.
    PriceIsZero(&'static str),
    /// Play store content labels mapped onto App Store age ratings.
    AgeRating(&'static str),
    /// `numerator / denominator` when both are known and the denominator
    /// is positive.
    Ratio {
        numerator: &'static str,
        denominator: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSource {
    pub column: &'static str,
    pub source: Source,
}

const fn map(column: &'static str, source: Source) -> ColumnSource {
    ColumnSource { column, source }
}

/// Every unified column of a provider's resource kind with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaMapping {
    pub provider: ProviderKind,
    pub sources: &'static [ColumnSource],
}

impl SchemaMapping {
    #[must_use]
    pub fn source_for(&self, column: &str) -> Option<Source> {
        self.sources
            .iter()
            .find(|s| s.column == column)
            .map(|s| s.source)
    }
}

static GOOGLE_PLAY: SchemaMapping = SchemaMapping {
    provider: ProviderKind::GooglePlay,
    sources: &[
        map("appId", Source::Field("appId")),
        map("title", Source::Field("title")),
        map("description", Source::Field("description")),
        map("summary", Source::Field("summary")),
        map("url", Source::Field("url")),
        map("genres", Source::Field("genre")),
        map("developer", Source::Field("developer")),
        map("developerWebsite", Source::Field("developerWebsite")),
        map("score", Source::Field("score")),
        map("ratings", Source::Field("ratings")),
        map("releaseDate", Source::Field("released")),
        map("currentVersionReleaseDate", Source::Field("updated")),
        map("languageCodesISO2A", Source::RequestedLanguageUpper),
        map("os", Source::Text("Android")),
        map("privacyPolicy", Source::Present("privacyPolicy")),
        map("privacyPolicyUrl", Source::Field("privacyPolicy")),
        map("contentRating", Source::AgeRating("contentRating")),
        map("free", Source::Field("free")),
        map("price", Source::Field("price")),
        map("installs", Source::Field("minInstalls")),
        map("provider", Source::Provider),
    ],
};

static APP_STORE: SchemaMapping = SchemaMapping {
    provider: ProviderKind::AppStore,
    sources: &[
        map("appId", Source::Field("bundleId")),
        map("title", Source::Field("trackName")),
        map("description", Source::Field("description")),
        map("summary", Source::Absent),
        map("url", Source::Field("trackViewUrl")),
        map("genres", Source::Field("genres")),
        map("developer", Source::Field("artistName")),
        map("developerWebsite", Source::Field("sellerUrl")),
        map("score", Source::Field("averageUserRating")),
        map("ratings", Source::Field("userRatingCount")),
        map("releaseDate", Source::Field("releaseDate")),
        map("currentVersionReleaseDate", Source::Field("currentVersionReleaseDate")),
        map("languageCodesISO2A", Source::Field("languageCodesISO2A")),
        map("os", Source::Text("iOS")),
        map("privacyPolicy", Source::Bool(true)),
        map("privacyPolicyUrl", Source::Absent),
        map("contentRating", Source::Field("contentAdvisoryRating")),
        map("free", Source::PriceIsZero("price")),
        map("price", Source::Field("price")),
        map("installs", Source::Absent),
        map("provider", Source::Provider),
    ],
};

static YOUTUBE: SchemaMapping = SchemaMapping {
    provider: ProviderKind::YouTube,
    sources: &[
        map("video_id", Source::Field("video_id")),
        map("video_URL", Source::Field("video_URL")),
        map("title", Source::Field("title")),
        map("description", Source::Field("description")),
        map("description_complete", Source::Field("description_complete")),
        map("channelId", Source::Field("channelId")),
        map("channelTitle", Source::Field("channelTitle")),
        map("publishedAt", Source::Field("publishedAt")),
        map("licensedContent", Source::Field("licensedContent")),
        map("duration", Source::Field("duration")),
        map("viewCount", Source::Field("viewCount")),
        map("likeCount", Source::Field("likeCount")),
        map(
            "likes_rate",
            Source::Ratio {
                numerator: "likeCount",
                denominator: "viewCount",
            },
        ),
        map("commentCount", Source::Field("commentCount")),
        map("subscriberCount", Source::Field("subscriberCount")),
        map("tags", Source::Field("tags")),
        map("provider", Source::Provider),
    ],
};

static SPOTIFY: SchemaMapping = SchemaMapping {
    provider: ProviderKind::Spotify,
    sources: &[
        map("id", Source::Field("id")),
        map("title", Source::Field("name")),
        map("description", Source::Field("description")),
        map("releaseDate", Source::Field("release_date")),
        map("trackTimeMillis", Source::Field("duration_ms")),
        map("trackViewUrl", Source::Field("external_urls.spotify")),
        map("languages", Source::Field("languages")),
        map("free", Source::Bool(true)),
        map("provider", Source::Provider),
    ],
};

static APPLE_PODCASTS: SchemaMapping = SchemaMapping {
    provider: ProviderKind::ApplePodcasts,
    sources: &[
        map("id", Source::Field("trackId")),
        map("title", Source::Field("trackName")),
        map("description", Source::Field("description")),
        map("releaseDate", Source::Field("releaseDate")),
        map("trackTimeMillis", Source::Field("trackTimeMillis")),
        map("trackViewUrl", Source::Field("trackViewUrl")),
        map("languages", Source::Absent),
        map("free", Source::PriceIsZero("trackPrice")),
        map("provider", Source::Provider),
    ],
};

static GOOGLE_NEWS: SchemaMapping = SchemaMapping {
    provider: ProviderKind::GoogleNews,
    sources: &[
        map("title", Source::Field("title")),
        map("URL", Source::Field("url")),
        map("description", Source::Field("description")),
        map("publishedAt", Source::Field("published date")),
        map("mediaTitle", Source::Field("publisher")),
        map("language", Source::RequestedLanguage),
        map("authors", Source::Field("authors")),
        map("summary", Source::Field("summary")),
        map("content", Source::Field("content")),
        map("textLength", Source::Field("textLength")),
        map("keywords", Source::Field("keywords")),
        map("provider", Source::Provider),
    ],
};

/// The mapping table of `provider`.
#[must_use]
pub fn mapping_for(provider: ProviderKind) -> &'static SchemaMapping {
    match provider {
        ProviderKind::GooglePlay => &GOOGLE_PLAY,
        ProviderKind::AppStore => &APP_STORE,
        ProviderKind::Spotify => &SPOTIFY,
        ProviderKind::ApplePodcasts => &APPLE_PODCASTS,
        ProviderKind::YouTube => &YOUTUBE,
        ProviderKind::GoogleNews => &GOOGLE_NEWS,
    }
}
