//! Per-kind filter registries.
//!
//! Every filter a resource kind accepts is declared here once, with the
//! value type it expects and the predicate that implements it. Lookup by
//! name happens only during validation; application works on the resolved
//! [`FilterDef`]s.

use topfind_core::{FilterSpec, FilterValueType, ResourceKind};

/// How a registered filter decides whether a row survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Keyword rule over `fields`. When `body` is set, a word counted at
    /// least twice in that column also counts as found.
    Keywords {
        fields: &'static [&'static str],
        body: Option<&'static str>,
    },
    /// `score >= value`, except unrated rows (score 0 and ratings 0) always pass.
    Score,
    /// Numeric column `>= value`. Null fails.
    AtLeast(&'static str),
    /// Numeric column `<= value`. Null fails.
    AtMost(&'static str),
    /// `true` keeps rows where the column is true; `false` passes all.
    RequireTrue(&'static str),
    /// Bool column equal to the value. Null fails.
    Equals(&'static str),
    /// `true` keeps rows with a non-blank column; `false` keeps rows without.
    HasValue(&'static str),
    /// Whole years since the date column are below the value. Rows without
    /// a parsable date fail.
    RecentUpdate(&'static str),
    /// Declared language codes, then detection over `detect` as fallback.
    Language {
        declared: Option<&'static str>,
        detect: &'static [&'static str],
    },
}

/// One registered filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDef {
    pub name: &'static str,
    pub value_type: FilterValueType,
    pub predicate: Predicate,
}

const fn def(name: &'static str, value_type: FilterValueType, predicate: Predicate) -> FilterDef {
    FilterDef {
        name,
        value_type,
        predicate,
    }
}

use FilterValueType::{Bool, Float, Int, Text};

static APP_FILTERS: &[FilterDef] = &[
    def(
        "keyword_search",
        Bool,
        Predicate::Keywords {
            fields: &["title", "description", "summary"],
            body: None,
        },
    ),
    def("score", Float, Predicate::Score),
    def("ratings", Int, Predicate::AtLeast("ratings")),
    def("privacy_policy", Bool, Predicate::RequireTrue("privacyPolicy")),
    def("free", Bool, Predicate::RequireTrue("free")),
    def(
        "recent_update",
        Int,
        Predicate::RecentUpdate("currentVersionReleaseDate"),
    ),
    def(
        "developer_has_website",
        Bool,
        Predicate::HasValue("developerWebsite"),
    ),
    def(
        "language",
        Text,
        Predicate::Language {
            declared: Some("languageCodesISO2A"),
            detect: &["title", "description", "summary"],
        },
    ),
];

static VIDEO_FILTERS: &[FilterDef] = &[
    def(
        "keywords",
        Bool,
        Predicate::Keywords {
            fields: &["title", "description", "description_complete", "tags"],
            body: None,
        },
    ),
    def(
        "language",
        Text,
        Predicate::Language {
            declared: None,
            detect: &["title", "description"],
        },
    ),
    def("licensed", Bool, Predicate::Equals("licensedContent")),
    def("duration", Int, Predicate::AtMost("duration")),
    def("views", Int, Predicate::AtLeast("viewCount")),
    def("likes", Int, Predicate::AtLeast("likeCount")),
    def("subscribers", Int, Predicate::AtLeast("subscriberCount")),
    def("recent_update", Int, Predicate::RecentUpdate("publishedAt")),
];

static PODCAST_FILTERS: &[FilterDef] = &[
    def("free", Bool, Predicate::RequireTrue("free")),
    def("recent_update", Int, Predicate::RecentUpdate("releaseDate")),
    def(
        "language",
        Text,
        Predicate::Language {
            declared: Some("languages"),
            detect: &["title", "description"],
        },
    ),
    def(
        "keywords_search",
        Bool,
        Predicate::Keywords {
            fields: &["title", "description"],
            body: None,
        },
    ),
];

static NEWS_FILTERS: &[FilterDef] = &[def(
    "keywords_search",
    Bool,
    Predicate::Keywords {
        fields: &["title", "description", "summary"],
        body: Some("content"),
    },
)];

/// The filters registered for `kind`, in declaration order.
#[must_use]
pub fn registered(kind: ResourceKind) -> &'static [FilterDef] {
    match kind {
        ResourceKind::Apps => APP_FILTERS,
        ResourceKind::Videos => VIDEO_FILTERS,
        ResourceKind::Podcasts => PODCAST_FILTERS,
        ResourceKind::News => NEWS_FILTERS,
    }
}

#[must_use]
pub fn lookup(kind: ResourceKind, name: &str) -> Option<&'static FilterDef> {
    registered(kind).iter().find(|def| def.name == name)
}

/// The chain applied when a caller supplies no filters. `lang` feeds the
/// language filter.
#[must_use]
pub fn default_spec(kind: ResourceKind, lang: &str) -> FilterSpec {
    match kind {
        ResourceKind::Apps => FilterSpec::new()
            .with("keyword_search", true)
            .with("privacy_policy", true)
            .with("score", 3.0)
            .with("free", true)
            .with("recent_update", 5_i64)
            .with("developer_has_website", true)
            .with("language", lang),
        ResourceKind::Videos => FilterSpec::new()
            .with("keywords", true)
            .with("language", lang)
            .with("licensed", false)
            .with("duration", 1800_i64)
            .with("views", 100_i64)
            .with("likes", 0_i64)
            .with("subscribers", 0_i64)
            .with("recent_update", 5_i64),
        ResourceKind::Podcasts => FilterSpec::new()
            .with("free", true)
            .with("recent_update", 5_i64)
            .with("language", lang)
            .with("keywords_search", true),
        ResourceKind::News => FilterSpec::new().with("keywords_search", true),
    }
}
