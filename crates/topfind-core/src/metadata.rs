//! Export metadata: which unified columns a caller may select for CSV output.

use crate::error::ValidationError;
use crate::resource::ResourceKind;

const APP_FIELDS: &[&str] = &[
    "appId",
    "title",
    "description",
    "url",
    "genres",
    "developerWebsite",
    "score",
    "ratings",
    "currentVersionReleaseDate",
    "languageCodesISO2A",
    "os",
    "privacyPolicy",
    "free",
    "contentRating",
];

const VIDEO_FIELDS: &[&str] = &[
    "publishedAt",
    "channelId",
    "title",
    "description",
    "channelTitle",
    "licensedContent",
    "duration",
    "viewCount",
    "video_id",
    "video_URL",
    "likeCount",
    "likes_rate",
    "commentCount",
    "subscriberCount",
    "description_complete",
    "tags",
];

const PODCAST_FIELDS: &[&str] = &[
    "id",
    "title",
    "releaseDate",
    "description",
    "trackTimeMillis",
    "trackViewUrl",
    "languages",
    "free",
    "provider",
];

const NEWS_FIELDS: &[&str] = &[
    "publishedAt",
    "description",
    "title",
    "URL",
    "language",
    "mediaTitle",
    "authors",
    "summary",
    "content",
    "textLength",
    "keywords",
];

/// Columns a caller may request for export, in default export order.
#[must_use]
pub fn allowed_export_fields(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::Apps => APP_FIELDS,
        ResourceKind::Videos => VIDEO_FIELDS,
        ResourceKind::Podcasts => PODCAST_FIELDS,
        ResourceKind::News => NEWS_FIELDS,
    }
}

/// Checks a requested export field list against [`allowed_export_fields`].
///
/// An empty selection means "all allowed fields" and is always valid.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidMetadataSpec`] for the first field not
/// exported for `kind`, or for a field requested twice.
pub fn validate_export_fields(kind: ResourceKind, fields: &[String]) -> Result<(), ValidationError> {
    let allowed = allowed_export_fields(kind);
    let mut seen = std::collections::HashSet::new();
    for field in fields {
        if !allowed.contains(&field.as_str()) {
            return Err(ValidationError::InvalidMetadataSpec(format!(
                "'{field}' is not an exportable {kind} field"
            )));
        }
        if !seen.insert(field.as_str()) {
            return Err(ValidationError::InvalidMetadataSpec(format!(
                "'{field}' selected more than once"
            )));
        }
    }
    Ok(())
}

/// Resolves the effective export column list for `kind`.
#[must_use]
pub fn export_fields(kind: ResourceKind, selected: &[String]) -> Vec<String> {
    if selected.is_empty() {
        allowed_export_fields(kind)
            .iter()
            .map(|f| (*f).to_string())
            .collect()
    } else {
        selected.to_vec()
    }
}
