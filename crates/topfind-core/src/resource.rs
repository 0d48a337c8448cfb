use serde::{Deserialize, Serialize};

/// A category of discovered content. Each kind has its own unified schema,
/// natural key and filter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Apps,
    Videos,
    Podcasts,
    News,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Apps,
        ResourceKind::Videos,
        ResourceKind::Podcasts,
        ResourceKind::News,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Apps => "apps",
            ResourceKind::Videos => "videos",
            ResourceKind::Podcasts => "podcasts",
            ResourceKind::News => "news",
        }
    }

    /// Column that identifies duplicate records of this kind.
    #[must_use]
    pub fn natural_key(self) -> &'static str {
        match self {
            ResourceKind::Apps => "appId",
            ResourceKind::Videos => "video_id",
            ResourceKind::Podcasts => "id",
            ResourceKind::News => "title",
        }
    }

    /// Secondary key used when the natural key is missing or blank.
    #[must_use]
    pub fn fallback_key(self) -> Option<&'static str> {
        match self {
            ResourceKind::News => Some("URL"),
            ResourceKind::Apps | ResourceKind::Videos | ResourceKind::Podcasts => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apps" | "app" => Ok(ResourceKind::Apps),
            "videos" | "video" => Ok(ResourceKind::Videos),
            "podcasts" | "podcast" => Ok(ResourceKind::Podcasts),
            "news" => Ok(ResourceKind::News),
            other => Err(format!(
                "unknown resource kind '{other}'; expected one of apps, videos, podcasts, news"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_and_plural_names() {
        assert_eq!("apps".parse::<ResourceKind>(), Ok(ResourceKind::Apps));
        assert_eq!("Video".parse::<ResourceKind>(), Ok(ResourceKind::Videos));
        assert_eq!(" podcast ".parse::<ResourceKind>(), Ok(ResourceKind::Podcasts));
        assert_eq!("news".parse::<ResourceKind>(), Ok(ResourceKind::News));
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "books".parse::<ResourceKind>().unwrap_err();
        assert!(err.contains("books"), "error should name the input: {err}");
    }

    #[test]
    fn display_matches_serde_name() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn only_news_has_a_fallback_key() {
        assert_eq!(ResourceKind::News.fallback_key(), Some("URL"));
        assert!(ResourceKind::Apps.fallback_key().is_none());
    }
}
