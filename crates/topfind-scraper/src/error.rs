use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("rate limited by {provider} (retry after {retry_after_secs}s)")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    #[error("{provider} quota exhausted and no further credentials to rotate to")]
    QuotaExceeded { provider: String },

    #[error("{provider} enrichment timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{provider} is not configured: {reason}")]
    MissingCredentials { provider: String, reason: String },

    #[error("malformed {provider} response: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScraperError {
    /// Network failures, timeouts, 429 and 5xx responses: worth retrying
    /// after a back-off delay.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ScraperError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            ScraperError::RateLimited { .. } => true,
            ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
            ScraperError::Deserialize { .. }
            | ScraperError::Xml(_)
            | ScraperError::QuotaExceeded { .. }
            | ScraperError::Timeout { .. }
            | ScraperError::NotFound { .. }
            | ScraperError::MissingCredentials { .. }
            | ScraperError::Malformed { .. }
            | ScraperError::InvalidUrl { .. } => false,
        }
    }

    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, ScraperError::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://example.com".to_owned(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = ScraperError::UnexpectedStatus {
            status: 400,
            url: "https://example.com".to_owned(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn quota_is_not_transient() {
        let err = ScraperError::QuotaExceeded {
            provider: "youtube".to_owned(),
        };
        assert!(!err.is_transient());
        assert!(err.is_quota());
    }
}
