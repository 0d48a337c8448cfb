use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub configs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_lang: String,
    pub default_country: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_enrichments: usize,
    pub max_pages: usize,
    pub inter_page_delay_ms: u64,
    pub news_fetch_articles: bool,
    /// Rotated in order when the video platform reports quota exhaustion.
    pub youtube_api_keys: Vec<String>,
    /// Rotated in order when `SerpApi` reports an exhausted plan.
    pub serpapi_keys: Vec<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("configs_dir", &self.configs_dir)
            .field("output_dir", &self.output_dir)
            .field("default_lang", &self.default_lang)
            .field("default_country", &self.default_country)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field(
                "max_concurrent_enrichments",
                &self.max_concurrent_enrichments,
            )
            .field("max_pages", &self.max_pages)
            .field("inter_page_delay_ms", &self.inter_page_delay_ms)
            .field("news_fetch_articles", &self.news_fetch_articles)
            .field(
                "youtube_api_keys",
                &format!("[{} redacted]", self.youtube_api_keys.len()),
            )
            .field(
                "serpapi_keys",
                &format!("[{} redacted]", self.serpapi_keys.len()),
            )
            .field(
                "spotify_client_id",
                &self.spotify_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "spotify_client_secret",
                &self.spotify_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
