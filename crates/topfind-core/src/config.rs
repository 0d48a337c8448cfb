use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; credentials left unset disable the providers
/// that need them. Tests pass a map-backed lookup instead of the process
/// environment.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, format!("'{raw}' is not a boolean"))),
        }
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env_raw = or_default("TOPFIND_ENV", "development");
    let env = parse_environment(&env_raw).map_err(|reason| invalid("TOPFIND_ENV", reason))?;

    let log_level = or_default("TOPFIND_LOG_LEVEL", "info");
    let configs_dir = PathBuf::from(or_default("TOPFIND_CONFIGS_DIR", "./config/searches"));
    let output_dir = PathBuf::from(or_default("TOPFIND_OUTPUT_DIR", "./output"));
    let default_lang = or_default("TOPFIND_DEFAULT_LANG", "en");
    let default_country = or_default("TOPFIND_DEFAULT_COUNTRY", "us");

    let request_timeout_secs = parse_u64("TOPFIND_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("TOPFIND_USER_AGENT", "topfind/0.1 (resource-discovery)");
    let max_retries = parse_u32("TOPFIND_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("TOPFIND_RETRY_BACKOFF_BASE_MS", "500")?;
    let max_concurrent_enrichments = parse_usize("TOPFIND_MAX_CONCURRENT_ENRICHMENTS", "8")?;
    if max_concurrent_enrichments == 0 {
        return Err(invalid(
            "TOPFIND_MAX_CONCURRENT_ENRICHMENTS",
            "must be at least 1".to_string(),
        ));
    }
    let max_pages = parse_usize("TOPFIND_MAX_PAGES", "25")?;
    let inter_page_delay_ms = parse_u64("TOPFIND_INTER_PAGE_DELAY_MS", "250")?;
    let news_fetch_articles = parse_bool("TOPFIND_NEWS_FETCH_ARTICLES", "false")?;

    let youtube_api_keys = split_credentials(&or_default("TOPFIND_YOUTUBE_API_KEYS", ""));
    let serpapi_keys = split_credentials(&or_default("TOPFIND_SERPAPI_KEYS", ""));
    let spotify_client_id = optional("TOPFIND_SPOTIFY_CLIENT_ID");
    let spotify_client_secret = optional("TOPFIND_SPOTIFY_CLIENT_SECRET");

    Ok(AppConfig {
        env,
        log_level,
        configs_dir,
        output_dir,
        default_lang,
        default_country,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_enrichments,
        max_pages,
        inter_page_delay_ms,
        news_fetch_articles,
        youtube_api_keys,
        serpapi_keys,
        spotify_client_id,
        spotify_client_secret,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, String> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(format!(
            "unknown environment '{other}'; expected development, test, or production"
        )),
    }
}

/// Splits a comma-separated credential list, dropping blanks.
fn split_credentials(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
