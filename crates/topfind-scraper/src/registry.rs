//! Builds the adapter set for a resource kind from application config.

use std::sync::Arc;

use topfind_core::{AppConfig, ResourceKind};

use crate::error::ScraperError;
use crate::http::HttpSettings;
use crate::provider::{ProviderAdapter, ProviderKind, SearchContext};
use crate::providers::app_store::AppStoreAdapter;
use crate::providers::apple_podcasts::ApplePodcastsAdapter;
use crate::providers::google_news::GoogleNewsAdapter;
use crate::providers::google_play::GooglePlayAdapter;
use crate::providers::spotify::SpotifyAdapter;
use crate::providers::youtube::YouTubeAdapter;

/// Adapters for every provider of `kind`.
///
/// A provider whose credentials are absent from `config` is skipped with a
/// warning; the remaining providers still run. The result may therefore be
/// empty, which callers report as "no providers available".
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
pub fn build_adapters(
    kind: ResourceKind,
    config: &AppConfig,
    context: &SearchContext,
) -> Result<Vec<Arc<dyn ProviderAdapter>>, ScraperError> {
    let settings = HttpSettings::from_app_config(config);
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

    for &provider in ProviderKind::for_resource(kind) {
        match build_adapter(provider, config, &settings, context) {
            Ok(adapter) => adapters.push(adapter),
            Err(ScraperError::MissingCredentials { provider, reason }) => {
                tracing::warn!(provider = %provider, reason = %reason, "provider skipped");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(adapters)
}

fn build_adapter(
    provider: ProviderKind,
    config: &AppConfig,
    settings: &HttpSettings,
    context: &SearchContext,
) -> Result<Arc<dyn ProviderAdapter>, ScraperError> {
    let context = context.clone();
    let adapter: Arc<dyn ProviderAdapter> = match provider {
        ProviderKind::GooglePlay => {
            require_keys(provider, &config.serpapi_keys, "TOPFIND_SERPAPI_KEYS")?;
            Arc::new(GooglePlayAdapter::new(
                settings,
                context,
                config.serpapi_keys.clone(),
            )?)
        }
        ProviderKind::AppStore => Arc::new(AppStoreAdapter::new(settings, context)?),
        ProviderKind::Spotify => {
            let (Some(id), Some(secret)) = (
                config.spotify_client_id.clone(),
                config.spotify_client_secret.clone(),
            ) else {
                return Err(ScraperError::MissingCredentials {
                    provider: provider.to_string(),
                    reason: "TOPFIND_SPOTIFY_CLIENT_ID and TOPFIND_SPOTIFY_CLIENT_SECRET are required"
                        .to_string(),
                });
            };
            Arc::new(SpotifyAdapter::new(settings, context, id, secret)?)
        }
        ProviderKind::ApplePodcasts => Arc::new(ApplePodcastsAdapter::new(settings, context)?),
        ProviderKind::YouTube => {
            require_keys(provider, &config.youtube_api_keys, "TOPFIND_YOUTUBE_API_KEYS")?;
            Arc::new(YouTubeAdapter::new(
                settings,
                context,
                config.youtube_api_keys.clone(),
            )?)
        }
        ProviderKind::GoogleNews => Arc::new(GoogleNewsAdapter::new(
            settings,
            context,
            config.news_fetch_articles,
        )?),
    };
    Ok(adapter)
}

fn require_keys(provider: ProviderKind, keys: &[String], var: &str) -> Result<(), ScraperError> {
    if keys.is_empty() {
        return Err(ScraperError::MissingCredentials {
            provider: provider.to_string(),
            reason: format!("{var} is not set"),
        });
    }
    Ok(())
}
