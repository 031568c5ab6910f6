pub mod api;
pub mod auth;
pub mod scrape;

#[cfg(test)]
mod tests;

pub use api::{ApiClient, Listing, PostData};
pub use auth::{Authenticator, ForumToken};
pub use scrape::{parse_listing, ScrapeClient};

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use trendcast_core::{CoreError, Credentials, ErrorExt, ForumApiError, ForumConfig, Post};

pub(crate) const FORUM_WEB_BASE: &str = "https://reddit.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    Scrape,
    Api,
}

impl CollectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            CollectionMode::Scrape => "scraping",
            CollectionMode::Api => "API",
        }
    }
}

/// Client context for all forum collection.
///
/// Built once by the driver; owns both HTTP clients and, when API
/// credentials are configured, the OAuth token cache.
pub struct ForumClient {
    config: ForumConfig,
    scraper: ScrapeClient,
    api: ApiClient,
    auth: Option<Authenticator>,
}

impl ForumClient {
    pub fn new(config: ForumConfig, credentials: &Credentials) -> Result<Self, CoreError> {
        let scraper = ScrapeClient::new(&config.scrape_user_agent)?;
        let api = ApiClient::new(config.api_user_agent.clone())?;

        let auth = match (
            credentials.reddit_client_id.clone(),
            credentials.reddit_client_secret.clone(),
        ) {
            (Some(client_id), Some(client_secret)) => Some(Authenticator::new(
                client_id,
                client_secret,
                api.http_client().clone(),
            )?),
            _ => None,
        };

        Ok(Self {
            config,
            scraper,
            api,
            auth,
        })
    }

    pub fn is_api_available(&self) -> bool {
        self.auth.is_some()
    }

    /// API mode silently degrades to scraping without credentials.
    pub fn resolve_mode(&self, use_api: bool) -> CollectionMode {
        if use_api && self.is_api_available() {
            CollectionMode::Api
        } else {
            CollectionMode::Scrape
        }
    }

    /// Collects posts from every configured channel, highest score first.
    ///
    /// Per-channel failures are logged and count as zero posts.
    pub async fn collect(&self, use_api: bool) -> Vec<Post> {
        let mode = self.resolve_mode(use_api);
        if use_api && mode == CollectionMode::Scrape {
            info!("Forum API not configured, using scraping");
        }
        info!(
            "Collecting posts from {} channels ({} mode)",
            self.config.channels.len(),
            mode.label()
        );

        let delay = match mode {
            CollectionMode::Api => self.config.api_delay(),
            CollectionMode::Scrape => self.config.scrape_delay(),
        };

        let client = self;
        let posts = gather_posts(&self.config.channels, delay, move |channel| {
            client.fetch_channel(mode, channel)
        })
        .await;

        info!("Total collected: {} posts", posts.len());
        posts
    }

    pub async fn fetch_channel(
        &self,
        mode: CollectionMode,
        channel: &str,
    ) -> Result<Vec<Post>, CoreError> {
        match mode {
            CollectionMode::Scrape => {
                self.scraper
                    .fetch_channel(channel, self.config.post_limit)
                    .await
            }
            CollectionMode::Api => {
                let auth = self
                    .auth
                    .as_ref()
                    .ok_or(CoreError::ForumApi(ForumApiError::CredentialsMissing))?;
                let token = auth.access_token().await?;
                self.api
                    .get_channel_posts(&token, channel, self.config.post_limit)
                    .await
            }
        }
    }
}

/// Visits channels in order with a fixed pause between them and merges the
/// results, sorted by descending score (ties keep collection order).
pub async fn gather_posts<'a, F, Fut>(
    channels: &'a [String],
    delay: Duration,
    mut fetch: F,
) -> Vec<Post>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<Vec<Post>, CoreError>>,
{
    let mut posts = Vec::new();

    for (index, channel) in channels.iter().enumerate() {
        match fetch(channel.as_str()).await {
            Ok(found) => {
                info!(
                    "[{}/{}] r/{}: {} posts",
                    index + 1,
                    channels.len(),
                    channel,
                    found.len()
                );
                posts.extend(found);
            }
            Err(e) => {
                warn!("[{}/{}] r/{} failed", index + 1, channels.len(), channel);
                e.log_warn();
            }
        }

        if index + 1 < channels.len() {
            sleep(delay).await;
        }
    }

    posts.sort_by(|a, b| b.score.cmp(&a.score));
    posts
}
