use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use trendcast_core::{CoreError, ForumApiError, Post};

use crate::FORUM_WEB_BASE;

const FORUM_API_BASE: &str = "https://oauth.reddit.com";
const API_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing<T> {
    #[serde(default)]
    pub kind: String,
    pub data: ListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<ListingChild<T>>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingChild<T> {
    #[serde(default)]
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostData {
    pub title: String,
    pub score: i64,
    pub num_comments: u64,
    pub url: String,
    pub permalink: String,
    pub promoted: Option<bool>,
}

impl PostData {
    pub fn is_promoted(&self) -> bool {
        self.promoted.unwrap_or(false)
    }

    pub fn into_post(self, channel: &str) -> Post {
        Post {
            title: self.title,
            score: self.score,
            comment_count: self.num_comments,
            url: self.url,
            channel: channel.to_string(),
            permalink: format!("{}{}", FORUM_WEB_BASE, self.permalink),
        }
    }
}

#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    user_agent: String,
}

impl ApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(API_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            user_agent,
        })
    }

    /// The underlying client, shared with the token exchange.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", FORUM_API_BASE, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making forum API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::ForumApi(ForumApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let error = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                ForumApiError::RateLimitExceeded { retry_after }
            }
            401 => ForumApiError::InvalidToken,
            403 => ForumApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => ForumApiError::InvalidResponse {
                details: format!("Resource not found: {}", endpoint),
            },
            code if status.is_server_error() => ForumApiError::ServerError { status_code: code },
            code => {
                return Err(CoreError::RequestFailed {
                    message: format!("{} {} returned {}", method, endpoint, status),
                    status_code: Some(code),
                })
            }
        };

        Err(CoreError::ForumApi(error))
    }

    /// Fetches the hot listing of one channel, skipping promoted entries.
    pub async fn get_channel_posts(
        &self,
        access_token: &str,
        channel: &str,
        limit: u32,
    ) -> Result<Vec<Post>, CoreError> {
        let endpoint = format!("/r/{}/hot", channel);
        let limit = limit.to_string();
        let params = [("limit", limit.as_str())];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params))
            .await?;

        let listing: Listing<PostData> = response.json().await.map_err(|e| {
            error!("Failed to parse channel posts: {}", e);
            CoreError::ForumApi(ForumApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", channel),
            })
        })?;

        let posts = listing_to_posts(listing, channel);
        info!("Retrieved {} posts from r/{}", posts.len(), channel);
        Ok(posts)
    }
}

pub fn listing_to_posts(listing: Listing<PostData>, channel: &str) -> Vec<Post> {
    listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .filter(|data| !data.is_promoted())
        .map(|data| data.into_post(channel))
        .collect()
}
