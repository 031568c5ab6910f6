use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, TokenResponse, TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trendcast_core::{CoreError, ForumApiError};

const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before the server-declared expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct ForumToken {
    pub access_token: String,
    /// Instant after which the token must be refreshed (already includes
    /// [`REFRESH_MARGIN`]).
    pub refresh_at: Instant,
}

impl ForumToken {
    pub fn new(access_token: String, lifetime: Duration) -> Self {
        Self {
            access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        }
    }

    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

/// Application-only OAuth2 (client credentials grant) with a cached token.
///
/// The cache lock is held across the token request, so concurrent callers
/// wait for a single refresh instead of each issuing their own.
pub struct Authenticator {
    oauth: BasicClient,
    http_client: Client,
    cached: Mutex<Option<ForumToken>>,
}

impl Authenticator {
    pub fn new(
        client_id: String,
        client_secret: String,
        http_client: Client,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(AUTHORIZE_URL.to_string()).map_err(|e| {
            ForumApiError::AuthenticationFailed {
                reason: format!("invalid authorize url: {}", e),
            }
        })?;
        let token_url = TokenUrl::new(TOKEN_URL.to_string()).map_err(|e| {
            ForumApiError::AuthenticationFailed {
                reason: format!("invalid token url: {}", e),
            }
        })?;

        let oauth = BasicClient::new(
            ClientId::new(client_id),
            Some(ClientSecret::new(client_secret)),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth,
            http_client,
            cached: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, requesting a new one when the cached
    /// token is missing or inside the refresh margin.
    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            debug!("Using cached forum API token");
            return Ok(token.access_token.clone());
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    pub async fn set_token(&self, token: ForumToken) {
        *self.cached.lock().await = Some(token);
    }

    pub async fn needs_refresh(&self) -> bool {
        !matches!(self.cached.lock().await.as_ref(), Some(token) if token.is_fresh())
    }

    async fn request_token(&self) -> Result<ForumToken, CoreError> {
        info!("Requesting forum API token");

        let response = self
            .oauth
            .exchange_client_credentials()
            .request_async(|request| send_oauth_request(&self.http_client, request))
            .await
            .map_err(|e| {
                warn!("Failed to get forum API token: {}", e);
                ForumApiError::AuthenticationFailed {
                    reason: e.to_string(),
                }
            })?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        debug!("Forum API token valid for {:?}", lifetime);

        Ok(ForumToken::new(
            response.access_token().secret().to_string(),
            lifetime,
        ))
    }
}

/// Executes the token request with our own client so the configured user
/// agent is sent; the forum rejects anonymous agents.
async fn send_oauth_request(
    client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
