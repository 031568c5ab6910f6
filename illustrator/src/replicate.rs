use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error};
use trendcast_core::{CoreError, ImageConfig, ImageError};

use crate::PredictionApi;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Serialize)]
struct PredictionRequest<'a> {
    input: PredictionInput<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    num_outputs: u32,
    aspect_ratio: &'static str,
    output_format: &'static str,
    output_quality: u32,
}

impl<'a> PredictionInput<'a> {
    fn square_png(prompt: &'a str) -> Self {
        Self {
            prompt,
            num_outputs: 1,
            aspect_ratio: "1:1",
            output_format: "png",
            output_quality: 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

/// An image-generation job as reported by the prediction service.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub status: PredictionStatus,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    pub fn polling_url(&self) -> Option<&str> {
        self.urls
            .as_ref()
            .and_then(|urls| urls.get.as_deref())
            .filter(|url| !url.is_empty())
    }

    /// First output URL. Some models report a bare string instead of a list.
    pub fn first_output(&self) -> Option<&str> {
        match self.output.as_ref()? {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(url) => Some(url.as_str()),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(Value::String(reason)) => reason.clone(),
            Some(Value::Null) | None => "unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Replicate predictions API client, authenticated with a bearer token.
pub struct ReplicateClient {
    http: Client,
    api_token: String,
    predictions_url: String,
}

impl ReplicateClient {
    pub fn new(api_token: &str, config: &ImageConfig) -> Result<Self, CoreError> {
        let http = Client::builder().build()?;

        Ok(Self {
            http,
            api_token: api_token.to_string(),
            predictions_url: format!(
                "{}/models/{}/predictions",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
        })
    }

    pub fn predictions_url(&self) -> &str {
        &self.predictions_url
    }

    fn headers(&self) -> Result<HeaderMap, CoreError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_token)).map_err(|_| {
            CoreError::InvalidInput {
                message: "image service token contains invalid characters".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl PredictionApi for ReplicateClient {
    async fn create_prediction(&self, prompt: &str) -> Result<Prediction, CoreError> {
        let request = PredictionRequest {
            input: PredictionInput::square_png(prompt),
        };

        debug!("Submitting prediction to {}", self.predictions_url);

        let response = self
            .http
            .post(&self.predictions_url)
            .headers(self.headers()?)
            .timeout(SUBMIT_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Prediction rejected ({}): {}", status, message);
            return Err(ImageError::JobRejected {
                status_code: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response.json().await?)
    }

    async fn get_prediction(&self, url: &str) -> Result<Prediction, CoreError> {
        let response = self
            .http
            .get(url)
            .headers(self.headers()?)
            .timeout(POLL_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::RequestFailed {
                message: format!("prediction poll returned {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        Ok(response.json().await?)
    }

    async fn download(&self, url: &str, path: &Path) -> Result<(), CoreError> {
        let mut response = self.http.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;

        if !response.status().is_success() {
            return Err(ImageError::DownloadFailed {
                url: url.to_string(),
            }
            .into());
        }

        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut written = 0usize;

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len();
        }
        writer.flush().await?;

        debug!("Downloaded {} bytes to {}", written, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let request = PredictionRequest {
            input: PredictionInput::square_png("a glowing chip"),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["input"]["prompt"], "a glowing chip");
        assert_eq!(value["input"]["num_outputs"], 1);
        assert_eq!(value["input"]["aspect_ratio"], "1:1");
        assert_eq!(value["input"]["output_format"], "png");
        assert_eq!(value["input"]["output_quality"], 90);
    }

    #[test]
    fn test_prediction_parsing() {
        let prediction: Prediction = serde_json::from_str(
            r#"{
                "id": "abc",
                "status": "succeeded",
                "urls": {"get": "https://api.example.com/p/abc", "cancel": "x"},
                "output": ["https://cdn.example.com/out-0.png"]
            }"#,
        )
        .unwrap();

        assert_eq!(prediction.status, PredictionStatus::Succeeded);
        assert!(prediction.status.is_terminal());
        assert_eq!(prediction.polling_url(), Some("https://api.example.com/p/abc"));
        assert_eq!(
            prediction.first_output(),
            Some("https://cdn.example.com/out-0.png")
        );
    }

    #[test]
    fn test_prediction_without_urls_or_output() {
        let prediction: Prediction =
            serde_json::from_str(r#"{"status": "failed", "error": "NSFW content detected"}"#)
                .unwrap();

        assert_eq!(prediction.polling_url(), None);
        assert_eq!(prediction.first_output(), None);
        assert_eq!(prediction.failure_reason(), "NSFW content detected");

        let queued: Prediction = serde_json::from_str(r#"{"status": "queued"}"#).unwrap();
        assert_eq!(queued.status, PredictionStatus::Unknown);
        assert!(!queued.status.is_terminal());
    }

    #[test]
    fn test_predictions_url_from_config() {
        let config = ImageConfig {
            base_url: "https://api.replicate.com/v1/".to_string(),
            ..ImageConfig::default()
        };
        let client = ReplicateClient::new("r8_test", &config).unwrap();
        assert_eq!(
            client.predictions_url(),
            "https://api.replicate.com/v1/models/black-forest-labs/flux-schnell/predictions"
        );
    }
}
