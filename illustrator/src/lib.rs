pub mod placeholder;
pub mod replicate;


pub use placeholder::{write_placeholder, WATERMARK};
pub use replicate::{Prediction, PredictionStatus, ReplicateClient};

use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use trendcast_core::{
    CoreError, Credentials, ErrorExt, ImageConfig, ImageError, Topic, DEFAULT_IMAGE_PROMPT,
};

/// Asynchronous image-generation job service.
pub trait PredictionApi {
    async fn create_prediction(&self, prompt: &str) -> Result<Prediction, CoreError>;

    async fn get_prediction(&self, url: &str) -> Result<Prediction, CoreError>;

    async fn download(&self, url: &str, path: &Path) -> Result<(), CoreError>;
}

pub fn image_filename(index: usize) -> String {
    format!("topic_{:02}.png", index)
}

/// Produces one image per topic, through the prediction service when a
/// token is configured and as a local placeholder otherwise.
pub struct Illustrator<A: PredictionApi> {
    api: Option<A>,
    poll_interval: Duration,
    max_poll_attempts: u32,
    inter_image_delay: Duration,
}

impl Illustrator<ReplicateClient> {
    pub fn new(config: &ImageConfig, credentials: &Credentials) -> Result<Self, CoreError> {
        let api = match credentials.replicate_api_token.as_deref() {
            Some(token) => Some(ReplicateClient::new(token, config)?),
            None => None,
        };
        Ok(Self::with_api(api, config))
    }
}

impl<A: PredictionApi> Illustrator<A> {
    pub fn with_api(api: Option<A>, config: &ImageConfig) -> Self {
        Self {
            api,
            poll_interval: config.poll_interval(),
            max_poll_attempts: config.max_poll_attempts,
            inter_image_delay: config.inter_image_delay(),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.api.is_some()
    }

    /// Writes an image for `prompt` to `path`. Any remote failure falls back
    /// to the placeholder; returns `false` only when nothing could be written.
    pub async fn generate(&self, prompt: &str, path: &Path) -> bool {
        match &self.api {
            Some(api) => match self.generate_remote(api, prompt, path).await {
                Ok(()) => return true,
                Err(e) => {
                    e.log_warn();
                    warn!("Using placeholder for {}", path.display());
                }
            },
            None => debug!("No image service token configured, using placeholder"),
        }

        match write_placeholder(prompt, path).await {
            Ok(()) => true,
            Err(e) => {
                e.log_error();
                false
            }
        }
    }

    async fn generate_remote(&self, api: &A, prompt: &str, path: &Path) -> Result<(), CoreError> {
        let prediction = api.create_prediction(prompt).await?;
        let polling_url = prediction
            .polling_url()
            .ok_or(ImageError::MissingPollingUrl)?
            .to_string();

        for attempt in 1..=self.max_poll_attempts {
            sleep(self.poll_interval).await;

            let prediction = api.get_prediction(&polling_url).await?;
            debug!("Poll {}: {:?}", attempt, prediction.status);

            match prediction.status {
                PredictionStatus::Succeeded => {
                    let url = prediction.first_output().ok_or(ImageError::NoOutput)?;
                    return api.download(url, path).await;
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    return Err(ImageError::JobFailed {
                        reason: prediction.failure_reason(),
                    }
                    .into());
                }
                _ => {}
            }
        }

        Err(ImageError::TimedOut {
            attempts: self.max_poll_attempts,
        }
        .into())
    }

    /// Illustrates every topic in order, recording the path and filename on
    /// success and clearing both on failure. Returns how many images exist.
    pub async fn illustrate_topics(
        &self,
        topics: &mut [Topic],
        images_dir: &Path,
    ) -> Result<usize, CoreError> {
        tokio::fs::create_dir_all(images_dir).await?;

        let total = topics.len();
        info!("Generating {} images into {}", total, images_dir.display());

        for (i, topic) in topics.iter_mut().enumerate() {
            let filename = image_filename(i + 1);
            let path = images_dir.join(&filename);
            let prompt = topic
                .image_prompt
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(DEFAULT_IMAGE_PROMPT);

            info!("[{}/{}] {}", i + 1, total, topic.title);

            if self.generate(prompt, &path).await {
                topic.image_path = Some(path.to_string_lossy().into_owned());
                topic.image_filename = Some(filename);
            } else {
                warn!("No image for topic {}", i + 1);
                topic.clear_image();
            }

            if i + 1 < total {
                sleep(self.inter_image_delay).await;
            }
        }

        let generated = topics.iter().filter(|t| t.has_image()).count();
        info!("Generated {}/{} images", generated, total);
        Ok(generated)
    }
}
