use crate::error::ConfigError;
use crate::types::DEFAULT_TOPIC_COUNT;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const REPLICATE_API_TOKEN_VAR: &str = "REPLICATE_API_TOKEN";
pub const REDDIT_CLIENT_ID_VAR: &str = "REDDIT_CLIENT_ID";
pub const REDDIT_CLIENT_SECRET_VAR: &str = "REDDIT_CLIENT_SECRET";

const DEFAULT_CHANNELS: &[&str] = &[
    "MachineLearning",
    "artificial",
    "LocalLLaMA",
    "ChatGPT",
    "OpenAI",
    "ClaudeAI",
    "StableDiffusion",
    "singularity",
    "Futurology",
    "deeplearning",
];

/// Settings for the pipeline.
///
/// Non-secret settings come from defaults or an optional TOML file; API
/// credentials are only ever read from the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub forum: ForumConfig,
    pub llm: LlmConfig,
    pub images: ImageConfig,
    pub output: OutputConfig,
    pub top_topics_count: usize,
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    pub channels: Vec<String>,
    /// Posts requested per channel.
    pub post_limit: u32,
    pub scrape_user_agent: String,
    pub api_user_agent: String,
    pub scrape_delay_ms: u64,
    pub api_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub summary_max_tokens: u32,
    pub topics_max_tokens: u32,
    pub prompts_max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub base_url: String,
    pub model: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub inter_image_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub images_subdir: String,
    pub markdown_file: String,
    pub html_file: String,
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub replicate_api_token: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            forum: ForumConfig::default(),
            llm: LlmConfig::default(),
            images: ImageConfig::default(),
            output: OutputConfig::default(),
            top_topics_count: DEFAULT_TOPIC_COUNT,
            credentials: Credentials::default(),
        }
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
            post_limit: 15,
            scrape_user_agent:
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string(),
            api_user_agent: format!("trendcast/{}", env!("CARGO_PKG_VERSION")),
            scrape_delay_ms: 1500,
            api_delay_ms: 600,
        }
    }
}

impl ForumConfig {
    pub fn scrape_delay(&self) -> Duration {
        Duration::from_millis(self.scrape_delay_ms)
    }

    pub fn api_delay(&self) -> Duration {
        Duration::from_millis(self.api_delay_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            summary_max_tokens: 2000,
            topics_max_tokens: 3000,
            prompts_max_tokens: 3000,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com/v1".to_string(),
            model: "black-forest-labs/flux-schnell".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: 30,
            inter_image_delay_ms: 1000,
        }
    }
}

impl ImageConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn inter_image_delay(&self) -> Duration {
        Duration::from_millis(self.inter_image_delay_ms)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            images_subdir: "images".to_string(),
            markdown_file: "ai-news.md".to_string(),
            html_file: "index.html".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn images_dir(&self) -> PathBuf {
        self.dir.join(&self.images_subdir)
    }

    pub fn markdown_path(&self) -> PathBuf {
        self.dir.join(&self.markdown_file)
    }

    pub fn html_path(&self) -> PathBuf {
        self.dir.join(&self.html_file)
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from an arbitrary variable lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            anthropic_api_key: read(ANTHROPIC_API_KEY_VAR),
            replicate_api_token: read(REPLICATE_API_TOKEN_VAR),
            reddit_client_id: read(REDDIT_CLIENT_ID_VAR),
            reddit_client_secret: read(REDDIT_CLIENT_SECRET_VAR),
        }
    }

    pub fn has_forum_api(&self) -> bool {
        self.reddit_client_id.is_some() && self.reddit_client_secret.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| if value.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("replicate_api_token", &redact(&self.replicate_api_token))
            .field("reddit_client_id", &redact(&self.reddit_client_id))
            .field("reddit_client_secret", &redact(&self.reddit_client_secret))
            .finish()
    }
}

impl AppConfig {
    /// Loads settings from `path` (or defaults) and credentials from the
    /// environment, then validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.credentials = Credentials::from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFormat {
            details: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forum.channels.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "at least one forum channel is required".to_string(),
            });
        }
        if self.forum.post_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "forum.post_limit".to_string(),
                value: self.forum.post_limit.to_string(),
            });
        }
        if self.images.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "images.max_poll_attempts".to_string(),
                value: self.images.max_poll_attempts.to_string(),
            });
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "llm.model".to_string(),
            });
        }
        Ok(())
    }

    /// The LLM key is the only mandatory credential.
    pub fn require_llm_key(&self) -> Result<&str, ConfigError> {
        self.credentials
            .anthropic_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                var_name: ANTHROPIC_API_KEY_VAR.to_string(),
            })
    }

    pub fn log_redacted(&self) {
        info!(
            channels = self.forum.channels.len(),
            post_limit = self.forum.post_limit,
            model = %self.llm.model,
            topics = self.top_topics_count,
            output = %self.output.dir.display(),
            credentials = ?self.credentials,
            "Configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.forum.channels.len(), 10);
        assert_eq!(config.forum.post_limit, 15);
        assert_eq!(config.forum.scrape_delay(), Duration::from_millis(1500));
        assert_eq!(config.forum.api_delay(), Duration::from_millis(600));
        assert_eq!(config.images.max_poll_attempts, 30);
        assert_eq!(config.top_topics_count, 10);
        assert_eq!(
            config.output.images_dir(),
            PathBuf::from("output").join("images")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            top_topics_count = 5

            [forum]
            channels = ["rust", "programming"]

            [output]
            dir = "site"
            "#,
        )
        .unwrap();

        assert_eq!(config.top_topics_count, 5);
        assert_eq!(config.forum.channels, vec!["rust", "programming"]);
        assert_eq!(config.forum.post_limit, 15);
        assert_eq!(config.output.html_path(), PathBuf::from("site").join("index.html"));
        assert_eq!(config.llm.summary_max_tokens, 2000);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml("top_topics_count = \"many\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm]\nmodel = \"claude-test\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.llm.model, "claude-test");
    }

    #[test]
    fn test_validation_rejects_empty_channels() {
        let mut config = AppConfig::default();
        config.forum.channels.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ANTHROPIC_API_KEY_VAR, "sk-test"),
            (REPLICATE_API_TOKEN_VAR, "   "),
            (REDDIT_CLIENT_ID_VAR, "id"),
        ]
        .into_iter()
        .collect();

        let credentials = Credentials::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(credentials.anthropic_api_key.as_deref(), Some("sk-test"));
        assert!(credentials.replicate_api_token.is_none());
        assert!(!credentials.has_forum_api());

        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("sk-test"));
    }

    #[test]
    fn test_require_llm_key() {
        let config = AppConfig::default();
        assert!(matches!(
            config.require_llm_key(),
            Err(ConfigError::MissingEnvironmentVariable { .. })
        ));
    }
}
