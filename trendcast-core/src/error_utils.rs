use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "CoreError: {}", self);
        match self {
            CoreError::ForumApi(e) => {
                error!("Forum API error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Image(e) => {
                error!("Image error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::ForumApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Image(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Io(e) => format!("File system error: {}", e),
            CoreError::InvalidInput { .. } => {
                "Invalid input provided. Please check your input and try again.".to_string()
            }
            CoreError::RequestFailed { message, .. } => {
                format!("Request failed: {}", message)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::ForumApi(_) => "FORUM_API".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Image(_) => "IMAGE".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::RequestFailed { .. } => "REQUEST_FAILED".to_string(),
        }
    }
}

impl ErrorExt for ForumApiError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "ForumApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "ForumApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ForumApiError::AuthenticationFailed { .. } => {
                "Forum authentication failed. Please check your client id and secret.".to_string()
            }
            ForumApiError::CredentialsMissing => {
                "Forum API credentials are not configured; scraping will be used instead."
                    .to_string()
            }
            ForumApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            ForumApiError::Forbidden { resource } => format!(
                "Access denied to {}. The channel may be private or quarantined.",
                resource
            ),
            ForumApiError::ChannelNotFound { channel } => {
                format!("Channel '{}' not found or is private.", channel)
            }
            ForumApiError::InvalidToken => {
                "Forum authentication token is invalid. Please re-authenticate.".to_string()
            }
            ForumApiError::RequestTimeout => {
                "Request to the forum timed out. Please try again.".to_string()
            }
            _ => "Forum API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ForumApiError::AuthenticationFailed { .. } => "FORUM_AUTH_FAILED".to_string(),
            ForumApiError::CredentialsMissing => "FORUM_CREDENTIALS_MISSING".to_string(),
            ForumApiError::RateLimitExceeded { .. } => "FORUM_RATE_LIMIT".to_string(),
            ForumApiError::Forbidden { .. } => "FORUM_FORBIDDEN".to_string(),
            ForumApiError::ChannelNotFound { .. } => "FORUM_CHANNEL_NOT_FOUND".to_string(),
            ForumApiError::InvalidToken => "FORUM_INVALID_TOKEN".to_string(),
            ForumApiError::RequestTimeout => "FORUM_TIMEOUT".to_string(),
            ForumApiError::InvalidResponse { .. } => "FORUM_INVALID_RESPONSE".to_string(),
            ForumApiError::ServerError { .. } => "FORUM_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "LlmError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "LlmError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::AuthenticationFailed { provider } | LlmError::InvalidApiKey { provider } => {
                format!("The {} API key was rejected. Please check your key.", provider)
            }
            LlmError::RateLimitExceeded { provider } => {
                format!("{} is rate limiting requests. Please try again later.", provider)
            }
            LlmError::ModelNotAvailable { model } => {
                format!("The model '{}' is not available.", model)
            }
            LlmError::ServiceUnavailable { provider } => {
                format!("{} is currently unavailable. Please try again later.", provider)
            }
            LlmError::RequestTimeout { provider } => {
                format!("The request to {} timed out.", provider)
            }
            LlmError::InvalidResponseFormat { provider } | LlmError::EmptyCompletion { provider } => {
                format!("{} returned an unexpected response.", provider)
            }
            LlmError::Api { provider, message, .. } => {
                format!("{} reported an error: {}", provider, message)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::AuthenticationFailed { .. } => "LLM_AUTH_FAILED".to_string(),
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
            LlmError::EmptyCompletion { .. } => "LLM_EMPTY_COMPLETION".to_string(),
            LlmError::Api { .. } => "LLM_API_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ImageError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "ImageError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "ImageError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ImageError::JobRejected { status_code, .. } => format!(
                "The image service rejected the request (HTTP {}).",
                status_code
            ),
            ImageError::TimedOut { .. } => {
                "The image service did not finish in time; a placeholder was used.".to_string()
            }
            ImageError::Encoding { reason } => format!("Could not write the image: {}", reason),
            _ => "Image generation failed; a placeholder was used.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ImageError::JobRejected { .. } => "IMAGE_JOB_REJECTED".to_string(),
            ImageError::MissingPollingUrl => "IMAGE_MISSING_POLLING_URL".to_string(),
            ImageError::JobFailed { .. } => "IMAGE_JOB_FAILED".to_string(),
            ImageError::TimedOut { .. } => "IMAGE_TIMEOUT".to_string(),
            ImageError::NoOutput => "IMAGE_NO_OUTPUT".to_string(),
            ImageError::DownloadFailed { .. } => "IMAGE_DOWNLOAD_FAILED".to_string(),
            ImageError::Encoding { .. } => "IMAGE_ENCODING".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' was not found.", path)
            }
            ConfigError::InvalidFormat { .. } | ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the file syntax.".to_string()
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set. Set it with: export {}='your-key'",
                var_name, var_name
            ),
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration is invalid: {}", reason)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidFormat { .. } => "CONFIG_INVALID_FORMAT".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}
